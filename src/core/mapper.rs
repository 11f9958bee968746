use crate::domain::model::{AttributeDefinition, ImportConfig, MappingTarget};
use crate::utils::error::{ImportError, Result};
use std::collections::HashSet;

/// Where one CSV column's cells end up, resolved against the attribute
/// catalog so row handling never touches header strings or the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTarget {
    Identity,
    FirstName,
    LastName,
    Attribute(AttributeDefinition),
    /// An attribute that does not exist yet, named after the header. Treated
    /// as TEXT until commit materializes it.
    NewAttribute(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub header: String,
    pub target: ResolvedTarget,
}

/// The pre-validated column plan for one import. Ignored and unmapped
/// headers carry no entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlan {
    pub entries: Vec<PlanEntry>,
    pub warnings: Vec<String>,
}

impl FieldPlan {
    /// Resolves the user's column mapping against the file's headers and the
    /// current attribute catalog. Pure; fails with a configuration error when
    /// the mapping is structurally unusable (missing system field, colliding
    /// targets, unknown attribute), since that invalidates every row alike.
    pub fn resolve(
        headers: &[String],
        config: &ImportConfig,
        catalog: &[AttributeDefinition],
    ) -> Result<FieldPlan> {
        let mut entries = Vec::new();
        let mut warnings = Vec::new();
        let mut system_fields_seen: HashSet<&'static str> = HashSet::new();
        let mut attributes_seen: HashSet<String> = HashSet::new();

        let mut claim_system_field = |field: &'static str| -> Result<()> {
            if !system_fields_seen.insert(field) {
                return Err(ImportError::configuration(format!(
                    "multiple columns map to {}",
                    field
                )));
            }
            Ok(())
        };

        for header in headers {
            let Some(target) = config.mapping.get(header) else {
                continue;
            };

            let resolved = match target {
                MappingTarget::Ignore => continue,
                MappingTarget::Identity => {
                    claim_system_field("identity")?;
                    ResolvedTarget::Identity
                }
                MappingTarget::FirstName => {
                    claim_system_field("firstName")?;
                    ResolvedTarget::FirstName
                }
                MappingTarget::LastName => {
                    claim_system_field("lastName")?;
                    ResolvedTarget::LastName
                }
                MappingTarget::Attribute(name) => {
                    let definition = catalog
                        .iter()
                        .find(|def| &def.name == name)
                        .ok_or_else(|| {
                            ImportError::configuration(format!(
                                "unknown attribute '{}' in column mapping",
                                name
                            ))
                        })?;
                    if !attributes_seen.insert(name.clone()) {
                        return Err(ImportError::configuration(format!(
                            "multiple columns map to attribute '{}'",
                            name
                        )));
                    }
                    ResolvedTarget::Attribute(definition.clone())
                }
                MappingTarget::CreateAttribute => {
                    if !config.create_missing_attributes {
                        warnings.push(format!(
                            "column '{}' requests a new attribute but attribute creation \
                             is disabled; column ignored",
                            header
                        ));
                        continue;
                    }
                    if !attributes_seen.insert(header.clone()) {
                        return Err(ImportError::configuration(format!(
                            "multiple columns map to attribute '{}'",
                            header
                        )));
                    }
                    // A same-named definition may already exist, e.g. created
                    // by a concurrent import. Resolving to it keeps the row
                    // values checked against the real type.
                    match catalog.iter().find(|def| def.name == *header) {
                        Some(existing) => ResolvedTarget::Attribute(existing.clone()),
                        None => ResolvedTarget::NewAttribute(header.clone()),
                    }
                }
            };

            entries.push(PlanEntry {
                header: header.clone(),
                target: resolved,
            });
        }

        for field in ["identity", "firstName", "lastName"] {
            if !system_fields_seen.contains(field) {
                return Err(ImportError::configuration(format!(
                    "no column maps to {}",
                    field
                )));
            }
        }

        for mapped_header in config.mapping.keys() {
            if !headers.contains(mapped_header) {
                warnings.push(format!(
                    "column mapping references header '{}' which is not in the file",
                    mapped_header
                ));
            }
        }
        warnings.sort();

        Ok(FieldPlan { entries, warnings })
    }

    /// Names of the attributes this plan would create, in column order.
    pub fn new_attribute_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.target {
                ResolvedTarget::NewAttribute(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}
