use crate::domain::model::{ColumnMapping, DuplicateMode, ImportConfig, MappingTarget};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{validate_non_empty_map, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The on-disk import plan: duplicate policy plus the column mapping, as
/// TOML. Values support `${VAR}` environment substitution.
///
/// ```toml
/// [import]
/// duplicate_mode = "update"
/// create_missing_attributes = true
///
/// [mapping]
/// "Student ID" = "identity"
/// "First Name" = "firstName"
/// "Last Name" = "lastName"
/// "Age" = "attribute:Age"
/// "T-Shirt" = "create"
/// "Internal Notes" = "ignore"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPlanFile {
    pub import: ImportSection,
    pub mapping: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSection {
    pub duplicate_mode: DuplicateMode,
    #[serde(default)]
    pub create_missing_attributes: bool,
}

impl ImportPlanFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| {
            ImportError::configuration(format!("import plan parsing error: {}", e))
        })
    }

    /// Replaces `${VAR_NAME}` with the environment value; unset variables
    /// are left as written.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// Resolves the raw target strings into the typed configuration the
    /// engine consumes.
    pub fn into_config(self) -> Result<ImportConfig> {
        self.validate()?;

        let mut mapping = ColumnMapping::with_capacity(self.mapping.len());
        for (header, raw_target) in self.mapping {
            mapping.insert(header, MappingTarget::parse(&raw_target)?);
        }

        Ok(ImportConfig {
            duplicate_mode: self.import.duplicate_mode,
            create_missing_attributes: self.import.create_missing_attributes,
            mapping,
        })
    }
}

impl Validate for ImportPlanFile {
    fn validate(&self) -> Result<()> {
        validate_non_empty_map("mapping", &self.mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_plan() {
        let toml_content = r#"
[import]
duplicate_mode = "skip"
create_missing_attributes = true

[mapping]
"Student ID" = "identity"
"First Name" = "firstName"
"Last Name" = "lastName"
"Age" = "attribute:Age"
"T-Shirt" = "create"
"Internal Notes" = "ignore"
"#;

        let plan = ImportPlanFile::from_toml_str(toml_content).unwrap();
        assert_eq!(plan.import.duplicate_mode, DuplicateMode::Skip);
        assert!(plan.import.create_missing_attributes);

        let config = plan.into_config().unwrap();
        assert_eq!(config.mapping.len(), 6);
        assert_eq!(
            config.mapping.get("Student ID"),
            Some(&MappingTarget::Identity)
        );
        assert_eq!(
            config.mapping.get("Age"),
            Some(&MappingTarget::Attribute("Age".to_string()))
        );
        assert_eq!(
            config.mapping.get("T-Shirt"),
            Some(&MappingTarget::CreateAttribute)
        );
    }

    #[test]
    fn test_create_missing_attributes_defaults_off() {
        let toml_content = r#"
[import]
duplicate_mode = "fail"

[mapping]
"ID" = "identity"
"#;

        let plan = ImportPlanFile::from_toml_str(toml_content).unwrap();
        assert_eq!(plan.import.duplicate_mode, DuplicateMode::Fail);
        assert!(!plan.import.create_missing_attributes);
    }

    #[test]
    fn test_unknown_duplicate_mode_fails_to_parse() {
        let toml_content = r#"
[import]
duplicate_mode = "merge"

[mapping]
"ID" = "identity"
"#;

        let err = ImportPlanFile::from_toml_str(toml_content).unwrap_err();
        assert!(err.to_string().contains("import plan parsing error"));
    }

    #[test]
    fn test_unknown_mapping_target_fails_resolution() {
        let toml_content = r#"
[import]
duplicate_mode = "skip"

[mapping]
"ID" = "identity"
"First" = "first_name"
"#;

        let plan = ImportPlanFile::from_toml_str(toml_content).unwrap();
        let err = plan.into_config().unwrap_err();
        assert!(err.to_string().contains("unknown mapping target"));
    }

    #[test]
    fn test_empty_mapping_is_rejected() {
        let toml_content = r#"
[import]
duplicate_mode = "skip"

[mapping]
"#;

        let plan = ImportPlanFile::from_toml_str(toml_content).unwrap();
        assert!(plan.into_config().is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_IDENTITY_HEADER", "Employee Number");

        let toml_content = r#"
[import]
duplicate_mode = "update"

[mapping]
"${TEST_IDENTITY_HEADER}" = "identity"
"#;

        let plan = ImportPlanFile::from_toml_str(toml_content).unwrap();
        assert!(plan.mapping.contains_key("Employee Number"));

        std::env::remove_var("TEST_IDENTITY_HEADER");
    }

    #[test]
    fn test_plan_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[import]
duplicate_mode = "update"

[mapping]
"ID" = "identity"
"First" = "firstName"
"Last" = "lastName"
"#;
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let plan = ImportPlanFile::from_file(temp_file.path()).unwrap();
        assert_eq!(plan.import.duplicate_mode, DuplicateMode::Update);
        assert_eq!(plan.mapping.len(), 3);
    }
}
