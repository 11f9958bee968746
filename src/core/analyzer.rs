use crate::core::mapper::FieldPlan;
use crate::core::resolver::{DuplicateResolver, Resolution};
use crate::core::validator::validate_row;
use crate::domain::model::{
    AnalysisResult, AttendeeRecord, AttributeDefinition, AttributeValue, ImportConfig, RawRow,
};
use crate::utils::error::Result;
use std::collections::BTreeMap;

/// Runs the full classification over a decoded file: plan resolution, row
/// validation, duplicate resolution, and final assembly.
///
/// Only a structurally broken mapping makes this fail; bad cell data ends up
/// in `invalid_rows` and never aborts the batch. Rows are processed strictly
/// in file order so duplicate handling is deterministic.
pub fn analyze_rows(
    headers: &[String],
    rows: &[RawRow],
    config: &ImportConfig,
    catalog: &[AttributeDefinition],
    roster: &[AttendeeRecord],
) -> Result<AnalysisResult> {
    let plan = FieldPlan::resolve(headers, config, catalog)?;
    let plan_new_names = plan.new_attribute_names();
    let mut resolver = DuplicateResolver::new(roster, config.duplicate_mode);

    let mut attendees_to_create = Vec::new();
    let mut attendees_to_update = Vec::new();
    let mut invalid_rows = Vec::new();
    let mut new_attributes_to_create: Vec<String> = Vec::new();
    let mut skipped_duplicates = 0;

    for row in rows {
        let candidate = match validate_row(&plan, row) {
            Ok(candidate) => candidate,
            Err(invalid) => {
                invalid_rows.push(invalid);
                continue;
            }
        };

        match resolver.classify(row, candidate) {
            Resolution::Create(record) => {
                note_new_attribute_usage(
                    &plan_new_names,
                    &record.attributes,
                    &mut new_attributes_to_create,
                );
                attendees_to_create.push(record);
            }
            Resolution::Update(update) => {
                note_new_attribute_usage(
                    &plan_new_names,
                    &update.attributes,
                    &mut new_attributes_to_create,
                );
                attendees_to_update.push(update);
            }
            Resolution::SkippedDuplicate(record) => {
                note_new_attribute_usage(
                    &plan_new_names,
                    &record.attributes,
                    &mut new_attributes_to_create,
                );
                skipped_duplicates += 1;
            }
            Resolution::Invalid(invalid) => invalid_rows.push(invalid),
        }
    }

    tracing::debug!(
        "classified {} rows: {} create, {} update, {} invalid, {} skipped",
        rows.len(),
        attendees_to_create.len(),
        attendees_to_update.len(),
        invalid_rows.len(),
        skipped_duplicates
    );

    Ok(AnalysisResult {
        attendees_to_create,
        attendees_to_update,
        invalid_rows,
        new_attributes_to_create,
        rows_read: rows.len(),
        skipped_duplicates,
        warnings: plan.warnings.clone(),
    })
}

/// Pending attribute definitions are only worth creating when some row that
/// survived classification actually supplied a value for them. First-seen
/// order, by row then by column.
fn note_new_attribute_usage(
    plan_new_names: &[&str],
    attributes: &BTreeMap<String, AttributeValue>,
    used: &mut Vec<String>,
) {
    for name in plan_new_names {
        if attributes.contains_key(*name) && !used.iter().any(|u| u == name) {
            used.push((*name).to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reader::read_rows;
    use crate::domain::model::{
        AttributeType, ColumnMapping, DuplicateMode, ImportConfig, MappingTarget,
    };

    fn mapping(entries: &[(&str, MappingTarget)]) -> ColumnMapping {
        entries
            .iter()
            .map(|(h, t)| (h.to_string(), t.clone()))
            .collect()
    }

    fn base_config(mode: DuplicateMode) -> ImportConfig {
        ImportConfig {
            duplicate_mode: mode,
            create_missing_attributes: true,
            mapping: mapping(&[
                ("identity", MappingTarget::Identity),
                ("firstName", MappingTarget::FirstName),
                ("lastName", MappingTarget::LastName),
            ]),
        }
    }

    fn roster_with(identity: &str) -> Vec<AttendeeRecord> {
        vec![AttendeeRecord {
            id: "rec-1".to_string(),
            identity: identity.to_string(),
            first_name: "Old".to_string(),
            last_name: "Name".to_string(),
            attributes: BTreeMap::new(),
        }]
    }

    fn analyze(
        csv: &[u8],
        config: &ImportConfig,
        catalog: &[AttributeDefinition],
        roster: &[AttendeeRecord],
    ) -> Result<AnalysisResult> {
        let (headers, rows) = read_rows(csv).unwrap();
        analyze_rows(&headers, &rows, config, catalog, roster)
    }

    #[test]
    fn test_intra_file_duplicate_under_skip_mode() {
        let csv = b"identity,firstName,lastName\n1,A,B\n1,C,D\n";
        let analysis = analyze(csv, &base_config(DuplicateMode::Skip), &[], &[]).unwrap();

        assert_eq!(analysis.attendees_to_create.len(), 1);
        assert_eq!(analysis.attendees_to_create[0].identity, "1");
        assert_eq!(analysis.attendees_to_create[0].first_name, "A");
        assert_eq!(analysis.invalid_rows.len(), 1);
        assert_eq!(analysis.invalid_rows[0].row_number, 2);
        assert_eq!(analysis.invalid_rows[0].error, "Duplicate identity within file");
        assert_eq!(analysis.skipped_duplicates, 0);
    }

    #[test]
    fn test_every_row_classified_exactly_once() {
        // Row 1 creates, row 2 updates, row 3 fails validation, row 4 is a
        // roster duplicate under SKIP.
        let csv = b"identity,firstName,lastName\n1,A,B\nX,C,D\n2,,F\nX2,G,H\n";
        let mut roster = roster_with("X");
        roster.push(AttendeeRecord {
            id: "rec-2".to_string(),
            identity: "X2".to_string(),
            first_name: "Old".to_string(),
            last_name: "Name".to_string(),
            attributes: BTreeMap::new(),
        });
        let mut config = base_config(DuplicateMode::Update);
        let analysis = analyze(csv, &config, &[], &roster).unwrap();
        assert_eq!(analysis.attendees_to_create.len(), 1);
        assert_eq!(analysis.attendees_to_update.len(), 2);
        assert_eq!(analysis.invalid_rows.len(), 1);
        assert_eq!(analysis.rows_read, 4);
        assert_eq!(analysis.classified_rows(), analysis.rows_read);

        // Same file under SKIP: roster collisions drop out of the lists but
        // stay visible in the skip count.
        config.duplicate_mode = DuplicateMode::Skip;
        let analysis = analyze(csv, &config, &[], &roster).unwrap();
        assert_eq!(analysis.attendees_to_create.len(), 1);
        assert_eq!(analysis.attendees_to_update.len(), 0);
        assert_eq!(analysis.skipped_duplicates, 2);
        assert_eq!(analysis.classified_rows(), analysis.rows_read);
    }

    #[test]
    fn test_update_mode_references_existing_record_id() {
        let csv = b"identity,firstName,lastName\nX,New,Person\n";
        let analysis = analyze(
            csv,
            &base_config(DuplicateMode::Update),
            &[],
            &roster_with("X"),
        )
        .unwrap();

        assert!(analysis.attendees_to_create.is_empty());
        assert_eq!(analysis.attendees_to_update.len(), 1);
        assert_eq!(analysis.attendees_to_update[0].id, "rec-1");
        assert_eq!(analysis.attendees_to_update[0].first_name, "New");
    }

    #[test]
    fn test_fail_mode_rejects_roster_collision() {
        let csv = b"identity,firstName,lastName\nX,New,Person\n";
        let analysis = analyze(
            csv,
            &base_config(DuplicateMode::Fail),
            &[],
            &roster_with("X"),
        )
        .unwrap();

        assert!(analysis.attendees_to_create.is_empty());
        assert!(analysis.attendees_to_update.is_empty());
        assert_eq!(analysis.invalid_rows.len(), 1);
        assert_eq!(analysis.invalid_rows[0].error, "Identity already exists");
    }

    #[test]
    fn test_new_attribute_created_only_when_some_row_uses_it() {
        let mut config = base_config(DuplicateMode::Skip);
        config.mapping.insert("T-Shirt".to_string(), MappingTarget::CreateAttribute);
        config.mapping.insert("Badge".to_string(), MappingTarget::CreateAttribute);

        // Badge is only filled on the invalid row; T-Shirt on a valid one.
        let csv = b"identity,firstName,lastName,T-Shirt,Badge\n1,A,B,L,\n2,,D,M,gold\n";
        let analysis = analyze(csv, &config, &[], &[]).unwrap();

        assert_eq!(analysis.new_attributes_to_create, vec!["T-Shirt".to_string()]);
        assert_eq!(
            analysis.attendees_to_create[0]
                .attributes
                .get("T-Shirt"),
            Some(&AttributeValue::Text("L".to_string()))
        );
    }

    #[test]
    fn test_new_attribute_names_deduplicated_in_first_seen_order() {
        let mut config = base_config(DuplicateMode::Skip);
        config.mapping.insert("Zeta".to_string(), MappingTarget::CreateAttribute);
        config.mapping.insert("Alpha".to_string(), MappingTarget::CreateAttribute);

        let csv = b"identity,firstName,lastName,Zeta,Alpha\n1,A,B,z,\n2,C,D,z,a\n";
        let analysis = analyze(csv, &config, &[], &[]).unwrap();
        assert_eq!(
            analysis.new_attributes_to_create,
            vec!["Zeta".to_string(), "Alpha".to_string()]
        );
    }

    #[test]
    fn test_broken_mapping_aborts_before_any_row() {
        let mut config = base_config(DuplicateMode::Skip);
        config.mapping.remove("lastName");

        let csv = b"identity,firstName,lastName\n1,A,B\n";
        let err = analyze(csv, &config, &[], &[]).unwrap_err();
        assert!(err.to_string().contains("no column maps to lastName"));
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let mut config = base_config(DuplicateMode::Update);
        config.mapping.insert(
            "Age".to_string(),
            MappingTarget::Attribute("Age".to_string()),
        );
        let catalog = vec![AttributeDefinition {
            id: "a1".to_string(),
            name: "Age".to_string(),
            attribute_type: AttributeType::Number,
            options: vec![],
        }];
        let csv = b"identity,firstName,lastName,Age\nX,A,B,30\n1,C,D,abc\n1,C,D,5\n";
        let roster = roster_with("X");

        let first = analyze(csv, &config, &catalog, &roster).unwrap();
        let second = analyze(csv, &config, &catalog, &roster).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_warnings_surface_in_analysis() {
        let mut config = base_config(DuplicateMode::Skip);
        config.create_missing_attributes = false;
        config.mapping.insert("Extra".to_string(), MappingTarget::CreateAttribute);

        let csv = b"identity,firstName,lastName,Extra\n1,A,B,x\n";
        let analysis = analyze(csv, &config, &[], &[]).unwrap();
        assert_eq!(analysis.warnings.len(), 1);
        assert!(analysis.warnings[0].contains("Extra"));
        assert!(analysis.attendees_to_create[0].attributes.is_empty());
    }
}
