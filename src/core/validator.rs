use crate::core::mapper::{FieldPlan, ResolvedTarget};
use crate::domain::model::{
    AttributeDefinition, AttributeType, AttributeValue, CandidateRecord, InvalidRow, RawRow,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Applies the field plan and per-type rules to one raw row.
///
/// Total and side-effect free. A row with several problems reports only the
/// first one in column order, so the user fixes errors left to right. The
/// roster is never consulted here; identity collisions are the resolver's
/// concern.
pub fn validate_row(plan: &FieldPlan, row: &RawRow) -> Result<CandidateRecord, InvalidRow> {
    let mut identity = None;
    let mut first_name = None;
    let mut last_name = None;
    let mut attributes = BTreeMap::new();

    let reject = |error: String| InvalidRow {
        row_number: row.row_number,
        row_data: row.values.clone(),
        error,
    };

    for entry in &plan.entries {
        let raw_cell = row.cell(&entry.header);
        let trimmed = raw_cell.trim();

        match &entry.target {
            ResolvedTarget::Identity => match trimmed {
                "" => return Err(reject("Identity is required".to_string())),
                value => identity = Some(value.to_string()),
            },
            ResolvedTarget::FirstName => match trimmed {
                "" => return Err(reject("First name is required".to_string())),
                value => first_name = Some(value.to_string()),
            },
            ResolvedTarget::LastName => match trimmed {
                "" => return Err(reject("Last name is required".to_string())),
                value => last_name = Some(value.to_string()),
            },
            ResolvedTarget::Attribute(definition) => {
                if trimmed.is_empty() {
                    continue;
                }
                match typed_value(definition, raw_cell, trimmed) {
                    Ok(value) => {
                        attributes.insert(definition.name.clone(), value);
                    }
                    Err(error) => return Err(reject(error)),
                }
            }
            ResolvedTarget::NewAttribute(name) => {
                if !trimmed.is_empty() {
                    attributes.insert(name.clone(), AttributeValue::Text(raw_cell.to_string()));
                }
            }
        }
    }

    match (identity, first_name, last_name) {
        (Some(identity), Some(first_name), Some(last_name)) => Ok(CandidateRecord {
            identity,
            first_name,
            last_name,
            attributes,
        }),
        // Unreachable when the plan carries all three system fields, which
        // FieldPlan::resolve guarantees.
        _ => Err(reject("row is missing a mapped system field".to_string())),
    }
}

fn typed_value(
    definition: &AttributeDefinition,
    raw_cell: &str,
    trimmed: &str,
) -> Result<AttributeValue, String> {
    match definition.attribute_type {
        AttributeType::Text => Ok(AttributeValue::Text(raw_cell.to_string())),
        AttributeType::Number => parse_number(trimmed)
            .map(AttributeValue::Number)
            .ok_or_else(|| format!("{} must be a valid number", definition.name)),
        AttributeType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(AttributeValue::Date)
            .map_err(|_| format!("{} must be in YYYY-MM-DD format", definition.name)),
        AttributeType::Select => {
            if definition.options.iter().any(|option| option == trimmed) {
                Ok(AttributeValue::Text(trimmed.to_string()))
            } else {
                Err(format!(
                    "{} must be one of: {}",
                    definition.name,
                    definition.options.join(", ")
                ))
            }
        }
    }
}

/// Base-10 integer or decimal only. f64's own parser is too permissive for
/// user data (it accepts exponents, `inf` and `NaN`).
fn parse_number(cell: &str) -> Option<f64> {
    let unsigned = cell.strip_prefix(['-', '+']).unwrap_or(cell);
    let mut parts = unsigned.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) || !frac_part.map_or(true, all_digits) {
        return None;
    }
    if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
        return None;
    }

    cell.parse::<f64>().ok()
}
