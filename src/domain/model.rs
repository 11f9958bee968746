use crate::utils::error::{ImportError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Attribute catalog
// ---------------------------------------------------------------------------

/// The closed set of types an organization-defined attribute can have. Each
/// variant owns its parse rule in the row validator, so adding a type is a
/// compile-time exhaustiveness error everywhere it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeType {
    Text,
    Number,
    Date,
    Select,
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "TEXT"),
            Self::Number => write!(f, "NUMBER"),
            Self::Date => write!(f, "DATE"),
            Self::Select => write!(f, "SELECT"),
        }
    }
}

/// A typed value held by an attendee attribute. SELECT values are stored as
/// `Text` holding the matched option string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    pub id: String,
    /// Unique within the organization, case-sensitive.
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    /// Allowed values; required and non-empty only when type is SELECT.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl AttributeDefinition {
    /// A TEXT-typed definition, the shape the import engine auto-creates.
    pub fn text(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attribute_type: AttributeType::Text,
            options: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ImportError::validation("attribute name cannot be empty"));
        }
        match self.attribute_type {
            AttributeType::Select if self.options.is_empty() => Err(ImportError::validation(
                format!("SELECT attribute '{}' must define options", self.name),
            )),
            AttributeType::Select => Ok(()),
            _ if !self.options.is_empty() => Err(ImportError::validation(format!(
                "{} attribute '{}' must not define options",
                self.attribute_type, self.name
            ))),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Attendees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRecord {
    /// Store-assigned, opaque.
    pub id: String,
    /// Attendee-supplied external key, unique within the organization and
    /// immutable after creation.
    pub identity: String,
    pub first_name: String,
    pub last_name: String,
    /// Unset attributes are absent, never null-valued.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
}

// ---------------------------------------------------------------------------
// Mapping and import configuration
// ---------------------------------------------------------------------------

/// What a CSV header feeds: a system field, an existing attribute, a new
/// attribute named after the header, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingTarget {
    Identity,
    FirstName,
    LastName,
    Attribute(String),
    CreateAttribute,
    Ignore,
}

impl MappingTarget {
    /// Parses the config-file target strings: `identity`, `firstName`,
    /// `lastName`, `attribute:<Name>`, `create`, `ignore`.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "identity" => Ok(Self::Identity),
            "firstName" => Ok(Self::FirstName),
            "lastName" => Ok(Self::LastName),
            "create" => Ok(Self::CreateAttribute),
            "ignore" => Ok(Self::Ignore),
            other => match other.strip_prefix("attribute:") {
                Some(name) if !name.trim().is_empty() => {
                    Ok(Self::Attribute(name.trim().to_string()))
                }
                _ => Err(ImportError::configuration(format!(
                    "unknown mapping target '{}' (expected identity, firstName, lastName, \
                     attribute:<Name>, create, or ignore)",
                    raw
                ))),
            },
        }
    }
}

pub type ColumnMapping = HashMap<String, MappingTarget>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateMode {
    Skip,
    Update,
    Fail,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub duplicate_mode: DuplicateMode,
    pub create_missing_attributes: bool,
    pub mapping: ColumnMapping,
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One decoded CSV data row. Data rows are numbered from 1; the header row is
/// row 0 and excluded. Cells missing from short rows read as empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row_number: usize,
    pub values: HashMap<String, String>,
}

impl RawRow {
    pub fn cell(&self, header: &str) -> &str {
        self.values.get(header).map(String::as_str).unwrap_or("")
    }
}

/// A row that passed validation: the create payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub identity: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// The update payload: the existing record's id plus the incoming fields.
/// Attributes absent from this map are left untouched on apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeUpdate {
    pub id: String,
    pub identity: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// A row the analysis could not use, with the original cell values kept
/// around so the error report can round-trip as a fixable CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidRow {
    pub row_number: usize,
    pub row_data: HashMap<String, String>,
    pub error: String,
}

// ---------------------------------------------------------------------------
// Analysis and commit
// ---------------------------------------------------------------------------

/// The unit returned for user review.
///
/// Accounting guarantee: `attendees_to_create.len() + attendees_to_update.len()
/// + invalid_rows.len() + skipped_duplicates == rows_read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub attendees_to_create: Vec<CandidateRecord>,
    pub attendees_to_update: Vec<AttendeeUpdate>,
    pub invalid_rows: Vec<InvalidRow>,
    /// Deduplicated, in first-seen row order.
    pub new_attributes_to_create: Vec<String>,
    pub rows_read: usize,
    pub skipped_duplicates: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl AnalysisResult {
    pub fn classified_rows(&self) -> usize {
        self.attendees_to_create.len()
            + self.attendees_to_update.len()
            + self.invalid_rows.len()
            + self.skipped_duplicates
    }
}

/// The user-approved subset of an analysis, re-supplied by the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub attendees_to_create: Vec<CandidateRecord>,
    pub attendees_to_update: Vec<AttendeeUpdate>,
    pub new_attributes: Vec<String>,
}

impl CommitRequest {
    /// Approves the whole analysis: every create and update, plus the pending
    /// attribute definitions.
    pub fn approving(analysis: &AnalysisResult) -> Self {
        Self {
            attendees_to_create: analysis.attendees_to_create.clone(),
            attendees_to_update: analysis.attendees_to_update.clone(),
            new_attributes: analysis.new_attributes_to_create.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attendees_to_create.is_empty()
            && self.attendees_to_update.is_empty()
            && self.new_attributes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    pub created: usize,
    pub updated: usize,
    pub attributes_created: usize,
}

impl CommitOutcome {
    /// Records actually created or updated.
    pub fn committed(&self) -> usize {
        self.created + self.updated
    }
}
