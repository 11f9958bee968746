use crate::domain::model::{
    AttendeeRecord, AttendeeUpdate, CandidateRecord, DuplicateMode, InvalidRow, RawRow,
};
use std::collections::{HashMap, HashSet};

/// How one validated row came out of duplicate resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Create(CandidateRecord),
    Update(AttendeeUpdate),
    /// Roster collision under SKIP mode. The candidate is kept so the caller
    /// can still account for which new attributes the row used.
    SkippedDuplicate(CandidateRecord),
    Invalid(InvalidRow),
}

/// Classifies validated rows against the roster and against each other.
///
/// Rows must be fed in original file order: the first occurrence of an
/// identity wins, every later one is rejected. That check runs before the
/// roster lookup and ignores the duplicate mode, so one file can never both
/// create and update the same identity.
pub struct DuplicateResolver<'a> {
    mode: DuplicateMode,
    roster_by_identity: HashMap<&'a str, &'a AttendeeRecord>,
    seen_identities: HashSet<String>,
}

impl<'a> DuplicateResolver<'a> {
    pub fn new(roster: &'a [AttendeeRecord], mode: DuplicateMode) -> Self {
        Self {
            mode,
            roster_by_identity: roster
                .iter()
                .map(|record| (record.identity.as_str(), record))
                .collect(),
            seen_identities: HashSet::new(),
        }
    }

    pub fn classify(&mut self, row: &RawRow, candidate: CandidateRecord) -> Resolution {
        if !self.seen_identities.insert(candidate.identity.clone()) {
            return Resolution::Invalid(InvalidRow {
                row_number: row.row_number,
                row_data: row.values.clone(),
                error: "Duplicate identity within file".to_string(),
            });
        }

        let Some(existing) = self.roster_by_identity.get(candidate.identity.as_str()) else {
            return Resolution::Create(candidate);
        };

        match self.mode {
            DuplicateMode::Skip => Resolution::SkippedDuplicate(candidate),
            DuplicateMode::Update => Resolution::Update(AttendeeUpdate {
                id: existing.id.clone(),
                identity: candidate.identity,
                first_name: candidate.first_name,
                last_name: candidate.last_name,
                attributes: candidate.attributes,
            }),
            DuplicateMode::Fail => Resolution::Invalid(InvalidRow {
                row_number: row.row_number,
                row_data: row.values.clone(),
                error: "Identity already exists".to_string(),
            }),
        }
    }
}
