use crate::domain::model::{AttendeeRecord, CommitRequest};
use crate::utils::error::{ImportError, Result};
use std::collections::{HashMap, HashSet};

/// Rejects commit payloads that could not have come out of a clean analysis.
/// Shape checks only; no store state is consulted.
pub fn validate_request(batch: &CommitRequest) -> Result<()> {
    for record in &batch.attendees_to_create {
        require(&record.identity, "attendee creation is missing an identity")?;
        require(&record.first_name, "attendee creation is missing a first name")?;
        require(&record.last_name, "attendee creation is missing a last name")?;
    }
    for update in &batch.attendees_to_update {
        require(&update.id, "attendee update is missing the record id")?;
        require(&update.identity, "attendee update is missing an identity")?;
        require(&update.first_name, "attendee update is missing a first name")?;
        require(&update.last_name, "attendee update is missing a last name")?;
    }
    for name in &batch.new_attributes {
        require(name, "new attribute name is empty")?;
    }
    Ok(())
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ImportError::validation(message));
    }
    Ok(())
}

/// Re-checks identity uniqueness against the roster as it stands right now,
/// closing the gap between analysis time and commit time. Returns every
/// offending identity, in payload order, so one failure reports the whole
/// problem set at once.
pub fn find_conflicts(batch: &CommitRequest, roster: &[AttendeeRecord]) -> Vec<String> {
    let roster_identities: HashSet<&str> =
        roster.iter().map(|record| record.identity.as_str()).collect();
    let roster_by_id: HashMap<&str, &AttendeeRecord> =
        roster.iter().map(|record| (record.id.as_str(), record)).collect();

    let mut conflicts: Vec<String> = Vec::new();
    let mut claimed: HashSet<&str> = HashSet::new();

    for record in &batch.attendees_to_create {
        let identity = record.identity.as_str();
        if roster_identities.contains(identity) || !claimed.insert(identity) {
            note_conflict(&mut conflicts, identity);
        }
    }

    for update in &batch.attendees_to_update {
        let identity = update.identity.as_str();
        match roster_by_id.get(update.id.as_str()) {
            // The target vanished or its identity no longer matches what the
            // analysis saw; either way the update is stale.
            None => note_conflict(&mut conflicts, identity),
            Some(existing) if existing.identity != update.identity => {
                note_conflict(&mut conflicts, identity)
            }
            Some(_) => {
                if !claimed.insert(identity) {
                    note_conflict(&mut conflicts, identity);
                }
            }
        }
    }

    conflicts
}

fn note_conflict(conflicts: &mut Vec<String>, identity: &str) {
    if !conflicts.iter().any(|c| c == identity) {
        conflicts.push(identity.to_string());
    }
}
