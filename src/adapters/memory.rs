use crate::core::committer;
use crate::domain::model::{
    AttendeeRecord, AttributeDefinition, CommitOutcome, CommitRequest,
};
use crate::domain::ports::{AttributeCatalog, ImportStore, RosterIndex};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreState {
    #[serde(default)]
    attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    attendees: Vec<AttendeeRecord>,
}

/// An attendee store held entirely in memory, with optional JSON snapshots
/// on disk. One mutex guards the whole state, so a commit is naturally a
/// transaction: conflicts are detected and the batch applied under a single
/// lock acquisition, and nothing is mutated before every check has passed.
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_state(StoreState::default())
    }

    /// A store pre-populated for tests and demos.
    pub fn seeded(
        attributes: Vec<AttributeDefinition>,
        attendees: Vec<AttendeeRecord>,
    ) -> Result<Self> {
        for definition in &attributes {
            definition.validate()?;
        }
        Ok(Self::with_state(StoreState {
            attributes,
            attendees,
        }))
    }

    fn with_state(state: StoreState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Loads a snapshot written by [`save_snapshot`](Self::save_snapshot).
    /// Fails when the file is missing; the caller decides whether a missing
    /// snapshot means "start empty".
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let state: StoreState = serde_json::from_str(&json)?;
        for definition in &state.attributes {
            definition.validate()?;
        }
        Ok(Self::with_state(state))
    }

    pub async fn save_snapshot(&self, path: &Path) -> Result<()> {
        let state = self.state.lock().await;
        let json = serde_json::to_string_pretty(&*state)?;
        fs::write(path, json).map_err(|e| {
            ImportError::persistence(format!(
                "cannot write store snapshot to {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub async fn attendee_count(&self) -> usize {
        self.state.lock().await.attendees.len()
    }

    pub async fn find_by_identity(&self, identity: &str) -> Option<AttendeeRecord> {
        let state = self.state.lock().await;
        state
            .attendees
            .iter()
            .find(|record| record.identity == identity)
            .cloned()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttributeCatalog for InMemoryStore {
    async fn attribute_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        Ok(self.state.lock().await.attributes.clone())
    }
}

#[async_trait]
impl RosterIndex for InMemoryStore {
    async fn roster(&self) -> Result<Vec<AttendeeRecord>> {
        Ok(self.state.lock().await.attendees.clone())
    }
}

#[async_trait]
impl ImportStore for InMemoryStore {
    async fn commit_import(&self, batch: &CommitRequest) -> Result<CommitOutcome> {
        let mut state = self.state.lock().await;

        committer::validate_request(batch)?;
        let conflicts = committer::find_conflicts(batch, &state.attendees);
        if !conflicts.is_empty() {
            return Err(ImportError::Conflict {
                identities: conflicts,
            });
        }

        // All checks passed; from here on every mutation must succeed.
        // Attribute definitions come first so new records never reference a
        // name the catalog lacks. Creation is idempotent by name: a
        // definition added since analysis is reused, not duplicated.
        let mut attributes_created = 0;
        for name in &batch.new_attributes {
            if state.attributes.iter().any(|def| &def.name == name) {
                continue;
            }
            state
                .attributes
                .push(AttributeDefinition::text(Uuid::new_v4().to_string(), name));
            attributes_created += 1;
        }

        for record in &batch.attendees_to_create {
            state.attendees.push(AttendeeRecord {
                id: Uuid::new_v4().to_string(),
                identity: record.identity.clone(),
                first_name: record.first_name.clone(),
                last_name: record.last_name.clone(),
                attributes: record.attributes.clone(),
            });
        }

        for update in &batch.attendees_to_update {
            // Present by construction: find_conflicts verified every target.
            if let Some(existing) = state
                .attendees
                .iter_mut()
                .find(|record| record.id == update.id)
            {
                existing.first_name = update.first_name.clone();
                existing.last_name = update.last_name.clone();
                for (name, value) in &update.attributes {
                    existing.attributes.insert(name.clone(), value.clone());
                }
            }
        }

        Ok(CommitOutcome {
            created: batch.attendees_to_create.len(),
            updated: batch.attendees_to_update.len(),
            attributes_created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AttributeValue, CandidateRecord};
    use std::collections::BTreeMap;

    fn candidate(identity: &str, first: &str) -> CandidateRecord {
        CandidateRecord {
            identity: identity.to_string(),
            first_name: first.to_string(),
            last_name: "Tester".to_string(),
            attributes: BTreeMap::new(),
        }
    }

    fn existing(id: &str, identity: &str) -> AttendeeRecord {
        AttendeeRecord {
            id: id.to_string(),
            identity: identity.to_string(),
            first_name: "Old".to_string(),
            last_name: "Name".to_string(),
            attributes: BTreeMap::from([(
                "Notes".to_string(),
                AttributeValue::Text("keep".to_string()),
            )]),
        }
    }

    #[tokio::test]
    async fn test_commit_creates_records_with_fresh_ids() {
        let store = InMemoryStore::new();
        let batch = CommitRequest {
            attendees_to_create: vec![candidate("1", "Ada"), candidate("2", "Grace")],
            ..Default::default()
        };

        let outcome = store.commit_import(&batch).await.unwrap();
        assert_eq!(outcome.created, 2);
        assert_eq!(outcome.committed(), 2);

        let ada = store.find_by_identity("1").await.unwrap();
        let grace = store.find_by_identity("2").await.unwrap();
        assert!(!ada.id.is_empty());
        assert_ne!(ada.id, grace.id);
    }

    #[tokio::test]
    async fn test_commit_conflict_applies_nothing() {
        let store =
            InMemoryStore::seeded(vec![], vec![existing("rec-1", "X")]).unwrap();
        let batch = CommitRequest {
            attendees_to_create: vec![candidate("fresh", "Ada"), candidate("X", "Clash")],
            new_attributes: vec!["T-Shirt".to_string()],
            ..Default::default()
        };

        let err = store.commit_import(&batch).await.unwrap_err();
        match err {
            ImportError::Conflict { identities } => {
                assert_eq!(identities, vec!["X".to_string()])
            }
            other => panic!("expected conflict, got {:?}", other),
        }

        // The valid creation and the attribute must not have leaked through.
        assert_eq!(store.attendee_count().await, 1);
        assert!(store.find_by_identity("fresh").await.is_none());
        assert!(store.attribute_definitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_attributes_per_key() {
        let store =
            InMemoryStore::seeded(vec![], vec![existing("rec-1", "X")]).unwrap();
        let batch = CommitRequest {
            attendees_to_update: vec![crate::domain::model::AttendeeUpdate {
                id: "rec-1".to_string(),
                identity: "X".to_string(),
                first_name: "New".to_string(),
                last_name: "Name".to_string(),
                attributes: BTreeMap::from([(
                    "Age".to_string(),
                    AttributeValue::Number(30.0),
                )]),
            }],
            ..Default::default()
        };

        let outcome = store.commit_import(&batch).await.unwrap();
        assert_eq!(outcome.updated, 1);

        let record = store.find_by_identity("X").await.unwrap();
        assert_eq!(record.first_name, "New");
        assert_eq!(record.attributes.get("Age"), Some(&AttributeValue::Number(30.0)));
        // An attribute outside the mapped set stays untouched.
        assert_eq!(
            record.attributes.get("Notes"),
            Some(&AttributeValue::Text("keep".to_string()))
        );
    }

    #[tokio::test]
    async fn test_attribute_creation_is_idempotent_by_name() {
        let store = InMemoryStore::seeded(
            vec![AttributeDefinition::text("attr-1", "T-Shirt")],
            vec![],
        )
        .unwrap();
        let batch = CommitRequest {
            attendees_to_create: vec![candidate("1", "Ada")],
            new_attributes: vec!["T-Shirt".to_string(), "Badge".to_string()],
            ..Default::default()
        };

        let outcome = store.commit_import(&batch).await.unwrap();
        assert_eq!(outcome.attributes_created, 1);

        let definitions = store.attribute_definitions().await.unwrap();
        assert_eq!(definitions.len(), 2);
        assert_eq!(
            definitions.iter().filter(|def| def.name == "T-Shirt").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected_as_validation_error() {
        let store = InMemoryStore::new();
        let batch = CommitRequest {
            attendees_to_create: vec![candidate("", "Ada")],
            ..Default::default()
        };

        let err = store.commit_import(&batch).await.unwrap_err();
        assert!(matches!(err, ImportError::Validation { .. }));
        assert_eq!(store.attendee_count().await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store =
            InMemoryStore::seeded(vec![AttributeDefinition::text("attr-1", "Notes")], vec![
                existing("rec-1", "X"),
            ])
            .unwrap();
        store.save_snapshot(&path).await.unwrap();

        let reloaded = InMemoryStore::load_snapshot(&path).unwrap();
        assert_eq!(reloaded.attendee_count().await, 1);
        let record = reloaded.find_by_identity("X").await.unwrap();
        assert_eq!(record.id, "rec-1");
        assert_eq!(
            reloaded.attribute_definitions().await.unwrap()[0].name,
            "Notes"
        );
    }

    #[test]
    fn test_load_snapshot_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = InMemoryStore::load_snapshot(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ImportError::Io(_)));
    }
}
