use crate::domain::model::{
    AttendeeRecord, AttributeDefinition, CommitOutcome, CommitRequest,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read access to the organization's attribute definitions.
#[async_trait]
pub trait AttributeCatalog: Send + Sync {
    async fn attribute_definitions(&self) -> Result<Vec<AttributeDefinition>>;
}

/// Read access to the organization's existing attendees.
#[async_trait]
pub trait RosterIndex: Send + Sync {
    async fn roster(&self) -> Result<Vec<AttendeeRecord>>;
}

/// The persistence boundary for an approved import.
///
/// `commit_import` is all-or-nothing: the store must apply every creation,
/// update, and attribute definition in the batch, or apply none of them and
/// return the error. Identity conflicts detected at commit time surface as
/// `ImportError::Conflict` listing every offending identity.
#[async_trait]
pub trait ImportStore: AttributeCatalog + RosterIndex {
    async fn commit_import(&self, batch: &CommitRequest) -> Result<CommitOutcome>;
}
