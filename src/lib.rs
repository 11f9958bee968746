pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::InMemoryStore;
#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::ImportPlanFile;
pub use core::{engine::ImportEngine, session::ImportSession};
pub use domain::model::{
    AnalysisResult, AttendeeRecord, AttributeDefinition, AttributeType, AttributeValue,
    ColumnMapping, CommitOutcome, CommitRequest, DuplicateMode, ImportConfig, InvalidRow,
    MappingTarget,
};
pub use domain::ports::{AttributeCatalog, ImportStore, RosterIndex};
pub use utils::error::{ImportError, Result};
