pub mod analyzer;
pub mod committer;
pub mod engine;
pub mod mapper;
pub mod reader;
pub mod report;
pub mod resolver;
pub mod session;
pub mod validator;

pub use crate::domain::model::{
    AnalysisResult, CommitOutcome, CommitRequest, ImportConfig,
};
pub use crate::domain::ports::{AttributeCatalog, ImportStore, RosterIndex};
pub use crate::utils::error::Result;
pub use engine::ImportEngine;
pub use session::ImportSession;
