use crate::domain::model::{AnalysisResult, CommitOutcome};
use crate::utils::error::{ImportError, Result};

/// The client-visible import wizard, one instance per dialog session.
///
/// Every transition consumes the old state and returns a fresh value, so
/// going back or starting over is just dropping the stage data. Exactly one
/// analysis is in flight per session.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSession {
    Upload,
    Mapping { headers: Vec<String> },
    Review { headers: Vec<String>, analysis: AnalysisResult },
    Success { outcome: CommitOutcome },
}

impl ImportSession {
    pub fn new() -> Self {
        Self::Upload
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Mapping { .. } => "mapping",
            Self::Review { .. } => "review",
            Self::Success { .. } => "success",
        }
    }

    /// Upload -> Mapping, once headers have been extracted.
    pub fn headers_extracted(self, headers: Vec<String>) -> Result<Self> {
        match self {
            Self::Upload => Ok(Self::Mapping { headers }),
            other => Err(other.rejected("headers extracted")),
        }
    }

    /// Mapping -> Review, once analysis has produced a result to inspect.
    pub fn analysis_completed(self, analysis: AnalysisResult) -> Result<Self> {
        match self {
            Self::Mapping { headers } => Ok(Self::Review { headers, analysis }),
            other => Err(other.rejected("analysis completed")),
        }
    }

    /// Review -> Success, terminal for the session.
    pub fn commit_completed(self, outcome: CommitOutcome) -> Result<Self> {
        match self {
            Self::Review { .. } => Ok(Self::Success { outcome }),
            other => Err(other.rejected("commit completed")),
        }
    }

    /// Mapping -> Upload, discarding the extracted headers.
    pub fn back(self) -> Result<Self> {
        match self {
            Self::Mapping { .. } => Ok(Self::Upload),
            other => Err(other.rejected("back")),
        }
    }

    /// Review -> Upload, discarding the pending analysis. No cleanup is
    /// needed; an uncommitted analysis has no side effects.
    pub fn start_over(self) -> Result<Self> {
        match self {
            Self::Review { .. } => Ok(Self::Upload),
            other => Err(other.rejected("start over")),
        }
    }

    fn rejected(&self, event: &'static str) -> ImportError {
        ImportError::InvalidTransition {
            from: self.stage(),
            event,
        }
    }
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}
