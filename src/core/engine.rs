use crate::core::{analyzer, committer, reader, report};
use crate::domain::model::{AnalysisResult, CommitOutcome, CommitRequest, ImportConfig, InvalidRow};
use crate::domain::ports::ImportStore;
use crate::utils::error::{ImportError, Result};
use tracing::{debug, info};

/// Front door for one import: header extraction, analysis, error-report
/// export, and commit, over any store implementing the persistence ports.
pub struct ImportEngine<S: ImportStore> {
    store: S,
}

impl<S: ImportStore> ImportEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads just the header row, the input to column mapping.
    pub fn extract_headers(&self, csv_bytes: &[u8]) -> Result<Vec<String>> {
        let headers = reader::extract_headers(csv_bytes)?;
        debug!("extracted {} headers", headers.len());
        Ok(headers)
    }

    /// Classifies every data row against the current catalog and roster.
    /// Read-only; the result is held by the caller until committed or
    /// discarded, and discarding needs no cleanup.
    pub async fn analyze(&self, csv_bytes: &[u8], config: &ImportConfig) -> Result<AnalysisResult> {
        info!("analyzing import file ({} bytes)", csv_bytes.len());
        let (headers, rows) = reader::read_rows(csv_bytes)?;
        debug!("read {} data rows", rows.len());

        let catalog = self.store.attribute_definitions().await?;
        let roster = self.store.roster().await?;

        let analysis = analyzer::analyze_rows(&headers, &rows, config, &catalog, &roster)?;
        info!(
            "analysis complete: {} to create, {} to update, {} invalid, {} skipped of {} rows",
            analysis.attendees_to_create.len(),
            analysis.attendees_to_update.len(),
            analysis.invalid_rows.len(),
            analysis.skipped_duplicates,
            analysis.rows_read
        );
        Ok(analysis)
    }

    /// Persists an approved batch. The store applies it atomically and
    /// re-checks identities against its current state, so a stale analysis
    /// fails here as a conflict instead of half-applying.
    pub async fn commit(&self, batch: &CommitRequest) -> Result<CommitOutcome> {
        committer::validate_request(batch)?;
        if batch.is_empty() {
            return Err(ImportError::validation("nothing to commit"));
        }

        info!(
            "committing {} creations, {} updates, {} new attributes",
            batch.attendees_to_create.len(),
            batch.attendees_to_update.len(),
            batch.new_attributes.len()
        );
        let outcome = self.store.commit_import(batch).await?;
        info!(
            "commit persisted {} records ({} created, {} updated, {} attributes added)",
            outcome.committed(),
            outcome.created,
            outcome.updated,
            outcome.attributes_created
        );
        Ok(outcome)
    }

    /// The fix-and-reupload CSV for rejected rows.
    pub fn error_report(&self, headers: &[String], invalid_rows: &[InvalidRow]) -> Result<String> {
        report::render_error_report(headers, invalid_rows)
    }
}
