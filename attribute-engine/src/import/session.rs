//! Import session
//!
//! Drives one bulk import: file preview, column mapping, schema check, job
//! submission, status polling and the final error report.

use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    ImportErrorReport, ImportFieldSchemaEntry, ImportJob, ImportJobStatus, ImportMapping,
    ImportPreview,
};
use shared::util::now_millis;
use std::path::Path;
use std::sync::Arc;
use tokio::time::Duration;

use super::preview::{SpreadsheetDecoder, read_preview};
use crate::catalog::CatalogCollaborator;
use crate::config::EngineConfig;
use crate::mapping::{self, MappingResolution, MappingResolver};
use crate::storage::TemplateStore;

/// Where the session stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStep {
    #[default]
    SelectFile,
    MapColumns,
    Review,
    Importing,
    Finished,
}

struct LoadedFile {
    name: String,
    bytes: Vec<u8>,
}

pub struct ImportSession {
    catalog: Arc<dyn CatalogCollaborator>,
    templates: TemplateStore,
    resolver: MappingResolver,
    schema: Vec<ImportFieldSchemaEntry>,
    decoder: Option<Arc<dyn SpreadsheetDecoder>>,
    preview_rows: usize,
    poll_interval: Duration,
    poll_max_attempts: u32,

    step: ImportStep,
    file: Option<LoadedFile>,
    preview: Option<ImportPreview>,
    mapping: ImportMapping,
    from_template: bool,
    job: Option<ImportJob>,
    submitted_at: Option<i64>,
}

impl ImportSession {
    pub fn new(
        catalog: Arc<dyn CatalogCollaborator>,
        templates: TemplateStore,
        schema: Vec<ImportFieldSchemaEntry>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            catalog,
            templates,
            resolver: config.mapping_resolver(),
            schema,
            decoder: None,
            preview_rows: config.import_preview_rows,
            poll_interval: config.import_poll_interval(),
            poll_max_attempts: config.import_poll_max_attempts,
            step: ImportStep::default(),
            file: None,
            preview: None,
            mapping: ImportMapping::new(),
            from_template: false,
            job: None,
            submitted_at: None,
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn SpreadsheetDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn step(&self) -> ImportStep {
        self.step
    }

    pub fn schema(&self) -> &[ImportFieldSchemaEntry] {
        &self.schema
    }

    pub fn preview(&self) -> Option<&ImportPreview> {
        self.preview.as_ref()
    }

    pub fn mapping(&self) -> &ImportMapping {
        &self.mapping
    }

    pub fn from_template(&self) -> bool {
        self.from_template
    }

    pub fn job(&self) -> Option<&ImportJob> {
        self.job.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        mapping::is_valid(&self.mapping, &self.schema)
    }

    pub fn missing_required(&self) -> Vec<String> {
        mapping::missing_required(&self.mapping, &self.schema)
    }

    /// Load an import file and resolve its mapping against the saved template
    pub fn load_file(&mut self, file_name: &str, bytes: Vec<u8>) -> MappingResolution {
        let preview = read_preview(
            file_name,
            &bytes,
            self.preview_rows,
            self.decoder.as_deref(),
        );
        let template = self.templates.load();
        let resolution = self
            .resolver
            .resolve(&preview.headers, &self.schema, template.as_ref());

        tracing::info!(
            file_name,
            columns = preview.headers.len(),
            mapped = resolution.mapping.len(),
            from_template = resolution.from_template,
            "Import file loaded"
        );

        self.mapping = resolution.mapping.clone();
        self.from_template = resolution.from_template;
        self.preview = Some(preview);
        self.file = Some(LoadedFile {
            name: file_name.to_string(),
            bytes,
        });
        self.job = None;
        self.submitted_at = None;
        self.step = ImportStep::MapColumns;
        resolution
    }

    /// Read an import file from disk and load it
    pub async fn open_file(&mut self, path: impl AsRef<Path>) -> AppResult<MappingResolution> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::storage(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.load_file(&file_name, bytes))
    }

    /// Map `header` to `field_id`, or to nothing ("do not import")
    ///
    /// A field can be the target of one header only; assigning it elsewhere
    /// releases the previous header.
    pub fn set_column(&mut self, header: &str, field_id: Option<&str>) -> AppResult<()> {
        if !matches!(self.step, ImportStep::MapColumns | ImportStep::Review) {
            return Err(AppError::invalid_request("No import file loaded"));
        }
        let known_header = self
            .preview
            .as_ref()
            .is_some_and(|p| p.headers.iter().any(|h| h == header));
        if !known_header {
            return Err(AppError::not_found(format!("Column '{header}'")));
        }

        let mut next: ImportMapping = self
            .mapping
            .iter()
            .filter(|(h, f)| *h != header && Some(*f) != field_id)
            .collect();
        if let Some(field_id) = field_id {
            if !self.schema.iter().any(|f| f.id == field_id) {
                return Err(AppError::not_found(format!("Import field '{field_id}'")));
            }
            next.insert(header, field_id);
        }
        self.mapping = next;
        self.step = ImportStep::MapColumns;
        Ok(())
    }

    /// Overwrite the saved template with the current mapping
    pub fn save_template(&self) -> AppResult<()> {
        self.templates.save(&self.mapping)
    }

    /// Check the mapping against the schema, store it as the template and move to review
    pub fn confirm_mapping(&mut self) -> AppResult<()> {
        if self.step != ImportStep::MapColumns {
            return Err(AppError::invalid_request("No mapping to confirm"));
        }
        mapping::check_required(&self.mapping, &self.schema)?;
        self.save_template()?;
        self.step = ImportStep::Review;
        Ok(())
    }

    /// Upload the file with the confirmed mapping
    pub async fn submit(&mut self) -> AppResult<ImportJob> {
        if self.step != ImportStep::Review {
            return Err(AppError::invalid_request("Mapping has not been confirmed"));
        }
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| AppError::invalid_request("No import file loaded"))?;
        if file.bytes.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyFile));
        }

        let job = self
            .catalog
            .create_import_job(&file.name, &file.bytes, &self.mapping)
            .await?;
        tracing::info!(job_id = %job.id, file_name = %file.name, columns = self.mapping.len(), "Import job submitted");

        self.submitted_at = Some(now_millis());
        self.job = Some(job.clone());
        self.step = ImportStep::Importing;
        Ok(job)
    }

    /// Poll the submitted job until it completes or fails
    pub async fn wait_for_completion(&mut self) -> AppResult<ImportJob> {
        let job_id = match &self.job {
            Some(job) => job.id.clone(),
            None => return Err(AppError::new(ErrorCode::ImportJobNotFound)),
        };

        for attempt in 1..=self.poll_max_attempts {
            tokio::time::sleep(self.poll_interval).await;
            let job = self.catalog.import_job_status(&job_id).await?;
            tracing::debug!(job_id = %job_id, attempt, status = ?job.status, processed = job.processed_rows, "Import job polled");
            self.job = Some(job.clone());

            if !job.status.is_terminal() {
                continue;
            }
            self.step = ImportStep::Finished;
            let elapsed_ms = self.submitted_at.map(|t| now_millis() - t).unwrap_or_default();
            if job.status == ImportJobStatus::Failed {
                tracing::error!(job_id = %job_id, elapsed_ms, "Import job failed");
                return Err(AppError::new(ErrorCode::ImportJobFailed).with_detail("job_id", job_id));
            }
            tracing::info!(job_id = %job_id, elapsed_ms, errors = job.error_count, "Import job completed");
            return Ok(job);
        }

        tracing::warn!(job_id = %job_id, attempts = self.poll_max_attempts, "Gave up waiting for import job");
        Err(AppError::new(ErrorCode::ImportPollTimeout).with_detail("job_id", job_id))
    }

    /// Per-row errors of the submitted job
    pub async fn error_report(&self) -> AppResult<ImportErrorReport> {
        let job = self
            .job
            .as_ref()
            .ok_or_else(|| AppError::new(ErrorCode::ImportJobNotFound))?;
        self.catalog.import_error_report(&job.id).await
    }

    /// Start over with a new file
    pub fn reset(&mut self) {
        self.step = ImportStep::SelectFile;
        self.file = None;
        self.preview = None;
        self.mapping = ImportMapping::new();
        self.from_template = false;
        self.job = None;
        self.submitted_at = None;
    }
}
