use async_trait::async_trait;
use attribute_engine::{AppError, AppResult, CatalogCollaborator};
use parking_lot::Mutex;
use serde_json::Value;
use shared::models::{
    AttributeValue, ImportErrorReport, ImportJob, ImportJobStatus, ImportMapping,
};

/// Catalog double recording persistence payloads
#[derive(Default)]
pub struct RecordingCatalog {
    pub payloads: Mutex<Vec<(i64, Value)>>,
    pub jobs: Mutex<Vec<ImportMapping>>,
}

#[async_trait]
impl CatalogCollaborator for RecordingCatalog {
    async fn fetch_values(&self, _product_id: i64) -> AppResult<Vec<AttributeValue>> {
        Ok(Vec::new())
    }

    async fn persist_value(
        &self,
        _product_id: i64,
        attribute_id: i64,
        _locale: Option<&str>,
        _channel: Option<&str>,
        payload: Value,
    ) -> AppResult<()> {
        self.payloads.lock().push((attribute_id, payload));
        Ok(())
    }

    async fn create_import_job(
        &self,
        _file_name: &str,
        _bytes: &[u8],
        mapping: &ImportMapping,
    ) -> AppResult<ImportJob> {
        self.jobs.lock().push(mapping.clone());
        Ok(ImportJob {
            id: "job-1".to_string(),
            status: ImportJobStatus::Pending,
            processed_rows: 0,
            total_rows: 0,
            error_count: 0,
        })
    }

    async fn import_job_status(&self, job_id: &str) -> AppResult<ImportJob> {
        Err(AppError::not_found(format!("Import job {job_id}")))
    }

    async fn import_error_report(&self, job_id: &str) -> AppResult<ImportErrorReport> {
        Err(AppError::not_found(format!("Import job {job_id}")))
    }
}
