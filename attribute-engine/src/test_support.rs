//! In-memory catalog collaborator for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use shared::error::{AppError, AppResult};
use shared::models::{
    AttributeValue, ImportErrorReport, ImportJob, ImportJobStatus, ImportMapping, ImportRowError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::time::Duration;

use crate::catalog::CatalogCollaborator;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PersistCall {
    pub attribute_id: i64,
    pub locale: Option<String>,
    pub channel: Option<String>,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub(crate) struct SubmittedJob {
    pub file_name: String,
    pub size: usize,
    pub mapping: ImportMapping,
}

#[derive(Default)]
pub(crate) struct MockCatalog {
    delay: Duration,
    stored: Mutex<Vec<AttributeValue>>,
    calls: Mutex<Vec<PersistCall>>,
    fail_persist: AtomicBool,
    fail_fetch: AtomicBool,
    active: AtomicUsize,
    max_active: AtomicUsize,
    jobs: Mutex<Vec<SubmittedJob>>,
    statuses: Mutex<VecDeque<ImportJobStatus>>,
    status_polls: AtomicUsize,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every persistence call takes `delay`
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn with_values(self, values: Vec<AttributeValue>) -> Self {
        *self.stored.lock() = values;
        self
    }

    /// Statuses returned by successive polls; the last one repeats
    pub fn with_statuses(self, statuses: Vec<ImportJobStatus>) -> Self {
        *self.statuses.lock() = statuses.into();
        self
    }

    pub fn fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PersistCall> {
        self.calls.lock().clone()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.calls.lock().iter().map(|c| c.payload.clone()).collect()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn jobs(&self) -> Vec<SubmittedJob> {
        self.jobs.lock().clone()
    }

    pub fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogCollaborator for MockCatalog {
    async fn fetch_values(&self, _product_id: i64) -> AppResult<Vec<AttributeValue>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::network("catalog unreachable"));
        }
        Ok(self.stored.lock().clone())
    }

    async fn persist_value(
        &self,
        _product_id: i64,
        attribute_id: i64,
        locale: Option<&str>,
        channel: Option<&str>,
        payload: Value,
    ) -> AppResult<()> {
        let fail = self.fail_persist.load(Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let call = PersistCall {
            attribute_id,
            locale: locale.map(str::to_string),
            channel: channel.map(str::to_string),
            payload: payload.clone(),
        };
        self.calls.lock().push(call);

        if fail {
            return Err(AppError::persistence("catalog rejected the value"));
        }

        let mut stored = self.stored.lock();
        stored.retain(|v| {
            !(v.attribute_id == attribute_id
                && v.locale.as_deref() == locale
                && v.channel.as_deref() == channel)
        });
        stored.push(
            AttributeValue::new(attribute_id, payload)
                .with_scope(locale.map(str::to_string), channel.map(str::to_string)),
        );
        Ok(())
    }

    async fn create_import_job(
        &self,
        file_name: &str,
        bytes: &[u8],
        mapping: &ImportMapping,
    ) -> AppResult<ImportJob> {
        self.jobs.lock().push(SubmittedJob {
            file_name: file_name.to_string(),
            size: bytes.len(),
            mapping: mapping.clone(),
        });
        Ok(ImportJob {
            id: format!("job-{}", self.jobs.lock().len()),
            status: ImportJobStatus::Pending,
            processed_rows: 0,
            total_rows: 0,
            error_count: 0,
        })
    }

    async fn import_job_status(&self, job_id: &str) -> AppResult<ImportJob> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        let status = {
            let mut statuses = self.statuses.lock();
            if statuses.len() > 1 {
                statuses.pop_front()
            } else {
                statuses.front().copied()
            }
        }
        .ok_or_else(|| AppError::not_found(format!("Import job {job_id}")))?;

        let failed = u64::from(status == ImportJobStatus::Failed);
        Ok(ImportJob {
            id: job_id.to_string(),
            status,
            processed_rows: if status.is_terminal() { 2 } else { 0 },
            total_rows: 2,
            error_count: failed,
        })
    }

    async fn import_error_report(&self, job_id: &str) -> AppResult<ImportErrorReport> {
        Ok(ImportErrorReport {
            job_id: job_id.to_string(),
            errors: vec![ImportRowError {
                row: 2,
                column: Some("GTIN".to_string()),
                message: "Invalid GTIN checksum".to_string(),
            }],
        })
    }
}
