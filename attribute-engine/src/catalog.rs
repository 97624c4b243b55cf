//! Catalog service collaborator
//!
//! The engine does not know how values reach the catalog service. Callers
//! inject an implementation of [`CatalogCollaborator`]; transport and
//! authentication live there.

use async_trait::async_trait;
use serde_json::Value;
use shared::error::AppResult;
use shared::models::{AttributeValue, ImportErrorReport, ImportJob, ImportMapping};

/// Remote catalog operations the engine depends on
///
/// Payloads follow the wire shapes produced by the value codec: scalars as
/// native JSON, price / measurement / media as JSON-encoded text.
#[async_trait]
pub trait CatalogCollaborator: Send + Sync {
    /// All attribute values currently stored for a product
    async fn fetch_values(&self, product_id: i64) -> AppResult<Vec<AttributeValue>>;

    /// Create or update one scoped value
    async fn persist_value(
        &self,
        product_id: i64,
        attribute_id: i64,
        locale: Option<&str>,
        channel: Option<&str>,
        payload: Value,
    ) -> AppResult<()>;

    /// Upload an import file with its column mapping
    async fn create_import_job(
        &self,
        file_name: &str,
        bytes: &[u8],
        mapping: &ImportMapping,
    ) -> AppResult<ImportJob>;

    async fn import_job_status(&self, job_id: &str) -> AppResult<ImportJob>;

    async fn import_error_report(&self, job_id: &str) -> AppResult<ImportErrorReport>;
}
