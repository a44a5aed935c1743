// src/core/backend.rs
//! Contract of the generation backend as the client consumes it

use async_trait::async_trait;

use crate::error::TailorResult;
use crate::types::request::{BatchZipPayload, PlanPayload, TailorPayload};

#[async_trait]
pub trait TailorBackend: Send + Sync {
    /// `/plan` - arbitrary JSON plan object
    async fn plan(&self, payload: &PlanPayload<'_>) -> TailorResult<serde_json::Value>;

    /// `/tailor` - tailored résumé text
    async fn tailor(&self, payload: &TailorPayload<'_>) -> TailorResult<String>;

    /// `/extract_jd` - job description text behind a posting link
    async fn extract_jd(&self, url: &str) -> TailorResult<String>;

    /// `/resume_pdf` - rendered PDF bytes
    async fn resume_pdf(&self, resume_text: &str, filename: &str) -> TailorResult<Vec<u8>>;

    /// `/batch_zip` - archive bytes for a whole batch
    async fn batch_zip(&self, payload: &BatchZipPayload<'_>) -> TailorResult<Vec<u8>>;
}
