// src/session.rs
//! Session controller: the one owner of client state

use std::sync::Arc;

use crate::batch::{BatchOrchestrator, BatchOutcome, BatchRequest};
use crate::core::{ConfigManager, ServiceClient, TailorBackend};
use crate::error::TailorResult;
use crate::pipeline::{JdSource, SinglePipeline};
use crate::state::{ClientStateStore, StateSnapshot};
use crate::types::TailoringRequest;

/// Entry point for every user-initiated action. Presentation code reads
/// state through `state()` and never mutates the store directly.
pub struct Session {
    store: Arc<ClientStateStore>,
    single: SinglePipeline,
    batch: BatchOrchestrator,
}

impl Session {
    pub fn new(backend: Arc<dyn TailorBackend>) -> Self {
        let store = Arc::new(ClientStateStore::new());
        Self {
            single: SinglePipeline::new(backend.clone(), store.clone()),
            batch: BatchOrchestrator::new(backend, store.clone()),
            store,
        }
    }

    /// Session backed by the HTTP client described by `config`
    pub fn connect(config: &ConfigManager) -> TailorResult<Self> {
        let client = ServiceClient::new(
            &config.service.api_base,
            config.service.timeout(),
            config.service.batch_timeout(),
        )?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn state(&self) -> StateSnapshot {
        self.store.snapshot()
    }

    pub async fn extract_jd_into(&self, url: &str, jd_text: &mut String) -> TailorResult<()> {
        self.single.extract_jd_into(url, jd_text).await
    }

    pub async fn generate_plan(&self, request: &TailoringRequest) -> TailorResult<serde_json::Value> {
        self.single.plan(request).await
    }

    pub async fn generate_tailored(&self, request: &TailoringRequest) -> TailorResult<String> {
        self.single.tailor(request).await
    }

    /// Tailor against the last plan generated in this session, if any
    pub async fn generate_tailored_with_plan(
        &self,
        request: &TailoringRequest,
    ) -> TailorResult<String> {
        let request = request.clone().with_plan(self.store.snapshot().last_plan);
        self.single.tailor(&request).await
    }

    pub async fn run_single(
        &self,
        request: TailoringRequest,
        source: JdSource,
    ) -> TailorResult<String> {
        self.single.run(request, source).await
    }

    pub async fn export_pdf(&self, tailored_text: &str) -> TailorResult<Vec<u8>> {
        self.single.export_pdf(tailored_text).await
    }

    pub async fn run_batch(&self, request: &BatchRequest) -> TailorResult<BatchOutcome> {
        self.batch.run(request).await
    }
}
