// src/batch.rs
//! Batch orchestrator: one base résumé, up to ten job links, one archive

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::archive::{self, ARCHIVE_FILE_NAME};
use crate::config::{derive_inputs, validate_custom_prompt, PromptConfiguration, Tolerance};
use crate::core::TailorBackend;
use crate::error::{Operation, TailorError, TailorResult, ValidationError};
use crate::state::ClientStateStore;
use crate::types::request::{BatchFormat, BatchZipPayload};
use crate::types::Provider;
use crate::utils::{is_long_enough, trimmed_len, MIN_TEXT_CHARS};

pub const MAX_BATCH_LINKS: usize = 10;

/// One link of a batch. `index` is 1-based and matches the archive entry prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub link: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SucceededJob {
    pub link: String,
    pub artifact_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedJob {
    pub link: String,
    pub error_message: String,
}

/// Every submitted job lands in exactly one list, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: Vec<SucceededJob>,
    pub failed: Vec<FailedJob>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Split newline-delimited input into jobs. Order and duplicates are kept.
pub fn parse_links(raw: &str) -> Vec<BatchJob> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, link)| BatchJob {
            link: link.to_string(),
            index: i + 1,
        })
        .collect()
}

/// Hard stops, checked in order: empty list, too many links, short résumé
pub fn validate_batch(jobs: &[BatchJob], base_resume: &str) -> Result<(), ValidationError> {
    if jobs.is_empty() {
        return Err(ValidationError::NoLinks);
    }
    if jobs.len() > MAX_BATCH_LINKS {
        return Err(ValidationError::TooManyLinks {
            count: jobs.len(),
            max: MAX_BATCH_LINKS,
        });
    }
    if !is_long_enough(base_resume) {
        return Err(ValidationError::ResumeTooShort {
            len: trimmed_len(base_resume),
            min: MIN_TEXT_CHARS,
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub links_text: String,
    pub base_resume: String,
    pub tolerance: Tolerance,
    pub provider: Provider,
    pub prompt: PromptConfiguration,
}

impl BatchRequest {
    pub fn new(links_text: impl Into<String>, base_resume: impl Into<String>) -> Self {
        Self {
            links_text: links_text.into(),
            base_resume: base_resume.into(),
            tolerance: Tolerance::default(),
            provider: Provider::default(),
            prompt: PromptConfiguration::default_prompt(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_prompt(mut self, prompt: PromptConfiguration) -> Self {
        self.prompt = prompt;
        self
    }
}

/// Delivered archive plus the jobs it answers
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub jobs: Vec<BatchJob>,
    pub archive: Vec<u8>,
    pub completed_at: DateTime<Utc>,
}

impl BatchOutcome {
    pub fn file_name(&self) -> &'static str {
        ARCHIVE_FILE_NAME
    }

    /// Per-link outcome as reported inside the archive
    pub fn result(&self) -> TailorResult<BatchResult> {
        archive::read_batch_result(&self.archive, &self.jobs)
    }
}

pub struct BatchOrchestrator {
    backend: Arc<dyn TailorBackend>,
    store: Arc<ClientStateStore>,
}

impl BatchOrchestrator {
    pub fn new(backend: Arc<dyn TailorBackend>, store: Arc<ClientStateStore>) -> Self {
        Self { backend, store }
    }

    /// Validate, then send the whole batch as one aggregate request.
    ///
    /// Per-link failures come back inside the archive; only a failure of the
    /// aggregate call itself is an error here.
    pub async fn run(&self, request: &BatchRequest) -> TailorResult<BatchOutcome> {
        let jobs = parse_links(&request.links_text);

        let prepared = validate_batch(&jobs, &request.base_resume).and_then(|_| {
            let inputs = derive_inputs(request.tolerance, &request.prompt);
            if let Some(text) = inputs.prompt_text.as_deref() {
                validate_custom_prompt(text)?;
            }
            Ok(inputs)
        });
        let inputs = match prepared {
            Ok(inputs) => inputs,
            Err(e) => {
                self.store.record_error(e.to_string());
                return Err(e.into());
            }
        };

        let guard = self.store.begin(Operation::Batch)?;

        let run_id = Uuid::new_v4();
        let span = info_span!("batch", %run_id, links = jobs.len());

        let payload = BatchZipPayload {
            base_resume_text: &request.base_resume,
            job_urls: jobs.iter().map(|job| job.link.as_str()).collect(),
            tolerance: inputs.tolerance,
            provider: request.provider,
            format: BatchFormat::PdfAndText,
            prompt_mode: inputs.prompt_mode,
            custom_prompt: inputs.prompt_text.as_deref(),
        };

        info!(parent: &span, "Submitting batch of {} links", jobs.len());
        match self.backend.batch_zip(&payload).instrument(span.clone()).await {
            Ok(archive) => {
                info!(parent: &span, "Batch archive received ({} bytes)", archive.len());
                guard.succeed();
                Ok(BatchOutcome {
                    run_id,
                    jobs,
                    archive,
                    completed_at: Utc::now(),
                })
            }
            Err(e) => {
                error!(parent: &span, "Batch failed: {}", e);
                guard.fail(e.to_string());
                Err(e)
            }
        }
    }
}
