// src/pipeline.rs
//! Single-item pipeline: optional JD extraction, tailoring, optional PDF export

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::validate_custom_prompt;
use crate::core::TailorBackend;
use crate::error::{Operation, TailorError, TailorResult, ValidationError};
use crate::state::{ClientStateStore, InFlightGuard};
use crate::types::request::{PlanPayload, TailorPayload};
use crate::types::TailoringRequest;
use crate::utils::{is_long_enough, sanitize_filename, trimmed_len, MIN_TEXT_CHARS};

pub const TAILORED_TEXT_FILE_NAME: &str = "tailored_resume.txt";
pub const TAILORED_PDF_FILE_NAME: &str = "tailored_resume.pdf";

const EMPTY_EXTRACTION: &str = "no job description text found at link";

/// Where the job description comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JdSource {
    Text(String),
    Link(String),
}

fn check_resume(resume_text: &str) -> Result<(), ValidationError> {
    if !is_long_enough(resume_text) {
        return Err(ValidationError::ResumeTooShort {
            len: trimmed_len(resume_text),
            min: MIN_TEXT_CHARS,
        });
    }
    Ok(())
}

fn check_jd(jd_text: &str) -> Result<(), ValidationError> {
    if !is_long_enough(jd_text) {
        return Err(ValidationError::JobDescriptionTooShort {
            len: trimmed_len(jd_text),
            min: MIN_TEXT_CHARS,
        });
    }
    Ok(())
}

fn check_link(url: &str) -> Result<&str, ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyLink);
    }
    Ok(url)
}

/// Preconditions of a tailoring call, checked before any network traffic
pub fn check_request(request: &TailoringRequest) -> Result<(), ValidationError> {
    check_resume(&request.resume_text)?;
    check_jd(&request.jd_text)?;
    if let Some(text) = request.effective_inputs().prompt_text.as_deref() {
        validate_custom_prompt(text)?;
    }
    Ok(())
}

pub struct SinglePipeline {
    backend: Arc<dyn TailorBackend>,
    store: Arc<ClientStateStore>,
}

impl SinglePipeline {
    pub fn new(backend: Arc<dyn TailorBackend>, store: Arc<ClientStateStore>) -> Self {
        Self { backend, store }
    }

    fn reject<T>(&self, err: ValidationError) -> TailorResult<T> {
        warn!("Rejected before request: {}", err);
        self.store.record_error(err.to_string());
        Err(err.into())
    }

    /// `url` must already have passed `check_link`
    async fn fetch_jd(&self, url: &str) -> TailorResult<String> {
        let jd_text = self
            .backend
            .extract_jd(url)
            .await
            .map_err(TailorError::into_extraction)?;

        if jd_text.trim().is_empty() {
            return Err(TailorError::Extraction(EMPTY_EXTRACTION.to_string()));
        }
        info!("Extracted {} characters of job description", jd_text.len());
        Ok(jd_text)
    }

    /// Fetch the job description behind a link
    pub async fn extract_jd(&self, url: &str) -> TailorResult<String> {
        let url = match check_link(url) {
            Ok(url) => url,
            Err(e) => return self.reject(e),
        };

        let guard = self.store.begin_preserving_output(Operation::Single)?;
        match self.fetch_jd(url).await {
            Ok(jd_text) => {
                guard.succeed();
                Ok(jd_text)
            }
            Err(e) => {
                error!("JD extraction failed for {}: {}", url, e);
                guard.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Like `extract_jd`, but writes into `target` only on success
    pub async fn extract_jd_into(&self, url: &str, target: &mut String) -> TailorResult<()> {
        let jd_text = self.extract_jd(url).await?;
        *target = jd_text;
        Ok(())
    }

    /// Ask the backend for a tailoring plan; the plan is kept in the store
    pub async fn plan(&self, request: &TailoringRequest) -> TailorResult<serde_json::Value> {
        if let Err(e) = check_resume(&request.resume_text).and_then(|_| check_jd(&request.jd_text))
        {
            return self.reject(e);
        }

        let guard = self.store.begin_preserving_output(Operation::Single)?;
        let payload = PlanPayload {
            resume_text: &request.resume_text,
            jd_text: &request.jd_text,
            tolerance: request.tolerance,
        };

        match self.backend.plan(&payload).await {
            Ok(plan) => {
                guard.succeed_with_plan(plan.clone());
                Ok(plan)
            }
            Err(e) => {
                error!("Plan request failed: {}", e);
                guard.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Request a tailored résumé. The previous output is cleared before the call.
    pub async fn tailor(&self, request: &TailoringRequest) -> TailorResult<String> {
        if let Err(e) = check_request(request) {
            return self.reject(e);
        }

        let guard = self.store.begin(Operation::Single)?;
        self.tailor_with(guard, request).await
    }

    async fn tailor_with(
        &self,
        guard: InFlightGuard<'_>,
        request: &TailoringRequest,
    ) -> TailorResult<String> {
        let inputs = request.effective_inputs();
        let payload = TailorPayload {
            resume_text: &request.resume_text,
            jd_text: &request.jd_text,
            tolerance: inputs.tolerance,
            provider: request.provider,
            plan: request.plan.as_ref(),
            prompt_mode: inputs.prompt_mode,
            custom_prompt: inputs.prompt_text.as_deref(),
        };

        match self.backend.tailor(&payload).await {
            Ok(tailored) => {
                info!("Tailored resume received ({} characters)", tailored.len());
                guard.succeed_with_output(tailored.clone());
                Ok(tailored)
            }
            Err(e) => {
                error!("Tailoring failed: {}", e);
                guard.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Extraction (for a link) then tailoring, under one hold of the gate
    pub async fn run(&self, request: TailoringRequest, source: JdSource) -> TailorResult<String> {
        let url = match source {
            JdSource::Text(jd_text) => return self.tailor(&TailoringRequest { jd_text, ..request }).await,
            JdSource::Link(url) => url,
        };

        if let Err(e) = check_resume(&request.resume_text) {
            return self.reject(e);
        }
        let url = match check_link(&url) {
            Ok(url) => url,
            Err(e) => return self.reject(e),
        };

        let guard = self.store.begin(Operation::Single)?;
        let jd_text = match self.fetch_jd(url).await {
            Ok(jd_text) => jd_text,
            Err(e) => {
                error!("JD extraction failed for {}: {}", url, e);
                guard.fail(e.to_string());
                return Err(e);
            }
        };

        let request = TailoringRequest { jd_text, ..request };
        if let Err(e) = check_request(&request) {
            guard.fail(e.to_string());
            return Err(e.into());
        }

        self.tailor_with(guard, &request).await
    }

    /// Render tailored text as PDF. Never touches the stored output.
    pub async fn export_pdf(&self, tailored_text: &str) -> TailorResult<Vec<u8>> {
        if tailored_text.trim().is_empty() {
            let err = TailorError::Export("nothing to export".to_string());
            self.store.record_error(err.to_string());
            return Err(err);
        }

        let guard = self.store.begin_preserving_output(Operation::Single)?;
        let filename = sanitize_filename(TAILORED_PDF_FILE_NAME);

        match self
            .backend
            .resume_pdf(tailored_text, &filename)
            .await
            .map_err(TailorError::into_export)
        {
            Ok(pdf) => {
                info!("PDF exported ({} bytes)", pdf.len());
                guard.succeed();
                Ok(pdf)
            }
            Err(e) => {
                error!("PDF export failed: {}", e);
                guard.fail(e.to_string());
                Err(e)
            }
        }
    }
}
