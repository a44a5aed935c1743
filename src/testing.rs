// src/testing.rs
//! Test doubles for the generation backend

use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{watch, Notify};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::archive::{entry_base_name, BASE_RESUME_ENTRY, ERRORS_ENTRY, ERRORS_OK};
use crate::batch::BatchJob;
use crate::config::PromptMode;
use crate::core::TailorBackend;
use crate::error::{TailorError, TailorResult};
use crate::types::request::{BatchFormat, BatchZipPayload, PlanPayload, TailorPayload};
use crate::types::Provider;

/// Text of exactly `n` non-blank characters
pub fn long_text(n: usize) -> String {
    "lorem ipsum dolor sit amet "
        .chars()
        .cycle()
        .take(n)
        .collect::<String>()
        .replace(' ', "-")
}

/// Build an archive the way the backend lays it out
pub fn build_archive(jobs: &[BatchJob], failed: &[usize], with_txt: bool) -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut errors = Vec::new();
    for job in jobs {
        if failed.contains(&job.index) {
            errors.push(format!(
                "{:02} {} -> fetch failed status=404",
                job.index, job.link
            ));
            continue;
        }
        let stem = entry_base_name(job.index, &job.link);
        zip.start_file(format!("{}.pdf", stem), options).unwrap();
        zip.write_all(b"%PDF-1.4 fake").unwrap();
        if with_txt {
            zip.start_file(format!("{}.txt", stem), options).unwrap();
            zip.write_all(b"tailored").unwrap();
        }
    }

    zip.start_file(ERRORS_ENTRY, options).unwrap();
    let log = if errors.is_empty() {
        ERRORS_OK.to_string()
    } else {
        errors.join("\n")
    };
    zip.write_all(log.as_bytes()).unwrap();

    zip.start_file(BASE_RESUME_ENTRY, options).unwrap();
    zip.write_all(b"base resume").unwrap();

    zip.finish().unwrap().into_inner()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTailor {
    pub resume_text: String,
    pub jd_text: String,
    pub tolerance: u8,
    pub provider: Provider,
    pub plan: Option<serde_json::Value>,
    pub prompt_mode: PromptMode,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    pub job_urls: Vec<String>,
    pub tolerance: u8,
    pub provider: Provider,
    pub format: BatchFormat,
    pub prompt_mode: PromptMode,
    pub custom_prompt: Option<String>,
}

/// Keeps a call open until released
struct Hold {
    called: Notify,
    released: watch::Sender<bool>,
}

impl Hold {
    fn new() -> Self {
        let (released, _) = watch::channel(false);
        Self {
            called: Notify::new(),
            released,
        }
    }

    async fn pass(&self) {
        self.called.notify_one();
        let mut rx = self.released.subscribe();
        let _ = rx.wait_for(|released| *released).await;
    }
}

#[derive(Default)]
pub struct FakeBackend {
    tailor_result: Option<(u16, String)>,
    extract_result: Option<(u16, String)>,
    pdf_error: Option<(u16, String)>,
    batch_error: Option<(u16, String)>,
    failing_links: Vec<usize>,
    tailor_hold: Option<Hold>,
    batch_hold: Option<Hold>,

    plan_calls: AtomicUsize,
    tailor_calls: AtomicUsize,
    extract_calls: AtomicUsize,
    pdf_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    last_tailor: Mutex<Option<RecordedTailor>>,
    last_batch: Mutex<Option<RecordedBatch>>,
}

fn failure(status: u16, message: &str) -> TailorError {
    TailorError::Request {
        status,
        message: message.to_string(),
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tailored(mut self, text: &str) -> Self {
        self.tailor_result = Some((200, text.to_string()));
        self
    }

    pub fn with_tailor_error(mut self, status: u16, message: &str) -> Self {
        self.tailor_result = Some((status, message.to_string()));
        self
    }

    pub fn with_extracted(mut self, text: &str) -> Self {
        self.extract_result = Some((200, text.to_string()));
        self
    }

    pub fn with_extract_error(mut self, status: u16, message: &str) -> Self {
        self.extract_result = Some((status, message.to_string()));
        self
    }

    pub fn with_pdf_error(mut self, status: u16, message: &str) -> Self {
        self.pdf_error = Some((status, message.to_string()));
        self
    }

    pub fn with_batch_error(mut self, status: u16, message: &str) -> Self {
        self.batch_error = Some((status, message.to_string()));
        self
    }

    /// 1-based indices reported as failed inside the archive
    pub fn failing_batch_links(mut self, indices: &[usize]) -> Self {
        self.failing_links = indices.to_vec();
        self
    }

    pub fn holding_tailor(mut self) -> Self {
        self.tailor_hold = Some(Hold::new());
        self
    }

    pub fn holding_batch(mut self) -> Self {
        self.batch_hold = Some(Hold::new());
        self
    }

    pub async fn wait_for_tailor_call(&self) {
        if let Some(hold) = &self.tailor_hold {
            hold.called.notified().await;
        }
    }

    pub fn release_tailor(&self) {
        if let Some(hold) = &self.tailor_hold {
            hold.released.send_replace(true);
        }
    }

    pub async fn wait_for_batch_call(&self) {
        if let Some(hold) = &self.batch_hold {
            hold.called.notified().await;
        }
    }

    pub fn release_batch(&self) {
        if let Some(hold) = &self.batch_hold {
            hold.released.send_replace(true);
        }
    }

    pub fn plan_calls(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }

    pub fn tailor_calls(&self) -> usize {
        self.tailor_calls.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn pdf_calls(&self) -> usize {
        self.pdf_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn last_tailor(&self) -> Option<RecordedTailor> {
        self.last_tailor.lock().unwrap().clone()
    }

    pub fn last_batch(&self) -> Option<RecordedBatch> {
        self.last_batch.lock().unwrap().clone()
    }
}

#[async_trait]
impl TailorBackend for FakeBackend {
    async fn plan(&self, payload: &PlanPayload<'_>) -> TailorResult<serde_json::Value> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::json!({
            "tolerance": payload.tolerance.value(),
            "mode": "balanced",
            "items": [],
        }))
    }

    async fn tailor(&self, payload: &TailorPayload<'_>) -> TailorResult<String> {
        self.tailor_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_tailor.lock().unwrap() = Some(RecordedTailor {
            resume_text: payload.resume_text.to_string(),
            jd_text: payload.jd_text.to_string(),
            tolerance: payload.tolerance.value(),
            provider: payload.provider,
            plan: payload.plan.cloned(),
            prompt_mode: payload.prompt_mode,
            custom_prompt: payload.custom_prompt.map(str::to_string),
        });

        if let Some(hold) = &self.tailor_hold {
            hold.pass().await;
        }

        match &self.tailor_result {
            Some((200, text)) => Ok(text.clone()),
            Some((status, message)) => Err(failure(*status, message)),
            None => Ok("SUMMARY\nTailored resume".to_string()),
        }
    }

    async fn extract_jd(&self, url: &str) -> TailorResult<String> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        match &self.extract_result {
            Some((200, text)) => Ok(text.clone()),
            Some((status, message)) => Err(failure(*status, message)),
            None => Ok(format!("Job description behind {}. {}", url, long_text(120))),
        }
    }

    async fn resume_pdf(&self, resume_text: &str, _filename: &str) -> TailorResult<Vec<u8>> {
        self.pdf_calls.fetch_add(1, Ordering::SeqCst);
        match &self.pdf_error {
            Some((status, message)) => Err(failure(*status, message)),
            None => Ok(format!("%PDF-1.4 {}", resume_text.len()).into_bytes()),
        }
    }

    async fn batch_zip(&self, payload: &BatchZipPayload<'_>) -> TailorResult<Vec<u8>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock().unwrap() = Some(RecordedBatch {
            job_urls: payload.job_urls.iter().map(|u| u.to_string()).collect(),
            tolerance: payload.tolerance.value(),
            provider: payload.provider,
            format: payload.format,
            prompt_mode: payload.prompt_mode,
            custom_prompt: payload.custom_prompt.map(str::to_string),
        });

        if let Some(hold) = &self.batch_hold {
            hold.pass().await;
        }

        if let Some((status, message)) = &self.batch_error {
            return Err(failure(*status, message));
        }

        let jobs: Vec<BatchJob> = payload
            .job_urls
            .iter()
            .enumerate()
            .map(|(i, link)| BatchJob {
                link: link.to_string(),
                index: i + 1,
            })
            .collect();
        Ok(build_archive(
            &jobs,
            &self.failing_links,
            payload.format == BatchFormat::PdfAndText,
        ))
    }
}
