// src/core/service_client.rs
//! HTTP client for the generation backend - JSON in, JSON or bytes out

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, error, info, trace};

use crate::core::backend::TailorBackend;
use crate::error::{TailorError, TailorResult};
use crate::types::{
    request::{BatchZipPayload, ExtractJdPayload, PdfPayload, PlanPayload, TailorPayload},
    response::{ErrorBody, ExtractJdResponse, HealthResponse, TailorResponse},
};

const PLAN_ENDPOINT: &str = "/plan";
const TAILOR_ENDPOINT: &str = "/tailor";
const EXTRACT_JD_ENDPOINT: &str = "/extract_jd";
const RESUME_PDF_ENDPOINT: &str = "/resume_pdf";
const BATCH_ZIP_ENDPOINT: &str = "/batch_zip";
const HEALTH_ENDPOINT: &str = "/health";

pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 900;

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
    batch_timeout: Duration,
}

impl ServiceClient {
    /// Create new service client. `timeout` bounds single calls, `batch_timeout` the archive call.
    pub fn new(base_url: &str, timeout: Duration, batch_timeout: Duration) -> TailorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TailorError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            batch_timeout,
        })
    }

    pub fn with_defaults(base_url: &str) -> TailorResult<Self> {
        Self::new(
            base_url,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_BATCH_TIMEOUT_SECS),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Liveness check
    pub async fn health(&self) -> TailorResult<bool> {
        let url = self.url(HEALTH_ENDPOINT);
        trace!("Calling health endpoint: {}", url);

        let response = self.send(self.client.get(&url), &url).await?;
        let health: HealthResponse = response.json().await?;
        Ok(health.ok)
    }

    /// Generic POST request with JSON
    pub async fn post_json<T, R>(&self, endpoint: &str, payload: &T) -> TailorResult<R>
    where
        T: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = self.url(endpoint);
        let response = self.send(self.client.post(&url).json(payload), &url).await?;

        response.json::<R>().await.map_err(|e| {
            TailorError::Transport(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    /// POST with JSON, binary body back
    pub async fn post_bytes<T>(
        &self,
        endpoint: &str,
        payload: &T,
        timeout: Option<Duration>,
    ) -> TailorResult<Vec<u8>>
    where
        T: serde::Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        let mut request = self.client.post(&url).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = self.send(request, &url).await?;
        let bytes = response.bytes().await?;
        debug!("Received {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    /// Send and turn any non-success status into a `Request` error
    async fn send(&self, request: RequestBuilder, url: &str) -> TailorResult<Response> {
        let response = request.send().await?;

        let status = response.status();
        trace!("Response status from {}: {}", url, status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = ErrorBody::message_from_body(&body);
        error!("Backend error {} from {}: {}", status, url, message);

        Err(TailorError::Request {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TailorBackend for ServiceClient {
    async fn plan(&self, payload: &PlanPayload<'_>) -> TailorResult<serde_json::Value> {
        info!("Requesting tailoring plan (tolerance {})", payload.tolerance);
        self.post_json(PLAN_ENDPOINT, payload).await
    }

    async fn tailor(&self, payload: &TailorPayload<'_>) -> TailorResult<String> {
        info!(
            "Requesting tailored resume (tolerance {}, provider {}, prompt {:?})",
            payload.tolerance, payload.provider, payload.prompt_mode
        );
        let response: TailorResponse = self.post_json(TAILOR_ENDPOINT, payload).await?;
        Ok(response.tailored_resume)
    }

    async fn extract_jd(&self, url: &str) -> TailorResult<String> {
        info!("Requesting job description extraction: {}", url);
        let response: ExtractJdResponse = self
            .post_json(EXTRACT_JD_ENDPOINT, &ExtractJdPayload { url })
            .await?;
        Ok(response.jd_text)
    }

    async fn resume_pdf(&self, resume_text: &str, filename: &str) -> TailorResult<Vec<u8>> {
        info!("Requesting PDF export: {}", filename);
        self.post_bytes(
            RESUME_PDF_ENDPOINT,
            &PdfPayload {
                resume_text,
                filename,
            },
            None,
        )
        .await
    }

    async fn batch_zip(&self, payload: &BatchZipPayload<'_>) -> TailorResult<Vec<u8>> {
        info!(
            "Requesting batch archive for {} links (timeout {:?})",
            payload.job_urls.len(),
            self.batch_timeout
        );
        self.post_bytes(BATCH_ZIP_ENDPOINT, payload, Some(self.batch_timeout))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PromptMode, Tolerance};
    use crate::types::Provider;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> (String, tokio::task::JoinHandle<String>) {
        serve_once_after(Duration::ZERO, status_line, content_type, body).await
    }

    /// Like `serve_once`, answering only after `delay`
    async fn serve_once_after(
        delay: Duration,
        status_line: &'static str,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            tokio::time::sleep(delay).await;

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                content_type,
                body.len()
            );
            // the client may already have given up
            if socket.write_all(head.as_bytes()).await.is_ok() {
                socket.write_all(&body).await.ok();
            }
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn tailor_payload<'a>() -> TailorPayload<'a> {
        TailorPayload {
            resume_text: "resume",
            jd_text: "jd",
            tolerance: Tolerance::new(50).unwrap(),
            provider: Provider::Local,
            plan: None,
            prompt_mode: PromptMode::Default,
            custom_prompt: None,
        }
    }

    #[tokio::test]
    async fn test_tailor_success() {
        let (base, server) = serve_once(
            "200 OK",
            "application/json",
            br#"{"tailored_resume":"X"}"#.to_vec(),
        )
        .await;
        let client = ServiceClient::with_defaults(&base).unwrap();

        let tailored = client.tailor(&tailor_payload()).await.unwrap();
        assert_eq!(tailored, "X");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /tailor "));
        assert!(request.contains(r#""provider":"ollama""#));
    }

    #[tokio::test]
    async fn test_tailor_failure_uses_detail() {
        let (base, _server) = serve_once(
            "500 Internal Server Error",
            "application/json",
            br#"{"detail":"model unavailable"}"#.to_vec(),
        )
        .await;
        let client = ServiceClient::with_defaults(&base).unwrap();

        let err = client.tailor(&tailor_payload()).await.unwrap_err();
        match err {
            TailorError::Request { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "model unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_binary_body_is_returned_verbatim() {
        let pdf = b"%PDF-1.4 fake".to_vec();
        let (base, server) = serve_once("200 OK", "application/pdf", pdf.clone()).await;
        let client = ServiceClient::with_defaults(&base).unwrap();

        let bytes = client
            .resume_pdf("tailored text", "tailored_resume.pdf")
            .await
            .unwrap();
        assert_eq!(bytes, pdf);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /resume_pdf "));
        assert!(request.contains(r#""filename":"tailored_resume.pdf""#));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_transport_error() {
        let (base, _server) = serve_once("200 OK", "application/json", b"not json".to_vec()).await;
        let client = ServiceClient::with_defaults(&base).unwrap();

        let err = client.extract_jd("https://jobs.example.com/1").await.unwrap_err();
        assert!(matches!(err, TailorError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ServiceClient::with_defaults(&format!("http://{}/", addr)).unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, TailorError::Transport(_)));
    }

    fn batch_payload<'a>() -> BatchZipPayload<'a> {
        BatchZipPayload {
            base_resume_text: "resume",
            job_urls: vec!["https://jobs.example.com/1"],
            tolerance: Tolerance::default(),
            provider: Provider::Local,
            format: crate::types::BatchFormat::PdfAndText,
            prompt_mode: PromptMode::Default,
            custom_prompt: None,
        }
    }

    #[tokio::test]
    async fn test_batch_uses_its_own_timeout() {
        let delay = Duration::from_millis(200);
        let (base, server) =
            serve_once_after(delay, "200 OK", "application/zip", b"PK zip".to_vec()).await;
        let client = ServiceClient::new(
            &base,
            Duration::from_millis(50),
            Duration::from_secs(2),
        )
        .unwrap();

        let bytes = client.batch_zip(&batch_payload()).await.unwrap();
        assert_eq!(bytes, b"PK zip");
        assert!(server.await.unwrap().starts_with("POST /batch_zip "));
    }

    #[tokio::test]
    async fn test_single_calls_use_client_timeout() {
        let delay = Duration::from_millis(200);
        let (base, _server) =
            serve_once_after(delay, "200 OK", "application/pdf", b"%PDF".to_vec()).await;
        let client = ServiceClient::new(
            &base,
            Duration::from_millis(50),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client
            .resume_pdf("tailored text", "tailored_resume.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, TailorError::Transport(ref m) if m.contains("timed out")));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ServiceClient::with_defaults("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url(TAILOR_ENDPOINT), "http://localhost:8000/tailor");
    }
}
