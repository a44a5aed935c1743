// src/types/request.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{derive_inputs, EffectiveInputs, PromptConfiguration, PromptMode, Tolerance};

/// Generation provider. The backend knows them by engine name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Provider {
    #[default]
    #[serde(rename = "ollama")]
    Local,
    #[serde(rename = "deepseek")]
    Remote,
}

impl Provider {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "local" | "ollama" => Some(Provider::Local),
            "remote" | "deepseek" => Some(Provider::Remote),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Local => write!(f, "local"),
            Provider::Remote => write!(f, "remote"),
        }
    }
}

/// One résumé/JD pair as entered by the user
#[derive(Debug, Clone, PartialEq)]
pub struct TailoringRequest {
    pub resume_text: String,
    pub jd_text: String,
    pub tolerance: Tolerance,
    pub provider: Provider,
    pub prompt_override: Option<String>,
    /// Plan from an earlier `/plan` call, forwarded as-is
    pub plan: Option<serde_json::Value>,
}

impl TailoringRequest {
    pub fn new(resume_text: impl Into<String>, jd_text: impl Into<String>) -> Self {
        Self {
            resume_text: resume_text.into(),
            jd_text: jd_text.into(),
            tolerance: Tolerance::default(),
            provider: Provider::default(),
            prompt_override: None,
            plan: None,
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

    pub fn with_prompt_override(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_override = Some(prompt.into());
        self
    }

    pub fn with_plan(mut self, plan: Option<serde_json::Value>) -> Self {
        self.plan = plan;
        self
    }

    /// A prompt override switches the request to custom mode
    pub fn prompt(&self) -> PromptConfiguration {
        match &self.prompt_override {
            Some(text) => PromptConfiguration::custom(text.clone()),
            None => PromptConfiguration::default_prompt(),
        }
    }

    pub fn effective_inputs(&self) -> EffectiveInputs {
        derive_inputs(self.tolerance, &self.prompt())
    }
}

/// Archive contents requested from `/batch_zip`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchFormat {
    #[serde(rename = "pdf+txt")]
    PdfAndText,
}

// ===== Wire Payloads =====

#[derive(Debug, Serialize)]
pub struct PlanPayload<'a> {
    pub resume_text: &'a str,
    pub jd_text: &'a str,
    pub tolerance: Tolerance,
}

#[derive(Debug, Serialize)]
pub struct TailorPayload<'a> {
    pub resume_text: &'a str,
    pub jd_text: &'a str,
    pub tolerance: Tolerance,
    pub provider: Provider,
    pub plan: Option<&'a serde_json::Value>,
    pub prompt_mode: PromptMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ExtractJdPayload<'a> {
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PdfPayload<'a> {
    pub resume_text: &'a str,
    pub filename: &'a str,
}

#[derive(Debug, Serialize)]
pub struct BatchZipPayload<'a> {
    pub base_resume_text: &'a str,
    pub job_urls: Vec<&'a str>,
    pub tolerance: Tolerance,
    pub provider: Provider,
    pub format: BatchFormat,
    pub prompt_mode: PromptMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<&'a str>,
}
