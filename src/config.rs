// src/config.rs
//! Derived request configuration: tolerance modes and prompt selection

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Tolerance used when a custom prompt takes over request shaping
pub const DEFAULT_TOLERANCE: u8 = 40;

pub const MAX_TOLERANCE: u8 = 100;

/// Placeholders a custom prompt may reference
pub const CUSTOM_PROMPT_PLACEHOLDERS: [&str; 5] = ["MODE", "RESUME", "JD", "ALLOWED", "DISALLOWED"];

/// Template offered when custom mode is selected without any text
pub const DEFAULT_CUSTOM_TEMPLATE: &str = "MODE: CUSTOM
ALLOWED:
{ALLOWED}

DISALLOWED:
{DISALLOWED}

BASE RESUME:
{RESUME}

JOB DESCRIPTION:
{JD}

TASK:
Rewrite the resume to match the JD. Preserve employers/titles/dates/education. No metrics. No JD copy-paste.
Output ONLY the resume text.";

/// Tolerance dial value, always within 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Tolerance(u8);

impl Tolerance {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (0..=MAX_TOLERANCE as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::ToleranceOutOfRange(value))
        }
    }

    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, MAX_TOLERANCE as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn mode(self) -> ToleranceMode {
        derive_mode(self)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

impl TryFrom<i64> for Tolerance {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tolerance> for u8 {
    fn from(t: Tolerance) -> Self {
        t.0
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToleranceMode {
    Conservative,
    Balanced,
    Creative,
    Evil,
}

impl ToleranceMode {
    pub fn label(self) -> &'static str {
        match self {
            ToleranceMode::Conservative => "Conservative",
            ToleranceMode::Balanced => "Balanced",
            ToleranceMode::Creative => "Creative",
            ToleranceMode::Evil => "Evil",
        }
    }
}

impl fmt::Display for ToleranceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a tolerance to its named mode. Only the top value is Evil.
pub fn derive_mode(tolerance: Tolerance) -> ToleranceMode {
    match tolerance.value() {
        0..=29 => ToleranceMode::Conservative,
        30..=69 => ToleranceMode::Balanced,
        70..=99 => ToleranceMode::Creative,
        _ => ToleranceMode::Evil,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    #[default]
    Default,
    Custom,
}

/// Prompt selector as chosen by the user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptConfiguration {
    mode: PromptMode,
    text: Option<String>,
}

impl PromptConfiguration {
    pub fn default_prompt() -> Self {
        Self::default()
    }

    /// Custom prompt. Blank text falls back to the built-in template.
    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            mode: PromptMode::Custom,
            text: Some(text.into()),
        }
    }

    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    /// Text sent to the backend, present only in custom mode
    pub fn effective_text(&self) -> Option<&str> {
        match self.mode {
            PromptMode::Default => None,
            PromptMode::Custom => match self.text.as_deref() {
                Some(text) if !text.trim().is_empty() => Some(text),
                _ => Some(DEFAULT_CUSTOM_TEMPLATE),
            },
        }
    }
}

/// What actually shapes an outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveInputs {
    pub prompt_mode: PromptMode,
    pub prompt_text: Option<String>,
    pub tolerance: Tolerance,
}

/// Resolve tolerance and prompt selection into request inputs.
/// A custom prompt replaces tolerance-derived instructions, so the dial is ignored.
pub fn derive_inputs(tolerance: Tolerance, prompt: &PromptConfiguration) -> EffectiveInputs {
    match prompt.mode() {
        PromptMode::Default => EffectiveInputs {
            prompt_mode: PromptMode::Default,
            prompt_text: None,
            tolerance,
        },
        PromptMode::Custom => EffectiveInputs {
            prompt_mode: PromptMode::Custom,
            prompt_text: prompt.effective_text().map(str::to_string),
            tolerance: Tolerance::default(),
        },
    }
}

/// Reject `{NAME}` placeholders the backend will not substitute
pub fn validate_custom_prompt(text: &str) -> Result<(), ValidationError> {
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        let is_identifier = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');

        if is_identifier && !CUSTOM_PROMPT_PLACEHOLDERS.contains(&name) {
            return Err(ValidationError::UnknownPlaceholder(name.to_string()));
        }
        rest = &after[end + 1..];
    }
    Ok(())
}
