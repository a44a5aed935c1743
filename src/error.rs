// src/error.rs
//! Error taxonomy for every user-initiated action

use std::fmt;

/// Operations guarded by the in-flight gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Single,
    Batch,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Single => write!(f, "single tailoring"),
            Operation::Batch => write!(f, "batch tailoring"),
        }
    }
}

/// Client-side precondition failures. None of these ever reach the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no links")]
    NoLinks,

    #[error("too many links ({count} > {max})")]
    TooManyLinks { count: usize, max: usize },

    #[error("resume too short ({len} < {min} characters)")]
    ResumeTooShort { len: usize, min: usize },

    #[error("job description too short ({len} < {min} characters)")]
    JobDescriptionTooShort { len: usize, min: usize },

    #[error("tolerance {0} is outside 0..=100")]
    ToleranceOutOfRange(i64),

    #[error("job link is empty")]
    EmptyLink,

    #[error("custom prompt uses unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TailorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend answered with a non-success status
    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("{0}")]
    Extraction(String),

    #[error("{0}")]
    Export(String),

    /// Network or decoding failure before a structured response was available
    #[error("{0}")]
    Transport(String),

    #[error("unreadable archive: {0}")]
    Archive(String),

    #[error("{0} already in progress")]
    InFlight(Operation),
}

impl TailorError {
    /// Re-labels a backend failure as a JD extraction failure
    pub fn into_extraction(self) -> Self {
        match self {
            TailorError::Request { message, .. } => TailorError::Extraction(message),
            other => other,
        }
    }

    /// Re-labels a backend failure as a PDF export failure
    pub fn into_export(self) -> Self {
        match self {
            TailorError::Request { message, .. } => TailorError::Export(message),
            other => other,
        }
    }
}

impl From<reqwest::Error> for TailorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TailorError::Transport(format!("request timed out: {}", err))
        } else {
            TailorError::Transport(err.to_string())
        }
    }
}

impl From<zip::result::ZipError> for TailorError {
    fn from(err: zip::result::ZipError) -> Self {
        TailorError::Archive(err.to_string())
    }
}

pub type TailorResult<T> = std::result::Result<T, TailorError>;
