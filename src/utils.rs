// src/utils.rs
use anyhow::{Context, Result};
use std::path::Path;

/// Minimum trimmed length of a résumé or job description
pub const MIN_TEXT_CHARS: usize = 80;

/// Length in characters once surrounding whitespace is removed
pub fn trimmed_len(text: &str) -> usize {
    text.trim().chars().count()
}

pub fn is_long_enough(text: &str) -> bool {
    trimmed_len(text) >= MIN_TEXT_CHARS
}

/// Strip line breaks so a name is safe inside a Content-Disposition header
pub fn sanitize_filename(name: &str) -> String {
    name.chars().filter(|c| *c != '\n' && *c != '\r').collect::<String>().trim().to_string()
}

/// Read file content as string with proper error context
pub async fn read_text_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))
}
