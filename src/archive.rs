// src/archive.rs
//! Batch archive contract: entry naming, error log, and reconciliation
//!
//! The backend builds one ZIP per batch. Job `NN` (1-based, two digits) with
//! link slug `S` yields `NN_S.pdf` and, for `pdf+txt`, `NN_S.txt`. Failed jobs
//! are listed in `errors.txt` as `NN <link> -> <message>`, or the file holds
//! the single word `OK`. The submitted résumé is stored as `base_resume.txt`.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use tracing::{info, warn};

use crate::batch::{BatchJob, BatchResult, FailedJob, SucceededJob};
use crate::error::{TailorError, TailorResult};

pub const ARCHIVE_FILE_NAME: &str = "tailored_resumes.zip";
pub const ERRORS_ENTRY: &str = "errors.txt";
pub const BASE_RESUME_ENTRY: &str = "base_resume.txt";
pub const ERRORS_OK: &str = "OK";

const SLUG_MAX_LEN: usize = 60;
const MISSING_ARTIFACTS: &str = "no artifacts in archive";

/// Filesystem-safe name for a job link
pub fn slugify(link: &str) -> String {
    let without_scheme = link
        .trim()
        .to_lowercase()
        .replace("https://", "")
        .replace("http://", "");

    let mut slug = String::with_capacity(without_scheme.len());
    for c in without_scheme.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let slug: String = slug.trim_matches('_').chars().take(SLUG_MAX_LEN).collect();
    if slug.is_empty() {
        "job".to_string()
    } else {
        slug
    }
}

/// Entry stem shared by the PDF and TXT artifacts of one job
pub fn entry_base_name(index: usize, link: &str) -> String {
    format!("{:02}_{}", index, slugify(link))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogLine {
    pub index: usize,
    pub link: String,
    pub message: String,
}

/// Parse `errors.txt`. Lines that do not open a new entry continue the previous message.
pub fn parse_error_log(text: &str) -> Vec<ErrorLogLine> {
    let mut lines: Vec<ErrorLogLine> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim_end();
        if line.trim().is_empty() || line.trim() == ERRORS_OK {
            continue;
        }

        match parse_error_line(line) {
            Some(entry) => lines.push(entry),
            None => {
                if let Some(last) = lines.last_mut() {
                    last.message.push('\n');
                    last.message.push_str(line);
                } else {
                    warn!("Ignoring unrecognised error log line: {}", line);
                }
            }
        }
    }

    lines
}

fn parse_error_line(line: &str) -> Option<ErrorLogLine> {
    let (index, rest) = line.split_once(' ')?;
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // an empty message leaves the line ending in " ->" once trailing space is gone
    let (link, message) = match rest.split_once(" -> ") {
        Some(parts) => parts,
        None => (rest.strip_suffix(" ->")?, ""),
    };

    Some(ErrorLogLine {
        index: index.parse().ok()?,
        link: link.trim().to_string(),
        message: message.trim().to_string(),
    })
}

/// Table of contents of a delivered batch archive
#[derive(Debug, Clone, Default)]
pub struct BatchArchive {
    entries: Vec<String>,
    errors: Vec<ErrorLogLine>,
    has_error_log: bool,
}

impl BatchArchive {
    pub fn read(bytes: &[u8]) -> TailorResult<Self> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            entries.push(zip.by_index(i)?.name().to_string());
        }

        let (errors, has_error_log) = match zip.by_name(ERRORS_ENTRY) {
            Ok(mut file) => {
                let mut text = String::new();
                file.read_to_string(&mut text)
                    .map_err(|e| TailorError::Archive(format!("{}: {}", ERRORS_ENTRY, e)))?;
                (parse_error_log(&text), true)
            }
            Err(zip::result::ZipError::FileNotFound) => {
                warn!("Archive has no {}", ERRORS_ENTRY);
                (Vec::new(), false)
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            entries,
            errors,
            has_error_log,
        })
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn errors(&self) -> &[ErrorLogLine] {
        &self.errors
    }

    pub fn has_error_log(&self) -> bool {
        self.has_error_log
    }

    pub fn has_base_resume(&self) -> bool {
        self.entries.iter().any(|e| e == BASE_RESUME_ENTRY)
    }

    fn artifacts_for(&self, job: &BatchJob) -> Vec<String> {
        let stem = entry_base_name(job.index, &job.link);
        self.entries
            .iter()
            .filter(|name| {
                name.strip_prefix(stem.as_str())
                    .is_some_and(|ext| ext == ".pdf" || ext == ".txt")
            })
            .cloned()
            .collect()
    }

    /// Place every submitted job in exactly one of succeeded/failed, in submission order
    pub fn reconcile(&self, jobs: &[BatchJob]) -> BatchResult {
        let failures: BTreeMap<usize, &ErrorLogLine> =
            self.errors.iter().map(|line| (line.index, line)).collect();

        if !self.has_base_resume() {
            warn!("Archive has no {}", BASE_RESUME_ENTRY);
        }

        let mut result = BatchResult::default();
        for job in jobs {
            if let Some(line) = failures.get(&job.index) {
                warn!("Batch job {:02} failed: {} -> {}", job.index, job.link, line.message);
                result.failed.push(FailedJob {
                    link: job.link.clone(),
                    error_message: line.message.clone(),
                });
                continue;
            }

            let artifacts = self.artifacts_for(job);
            if artifacts.is_empty() {
                warn!("Batch job {:02} has no artifacts: {}", job.index, job.link);
                result.failed.push(FailedJob {
                    link: job.link.clone(),
                    error_message: MISSING_ARTIFACTS.to_string(),
                });
            } else {
                result.succeeded.push(SucceededJob {
                    link: job.link.clone(),
                    artifact_refs: artifacts,
                });
            }
        }

        info!(
            "Batch archive reconciled: {} succeeded, {} failed",
            result.succeeded.len(),
            result.failed.len()
        );
        result
    }
}

/// Read an archive and reconcile it against the submitted jobs
pub fn read_batch_result(bytes: &[u8], jobs: &[BatchJob]) -> TailorResult<BatchResult> {
    Ok(BatchArchive::read(bytes)?.reconcile(jobs))
}
