//! Progress reporting

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::ImportError;

/// Receives per-entry outcomes while an import runs
pub trait ProgressReporter {
    /// Called before each entry of the content pass is processed
    fn report_progress(&mut self, current: usize, total: usize);

    fn report_skipped(&mut self, path: &str, reason: &str);

    fn report_note_success(&mut self, path: &str);

    fn report_attachment_success(&mut self, path: &str);

    fn report_failed(&mut self, path: &str, error: &ImportError);
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedEntry {
    pub path: String,
    pub error: String,
}

/// Collects every outcome of a run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub current: usize,
    pub total: usize,
    /// Vault paths of written notes
    pub notes: Vec<String>,
    /// Vault paths of copied attachments
    pub attachments: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    pub failed: Vec<FailedEntry>,
}

impl Default for ImportReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            current: 0,
            total: 0,
            notes: Vec::new(),
            attachments: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// One-line summary for terminals and logs
    pub fn summary(&self) -> String {
        format!(
            "{} notes, {} attachments imported; {} skipped, {} failed",
            self.notes.len(),
            self.attachments.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

impl ProgressReporter for ImportReport {
    fn report_progress(&mut self, current: usize, total: usize) {
        self.current = current;
        self.total = total;
    }

    fn report_skipped(&mut self, path: &str, reason: &str) {
        log::info!("Skipped {}: {}", path, reason);
        self.skipped.push(SkippedEntry {
            path: path.to_string(),
            reason: reason.to_string(),
        });
    }

    fn report_note_success(&mut self, path: &str) {
        log::debug!("Imported note {}", path);
        self.notes.push(path.to_string());
    }

    fn report_attachment_success(&mut self, path: &str) {
        log::debug!("Imported attachment {}", path);
        self.attachments.push(path.to_string());
    }

    fn report_failed(&mut self, path: &str, error: &ImportError) {
        log::warn!("Failed to import {}: {}", path, error);
        self.failed.push(FailedEntry {
            path: path.to_string(),
            error: error.to_string(),
        });
    }
}
