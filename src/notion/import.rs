//! Notion import driver
//!
//! An import runs in two passes over the selected archives. The first pass
//! only looks at entry names to build the export index, merge duplicates and
//! plan every destination path. The second pass creates all planned folders,
//! then reads the archives again and writes pages and attachments one entry
//! at a time.

use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::archive::{ArchiveEntry, ArchiveSource};
use crate::storage::frontmatter::render_with_frontmatter;
use crate::storage::Vault;

use super::convert::{LinkContext, MarkupConverter};
use super::duplicates::{resolve_duplicates, ResolveStats};
use super::error::{ImportError, Result};
use super::hierarchy::depth;
use super::models::{ExportIndex, SourceRef};
use super::planner::plan_paths;
use super::progress::ProgressReporter;
use super::scanner::scan_archives;
use super::settings::ImportSettings;

/// Preview metadata for a Notion import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionImportPreview {
    /// Number of pages that will be written
    pub page_count: usize,
    /// Number of attachments that will be copied
    pub asset_count: usize,
    /// Database exports passed over because their page exists
    pub ignored_count: usize,
    /// Duplicate pages and attachments merged away
    pub duplicate_count: usize,
    /// Maximum page nesting depth
    pub nested_depth: usize,
    /// Folders the import will create
    pub folders: Vec<String>,
    /// Sample pages for preview (first 10 by destination)
    pub pages: Vec<NotionPagePreview>,
}

/// Preview info for a single Notion page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionPagePreview {
    /// Cleaned page title (without Notion id)
    pub title: String,
    /// Original path in the archive
    pub source: String,
    /// Planned vault path
    pub destination: String,
}

/// Result of the metadata pass
#[derive(Debug)]
pub struct ImportPlan {
    pub index: ExportIndex,
    /// Every folder the content pass writes into
    pub folders: BTreeSet<String>,
    pub stats: ResolveStats,
    /// Archives that could not be read during planning
    pub unreadable: Vec<usize>,
}

impl ImportPlan {
    pub fn preview(&self) -> NotionImportPreview {
        let mut pages: Vec<NotionPagePreview> = self
            .index
            .documents()
            .filter_map(|(_, doc)| {
                Some(NotionPagePreview {
                    title: doc.title.clone(),
                    source: doc.source.path.clone(),
                    destination: doc.path.clone()?,
                })
            })
            .collect();
        pages.sort_by(|a, b| a.destination.cmp(&b.destination));
        pages.truncate(10);

        let nested_depth = self
            .index
            .documents()
            .map(|(key, _)| depth(&self.index, key) + 1)
            .max()
            .unwrap_or(0);

        NotionImportPreview {
            page_count: self.index.document_count(),
            asset_count: self.index.attachment_count(),
            ignored_count: self.index.ignored_count(),
            duplicate_count: self.stats.merged_documents + self.stats.merged_attachments,
            nested_depth,
            folders: self.folders.iter().cloned().collect(),
            pages,
        }
    }
}

/// Imports Notion exports into a vault
pub struct Importer<'a> {
    vault: &'a dyn Vault,
    converter: &'a dyn MarkupConverter,
    settings: ImportSettings,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Importer<'a> {
    pub fn new(vault: &'a dyn Vault, converter: &'a dyn MarkupConverter, settings: ImportSettings) -> Self {
        Self {
            vault,
            converter,
            settings,
            cancel: None,
        }
    }

    /// Stop the content pass before the next entry once the flag is set
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Metadata pass: scan, merge duplicates, plan paths
    pub fn plan(
        &self,
        archives: &mut [Box<dyn ArchiveSource>],
        reporter: &mut dyn ProgressReporter,
    ) -> Result<ImportPlan> {
        if archives.is_empty() {
            return Err(ImportError::NoFilesChosen);
        }
        self.settings.validate()?;

        let (mut index, unreadable) = scan_archives(archives, reporter);
        let stats = resolve_duplicates(&mut index, &self.settings);
        let folders = plan_paths(&mut index, &self.settings, self.vault);

        log::info!(
            "Planned {} pages and {} attachments in {} folders",
            index.document_count(),
            index.attachment_count(),
            folders.len()
        );

        Ok(ImportPlan {
            index,
            folders,
            stats,
            unreadable,
        })
    }

    /// Content pass: create folders, then write every entry
    ///
    /// Per-entry problems are handed to the reporter; only cancellation ends
    /// the pass with an error.
    pub fn execute(
        &self,
        plan: &ImportPlan,
        archives: &mut [Box<dyn ArchiveSource>],
        reporter: &mut dyn ProgressReporter,
    ) -> Result<()> {
        for folder in &plan.folders {
            if let Err(source) = self.vault.create_folder(folder) {
                reporter.report_failed(
                    folder,
                    &ImportError::Write {
                        path: folder.clone(),
                        source,
                    },
                );
            }
        }

        let total = plan.index.entry_count();
        let mut current = 0;
        let mut cancelled = false;

        for (archive_idx, archive) in archives.iter_mut().enumerate() {
            if plan.unreadable.contains(&archive_idx) {
                continue;
            }
            let label = archive.label().to_string();
            log::info!("Importing from {}", label);

            let result = archive.for_each_entry(&mut |entry| {
                current += 1;
                reporter.report_progress(current, total);
                if self.is_cancelled() {
                    cancelled = true;
                    return ControlFlow::Break(());
                }

                match entry {
                    Ok(entry) => {
                        if let Err(e) = self.import_entry(plan, archive_idx, entry, reporter) {
                            reporter.report_failed(entry.path(), &e);
                        }
                    }
                    // Already reported by the metadata pass
                    Err((path, e)) => log::debug!("Passing over {}: {}", path, e),
                }
                ControlFlow::Continue(())
            });

            if let Err(e) = result {
                reporter.report_failed(&label, &ImportError::Archive(e));
            }
            if cancelled {
                log::info!("Import cancelled after {} of {} entries", current, total);
                return Err(ImportError::Cancelled);
            }
        }

        Ok(())
    }

    /// Both passes
    pub fn run(
        &self,
        archives: &mut [Box<dyn ArchiveSource>],
        reporter: &mut dyn ProgressReporter,
    ) -> Result<ImportPlan> {
        let plan = self.plan(archives, reporter)?;
        self.execute(&plan, archives, reporter)?;
        Ok(plan)
    }

    fn import_entry(
        &self,
        plan: &ImportPlan,
        archive_idx: usize,
        entry: &mut dyn ArchiveEntry,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<()> {
        let source = SourceRef::new(archive_idx, entry.path());
        let index = &plan.index;

        if let Some(key) = index.document_by_source(&source) {
            let doc = index.document(key);
            if let Some(winner) = doc.merged_into {
                let reason = format!("duplicate of {}", index.document(winner).source.path);
                reporter.report_skipped(&source.path, &reason);
                return Ok(());
            }
            let dest = doc
                .path
                .as_deref()
                .ok_or_else(|| ImportError::UnresolvedReference(source.path.clone()))?;
            self.import_document(plan, &source, dest, entry)?;
            reporter.report_note_success(dest);
            return Ok(());
        }

        if let Some(key) = index.attachment_by_source(&source) {
            let attachment = index.attachment(key);
            if attachment.source != source {
                let reason = format!("duplicate of {}", attachment.source.path);
                reporter.report_skipped(&source.path, &reason);
                return Ok(());
            }
            let dest = attachment
                .path
                .as_deref()
                .ok_or_else(|| ImportError::UnresolvedReference(source.path.clone()))?;
            let bytes = entry.read_bytes()?;
            self.vault
                .write_binary(dest, &bytes)
                .map_err(|source| ImportError::Write {
                    path: dest.to_string(),
                    source,
                })?;
            reporter.report_attachment_success(dest);
            return Ok(());
        }

        if index.is_ignored(&source) {
            log::debug!("Ignoring {}", source.path);
        } else {
            reporter.report_skipped(&source.path, "not present when the import was planned");
        }
        Ok(())
    }

    fn import_document(
        &self,
        plan: &ImportPlan,
        source: &SourceRef,
        dest: &str,
        entry: &mut dyn ArchiveEntry,
    ) -> Result<()> {
        let body = entry.read_text()?;
        let ctx = LinkContext::new(&plan.index, source);
        let converted = self
            .converter
            .convert(&body, &ctx)
            .map_err(|e| ImportError::Conversion {
                path: source.path.clone(),
                source: e,
            })?;

        let mut frontmatter = Mapping::new();
        for (key, value) in converted.properties {
            frontmatter.insert(Value::String(key), Value::String(value));
        }

        // Front-matter and body go out in a single write
        let write_error = |source| ImportError::Write {
            path: dest.to_string(),
            source,
        };
        let content = render_with_frontmatter(&frontmatter, &converted.body).map_err(write_error)?;
        self.vault.write_text(dest, &content).map_err(write_error)?;
        Ok(())
    }
}
