//! Metadata pass over the selected archives
//!
//! Only names, paths and sizes are looked at here; page bodies are read again
//! in the content pass so memory stays flat on large workspaces.

use std::ops::ControlFlow;

use crate::archive::{file_extension, ArchiveEntry, ArchiveSource};

use super::error::{ImportError, Result};
use super::ids::{clean_title, extract_folder_id, extract_notion_id, NotionId};
use super::models::{AttachmentInfo, DocumentInfo, EntryKind, ExportIndex, SourceRef};
use super::progress::ProgressReporter;

/// Classify an archive entry by its path
///
/// A `.csv` with an id is reported as [`EntryKind::Ignored`] here; the scanner
/// only really drops it when a page with the same id was exported too.
pub fn classify(path: &str) -> EntryKind {
    let name = path.rsplit('/').next().unwrap_or(path);

    if path.starts_with("__MACOSX/") || name == ".DS_Store" {
        return EntryKind::Ignored;
    }

    match file_extension(name).as_deref() {
        Some("md") | Some("markdown") => match extract_notion_id(name) {
            Some(id) => EntryKind::Document(id),
            None => EntryKind::Attachment,
        },
        Some("csv") if database_export_id(name).is_some() => EntryKind::Ignored,
        _ => EntryKind::Attachment,
    }
}

/// Id of a database export ("Tasks <id>.csv" or "Tasks <id>_all.csv")
pub fn database_export_id(name: &str) -> Option<NotionId> {
    if file_extension(name).as_deref() != Some("csv") {
        return None;
    }
    let (stem, _) = name.rsplit_once('.')?;
    let stem = stem.strip_suffix("_all").unwrap_or(stem);
    extract_folder_id(stem)
}

/// Ids of the enclosing page folders, nearest first
fn enclosing_page_ids(path: &str) -> impl Iterator<Item = NotionId> + '_ {
    path.rsplit('/').skip(1).filter_map(extract_folder_id)
}

fn document_info(source: SourceRef, size: u64) -> Result<DocumentInfo> {
    let name = source.path.rsplit('/').next().unwrap_or(&source.path).to_string();
    let id = extract_notion_id(&name).ok_or_else(|| ImportError::MissingIdentity(source.path.clone()))?;
    let parent_id = enclosing_page_ids(&source.path).find(|parent| *parent != id);
    Ok(DocumentInfo::new(id, clean_title(&name), parent_id, source, size))
}

fn attachment_info(source: SourceRef, size: u64) -> AttachmentInfo {
    let name = source.path.rsplit('/').next().unwrap_or(&source.path).to_string();
    let owner_id = enclosing_page_ids(&source.path).next();
    AttachmentInfo::new(source, name, owner_id, size)
}

/// Database exports wait until every page is known
struct PendingDatabase {
    id: NotionId,
    info: AttachmentInfo,
}

fn scan_entry(
    index: &mut ExportIndex,
    pending: &mut Vec<PendingDatabase>,
    archive: usize,
    entry: &dyn ArchiveEntry,
) -> Result<()> {
    let source = SourceRef::new(archive, entry.path());

    match classify(entry.path()) {
        EntryKind::Document(_) => {
            let info = document_info(source, entry.size())?;
            log::debug!("Page {} ({}) at {}", info.title, info.id, info.source.path);
            index.insert_document(info);
        }
        EntryKind::Attachment => {
            index.insert_attachment(attachment_info(source, entry.size()));
        }
        EntryKind::Ignored => match database_export_id(entry.name()) {
            Some(id) => pending.push(PendingDatabase {
                id,
                info: attachment_info(source, entry.size()),
            }),
            None => index.ignore(source),
        },
    }

    Ok(())
}

/// Scan every entry of every archive and build the export index
///
/// Unreadable entries are reported as skipped, unreadable archives as failed;
/// neither stops the scan. The returned list holds the indices of archives
/// that could not be read.
pub fn scan_archives(
    archives: &mut [Box<dyn ArchiveSource>],
    reporter: &mut dyn ProgressReporter,
) -> (ExportIndex, Vec<usize>) {
    let mut index = ExportIndex::new();
    let mut pending: Vec<PendingDatabase> = Vec::new();
    let mut unreadable = Vec::new();

    for (archive_idx, archive) in archives.iter_mut().enumerate() {
        let label = archive.label().to_string();
        log::info!("Scanning {}", label);

        let result = archive.for_each_entry(&mut |entry| {
            index.entry_count += 1;
            match entry {
                Ok(entry) => {
                    if let Err(e) = scan_entry(&mut index, &mut pending, archive_idx, entry) {
                        reporter.report_skipped(entry.path(), &e.to_string());
                    }
                }
                Err((path, e)) => reporter.report_skipped(&path, &e.to_string()),
            }
            ControlFlow::Continue(())
        });

        if let Err(e) = result {
            unreadable.push(archive_idx);
            reporter.report_failed(&label, &ImportError::Archive(e));
        }
    }

    for database in pending {
        if index.document_key(&database.id).is_some() {
            log::debug!("Ignoring database export {}", database.info.source.path);
            index.ignore(database.info.source);
        } else {
            index.insert_attachment(database.info);
        }
    }

    index.link();

    log::info!(
        "Found {} pages, {} attachments, {} ignored entries",
        index.document_count(),
        index.attachment_count(),
        index.ignored_count()
    );

    (index, unreadable)
}
