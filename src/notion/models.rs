//! Export graph: documents and attachments found in the selected archives
//!
//! Documents and attachments live in arenas owned by [`ExportIndex`]; every
//! cross reference (parent page, owning page, duplicate winner) is an arena
//! key, so duplicate resolution can rewrite references without dangling.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::ids::NotionId;

/// Where an entry physically lives: archive index in the selected set plus
/// its path inside that archive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceRef {
    pub archive: usize,
    pub path: String,
}

impl SourceRef {
    pub fn new(archive: usize, path: impl Into<String>) -> Self {
        Self {
            archive,
            path: path.into(),
        }
    }

    /// Folder part of the path, without trailing slash ("" at archive root)
    pub fn folder(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }
}

/// Path inside the export with any nested `*.zip/` prefix removed
///
/// Every part of a multi-part export shares the same layout below it, so this
/// names a file independently of the part it ended up in.
pub fn export_path(path: &str) -> &str {
    match path.to_ascii_lowercase().rfind(".zip/") {
        Some(idx) => &path[idx + 5..],
        None => path,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocKey(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentKey(pub(crate) usize);

/// How the scanner classified an archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A page (`Title <id>.md`)
    Document(NotionId),
    /// Anything copied verbatim
    Attachment,
    /// A database CSV sitting next to the page of the same id
    Ignored,
}

/// A Notion page
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub id: NotionId,
    /// Title cleaned from the file name
    pub title: String,
    /// Id of the nearest enclosing page folder; `None` for top-level pages
    pub parent_id: Option<NotionId>,
    pub source: SourceRef,
    /// Byte size recorded in the archive
    pub size: u64,
    /// Parent resolved to an arena key (dangling parents resolve to `None`)
    pub parent: Option<DocKey>,
    /// Sibling-unique file/folder name
    pub segment: String,
    /// Segments of the ancestors, root first, immediate parent last
    pub ancestors: Vec<String>,
    /// Vault path, set by the planner
    pub path: Option<String>,
    /// Set when this entry lost duplicate resolution
    pub merged_into: Option<DocKey>,
}

impl DocumentInfo {
    pub fn new(id: NotionId, title: String, parent_id: Option<NotionId>, source: SourceRef, size: u64) -> Self {
        Self {
            id,
            title,
            parent_id,
            source,
            size,
            parent: None,
            segment: String::new(),
            ancestors: Vec::new(),
            path: None,
            merged_into: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.merged_into.is_none()
    }
}

/// A file attached to a page (image, PDF, stray export file, ...)
#[derive(Debug, Clone)]
pub struct AttachmentInfo {
    pub source: SourceRef,
    /// Display name with extension
    pub name: String,
    /// Id of the nearest enclosing page folder
    pub owner_id: Option<NotionId>,
    pub size: u64,
    pub owner: Option<DocKey>,
    /// Folder-unique file name
    pub file_name: String,
    /// Vault folder (trailing slash)
    pub target_folder: String,
    pub path: Option<String>,
    pub merged_into: Option<AttachmentKey>,
}

impl AttachmentInfo {
    pub fn new(source: SourceRef, name: String, owner_id: Option<NotionId>, size: u64) -> Self {
        Self {
            source,
            file_name: name.clone(),
            name,
            owner_id,
            size,
            owner: None,
            target_folder: String::new(),
            path: None,
            merged_into: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.merged_into.is_none()
    }
}

/// Everything known about the selected archives after the metadata pass
#[derive(Debug, Default)]
pub struct ExportIndex {
    pub(crate) documents: Vec<DocumentInfo>,
    pub(crate) attachments: Vec<AttachmentInfo>,
    pub(crate) by_id: HashMap<NotionId, DocKey>,
    pub(crate) doc_by_source: HashMap<SourceRef, DocKey>,
    pub(crate) by_path: HashMap<SourceRef, AttachmentKey>,
    /// First attachment seen at each export path, across all archives
    pub(crate) by_export_path: HashMap<String, AttachmentKey>,
    pub(crate) ignored: HashSet<SourceRef>,
    /// Entries seen across all archives, including ignored and skipped ones
    pub(crate) entry_count: usize,
}

impl ExportIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scanned page. A second page with a known id is kept as a
    /// duplicate candidate; the id map keeps pointing at the first one.
    pub fn insert_document(&mut self, info: DocumentInfo) -> DocKey {
        let key = DocKey(self.documents.len());
        self.by_id.entry(info.id.clone()).or_insert(key);
        self.doc_by_source.insert(info.source.clone(), key);
        self.documents.push(info);
        key
    }

    pub fn insert_attachment(&mut self, info: AttachmentInfo) -> AttachmentKey {
        let key = AttachmentKey(self.attachments.len());
        self.by_path.insert(info.source.clone(), key);
        self.by_export_path
            .entry(export_path(&info.source.path).to_string())
            .or_insert(key);
        self.attachments.push(info);
        key
    }

    pub fn ignore(&mut self, source: SourceRef) {
        self.ignored.insert(source);
    }

    /// Resolve parent and owner ids to arena keys
    pub fn link(&mut self) {
        for i in 0..self.documents.len() {
            let parent = self.documents[i]
                .parent_id
                .as_ref()
                .and_then(|id| self.by_id.get(id).copied());
            self.documents[i].parent = parent.filter(|p| p.0 != i);
        }
        for i in 0..self.attachments.len() {
            let owner = self.attachments[i]
                .owner_id
                .as_ref()
                .and_then(|id| self.by_id.get(id).copied());
            self.attachments[i].owner = owner;
        }
    }

    pub fn document(&self, key: DocKey) -> &DocumentInfo {
        &self.documents[key.0]
    }

    pub fn attachment(&self, key: AttachmentKey) -> &AttachmentInfo {
        &self.attachments[key.0]
    }

    pub(crate) fn document_mut(&mut self, key: DocKey) -> &mut DocumentInfo {
        &mut self.documents[key.0]
    }

    pub(crate) fn attachment_mut(&mut self, key: AttachmentKey) -> &mut AttachmentInfo {
        &mut self.attachments[key.0]
    }

    pub fn document_by_id(&self, id: &NotionId) -> Option<&DocumentInfo> {
        self.by_id.get(id).map(|key| self.document(*key))
    }

    pub fn document_key(&self, id: &NotionId) -> Option<DocKey> {
        self.by_id.get(id).copied()
    }

    pub fn document_by_source(&self, source: &SourceRef) -> Option<DocKey> {
        self.doc_by_source.get(source).copied()
    }

    pub fn attachment_by_source(&self, source: &SourceRef) -> Option<AttachmentKey> {
        self.by_path.get(source).copied()
    }

    /// Attachment at an export path in any archive, redirected to the
    /// duplicate winner
    pub fn attachment_by_export_path(&self, path: &str) -> Option<AttachmentKey> {
        let key = *self.by_export_path.get(export_path(path))?;
        Some(self.attachment(key).merged_into.unwrap_or(key))
    }

    pub fn is_ignored(&self, source: &SourceRef) -> bool {
        self.ignored.contains(source)
    }

    /// Every scanned page, duplicates included
    pub fn all_documents(&self) -> impl Iterator<Item = (DocKey, &DocumentInfo)> {
        self.documents.iter().enumerate().map(|(i, d)| (DocKey(i), d))
    }

    /// Pages that survived duplicate resolution
    pub fn documents(&self) -> impl Iterator<Item = (DocKey, &DocumentInfo)> {
        self.all_documents().filter(|(_, d)| d.is_live())
    }

    pub fn all_attachments(&self) -> impl Iterator<Item = (AttachmentKey, &AttachmentInfo)> {
        self.attachments.iter().enumerate().map(|(i, a)| (AttachmentKey(i), a))
    }

    pub fn attachments(&self) -> impl Iterator<Item = (AttachmentKey, &AttachmentInfo)> {
        self.all_attachments().filter(|(_, a)| a.is_live())
    }

    pub fn document_count(&self) -> usize {
        self.documents().count()
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments().count()
    }

    pub fn ignored_count(&self) -> usize {
        self.ignored.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }
}
