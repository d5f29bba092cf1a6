//! Page hierarchy
//!
//! Walks parent references upward. Exports can contain pages whose parent was
//! not exported, and malformed ones can even contain cycles; both simply end
//! the walk.

use std::collections::HashSet;

use super::models::{DocKey, ExportIndex};

/// Lazy walk from a page's immediate parent up to its root
///
/// Each call to [`ancestors`] starts a fresh walk; nothing is cached.
pub struct Ancestors<'a> {
    index: &'a ExportIndex,
    next: Option<DocKey>,
    seen: HashSet<DocKey>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = DocKey;

    fn next(&mut self) -> Option<DocKey> {
        let current = self.next.take()?;
        // Prevent infinite loops
        if !self.seen.insert(current) {
            return None;
        }
        self.next = self.index.document(current).parent;
        Some(current)
    }
}

pub fn ancestors(index: &ExportIndex, key: DocKey) -> Ancestors<'_> {
    let mut seen = HashSet::new();
    seen.insert(key);
    Ancestors {
        index,
        next: index.document(key).parent,
        seen,
    }
}

/// Folder segments from the root ancestor down to the immediate parent
///
/// The page's own segment is not included.
pub fn assemble_parent_ids(index: &ExportIndex, key: DocKey) -> Vec<String> {
    let mut segments: Vec<String> = ancestors(index, key)
        .map(|ancestor| {
            let doc = index.document(ancestor);
            if doc.segment.is_empty() {
                doc.title.clone()
            } else {
                doc.segment.clone()
            }
        })
        .collect();
    segments.reverse();
    segments
}

/// Number of ancestors above a page (0 for roots)
pub fn depth(index: &ExportIndex, key: DocKey) -> usize {
    ancestors(index, key).count()
}
