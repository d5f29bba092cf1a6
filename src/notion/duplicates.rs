//! Duplicate resolution and naming
//!
//! Multi-part exports repeat pages and files across parts. The largest copy
//! of each page (ties go to the first source in archive/path order) wins, and
//! every reference to a losing copy is redirected to the winner. Afterwards
//! each page gets a sibling-unique segment and each attachment a
//! folder-unique file name.
//!
//! Everything is recomputed from the raw titles and names, so running the
//! resolver twice gives the same result.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::hierarchy::assemble_parent_ids;
use super::ids::{sanitize_segment, NotionId};
use super::models::{AttachmentKey, DocKey, ExportIndex, SourceRef};
use super::planner::{document_folder, split_file_name};
use super::settings::ImportSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub merged_documents: usize,
    pub merged_attachments: usize,
}

/// Larger copy first, then lowest source
fn winner_order(size_a: u64, source_a: &SourceRef, size_b: u64, source_b: &SourceRef) -> Ordering {
    size_b.cmp(&size_a).then_with(|| source_a.cmp(source_b))
}

/// Attachments are duplicates when they belong to the same page and carry
/// the same name; ownerless ones when they sit in the same folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum AttachmentGroup {
    Owned(DocKey, String),
    Orphan(String, String),
}

fn normalized_name(name: &str) -> String {
    urlencoding::decode(name)
        .map(|n| n.into_owned())
        .unwrap_or_else(|_| name.to_string())
        .to_lowercase()
}

fn merge_documents(index: &mut ExportIndex) -> usize {
    let mut groups: BTreeMap<NotionId, Vec<DocKey>> = BTreeMap::new();
    for (key, doc) in index.documents() {
        groups.entry(doc.id.clone()).or_default().push(key);
    }

    let mut redirects: HashMap<DocKey, DocKey> = HashMap::new();
    for (id, mut keys) in groups {
        keys.sort_by(|a, b| {
            let (a, b) = (index.document(*a), index.document(*b));
            winner_order(a.size, &a.source, b.size, &b.source)
        });
        let winner = keys[0];
        for loser in &keys[1..] {
            log::info!(
                "Page {} found twice; keeping {} over {}",
                id,
                index.document(winner).source.path,
                index.document(*loser).source.path
            );
            redirects.insert(*loser, winner);
        }
        index.by_id.insert(id, winner);
    }

    for (loser, winner) in &redirects {
        index.document_mut(*loser).merged_into = Some(*winner);
    }

    for doc in index.documents.iter_mut() {
        if let Some(parent) = doc.parent {
            doc.parent = redirects.get(&parent).copied().or(Some(parent));
        }
    }
    for i in 0..index.documents.len() {
        if index.documents[i].parent == Some(DocKey(i)) {
            index.documents[i].parent = None;
        }
    }
    for attachment in index.attachments.iter_mut() {
        if let Some(owner) = attachment.owner {
            attachment.owner = redirects.get(&owner).copied().or(Some(owner));
        }
    }

    redirects.len()
}

fn merge_attachments(index: &mut ExportIndex) -> usize {
    let mut groups: BTreeMap<AttachmentGroup, Vec<AttachmentKey>> = BTreeMap::new();
    for (key, attachment) in index.attachments() {
        let name = normalized_name(&attachment.name);
        let group = match attachment.owner {
            Some(owner) => AttachmentGroup::Owned(owner, name),
            None => AttachmentGroup::Orphan(attachment.source.folder().to_string(), name),
        };
        groups.entry(group).or_default().push(key);
    }

    let mut merged = 0;
    for (_, mut keys) in groups {
        if keys.len() < 2 {
            continue;
        }
        keys.sort_by(|a, b| {
            let (a, b) = (index.attachment(*a), index.attachment(*b));
            winner_order(a.size, &a.source, b.size, &b.source)
        });
        let winner = keys[0];
        for loser in &keys[1..] {
            log::debug!(
                "Attachment {} duplicates {}",
                index.attachment(*loser).source.path,
                index.attachment(winner).source.path
            );
            let source = index.attachment(*loser).source.clone();
            index.attachment_mut(*loser).merged_into = Some(winner);
            index.by_path.insert(source, winner);
            merged += 1;
        }
    }

    merged
}

/// Candidate names for a page that collides with a sibling
fn segment_candidates(title: &str, id: &NotionId) -> [String; 3] {
    let base = sanitize_segment(title);
    [
        base.clone(),
        format!("{} {}", base, id.short()),
        format!("{} {}", base, id),
    ]
}

fn assign_segments(index: &mut ExportIndex) {
    let mut siblings: BTreeMap<Option<DocKey>, Vec<DocKey>> = BTreeMap::new();
    for (key, doc) in index.documents() {
        siblings.entry(doc.parent).or_default().push(key);
    }

    for (_, mut keys) in siblings {
        keys.sort_by(|a, b| index.document(*a).id.cmp(&index.document(*b).id));
        let mut used: HashSet<String> = HashSet::new();

        for key in keys {
            let doc = index.document(key);
            let candidates = segment_candidates(&doc.title, &doc.id);
            let segment = match candidates.iter().find(|c| !used.contains(&c.to_lowercase())) {
                Some(segment) => segment.clone(),
                None => (1..)
                    .map(|n| format!("{} {}", candidates[0], n))
                    .find(|c| !used.contains(&c.to_lowercase()))
                    .unwrap_or_else(|| candidates[2].clone()),
            };
            used.insert(segment.to_lowercase());
            index.document_mut(key).segment = segment;
        }
    }

    let ancestors: Vec<(DocKey, Vec<String>)> = index
        .documents()
        .map(|(key, _)| (key, assemble_parent_ids(index, key)))
        .collect();
    for (key, ancestors) in ancestors {
        index.document_mut(key).ancestors = ancestors;
    }
}

fn assign_attachment_names(index: &mut ExportIndex, settings: &ImportSettings) {
    let subfolder = settings.attachment_subfolder();

    let mut attachments: Vec<(SourceRef, AttachmentKey)> = index
        .attachments()
        .map(|(key, a)| (a.source.clone(), key))
        .collect();
    attachments.sort();

    let mut used: HashMap<String, HashSet<String>> = HashMap::new();
    for (_, key) in attachments {
        let attachment = index.attachment(key);
        let folder = match attachment.owner {
            Some(owner) if settings.parents_in_subfolders => document_folder(index, owner, settings),
            _ => settings.output_root(),
        };
        let target_folder = format!("{}{}", folder, subfolder);

        let (stem, ext) = split_file_name(&attachment.name);
        let stem = sanitize_segment(stem);
        let taken = used.entry(target_folder.to_lowercase()).or_default();
        let mut file_name = format!("{}{}", stem, ext);
        let mut n = 1;
        while taken.contains(&file_name.to_lowercase()) {
            file_name = format!("{} {}{}", stem, n, ext);
            n += 1;
        }
        taken.insert(file_name.to_lowercase());

        let attachment = index.attachment_mut(key);
        attachment.target_folder = target_folder;
        attachment.file_name = file_name;
    }
}

/// Merge duplicate pages and attachments, then name everything that is left
pub fn resolve_duplicates(index: &mut ExportIndex, settings: &ImportSettings) -> ResolveStats {
    let merged_documents = merge_documents(index);
    let merged_attachments = merge_attachments(index);

    assign_segments(index);
    assign_attachment_names(index, settings);

    if merged_documents + merged_attachments > 0 {
        log::info!(
            "Merged {} duplicate pages and {} duplicate attachments",
            merged_documents,
            merged_attachments
        );
    }

    ResolveStats {
        merged_documents,
        merged_attachments,
    }
}
