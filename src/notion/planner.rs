//! Destination paths
//!
//! Runs after duplicate resolution. Every page and attachment gets a vault
//! path that no other planned entity (and no file already in the vault) uses,
//! and the set of folders those paths need is returned so it can be created
//! before anything is written.

use std::collections::{BTreeSet, HashSet};

use crate::storage::Vault;

use super::models::{DocKey, ExportIndex};
use super::settings::ImportSettings;

/// Folder a page's file goes into
///
/// Siblings mode: `root/<ancestors>/`. Subfolder mode adds the page's own
/// segment, so the page sits inside the folder holding its children.
pub fn document_folder(index: &ExportIndex, key: DocKey, settings: &ImportSettings) -> String {
    let doc = index.document(key);
    let mut folder = settings.output_root();
    for segment in &doc.ancestors {
        folder.push_str(segment);
        folder.push('/');
    }
    if settings.parents_in_subfolders {
        folder.push_str(&doc.segment);
        folder.push('/');
    }
    folder
}

/// Folder part of a vault path, with trailing slash ("" at vault root)
pub fn parent_folder(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx + 1],
        None => "",
    }
}

/// "name.ext" -> ("name", ".ext")
pub(crate) fn split_file_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Tracks claimed paths case-insensitively, like most desktop filesystems
struct PathClaims<'a> {
    taken: HashSet<String>,
    vault: &'a dyn Vault,
}

impl<'a> PathClaims<'a> {
    fn is_free(&self, path: &str) -> bool {
        !self.taken.contains(&path.to_lowercase()) && !self.vault.exists(path)
    }

    /// Claim the first free candidate, falling back to numbered names
    fn claim(&mut self, folder: &str, candidates: &[String], fallback_stem: &str, ext: &str) -> String {
        let mut chosen = None;
        for name in candidates {
            let path = format!("{}{}", folder, name);
            if self.is_free(&path) {
                chosen = Some(path);
                break;
            }
        }

        let path = chosen.unwrap_or_else(|| {
            let mut n = 1;
            loop {
                let path = format!("{}{} {}{}", folder, fallback_stem, n, ext);
                if self.is_free(&path) {
                    break path;
                }
                n += 1;
            }
        });

        self.taken.insert(path.to_lowercase());
        path
    }
}

/// Assign a destination path to every live page and attachment
///
/// Returns the distinct parent folders of all assigned paths.
pub fn plan_paths(index: &mut ExportIndex, settings: &ImportSettings, vault: &dyn Vault) -> BTreeSet<String> {
    let mut claims = PathClaims {
        taken: HashSet::new(),
        vault,
    };
    let mut folders = BTreeSet::new();

    let mut documents: Vec<DocKey> = index.documents().map(|(key, _)| key).collect();
    documents.sort_by(|a, b| index.document(*a).id.cmp(&index.document(*b).id));

    for key in documents {
        let folder = document_folder(index, key, settings);
        let doc = index.document(key);
        let candidates = [
            format!("{}.md", doc.segment),
            format!("{} {}.md", doc.segment, doc.id.short()),
            format!("{} {}.md", doc.segment, doc.id),
        ];
        let path = claims.claim(&folder, &candidates, &doc.segment, ".md");
        if !path.ends_with(&candidates[0]) {
            log::info!("Renamed {} to {} to avoid a collision", doc.source.path, path);
        }

        folders.insert(parent_folder(&path).to_string());
        index.document_mut(key).path = Some(path);
    }

    let mut attachments: Vec<_> = index.attachments().map(|(key, a)| (a.source.clone(), key)).collect();
    attachments.sort();

    for (_, key) in attachments {
        let attachment = index.attachment(key);
        let (stem, ext) = split_file_name(&attachment.file_name);
        let candidates = [attachment.file_name.clone()];
        let path = claims.claim(&attachment.target_folder, &candidates, stem, ext);

        folders.insert(parent_folder(&path).to_string());
        index.attachment_mut(key).path = Some(path);
    }

    folders.remove("");
    folders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::duplicates::resolve_duplicates;
    use crate::notion::ids::NotionId;
    use crate::notion::models::{AttachmentInfo, DocumentInfo, SourceRef};
    use crate::storage::memory::MemoryVault;

    fn id(n: u32) -> NotionId {
        NotionId::parse(&format!("{:032x}", n)).unwrap()
    }

    fn add(index: &mut ExportIndex, n: u32, title: &str, parent: Option<u32>) -> DocKey {
        index.insert_document(DocumentInfo::new(
            id(n),
            title.to_string(),
            parent.map(id),
            SourceRef::new(0, format!("{} {}.md", title, id(n))),
            10,
        ))
    }

    fn settings(parents_in_subfolders: bool) -> ImportSettings {
        ImportSettings {
            parents_in_subfolders,
            ..Default::default()
        }
    }

    fn plan(index: &mut ExportIndex, settings: &ImportSettings) -> BTreeSet<String> {
        index.link();
        resolve_duplicates(index, settings);
        plan_paths(index, settings, &MemoryVault::new())
    }

    fn path_of(index: &ExportIndex, key: DocKey) -> &str {
        index.document(key).path.as_deref().unwrap()
    }

    #[test]
    fn test_siblings_mode_paths() {
        let mut index = ExportIndex::new();
        let root = add(&mut index, 1, "Root", None);
        let child = add(&mut index, 2, "Child", Some(1));

        let folders = plan(&mut index, &settings(false));

        assert_eq!(path_of(&index, root), "Notion/Root.md");
        assert_eq!(path_of(&index, child), "Notion/Root/Child.md");
        assert_eq!(
            folders.into_iter().collect::<Vec<_>>(),
            vec!["Notion/".to_string(), "Notion/Root/".to_string()]
        );
    }

    #[test]
    fn test_subfolder_mode_paths() {
        let mut index = ExportIndex::new();
        let root = add(&mut index, 1, "Root", None);
        let child = add(&mut index, 2, "Child", Some(1));

        let folders = plan(&mut index, &settings(true));

        assert_eq!(path_of(&index, root), "Notion/Root/Root.md");
        assert_eq!(path_of(&index, child), "Notion/Root/Child/Child.md");
        assert_eq!(
            folders.into_iter().collect::<Vec<_>>(),
            vec!["Notion/Root/".to_string(), "Notion/Root/Child/".to_string()]
        );
    }

    #[test]
    fn test_attachment_placement_per_mode() {
        for (subfolders, expected) in [
            (false, "Notion/attachments/chart.png"),
            (true, "Notion/Root/attachments/chart.png"),
        ] {
            let mut index = ExportIndex::new();
            add(&mut index, 1, "Root", None);
            let key = index.insert_attachment(AttachmentInfo::new(
                SourceRef::new(0, format!("Root {}/chart.png", id(1))),
                "chart.png".to_string(),
                Some(id(1)),
                5,
            ));

            plan(&mut index, &settings(subfolders));

            assert_eq!(index.attachment(key).path.as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_all_paths_unique_and_folders_match() {
        let mut index = ExportIndex::new();
        add(&mut index, 1, "Root", None);
        add(&mut index, 2, "Notes", Some(1));
        add(&mut index, 3, "Notes", Some(1));
        add(&mut index, 4, "notes", Some(1));
        add(&mut index, 5, "Root", None);
        for (n, owner) in [(1, 2), (2, 3), (3, 4)] {
            index.insert_attachment(AttachmentInfo::new(
                SourceRef::new(0, format!("x{}/image.png", n)),
                "image.png".to_string(),
                Some(id(owner)),
                5,
            ));
        }

        let folders = plan(&mut index, &settings(false));

        let mut seen = HashSet::new();
        let mut parents = BTreeSet::new();
        for (_, doc) in index.documents() {
            let path = doc.path.clone().unwrap();
            parents.insert(parent_folder(&path).to_string());
            assert!(seen.insert(path.to_lowercase()), "duplicate path {}", path);
        }
        for (_, attachment) in index.attachments() {
            let path = attachment.path.clone().unwrap();
            parents.insert(parent_folder(&path).to_string());
            assert!(seen.insert(path.to_lowercase()), "duplicate path {}", path);
        }
        assert_eq!(folders, parents);
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_existing_vault_file_is_not_overwritten() {
        let mut index = ExportIndex::new();
        let root = add(&mut index, 1, "Root", None);
        let vault = MemoryVault::new();
        vault.write_text("Notion/Root.md", "user note").unwrap();

        let settings = settings(false);
        index.link();
        resolve_duplicates(&mut index, &settings);
        plan_paths(&mut index, &settings, &vault);

        assert_eq!(path_of(&index, root), "Notion/Root 00000000.md");
    }

    #[test]
    fn test_numbered_fallback() {
        let vault = MemoryVault::new();
        let mut claims = PathClaims {
            taken: HashSet::new(),
            vault: &vault,
        };
        let candidates = ["a.png".to_string()];

        assert_eq!(claims.claim("f/", &candidates, "a", ".png"), "f/a.png");
        assert_eq!(claims.claim("f/", &candidates, "a", ".png"), "f/a 1.png");
        assert_eq!(claims.claim("f/", &candidates, "a", ".png"), "f/a 2.png");
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("photo.png"), ("photo", ".png"));
        assert_eq!(split_file_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_file_name("README"), ("README", ""));
        assert_eq!(split_file_name(".env"), (".env", ""));
    }
}
