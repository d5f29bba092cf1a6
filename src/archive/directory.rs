//! Already-extracted export folder

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{normalize_entry_path, ArchiveEntry, ArchiveError, ArchiveSource, EntryResult, Result};

/// An export the user unzipped themselves
pub struct DirectorySource {
    label: String,
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: &Path) -> Self {
        Self {
            label: root.to_string_lossy().to_string(),
            root: root.to_path_buf(),
        }
    }
}

struct FileEntry {
    full_path: PathBuf,
    path: String,
    size: u64,
}

impl ArchiveEntry for FileEntry {
    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.full_path)?)
    }
}

impl ArchiveSource for DirectorySource {
    fn label(&self) -> &str {
        &self.label
    }

    fn for_each_entry(
        &mut self,
        visit: &mut dyn FnMut(EntryResult<'_>) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>> {
        if !self.root.is_dir() {
            return Err(ArchiveError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Export folder not found: {}", self.root.display()),
            )));
        }

        // Sorted so both passes see the same order on every platform
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let label = e
                        .path()
                        .map(|p| p.to_string_lossy().to_string())
                        .unwrap_or_else(|| self.label.clone());
                    if visit(Err((label, e.into()))).is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();

            let result = normalize_entry_path(&relative).and_then(|path| {
                let size = entry.metadata().map(|m| m.len()).map_err(ArchiveError::from)?;
                Ok(FileEntry {
                    full_path: entry.path().to_path_buf(),
                    path,
                    size,
                })
            });

            let flow = match result {
                Ok(mut file) => visit(Ok(&mut file)),
                Err(e) => visit(Err((relative, e))),
            };
            if flow.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        Ok(ControlFlow::Continue(()))
    }
}
