//! ZIP archive reader
//!
//! Large Notion workspaces are exported as an outer ZIP that contains
//! `Export-<uuid>-Part-N.zip` archives. Nested archives are visited in place,
//! their entries prefixed with the nested archive's own path so paths stay
//! unique within one source.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::{normalize_entry_path, ArchiveEntry, ArchiveSource, EntryResult, Result};

/// Upper bound on the buffer reserved up front for one entry
const MAX_PREALLOC: u64 = 1 << 20;

/// Where the ZIP bytes come from
enum ZipOrigin {
    File(PathBuf),
    Memory(Vec<u8>),
}

/// A Notion export ZIP
///
/// The file is reopened on every [`ArchiveSource::for_each_entry`] call, so
/// nothing is kept in memory between the metadata and content passes.
pub struct ZipSource {
    label: String,
    origin: ZipOrigin,
}

impl ZipSource {
    /// ZIP file on disk
    pub fn open(path: &Path) -> Self {
        Self {
            label: path.to_string_lossy().to_string(),
            origin: ZipOrigin::File(path.to_path_buf()),
        }
    }

    /// ZIP already held in memory
    pub fn from_bytes(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            origin: ZipOrigin::Memory(bytes),
        }
    }
}

impl ArchiveSource for ZipSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn for_each_entry(
        &mut self,
        visit: &mut dyn FnMut(EntryResult<'_>) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>> {
        match &self.origin {
            ZipOrigin::File(path) => {
                let mut archive = ZipArchive::new(File::open(path)?)?;
                visit_zip(&mut archive, "", visit)
            }
            ZipOrigin::Memory(bytes) => {
                let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
                visit_zip(&mut archive, "", visit)
            }
        }
    }
}

/// Lazily readable entry borrowed from an open archive
struct ZipEntry<F: Read> {
    file: F,
    path: String,
    size: u64,
}

impl<F: Read> ArchiveEntry for ZipEntry<F> {
    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        // The recorded size comes from the archive header and may be bogus
        let mut bytes = Vec::with_capacity(self.size.min(MAX_PREALLOC) as usize);
        self.file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

fn visit_zip<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    prefix: &str,
    visit: &mut dyn FnMut(EntryResult<'_>) -> ControlFlow<()>,
) -> Result<ControlFlow<()>> {
    for i in 0..archive.len() {
        let file = match archive.by_index(i) {
            Ok(file) => file,
            Err(e) => {
                let label = format!("{}#{}", prefix, i);
                if visit(Err((label, e.into()))).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
                continue;
            }
        };

        if file.is_dir() {
            continue;
        }

        let raw_name = file.name().to_string();
        let path = match normalize_entry_path(&raw_name) {
            Ok(path) => format!("{}{}", prefix, path),
            Err(e) => {
                drop(file);
                if visit(Err((format!("{}{}", prefix, raw_name), e))).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
                continue;
            }
        };

        if path.to_lowercase().ends_with(".zip") {
            let mut entry = ZipEntry { size: file.size(), file, path };
            let nested = entry.read_bytes().and_then(|bytes| {
                ZipArchive::new(Cursor::new(bytes)).map_err(Into::into)
            });
            let nested_prefix = format!("{}/", entry.path);
            match nested {
                Ok(mut nested) => {
                    log::debug!("Descending into nested archive {}", entry.path);
                    if visit_zip(&mut nested, &nested_prefix, visit)?.is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
                Err(e) => {
                    if visit(Err((entry.path.clone(), e))).is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
            }
            continue;
        }

        let mut entry = ZipEntry { size: file.size(), file, path };
        if visit(Ok(&mut entry)).is_break() {
            return Ok(ControlFlow::Break(()));
        }
    }

    Ok(ControlFlow::Continue(()))
}


#[cfg(test)]
mod tests {
    use super::test_support::build_zip;
    use super::*;

    fn collect(source: &mut dyn ArchiveSource) -> Vec<(String, String)> {
        let mut seen = Vec::new();
        source
            .for_each_entry(&mut |entry| {
                if let Ok(entry) = entry {
                    let path = entry.path().to_string();
                    let text = entry.read_text().unwrap();
                    seen.push((path, text));
                }
                ControlFlow::Continue(())
            })
            .unwrap();
        seen
    }

    #[test]
    fn test_oversized_header_size_does_not_reserve_it() {
        let mut entry = ZipEntry {
            file: Cursor::new(b"PNG".to_vec()),
            path: "Export/diagram.png".to_string(),
            size: u64::MAX,
        };

        assert_eq!(entry.read_bytes().unwrap(), b"PNG");
    }

    #[test]
    fn test_visits_entries_in_order() {
        let bytes = build_zip(&[
            ("Export/Root 0123456789abcdef0123456789abcdef.md", b"# Root"),
            ("Export/notes.txt", b"plain"),
        ]);
        let mut source = ZipSource::from_bytes("export.zip", bytes);

        let seen = collect(&mut source);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "Export/Root 0123456789abcdef0123456789abcdef.md");
        assert_eq!(seen[0].1, "# Root");
        assert_eq!(seen[1].0, "Export/notes.txt");
    }

    #[test]
    fn test_nested_zip_entries_are_prefixed() {
        let inner = build_zip(&[("Page 0123456789abcdef0123456789abcdef.md", b"inner")]);
        let outer = build_zip(&[("Export-Part-1.zip", &inner), ("top.md", b"top")]);
        let mut source = ZipSource::from_bytes("outer.zip", outer);

        let seen = collect(&mut source);
        let paths: Vec<&str> = seen.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "Export-Part-1.zip/Page 0123456789abcdef0123456789abcdef.md",
                "top.md"
            ]
        );
    }

    #[test]
    fn test_break_stops_iteration() {
        let bytes = build_zip(&[("a.md", b"a"), ("b.md", b"b")]);
        let mut source = ZipSource::from_bytes("export.zip", bytes);

        let mut count = 0;
        let flow = source
            .for_each_entry(&mut |_| {
                count += 1;
                ControlFlow::Break(())
            })
            .unwrap();

        assert_eq!(count, 1);
        assert!(flow.is_break());
    }

    #[test]
    fn test_reopens_for_every_pass() {
        let bytes = build_zip(&[("a.md", b"a")]);
        let mut source = ZipSource::from_bytes("export.zip", bytes);

        assert_eq!(collect(&mut source).len(), 1);
        assert_eq!(collect(&mut source).len(), 1);
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let mut source = ZipSource::from_bytes("broken.zip", b"not a zip".to_vec());
        let result = source.for_each_entry(&mut |_| ControlFlow::Continue(()));
        assert!(result.is_err());
    }
}
