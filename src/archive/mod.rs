//! Archive access
//!
//! Notion exports arrive either as ZIP files (possibly containing further
//! `Part-N.zip` archives) or as folders the user already extracted. Both are
//! exposed through [`ArchiveSource`], which hands every file entry to a
//! visitor one at a time. Entry bodies are only read when the visitor asks
//! for them.

mod directory;
pub(crate) mod zip_source;

use std::ops::ControlFlow;

use thiserror::Error;

pub use directory::DirectorySource;
pub use zip_source::ZipSource;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Unsafe entry path: {0}")]
    UnsafePath(String),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// A single file inside an archive
pub trait ArchiveEntry {
    /// Forward-slash separated path inside the archive
    fn path(&self) -> &str;

    /// Uncompressed size in bytes, as recorded by the archive
    fn size(&self) -> u64;

    /// Read the whole entry body
    fn read_bytes(&mut self) -> Result<Vec<u8>>;

    /// File name (last path component)
    fn name(&self) -> &str {
        let path = self.path();
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Read the body as text
    ///
    /// Invalid UTF-8 sequences are replaced instead of failing, exports with
    /// odd emoji encodings still convert.
    fn read_text(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

/// What a visitor receives for each entry: the entry, or the reason it could
/// not be opened (with the best path known for it)
pub type EntryResult<'a> = std::result::Result<&'a mut dyn ArchiveEntry, (String, ArchiveError)>;

/// A user-selected export bundle
pub trait ArchiveSource {
    /// Human readable name used in progress reports
    fn label(&self) -> &str;

    /// Visit every file entry in archive order
    ///
    /// Returns an error only when the archive itself cannot be read. Returning
    /// `ControlFlow::Break` from the visitor stops the iteration early.
    fn for_each_entry(
        &mut self,
        visit: &mut dyn FnMut(EntryResult<'_>) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>>;
}

/// Lowercased extension of a file name
pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Normalize a raw entry name to a relative forward-slash path
///
/// Rejects absolute paths and `..` components.
pub(crate) fn normalize_entry_path(raw: &str) -> Result<String> {
    let unified = raw.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(ArchiveError::UnsafePath(raw.to_string()));
    }

    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(ArchiveError::UnsafePath(raw.to_string())),
            _ => parts.push(part),
        }
    }

    if parts.is_empty() {
        return Err(ArchiveError::UnsafePath(raw.to_string()));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Page.MD"), Some("md".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".hidden"), None);
    }

    #[test]
    fn test_normalize_entry_path() {
        assert_eq!(
            normalize_entry_path("Export\\Page abc/./image.png").unwrap(),
            "Export/Page abc/image.png"
        );
        assert!(normalize_entry_path("../etc/passwd").is_err());
        assert!(normalize_entry_path("/abs/path.md").is_err());
        assert!(normalize_entry_path("a/../../b").is_err());
    }
}
