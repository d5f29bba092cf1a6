use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use serde_yaml::Mapping;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::frontmatter::{parse_frontmatter, render_with_frontmatter, split_frontmatter};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid vault path: {0}")]
    InvalidPath(String),

    #[error("Invalid front-matter: {0}")]
    InvalidFrontmatter(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Destination of an import
///
/// Paths are vault-relative and forward-slash separated; folder paths carry a
/// trailing `/`.
pub trait Vault {
    /// Create a folder and any missing parents. Existing folders are fine.
    fn create_folder(&self, path: &str) -> Result<()>;

    fn write_text(&self, path: &str, content: &str) -> Result<()>;

    fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<()>;

    fn read_binary(&self, path: &str) -> Result<Vec<u8>>;

    fn exists(&self, path: &str) -> bool;

    /// Rewrite a note's YAML front-matter in place
    ///
    /// The mutator receives the current mapping (empty when the note has
    /// none); the note body is preserved.
    fn edit_frontmatter(&self, path: &str, mutator: &mut dyn FnMut(&mut Mapping)) -> Result<()> {
        let bytes = self.read_binary(path)?;
        let content = String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());

        let (yaml, body) = split_frontmatter(&content);
        let mut mapping = parse_frontmatter(yaml)?;
        mutator(&mut mapping);

        let rendered = render_with_frontmatter(&mapping, body)?;
        self.write_text(path, &rendered)
    }
}

/// A vault folder on disk
pub struct FsVault {
    base_path: PathBuf,
}

impl FsVault {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Resolve a vault path, refusing anything that would escape the vault
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_end_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.base_path.join(relative))
    }

    /// Write through a temp file in the destination folder so an interrupted
    /// import never leaves a half-written note behind
    fn write_atomic(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        let parent = target
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;
        fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(bytes)?;
        temp.persist(&target).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }
}

impl Vault for FsVault {
    fn create_folder(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        fs::create_dir_all(target)?;
        Ok(())
    }

    fn write_text(&self, path: &str, content: &str) -> Result<()> {
        self.write_atomic(path, content.as_bytes())
    }

    fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.write_atomic(path, bytes)
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        if !target.exists() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(fs::read(target)?)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }
}
