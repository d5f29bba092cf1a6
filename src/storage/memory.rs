//! In-memory vault for tests

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::{Result, StorageError, Vault};

/// Records every folder and file operation in order
#[derive(Default)]
pub struct MemoryVault {
    pub folders: RefCell<BTreeSet<String>>,
    pub files: RefCell<BTreeMap<String, Vec<u8>>>,
    /// `folder:<path>` / `write:<path>` in call order
    pub log: RefCell<Vec<String>>,
    /// Writes to these paths fail
    pub read_only: RefCell<BTreeSet<String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.files
            .borrow()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }

    fn store(&self, path: &str, bytes: &[u8]) -> Result<()> {
        if self.read_only.borrow().contains(path) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("read-only: {}", path),
            )));
        }
        self.log.borrow_mut().push(format!("write:{}", path));
        self.files.borrow_mut().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}

impl Vault for MemoryVault {
    fn create_folder(&self, path: &str) -> Result<()> {
        self.log.borrow_mut().push(format!("folder:{}", path));
        self.folders.borrow_mut().insert(path.to_string());
        Ok(())
    }

    fn write_text(&self, path: &str, content: &str) -> Result<()> {
        self.store(path, content.as_bytes())
    }

    fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.store(path, bytes)
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.files.borrow().contains_key(path) || self.folders.borrow().contains(path)
    }
}
