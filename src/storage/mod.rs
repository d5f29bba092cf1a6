//! Vault storage
//!
//! The importer writes through the [`Vault`] trait; [`FsVault`] is the
//! on-disk implementation used by the CLI.

pub mod frontmatter;
#[cfg(test)]
pub(crate) mod memory;
mod vault;

pub use vault::{FsVault, Result, StorageError, Vault};
