use thiserror::Error;

use crate::archive::ArchiveError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("No Notion id in file name: {0}")]
    MissingIdentity(String),

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("Conversion failed for {path}: {source}")]
    Conversion {
        path: String,
        #[source]
        source: ConversionError,
    },

    #[error("Write failed for {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("No export files chosen")]
    NoFilesChosen,

    #[error("No output folder chosen")]
    NoOutputFolder,

    #[error("Import cancelled")]
    Cancelled,
}

/// Raised by a markup converter for a document body it cannot handle
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ConversionError(pub String);

pub type Result<T> = std::result::Result<T, ImportError>;
