//! Notion import module
//!
//! Imports Notion workspace exports into a markdown vault.
//! Supports:
//! - Markdown pages with nested folder structure
//! - Multi-part exports (duplicates across parts are merged)
//! - Images and other attachments
//! - Internal link conversion to wiki-links
//! - Page properties as YAML front-matter

pub mod convert;
pub mod duplicates;
mod error;
pub mod hierarchy;
pub mod ids;
mod import;
pub mod models;
pub mod planner;
pub mod progress;
pub mod scanner;
mod settings;

pub use convert::{Converted, LinkContext, LinkTarget, MarkupConverter, NotionMarkdown};
pub use error::{ConversionError, ImportError, Result};
pub use import::*;
pub use progress::{ImportReport, ProgressReporter};
pub use settings::ImportSettings;
