use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use nous_notion::archive::{ArchiveSource, DirectorySource, ZipSource};
use nous_notion::notion::ImportSettings;

use crate::LayoutArgs;

/// Settings from the config file (if any) with command line overrides
pub fn load_settings(layout: &LayoutArgs) -> Result<ImportSettings> {
    let mut settings = match &layout.config {
        Some(path) => ImportSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => ImportSettings::default(),
    };

    if let Some(folder) = &layout.output_folder {
        settings.output_folder = folder.clone();
    }
    if let Some(folder) = &layout.attachment_folder {
        settings.attachment_folder = folder.clone();
    }
    if layout.parents_in_subfolders {
        settings.parents_in_subfolders = true;
    }

    Ok(settings)
}

/// Open every selected export, ZIP files and extracted folders alike
pub fn open_archives(paths: &[PathBuf]) -> Result<Vec<Box<dyn ArchiveSource>>> {
    paths.iter().map(|path| open_archive(path)).collect()
}

fn open_archive(path: &Path) -> Result<Box<dyn ArchiveSource>> {
    if path.is_dir() {
        return Ok(Box::new(DirectorySource::new(path)));
    }
    if !path.is_file() {
        bail!("Export not found: {}", path.display());
    }

    let is_zip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    if !is_zip {
        bail!("Not a ZIP file or folder: {}", path.display());
    }
    Ok(Box::new(ZipSource::open(path)))
}
