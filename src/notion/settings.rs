//! Import settings
//!
//! Chosen once before an import starts and applied to the whole run. Stored
//! as TOML so a user can keep their preferred layout next to their vault.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ImportError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Vault folder receiving the import
    pub output_folder: String,
    /// Sub-folder for attachments, relative to the output folder (or to each
    /// page's folder in subfolder mode). Empty puts them next to the notes.
    pub attachment_folder: String,
    /// Give every page its own folder holding the page, its sub-pages and
    /// its attachments ("folder note" layout)
    pub parents_in_subfolders: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            output_folder: "Notion".to_string(),
            attachment_folder: "attachments".to_string(),
            parents_in_subfolders: false,
        }
    }
}

fn normalize_folder(folder: &str) -> String {
    folder
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

impl ImportSettings {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ImportError::Settings(e.to_string()))
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| ImportError::Settings(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ImportError::Settings(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| ImportError::Settings(format!("{}: {}", path.display(), e)))
    }

    /// Pre-flight check run before any archive is touched
    pub fn validate(&self) -> Result<()> {
        if normalize_folder(&self.output_folder).is_empty() {
            return Err(ImportError::NoOutputFolder);
        }
        Ok(())
    }

    /// Output folder as a vault folder path ("Notion/")
    pub fn output_root(&self) -> String {
        format!("{}/", normalize_folder(&self.output_folder))
    }

    /// Attachment sub-folder with trailing slash, or "" when disabled
    pub fn attachment_subfolder(&self) -> String {
        let folder = normalize_folder(&self.attachment_folder);
        if folder.is_empty() {
            folder
        } else {
            format!("{}/", folder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = ImportSettings::default();
        assert_eq!(settings.output_root(), "Notion/");
        assert_eq!(settings.attachment_subfolder(), "attachments/");
        assert!(!settings.parents_in_subfolders);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = ImportSettings::from_toml("parents_in_subfolders = true\n").unwrap();
        assert!(settings.parents_in_subfolders);
        assert_eq!(settings.output_folder, "Notion");
    }

    #[test]
    fn test_folder_normalization() {
        let settings = ImportSettings {
            output_folder: " /Imports//Notion/ ".to_string(),
            attachment_folder: String::new(),
            parents_in_subfolders: false,
        };
        assert_eq!(settings.output_root(), "Imports/Notion/");
        assert_eq!(settings.attachment_subfolder(), "");
    }

    #[test]
    fn test_blank_output_folder_fails_validation() {
        let settings = ImportSettings {
            output_folder: " / ".to_string(),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(ImportError::NoOutputFolder)));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ImportSettings::from_toml("parents_in_subfolders = \"yes\""),
            Err(ImportError::Settings(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notion-import.toml");

        assert_eq!(ImportSettings::load(&path).unwrap(), ImportSettings::default());

        let settings = ImportSettings {
            output_folder: "Archive".to_string(),
            attachment_folder: "files".to_string(),
            parents_in_subfolders: true,
        };
        settings.save(&path).unwrap();

        assert_eq!(ImportSettings::load(&path).unwrap(), settings);
    }
}
