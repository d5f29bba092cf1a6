//! Notion ids embedded in export file names
//!
//! Every page in a Notion export is written as `Title <32 hex digits>.md`,
//! and the folder holding its sub-pages and files as `Title <32 hex digits>`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Lowercase 32-hex-digit Notion page id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotionId(String);

impl NotionId {
    /// Accepts exactly 32 hex digits, any case
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(s.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight digits, used to tell same-titled pages apart
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for NotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trailing id, separated from the title by whitespace (or the whole name)
fn notion_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)([0-9a-fA-F]{32})$").unwrap())
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// Extract the Notion id from a file name
/// "Page Name 0123456789abcdef0123456789abcdef.md" -> Some("0123...")
pub fn extract_notion_id(file_name: &str) -> Option<NotionId> {
    extract_folder_id(strip_extension(file_name))
}

/// Extract the Notion id from a folder name (no extension handling, titles
/// may contain dots)
pub fn extract_folder_id(folder_name: &str) -> Option<NotionId> {
    notion_id_regex()
        .captures(folder_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| NotionId::parse(m.as_str()))
}

/// Clean a page title by removing the extension and the Notion id suffix
/// "Page Name 0123456789abcdef0123456789abcdef.md" -> "Page Name"
pub fn clean_title(file_name: &str) -> String {
    clean_folder_title(strip_extension(file_name))
}

/// Same as [`clean_title`] for folder names
pub fn clean_folder_title(folder_name: &str) -> String {
    let title = notion_id_regex().replace(folder_name, "");
    let title = title.trim();
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title.to_string()
    }
}

/// Make a title usable as a vault file or folder name
pub fn sanitize_segment(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '*' | '"' | '\\' | '/' | '<' | '>' | ':' | '|' | '?' | '#' | '^' | '[' | ']' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c == ' ');

    if trimmed.is_empty() {
        "Untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_extract_notion_id() {
        assert_eq!(
            extract_notion_id(&format!("Page Name {}.md", ID)).unwrap().as_str(),
            ID
        );
        assert_eq!(
            extract_notion_id("Page Name 0123456789ABCDEF0123456789ABCDEF.csv")
                .unwrap()
                .as_str(),
            ID
        );
        assert_eq!(extract_notion_id(&format!("{}.md", ID)).unwrap().as_str(), ID);
        assert_eq!(extract_notion_id("Simple Page.md"), None);
    }

    #[test]
    fn test_id_must_be_trailing_suffix() {
        // Id-shaped text in the middle of the name
        assert_eq!(extract_notion_id(&format!("{} notes.md", ID)), None);
        // Glued to the title
        assert_eq!(extract_notion_id(&format!("Page{}.md", ID)), None);
        // Longer hex run, e.g. a sha1 file name
        assert_eq!(
            extract_notion_id("da39a3ee5e6b4b0d3255bfef95601890afd80709.png"),
            None
        );
        // Too short
        assert_eq!(extract_notion_id("Page 0123456789abcdef.md"), None);
    }

    #[test]
    fn test_extract_folder_id_keeps_dots() {
        assert_eq!(
            extract_folder_id(&format!("v1.2 release {}", ID)).unwrap().as_str(),
            ID
        );
        assert_eq!(extract_folder_id("Export-5f1c"), None);
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title(&format!("Page Name {}.md", ID)), "Page Name");
        assert_eq!(clean_title("Simple Page.md"), "Simple Page");
        assert_eq!(clean_title(&format!("{}.md", ID)), "Untitled");
        assert_eq!(clean_folder_title(&format!("v1.2 release {}", ID)), "v1.2 release");
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("Q1/Q2: plans?"), "Q1 Q2 plans");
        assert_eq!(sanitize_segment("[[Draft]] #1"), "Draft 1");
        assert_eq!(sanitize_segment("...hidden."), "hidden");
        assert_eq!(sanitize_segment("///"), "Untitled");
        assert_eq!(sanitize_segment("Café ☕"), "Café ☕");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(NotionId::parse(ID).unwrap().short(), "01234567");
        assert!(NotionId::parse("xyz").is_none());
    }
}
