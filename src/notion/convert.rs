//! Notion markdown to vault markdown
//!
//! Notion writes internal links as relative, percent-encoded paths
//! (`[Other Page](Other%20Page%20<id>.md)`). They are rewritten to wiki-links
//! pointing at the planned vault paths, and the property block Notion puts
//! under the title is handed back so it can go into front-matter.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::error::ConversionError;
use super::ids::{extract_notion_id, NotionId};
use super::models::{export_path, DocumentInfo, ExportIndex, SourceRef};

/// Result of converting one page body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Converted {
    pub body: String,
    /// Page properties in document order
    pub properties: Vec<(String, String)>,
}

/// Turns an exported page body into vault markdown
pub trait MarkupConverter {
    fn convert(&self, body: &str, ctx: &LinkContext<'_>) -> Result<Converted, ConversionError>;
}

/// What a link inside a page points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Vault path without the `.md` extension
    Document { path: String },
    Attachment { path: String },
}

/// Resolves links relative to the page being converted
pub struct LinkContext<'a> {
    index: &'a ExportIndex,
    source: &'a SourceRef,
}

fn strip_fragment(href: &str) -> &str {
    let end = href.find(['#', '?']).unwrap_or(href.len());
    &href[..end]
}

/// Join a relative link onto an archive folder, resolving `.` and `..`
fn join_archive_path(folder: &str, relative: &str) -> Option<String> {
    let mut parts: Vec<&str> = folder.split('/').filter(|p| !p.is_empty()).collect();
    for part in relative.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            _ => parts.push(part),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Page id at the end of a notion.so URL ("…/Page-Title-<id>")
fn notion_url_id(url: &str) -> Option<NotionId> {
    let rest = url.split_once("://")?.1;
    let host = rest.split('/').next()?;
    if !(host.ends_with("notion.so") || host.ends_with("notion.site")) {
        return None;
    }
    let last = strip_fragment(rest).trim_end_matches('/').rsplit('/').next()?;
    let start = last.len().checked_sub(32)?;
    NotionId::parse(last.get(start..)?)
}

impl<'a> LinkContext<'a> {
    pub fn new(index: &'a ExportIndex, source: &'a SourceRef) -> Self {
        Self { index, source }
    }

    fn document_target(doc: &DocumentInfo) -> Option<LinkTarget> {
        let path = doc.path.as_deref()?;
        Some(LinkTarget::Document {
            path: path.strip_suffix(".md").unwrap_or(path).to_string(),
        })
    }

    fn document_by_id(&self, id: &NotionId) -> Option<LinkTarget> {
        Self::document_target(self.index.document_by_id(id)?)
    }

    /// Resolve an href as written in the exported markdown
    pub fn resolve(&self, href: &str) -> Option<LinkTarget> {
        let decoded = urlencoding::decode(href)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| href.to_string());

        if decoded.contains("://") {
            return notion_url_id(&decoded).and_then(|id| self.document_by_id(&id));
        }
        if decoded.starts_with("mailto:") {
            return None;
        }

        let relative = strip_fragment(&decoded);
        let name = relative.rsplit('/').next().unwrap_or(relative);
        if let Some(id) = extract_notion_id(name).filter(|_| name.to_lowercase().ends_with(".md")) {
            if let Some(target) = self.document_by_id(&id) {
                return Some(target);
            }
        }

        let path = join_archive_path(self.source.folder(), relative)?;
        let source = SourceRef::new(self.source.archive, path);
        // Multi-part exports keep a page and its files in different parts
        let attachment = self
            .index
            .attachment_by_source(&source)
            .or_else(|| self.index.attachment_by_export_path(export_path(&source.path)));
        if let Some(key) = attachment {
            let path = self.index.attachment(key).path.clone()?;
            return Some(LinkTarget::Attachment { path });
        }
        let key = self.index.document_by_source(&source)?;
        let doc = self.index.document(key);
        Self::document_target(doc.merged_into.map(|winner| self.index.document(winner)).unwrap_or(doc))
    }
}

/// Default converter for Notion's markdown export
#[derive(Debug, Clone, Copy, Default)]
pub struct NotionMarkdown;

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)\s]+)\)").unwrap())
}

fn property_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\p{L}\p{N}][^:\n]{0,63}): (.*)$").unwrap())
}

/// Wiki-link aliases cannot contain these
fn clean_alias(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '|' | '[' | ']'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn wikilink(embed: bool, path: &str, text: &str) -> String {
    let bang = if embed { "!" } else { "" };
    let stem = path.rsplit('/').next().unwrap_or(path);
    let alias = clean_alias(text);
    if alias.is_empty() || alias == stem || embed {
        format!("{}[[{}]]", bang, path)
    } else {
        format!("{}[[{}|{}]]", bang, path, alias)
    }
}

fn rewrite_links(line: &str, ctx: &LinkContext<'_>) -> String {
    link_regex()
        .replace_all(line, |caps: &Captures| {
            let embed = !caps[1].is_empty();
            let text = &caps[2];
            match ctx.resolve(&caps[3]) {
                Some(LinkTarget::Document { path } | LinkTarget::Attachment { path }) => wikilink(embed, &path, text),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Split off the title heading and the property block under it
fn split_header(body: &str) -> (Vec<(String, String)>, Vec<&str>) {
    let mut lines: Vec<&str> = body.lines().collect();
    let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    lines.drain(..start);

    if !lines.first().is_some_and(|l| l.starts_with("# ")) {
        return (Vec::new(), lines);
    }
    lines.remove(0);

    let first = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    let mut end = first;
    let mut properties = Vec::new();
    while let Some(caps) = lines.get(end).and_then(|l| property_regex().captures(l)) {
        properties.push((caps[1].trim().to_string(), caps[2].trim().to_string()));
        end += 1;
    }

    // Text running on after the "properties" means it was a paragraph
    let block_closed = lines.get(end).map_or(true, |l| l.trim().is_empty());
    if properties.is_empty() || !block_closed {
        lines.drain(..first);
        return (Vec::new(), lines);
    }

    lines.drain(..end);
    let rest = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    lines.drain(..rest);
    (properties, lines)
}

impl MarkupConverter for NotionMarkdown {
    fn convert(&self, body: &str, ctx: &LinkContext<'_>) -> Result<Converted, ConversionError> {
        if body.contains('\0') {
            return Err(ConversionError("body is not text".to_string()));
        }

        let (properties, lines) = split_header(body);

        let mut out = String::with_capacity(body.len());
        let mut fence: Option<&str> = None;
        for line in lines {
            let trimmed = line.trim_start();
            match fence {
                Some(marker) => {
                    if trimmed.starts_with(marker) {
                        fence = None;
                    }
                    out.push_str(line);
                }
                None if trimmed.starts_with("```") || trimmed.starts_with("~~~") => {
                    fence = Some(&trimmed[..3]);
                    out.push_str(line);
                }
                None => out.push_str(&rewrite_links(line, ctx)),
            }
            out.push('\n');
        }

        Ok(Converted { body: out, properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::models::{AttachmentInfo, DocumentInfo};

    const ROOT: &str = "0123456789abcdef0123456789abcdef";
    const OTHER: &str = "fedcba9876543210fedcba9876543210";

    fn index() -> ExportIndex {
        let mut index = ExportIndex::new();
        let root = index.insert_document(DocumentInfo::new(
            NotionId::parse(ROOT).unwrap(),
            "Root".to_string(),
            None,
            SourceRef::new(0, format!("Export/Root {}.md", ROOT)),
            10,
        ));
        let other = index.insert_document(DocumentInfo::new(
            NotionId::parse(OTHER).unwrap(),
            "Other Page".to_string(),
            Some(NotionId::parse(ROOT).unwrap()),
            SourceRef::new(0, format!("Export/Root {}/Other Page {}.md", ROOT, OTHER)),
            10,
        ));
        let image = index.insert_attachment(AttachmentInfo::new(
            SourceRef::new(0, format!("Export/Root {}/chart 1.png", ROOT)),
            "chart 1.png".to_string(),
            Some(NotionId::parse(ROOT).unwrap()),
            3,
        ));
        index.link();
        index.document_mut(root).path = Some("Notion/Root.md".to_string());
        index.document_mut(other).path = Some("Notion/Root/Other Page.md".to_string());
        index.attachment_mut(image).path = Some("Notion/attachments/chart 1.png".to_string());
        index
    }

    fn convert(body: &str) -> Converted {
        let index = index();
        let source = SourceRef::new(0, format!("Export/Root {}.md", ROOT));
        let ctx = LinkContext::new(&index, &source);
        NotionMarkdown.convert(body, &ctx).unwrap()
    }

    #[test]
    fn test_page_links_become_wikilinks() {
        let body = format!(
            "See [Other Page](Root%20{}/Other%20Page%20{}.md) and [the details](Root%20{}/Other%20Page%20{}.md).",
            ROOT, OTHER, ROOT, OTHER
        );
        assert_eq!(
            convert(&body).body,
            "See [[Notion/Root/Other Page]] and [[Notion/Root/Other Page|the details]].\n"
        );
    }

    #[test]
    fn test_image_links_become_embeds() {
        let body = format!("![chart](Root%20{}/chart%201.png)", ROOT);
        assert_eq!(convert(&body).body, "![[Notion/attachments/chart 1.png]]\n");
    }

    #[test]
    fn test_notion_url_resolves_by_id() {
        let body = format!("[Other](https://www.notion.so/Other-Page-{})", OTHER);
        assert_eq!(convert(&body).body, "[[Notion/Root/Other Page|Other]]\n");
    }

    #[test]
    fn test_attachment_in_other_part_resolves() {
        let mut index = index();
        let image = index.insert_attachment(AttachmentInfo::new(
            SourceRef::new(1, format!("Export-Part-2.zip/Export/Root {}/scan.pdf", ROOT)),
            "scan.pdf".to_string(),
            Some(NotionId::parse(ROOT).unwrap()),
            3,
        ));
        index.attachment_mut(image).path = Some("Notion/attachments/scan.pdf".to_string());
        let source = SourceRef::new(0, format!("Export-Part-1.zip/Export/Root {}.md", ROOT));
        let ctx = LinkContext::new(&index, &source);

        let body = format!("[scan](Root%20{}/scan.pdf)", ROOT);
        let converted = NotionMarkdown.convert(&body, &ctx).unwrap();

        assert_eq!(converted.body, "[[Notion/attachments/scan.pdf|scan]]\n");
    }

    #[test]
    fn test_unresolved_and_external_links_kept() {
        let body = "[Rust](https://www.rust-lang.org) and [gone](Missing%20Page.md)";
        assert_eq!(convert(body).body, format!("{}\n", body));
    }

    #[test]
    fn test_links_in_code_fences_untouched() {
        let link = format!("[x](Root%20{}/chart%201.png)", ROOT);
        let body = format!("```\n{}\n```\n{}", link, link);
        assert_eq!(
            convert(&body).body,
            format!("```\n{}\n```\n[[Notion/attachments/chart 1.png|x]]\n", link)
        );
    }

    #[test]
    fn test_title_and_properties_extracted() {
        let converted = convert("# Root\n\nStatus: Done\nOwner: Ann Smith\n\nBody text\n");

        assert_eq!(
            converted.properties,
            vec![
                ("Status".to_string(), "Done".to_string()),
                ("Owner".to_string(), "Ann Smith".to_string()),
            ]
        );
        assert_eq!(converted.body, "Body text\n");
    }

    #[test]
    fn test_paragraph_is_not_a_property_block() {
        let converted = convert("# Root\n\nNote: this is a sentence\nthat keeps going.\n");

        assert!(converted.properties.is_empty());
        assert_eq!(converted.body, "Note: this is a sentence\nthat keeps going.\n");
    }

    #[test]
    fn test_body_without_title_is_kept() {
        let converted = convert("Just text\n");
        assert!(converted.properties.is_empty());
        assert_eq!(converted.body, "Just text\n");
    }

    #[test]
    fn test_binary_body_fails() {
        let index = index();
        let source = SourceRef::new(0, "Export/x.md");
        let ctx = LinkContext::new(&index, &source);
        assert!(NotionMarkdown.convert("a\0b", &ctx).is_err());
    }

    #[test]
    fn test_join_archive_path() {
        assert_eq!(join_archive_path("A/B", "../c.png").as_deref(), Some("A/c.png"));
        assert_eq!(join_archive_path("", "./x/y.png").as_deref(), Some("x/y.png"));
        assert_eq!(join_archive_path("A", "../../x.png"), None);
    }
}
