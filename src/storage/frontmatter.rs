//! YAML front-matter helpers

use serde_yaml::{Mapping, Value};

use super::StorageError;

/// Split a note into its front-matter block and body
///
/// Returns `None` for the block when the note does not start with `---`
/// or the block is never closed.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    // Empty block: closing marker right away
    if let Some(body) = rest.strip_prefix("---") {
        return (Some(""), trim_marker_line_end(body));
    }

    match rest.find("\n---") {
        Some(end_idx) => {
            let yaml = &rest[..end_idx + 1];
            let body = &rest[end_idx + 4..];
            (Some(yaml), trim_marker_line_end(body))
        }
        None => (None, content),
    }
}

fn trim_marker_line_end(body: &str) -> &str {
    body.strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body)
}

/// Parse a front-matter block into a mapping, empty for a missing block
pub fn parse_frontmatter(yaml: Option<&str>) -> Result<Mapping, StorageError> {
    match yaml {
        None => Ok(Mapping::new()),
        Some(yaml) if yaml.trim().is_empty() => Ok(Mapping::new()),
        Some(yaml) => match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(mapping) => Ok(mapping),
            Value::Null => Ok(Mapping::new()),
            _ => Err(StorageError::InvalidFrontmatter(
                "front-matter is not a key/value mapping".to_string(),
            )),
        },
    }
}

/// Render a note from a mapping and a body, omitting an empty block
pub fn render_with_frontmatter(mapping: &Mapping, body: &str) -> Result<String, StorageError> {
    if mapping.is_empty() {
        return Ok(body.to_string());
    }

    let yaml = serde_yaml::to_string(mapping)?;
    let mut output = String::with_capacity(yaml.len() + body.len() + 8);
    output.push_str("---\n");
    output.push_str(&yaml);
    if !yaml.ends_with('\n') {
        output.push('\n');
    }
    output.push_str("---\n");
    output.push_str(body);
    Ok(output)
}
