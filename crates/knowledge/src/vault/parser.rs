//! Parse a single vault note: frontmatter, wikilinks, tags, images.

use crate::images::{self, ImageRefs};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());

/// A parsed note.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedNote {
    /// Leading YAML block
    pub metadata: BTreeMap<String, Value>,
    /// Raw link texts in order of appearance
    pub wikilinks: Vec<String>,
    /// Raw link text to the note key it resolves to
    pub resolved_wikilinks: BTreeMap<String, Option<String>>,
    pub tags: Vec<String>,
    /// Body with image tokens in place of images
    pub content: String,
    pub reference_images: ImageRefs,
}

/// Parse note text. Links are left unresolved.
pub fn parse_markdown(text: &str) -> ParsedNote {
    let (metadata, body) = match split_frontmatter(text) {
        Some((metadata, body)) => (metadata, body),
        None => (BTreeMap::new(), text),
    };

    let wikilinks = WIKILINK_RE
        .captures_iter(body)
        .map(|c| c[1].to_string())
        .collect();
    let tags = TAG_RE.captures_iter(body).map(|c| c[1].to_string()).collect();
    let (content, reference_images) = images::tokenize(body);

    ParsedNote {
        metadata,
        wikilinks,
        resolved_wikilinks: BTreeMap::new(),
        tags,
        content,
        reference_images,
    }
}

/// Split off a leading `---` block that parses as a YAML mapping. The block
/// may be empty and may use `\r\n` line endings.
fn split_frontmatter(text: &str) -> Option<(BTreeMap<String, Value>, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;
    let (yaml, body) = closing_delimiter(rest)?;
    if yaml.trim().is_empty() {
        return Some((BTreeMap::new(), body));
    }

    let parsed: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Unparsable frontmatter left in content: {}", e);
            return None;
        }
    };
    match serde_json::to_value(parsed).ok()? {
        Value::Object(map) => Some((map.into_iter().collect(), body)),
        Value::Null => Some((BTreeMap::new(), body)),
        _ => None,
    }
}

/// YAML before the first line that is exactly `---`, and the body after it.
fn closing_delimiter(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontmatter_links_and_tags() {
        let note = parse_markdown(
            "---\ntitle: Cortex\naliases: [ctx]\n---\nSee [[Neuron]] and [[Glia#Types|glial cells]]. #brain #bio",
        );
        assert_eq!(note.metadata.get("title"), Some(&Value::from("Cortex")));
        assert_eq!(note.wikilinks, vec!["Neuron", "Glia#Types|glial cells"]);
        assert_eq!(note.tags, vec!["Types", "brain", "bio"]);
        assert!(note.content.starts_with("See"));
    }

    #[test]
    fn test_unparsable_frontmatter_stays_in_content() {
        let text = "---\nkey: [unclosed\n---\nbody";
        let note = parse_markdown(text);
        assert!(note.metadata.is_empty());
        assert_eq!(note.content, text);
    }

    #[test]
    fn test_no_frontmatter() {
        let note = parse_markdown("plain [[Link]]");
        assert!(note.metadata.is_empty());
        assert_eq!(note.content, "plain [[Link]]");
    }

    #[test]
    fn test_images_tokenized() {
        let note = parse_markdown("pic ![Image](data:abc) end");
        assert_eq!(note.reference_images.len(), 1);
        assert!(note.content.contains("<reference image "));
    }

    #[test]
    fn test_empty_frontmatter_is_removed() {
        let note = parse_markdown("---\n---\nbody [[Link]]");
        assert!(note.metadata.is_empty());
        assert_eq!(note.content, "body [[Link]]");
    }

    #[test]
    fn test_crlf_frontmatter() {
        let note = parse_markdown("---\r\ntitle: Cortex\r\n---\r\nbody");
        assert_eq!(note.metadata.get("title"), Some(&Value::from("Cortex")));
        assert_eq!(note.content, "body");
    }

    #[test]
    fn test_frontmatter_closing_at_end_of_file() {
        let note = parse_markdown("---\ntitle: Cortex\n---");
        assert_eq!(note.metadata.get("title"), Some(&Value::from("Cortex")));
        assert_eq!(note.content, "");
    }
}
