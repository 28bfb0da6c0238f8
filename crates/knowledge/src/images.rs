//! Embedded image substitution.
//!
//! Documents converted to markdown carry their pictures inline as
//! `![Image](data:...)`. Those blobs are swapped for short
//! `<reference image {id}>` tokens before the text reaches the store or the
//! model, and swapped back when a note is written to disk.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::ids::new_record_id;

/// Token to original image markup.
pub type ImageRefs = BTreeMap<String, String>;

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[Image\]\((.*?)\)").unwrap());
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<reference image[^>]*>").unwrap());

/// Replace every embedded image with a fresh token.
pub fn tokenize(markdown: &str) -> (String, ImageRefs) {
    let mut refs = ImageRefs::new();
    let replaced = IMAGE_RE.replace_all(markdown, |caps: &regex::Captures<'_>| {
        let token = format!("<reference image {}>", new_record_id());
        refs.insert(token.clone(), caps[0].to_string());
        token
    });
    (replaced.into_owned(), refs)
}

/// Substitute known tokens back; unknown tokens are left in place.
pub fn detokenize(text: &str, refs: &ImageRefs) -> String {
    TOKEN_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            refs.get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Remove every image token, leaving a space in its place.
pub fn strip_tokens(text: &str) -> String {
    TOKEN_RE.replace_all(text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_replaces_each_image() {
        let md = "before ![Image](data:image/png;base64,AAA) mid ![Image](data:b) after";
        let (text, refs) = tokenize(md);

        assert_eq!(refs.len(), 2);
        assert!(!text.contains("base64"));
        assert_eq!(text.matches("<reference image ").count(), 2);
        assert!(refs.values().any(|v| v == "![Image](data:b)"));
    }

    #[test]
    fn test_round_trip_restores_original() {
        let md = "# Title\n![Image](data:image/png;base64,QUJD)\ntext";
        let (text, refs) = tokenize(md);
        assert_eq!(detokenize(&text, &refs), md);
    }

    #[test]
    fn test_unmatched_tokens_remain() {
        let refs = ImageRefs::new();
        let text = "see <reference image 42> here";
        assert_eq!(detokenize(text, &refs), text);
    }

    #[test]
    fn test_other_image_alts_untouched() {
        let md = "![diagram](x.png)";
        let (text, refs) = tokenize(md);
        assert!(refs.is_empty());
        assert_eq!(text, md);
    }
}
