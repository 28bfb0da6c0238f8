//! Markdown layout of generated notes.

use super::parse::GeneratedNote;
use regex::Regex;
use std::sync::LazyLock;

static SOURCE_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(md|pdf|pptx)$").unwrap());

/// A note as written to the vault and as stored in the notes collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedNote {
    /// Store copy, without the pictures section
    pub store_text: String,
    pub file_text: String,
}

/// Source tags: extension stripped, spaces to underscores, first-seen order.
pub fn source_names<'a>(filenames: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for filename in filenames {
        let name = SOURCE_EXT_RE.replace(filename, "").replace(' ', "_");
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Tags line, sources, explanation, snippets and tables.
///
/// The related-notes lookup runs against this text.
pub fn note_head(tags: &str, sources: &[String], note: &GeneratedNote) -> String {
    let mut text = tags.to_string();
    text.push_str("\n#### Abstracted from documents\n#");
    text.push_str(&sources.join("\n#"));
    text.push_str("\n\n");
    text.push_str(&note.detailed_explanation);

    if !note.important_snippets.is_empty() {
        text.push_str("\n## Important Snippets\n");
        text.push_str(&note.important_snippets);
    }
    if !note.tables.is_empty() {
        text.push_str("\n## Tables\n");
        text.push_str(&note.tables);
    }
    text
}

/// Append related links, the simple explanation and pictures to `head`.
pub fn finish_note(
    head: String,
    related_titles: &[String],
    note: &GeneratedNote,
    pictures: &str,
) -> FormattedNote {
    let mut text = head;

    if !related_titles.is_empty() {
        let links: Vec<String> = related_titles.iter().map(|t| format!("[[{}]]", t)).collect();
        text.push_str("\n\n# Related notes\n");
        text.push_str(&links.join("\n"));
    }
    if !note.simple_explanation.is_empty() {
        text.push_str(&format!("\n\n## Simple explanation\n{}\n", note.simple_explanation));
    }

    let store_text = text.clone();
    if !pictures.is_empty() {
        text.push_str("\n## Pictures\n");
        text.push_str(pictures);
    }

    FormattedNote {
        store_text,
        file_text: text,
    }
}
