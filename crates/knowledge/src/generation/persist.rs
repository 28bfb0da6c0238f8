//! Writing generated notes into the vault.

use noteweave_core::AppResult;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-.\s]").unwrap());

/// Replace characters outside word, dash, dot and whitespace with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced = UNSAFE_CHARS_RE.replace_all(name, "_");
    let trimmed = replaced.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write `content` as `<dir>/<sanitized title>.md` without overwriting.
///
/// On collision the stem gets `_{n}` appended, `n` starting at the number of
/// entries in `dir` and counting up until the name is free. Returns the
/// final stem and path.
pub fn write_note(dir: &Path, title: &str, content: &str) -> AppResult<(String, PathBuf)> {
    std::fs::create_dir_all(dir)?;

    let title = title.strip_suffix(".md").unwrap_or(title);
    let mut stem = sanitize_filename(title);
    let mut path = dir.join(format!("{}.md", stem));

    if path.exists() {
        let base = stem.clone();
        let mut n = std::fs::read_dir(dir)?.count();
        loop {
            stem = format!("{}_{}", base, n);
            path = dir.join(format!("{}.md", stem));
            if !path.exists() {
                break;
            }
            n += 1;
        }
        tracing::info!("{} exists, writing {} instead", base, stem);
    }

    std::fs::write(&path, content)?;
    Ok((stem, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_filename("1__What/Why? A:B"), "1__What_Why_ A_B");
        assert_eq!(sanitize_filename(" .hidden. "), "hidden");
        assert_eq!(sanitize_filename("..."), "untitled");
        assert_eq!(sanitize_filename("v1.2 notes-x"), "v1.2 notes-x");
    }

    #[test]
    fn test_collisions_never_overwrite() {
        let dir = TempDir::new().unwrap();
        let (first, _) = write_note(dir.path(), "Note", "one").unwrap();
        let (second, path) = write_note(dir.path(), "Note", "two").unwrap();
        let (third, _) = write_note(dir.path(), "Note.md", "three").unwrap();

        assert_eq!(first, "Note");
        assert_eq!(second, "Note_1");
        assert_eq!(third, "Note_2");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "two");
        assert_eq!(std::fs::read_to_string(dir.path().join("Note.md")).unwrap(), "one");
    }
}
