//! Back-matter headers whose sections are not worth a note.

const SKIPPED_HEADERS: &[&str] = &[
    "Acknowledgments",
    "Acknowledgements",
    "Acknowledgment",
    "Acknowledgement",
    "References",
    "Bibliography",
    "Citations",
    "Appendix",
    "Appendices",
    "Author Contributions",
    "Conflict of Interest",
    "Funding",
    "Disclosure",
    "Notes",
    "Footnotes",
    "Index",
    "Glossary",
    "Abbreviations",
    "Errata",
    "Erratum",
    "Corrigendum",
    "Dedication",
    "Copyright Notice",
    "Related Work",
    "Curriculum Vitae",
    "Biography",
    "Postscript",
    "Afterword",
    "Table of Contents",
    "Contents",
    "Endnotes",
    "Works Cited",
    "Credits",
    "Legends",
    "Symbols",
    "Permissions",
    "Contributors",
    "Statistical Analysis",
    "Data Availability",
    "Availability of Data and Materials",
    "Supporting Data",
    "Back Matter",
    "Editorial Note",
    "Publication History",
];

/// True when `header` names a section on the skip list.
///
/// The header is reduced to lower-case letters and whitespace, so numbering
/// and punctuation (`"7. References"`) do not matter; a skip entry matches
/// anywhere inside it.
pub fn is_skipped_header(header: &str) -> bool {
    let normalized: String = header
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    SKIPPED_HEADERS.iter().any(|skip| {
        let skip = skip.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        normalized.contains(&skip)
    })
}
