//! Recovering a structured note from a free-form LLM reply.

use serde_json::{Map, Value};

/// Fields of a generated note. Absent fields are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedNote {
    pub title: String,
    pub detailed_explanation: String,
    pub tables: String,
    pub reference_image: String,
    pub important_snippets: String,
    pub tags: String,
    pub simple_explanation: String,
}

impl GeneratedNote {
    fn from_map(map: &Map<String, Value>) -> Self {
        let field = |key: &str, sep: &str| map.get(key).map(|v| flatten(v, sep)).unwrap_or_default();
        Self {
            title: field("title", " "),
            detailed_explanation: field("detailed_explanation", "\n"),
            tables: field("tables", "\n"),
            reference_image: field("reference image", "\n"),
            important_snippets: field("important_snippets", "\n"),
            tags: field("tags", " "),
            simple_explanation: field("simple_explanation", "\n"),
        }
    }
}

/// Text of a reply value; lists are joined with `sep`.
fn flatten(value: &Value, sep: &str) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| flatten(v, sep))
            .collect::<Vec<_>>()
            .join(sep),
        other => other.to_string(),
    }
}

/// Result of parsing an LLM reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(GeneratedNote),
    /// The reply or the extracted block that could not be parsed
    Unparsable(String),
}

/// Parse a reply expected to hold one fenced JSON object.
pub fn parse_reply(reply: &str) -> ParseOutcome {
    let Some(block) = extract_fenced(reply) else {
        tracing::debug!("No fenced block in LLM reply");
        return ParseOutcome::Unparsable(reply.to_string());
    };
    let repaired = repair_backslashes(block);

    match serde_json::from_str::<Value>(&escape_control_chars(&repaired)) {
        Ok(Value::Object(map)) => return ParseOutcome::Parsed(GeneratedNote::from_map(&map)),
        Ok(_) => return ParseOutcome::Unparsable(repaired),
        Err(e) => tracing::debug!("JSON decoding failed: {}", e),
    }

    match serde_yaml::from_str::<serde_yaml::Value>(&repaired)
        .ok()
        .and_then(|v| serde_json::to_value(v).ok())
    {
        Some(Value::Object(map)) => ParseOutcome::Parsed(GeneratedNote::from_map(&map)),
        _ => {
            tracing::debug!("YAML fallback failed");
            ParseOutcome::Unparsable(repaired)
        }
    }
}

/// Text between the opening fence (` ```json ` preferred) and the last fence.
fn extract_fenced(reply: &str) -> Option<&str> {
    const FENCE: &str = "```";
    let (start, offset) = match reply.find("```json") {
        Some(pos) => (pos, "```json".len()),
        None => (reply.find(FENCE)?, FENCE.len()),
    };
    let end = reply.rfind(FENCE)?;
    if end <= start || end < start + offset {
        return None;
    }
    Some(reply[start + offset..end].trim())
}

/// Double every backslash that does not start a valid JSON escape.
fn repair_backslashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&next) if matches!(next, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => {
                out.push('\\');
                out.push(next);
                chars.next();
            }
            _ => out.push_str("\\\\"),
        }
    }
    out
}

/// Escape raw control characters inside JSON string literals.
fn escape_control_chars(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            } else if c.is_control() && (c as u32) < 0x20 {
                match c {
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    other => out.push_str(&format!("\\u{:04x}", other as u32)),
                }
                continue;
            }
        } else if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    out
}
