//! Prompts shipped with the binary.
//!
//! Both can be replaced per workspace by dropping a YAML file with the same
//! id into `.noteweave/prompts/`.

use crate::types::{PromptDefinition, PromptOutputSpec};

/// Turns retrieved source excerpts into one structured note.
pub const NOTE_GENERATION: &str = "note.generate";

/// Answers a chat message from retrieved note context.
pub const CHAT_ANSWER: &str = "chat.answer";

const NOTE_SYSTEM: &str = r#"Use language that is grammatically declarative in style, uses active voice, uses direct exposition and talks in factual sounding statements.
Focus on the ideas, not the analysis. Write as if you are stating facts or conclusions, not describing an analysis.

Never use reporting verbs or framing language.

Respond in JSON format, structured as follows:

```json
{
  "title": "A concise and descriptive title summarizing the main topic.",
  "detailed_explanation": "A detailed explanation in Markdown that makes the ideas the subject of each sentence. Use headings, bullet points and inline formatting where they help. Break down concepts, ideas or processes thoroughly. End with a 'References' section listing explicitly mentioned references, or 'None'.",
  "tables": "Markdown tables.",
  "reference image": "Reference any '<reference image n>' exactly as stated without modifications, with a caption for each image. Empty string if none exist.",
  "important_snippets": "Impactful parts of the content, verbatim, preserving key details. Use Markdown to highlight critical passages.",
  "tags": "A string of broad one word subjects related to the content, each starting with a hashtag (#).",
  "simple_explanation": "A simplified explanation, in first person like a teacher, for a 14 year old."
}
```

The "detailed_explanation" field must be valid Markdown, structured and clear for note-taking."#;

const NOTE_TEMPLATE: &str = "{{documents}}";

const CHAT_SYSTEM: &str = "Answer the user query in markdown. You are a professional assistant.";

const CHAT_TEMPLATE: &str = "{{history}}User: {{message}}\n\nCONTEXT:\n{{context}}";

/// Look up a built-in prompt by id.
pub fn builtin(id: &str) -> Option<PromptDefinition> {
    let (title, system, template, format) = match id {
        NOTE_GENERATION => ("Note generation", NOTE_SYSTEM, NOTE_TEMPLATE, "json"),
        CHAT_ANSWER => ("Chat answer", CHAT_SYSTEM, CHAT_TEMPLATE, "markdown"),
        _ => return None,
    };

    Some(PromptDefinition {
        id: id.to_string(),
        title: title.to_string(),
        api_version: "1.0".to_string(),
        created_by: "noteweave".to_string(),
        system: Some(system.to_string()),
        template: template.to_string(),
        output: PromptOutputSpec {
            format: format.to_string(),
        },
    })
}

/// Ids of every built-in prompt.
pub fn builtin_ids() -> [&'static str; 2] {
    [NOTE_GENERATION, CHAT_ANSWER]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_resolve() {
        for id in builtin_ids() {
            let def = builtin(id).unwrap();
            assert_eq!(def.id, id);
            assert!(def.system.is_some());
        }
        assert!(builtin("nope").is_none());
    }

    #[test]
    fn test_note_prompt_names_every_field() {
        let def = builtin(NOTE_GENERATION).unwrap();
        let system = def.system.unwrap();
        for key in [
            "\"title\"",
            "\"detailed_explanation\"",
            "\"tables\"",
            "\"reference image\"",
            "\"important_snippets\"",
            "\"tags\"",
            "\"simple_explanation\"",
        ] {
            assert!(system.contains(key), "missing {}", key);
        }
    }
}
