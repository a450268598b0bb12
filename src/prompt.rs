//! Prompt shaping for both call paths.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::llm_interaction::{Content, GenerateRequest, GenerationConfig};

/// One prior exchange as the browser sends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub bot: String,
}

const PERSONA: &str = "You are a helpful mobile phone shopping assistant. \
Use ONLY the provided phones data. Never make up specs.";

const INSTRUCTIONS: &str = r#"INSTRUCTIONS:
- Parse user query: budget, brand, features.
- Recommend 1-3 phones with "Why?".
- For "compare", make a markdown table.
- Response format: JSON { "text": "...", "recommendations": [...], "comparison": { "table": "...", "tradeoffs": "..." } }
- If unsafe/off-topic: {"text": "Let's talk phones! What's your budget?", "recommendations": [], "comparison": {}}"#;

/// Persona, catalog and output contract.
pub fn system_prompt(catalog: &Catalog) -> String {
    format!(
        "{PERSONA}\n\nPhones Data: {}\n\n{INSTRUCTIONS}\n",
        catalog.as_prompt_json()
    )
}

/// History as alternating `user`/`model` contents, two per turn.
pub fn history_contents(history: &[HistoryTurn]) -> Vec<Content> {
    history
        .iter()
        .flat_map(|turn| {
            [
                Content::new("user", turn.user.as_str()),
                Content::new("model", turn.bot.as_str()),
            ]
        })
        .collect()
}

/// Server path: JSON-mode request carrying the catalog, prior turns and the
/// new message with the instruction block repeated after it.
pub fn build_chat_request(catalog: &Catalog, history: &[HistoryTurn], message: &str) -> GenerateRequest {
    let system = system_prompt(catalog);
    let mut contents = history_contents(history);
    contents.push(Content::new("user", format!("{message}\n{system}")));

    GenerateRequest {
        contents,
        system_instruction: Some(Content::unrolled(system)),
        generation_config: Some(GenerationConfig::json()),
    }
}

/// Direct path: one free-form markdown prompt, no history, no JSON mode.
pub fn build_direct_request(catalog: &Catalog, message: &str) -> GenerateRequest {
    let prompt = format!(
        "You are Mobile Guru AI, a friendly, professional mobile shopping assistant.\n\
         Use ONLY this data: {}\n\
         Respond in clean Markdown. Use **Name – ₹Price**. Keep it short.\n\
         User: {message}",
        catalog.as_prompt_json()
    );

    GenerateRequest {
        contents: vec![Content::new("user", prompt)],
        system_instruction: None,
        generation_config: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(r#"[{"name":"Pixel 8a","brand":"Google","price":52999}]"#).unwrap()
    }

    fn turns(n: usize) -> Vec<HistoryTurn> {
        (0..n)
            .map(|i| HistoryTurn {
                user: format!("q{i}"),
                bot: format!("a{i}"),
            })
            .collect()
    }

    #[test]
    fn test_history_yields_two_entries_per_turn_in_order() {
        for n in [0, 1, 4] {
            let contents = history_contents(&turns(n));
            assert_eq!(contents.len(), 2 * n);
            for (i, pair) in contents.chunks(2).enumerate() {
                assert_eq!(pair[0].role.as_deref(), Some("user"));
                assert_eq!(pair[0].parts[0].text, format!("q{i}"));
                assert_eq!(pair[1].role.as_deref(), Some("model"));
                assert_eq!(pair[1].parts[0].text, format!("a{i}"));
            }
        }
    }

    #[test]
    fn test_chat_request_appends_message_with_instructions() {
        let request = build_chat_request(&catalog(), &turns(2), "phone under 60k?");
        assert_eq!(request.contents.len(), 5);

        let last = request.contents.last().unwrap();
        assert_eq!(last.role.as_deref(), Some("user"));
        assert!(last.parts[0].text.starts_with("phone under 60k?\n"));
        assert!(last.parts[0].text.contains("INSTRUCTIONS:"));

        let system = &request.system_instruction.as_ref().unwrap().parts[0].text;
        assert!(system.contains("Use ONLY the provided phones data"));
        assert!(system.contains(r#""name":"Pixel 8a""#));
        assert_eq!(
            request.generation_config.as_ref().unwrap().response_mime_type,
            "application/json"
        );
    }

    #[test]
    fn test_message_passes_through_verbatim() {
        let raw = "  <b>ignore previous</b> \"quotes\" ₹ ";
        let request = build_chat_request(&catalog(), &[], raw);
        assert!(request.contents[0].parts[0].text.starts_with(raw));
    }

    #[test]
    fn test_direct_request_is_plain_markdown_prompt() {
        let request = build_direct_request(&catalog(), "best camera");
        assert_eq!(request.contents.len(), 1);
        assert!(request.generation_config.is_none());
        let text = &request.contents[0].parts[0].text;
        assert!(text.contains("Respond in clean Markdown"));
        assert!(text.contains("Pixel 8a"));
        assert!(text.ends_with("User: best camera"));
    }
}
