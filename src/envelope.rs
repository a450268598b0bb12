//! The `{text, recommendations, comparison}` reply contract and the
//! interpreter that turns raw model output into one.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::constants::{PARSE_FALLBACK_TEXT, UNAVAILABLE_TEXT};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tradeoffs: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.table.is_none() && self.tradeoffs.is_none() && self.extra.is_empty()
    }
}

// JSON mode often writes `null` for members it has nothing to say about.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unknown members are carried through untouched. Missing or `null` known
/// members take their empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comparison: Comparison,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn parse_fallback() -> Self {
        Self::with_text(PARSE_FALLBACK_TEXT)
    }

    pub fn unavailable() -> Self {
        Self::with_text(UNAVAILABLE_TEXT)
    }

    /// Flattens the envelope into markdown for places that show a single message.
    pub fn to_markdown(&self) -> String {
        let mut out = self.text.trim().to_string();

        for rec in &self.recommendations {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("- ");
            out.push_str(&recommendation_line(rec));
        }

        if let Some(table) = self.comparison.table.as_deref().filter(|t| !t.trim().is_empty()) {
            out.push_str("\n\n");
            out.push_str(table.trim());
        }
        if let Some(tradeoffs) = self.comparison.tradeoffs.as_deref().filter(|t| !t.trim().is_empty()) {
            out.push_str("\n\n");
            out.push_str(tradeoffs.trim());
        }
        out
    }
}

fn recommendation_line(rec: &Value) -> String {
    match rec {
        Value::String(s) => s.clone(),
        Value::Object(obj) => {
            let name = obj.get("name").and_then(Value::as_str);
            let price = obj.get("price").and_then(|p| match p {
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) => Some(s.trim_start_matches('₹').to_string()),
                _ => None,
            });
            let why = obj
                .get("why")
                .or_else(|| obj.get("Why?"))
                .or_else(|| obj.get("reason"))
                .and_then(Value::as_str);

            let mut line = match (name, price) {
                (Some(n), Some(p)) => format!("**{n} – ₹{p}**"),
                (Some(n), None) => format!("**{n}**"),
                _ => return rec.to_string(),
            };
            if let Some(w) = why {
                line.push_str(": ");
                line.push_str(w);
            }
            line
        }
        other => other.to_string(),
    }
}

/// Outcome of reading model output; falling back is an expected result.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    Parsed(Envelope),
    Fallback { envelope: Envelope, reason: String },
}

impl Interpretation {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Interpretation::Fallback { .. })
    }

    pub fn into_envelope(self) -> Envelope {
        match self {
            Interpretation::Parsed(envelope) => envelope,
            Interpretation::Fallback { envelope, .. } => envelope,
        }
    }
}

/// Strips a surrounding ```json fence if the model added one.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub fn interpret(raw: &str) -> Interpretation {
    match serde_json::from_str::<Envelope>(strip_code_fence(raw)) {
        Ok(envelope) => Interpretation::Parsed(envelope),
        Err(e) => {
            warn!(error = %e, raw = %raw, "Model reply is not a valid envelope");
            Interpretation::Fallback {
                envelope: Envelope::parse_fallback(),
                reason: e.to_string(),
            }
        }
    }
}
