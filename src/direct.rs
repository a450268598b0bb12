//! Direct mode: the client talks to Gemini itself and gets markdown back.
//!
//! This needs a provider key on the client side. Anyone who can read the
//! client's environment can use that key, so the server path is the default
//! and this mode logs a warning when it starts.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::chat::ChatBackend;
use crate::constants::EMPTY_REPLY_PLACEHOLDER;
use crate::llm_interaction::GeminiClient;
use crate::prompt::{build_direct_request, HistoryTurn};

pub struct DirectClient {
    llm: GeminiClient,
    catalog: Arc<Catalog>,
}

impl DirectClient {
    pub fn new(llm: GeminiClient, catalog: Arc<Catalog>) -> Self {
        warn!(
            model = llm.model(),
            "Direct mode holds a Gemini key on the client; prefer the server path"
        );
        Self { llm, catalog }
    }

    /// Asks for a markdown answer. Only a failed request is an error; an
    /// answer without text becomes the placeholder.
    pub async fn ask(&self, message: &str) -> Result<String> {
        let request = build_direct_request(&self.catalog, message);
        let response = self.llm.generate(&request).await?;
        let reply = match response.first_text() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => {
                debug!("Gemini returned no candidate text");
                EMPTY_REPLY_PLACEHOLDER.to_string()
            }
        };
        Ok(reply)
    }
}

impl ChatBackend for DirectClient {
    // Direct mode sends no history, only the catalog and the new message.
    async fn reply(&self, message: &str, _history: &[HistoryTurn]) -> Result<String> {
        self.ask(message).await
    }
}
