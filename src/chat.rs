// Chat session state and the interactive terminal chat.
//
// A session is an append-only transcript plus a two-state machine:
// Idle -> Sending on a valid send, Sending -> Idle once exactly one bot
// turn has been appended for it.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::{NETWORK_ERROR_TEXT, QUICK_REPLIES};
use crate::envelope::Envelope;
use crate::prompt::HistoryTurn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
}

/// Something that can answer a chat message.
#[allow(async_fn_in_trait)]
pub trait ChatBackend {
    async fn reply(&self, message: &str, history: &[HistoryTurn]) -> Result<String>;
}

fn display_time() -> String {
    Local::now().format("%I:%M %p").to_string()
}

#[derive(Debug)]
pub struct ChatSession {
    turns: Vec<Turn>,
    input: String,
    state: SessionState,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            input: String::new(),
            state: SessionState::Idle,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Prefills the input with one of the suggested questions.
    pub fn apply_quick_reply(&mut self, index: usize) -> bool {
        match QUICK_REPLIES.get(index) {
            Some(text) => {
                self.input = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Completed user/bot pairs, oldest first.
    pub fn history(&self) -> Vec<HistoryTurn> {
        self.turns
            .windows(2)
            .filter(|w| w[0].role == Role::User && w[1].role == Role::Bot)
            .map(|w| HistoryTurn {
                user: w[0].content.clone(),
                bot: w[1].content.clone(),
            })
            .collect()
    }

    /// Starts a send. Returns the message to deliver, or `None` when the
    /// input is blank or a send is already outstanding.
    pub fn begin_send(&mut self) -> Option<String> {
        if self.state == SessionState::Sending {
            debug!("Send ignored: a request is already in flight");
            return None;
        }
        let message = self.input.trim();
        if message.is_empty() {
            return None;
        }
        let message = message.to_string();

        self.input.clear();
        self.turns.push(Turn {
            role: Role::User,
            content: message.clone(),
            time: display_time(),
        });
        self.state = SessionState::Sending;
        Some(message)
    }

    /// Finishes the outstanding send with the backend's outcome.
    pub fn complete(&mut self, outcome: Result<String>) -> Option<&Turn> {
        if self.state != SessionState::Sending {
            warn!("Completion arrived with no send in flight; ignoring");
            return None;
        }
        let content = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                NETWORK_ERROR_TEXT.to_string()
            }
        };
        self.turns.push(Turn {
            role: Role::Bot,
            content,
            time: display_time(),
        });
        self.state = SessionState::Idle;
        self.turns.last()
    }

    /// Sends the current input through `backend`. Returns `false` when the
    /// send was a no-op.
    pub async fn send<B: ChatBackend>(&mut self, backend: &B) -> bool {
        let Some(message) = self.begin_send() else {
            return false;
        };
        let history = self.history();
        let outcome = backend.reply(&message, &history).await;
        self.complete(outcome);
        true
    }
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    message: &'a str,
    history: &'a [HistoryTurn],
}

/// Talks to a running `mobile-guru start` over `POST /api/chat`.
pub struct ServerClient {
    client: Client,
    endpoint: String,
}

impl ServerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
        })
    }
}

impl ChatBackend for ServerClient {
    async fn reply(&self, message: &str, history: &[HistoryTurn]) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequestBody { message, history })
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint))?;

        // A 500 still carries a displayable envelope.
        let status = response.status();
        let envelope = response
            .json::<Envelope>()
            .await
            .context("Server reply is not an envelope")?;
        debug!(%status, "Received envelope from server");
        Ok(envelope.to_markdown())
    }
}

/// Line-based chat loop. Blank lines are ignored, `/1`..`/3` send a quick
/// reply and `/quit` ends the session.
pub async fn run_chat<B, R, W>(backend: &B, input: R, mut output: W) -> Result<ChatSession>
where
    B: ChatBackend,
    R: BufRead,
    W: Write,
{
    info!("Starting chat session...");
    let mut session = ChatSession::new();

    writeln!(output, "Mobile Guru AI. Ask about phones!")?;
    for (i, suggestion) in QUICK_REPLIES.iter().enumerate() {
        writeln!(output, "  /{} {}", i + 1, suggestion)?;
    }
    output.flush()?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let command = line.trim();
        if command == "/quit" {
            break;
        }

        let quick = command
            .strip_prefix('/')
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1));
        match quick {
            Some(index) if session.apply_quick_reply(index) => {
                writeln!(output, "> {}", session.input())?;
            }
            _ => session.set_input(line.as_str()),
        }

        if session.send(backend).await {
            if let Some(turn) = session.turns().last() {
                writeln!(output, "[{}] Guru: {}", turn.time, turn.content)?;
                output.flush()?;
            }
        }
    }

    info!(turns = session.turns().len(), "Chat session finished");
    Ok(session)
}
