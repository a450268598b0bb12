//! Mobile Guru: a Gemini-backed shopping assistant over a static phone catalog.
//!
//! The server path (`web_server`) builds a JSON-mode prompt, interprets the
//! reply as an [`envelope::Envelope`] and falls back to canned replies when the
//! model or the network misbehaves. The direct path (`direct`) asks for
//! markdown instead, which [`render`] turns into sanitized HTML.

pub mod catalog;
pub mod chat;
pub mod constants;
pub mod direct;
pub mod envelope;
pub mod llm_interaction;
pub mod prompt;
pub mod render;
pub mod web_server;
