// Environment-backed settings and the fixed strings shown to users.

use std::env;

// Use lazy_static to initialize static variables safely.
lazy_static::lazy_static! {
    /// Server-side secret used by `POST /api/chat`.
    pub static ref GOOGLE_API_KEY: String = env::var("GOOGLE_API_KEY").unwrap_or_default();
    /// Key held by the client in direct mode. Anything holding it can spend the quota.
    pub static ref GEMINI_CLIENT_KEY: String = env::var("GEMINI_CLIENT_KEY").unwrap_or_default();
    pub static ref GEMINI_MODEL: String = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());
    pub static ref GEMINI_BASE_URL: String = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
}

pub const DEFAULT_PORT: u16 = 9900;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Reply when the model's output is not the requested JSON.
pub const PARSE_FALLBACK_TEXT: &str = "Sorry, try again!";
/// Reply when the provider could not be reached at all.
pub const UNAVAILABLE_TEXT: &str = "AI unavailable. Check key & internet.";
/// Direct mode: provider answered without any candidate text.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "Let me check...";
/// Direct mode: the request itself failed.
pub const NETWORK_ERROR_TEXT: &str = "Network error.";

pub const QUICK_REPLIES: [&str; 3] = ["iPhone under ₹50k", "Best camera", "Gaming phone"];
