//! Transport for the GitHub Copilot chat-completions API.
//!
//! Covers credential discovery, the session-token exchange, request payloads and headers, and
//! opening a streamed completion. Decoding and rendering the streamed body is left to the
//! caller.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod token;
pub mod url;

pub use client::{ChatStream, CopilotApiClient};
pub use config::{CopilotApiConfig, HttpOptions};
pub use error::CopilotApiError;
pub use payload::{ChatMessage, ChatRequest, Role};
pub use token::{discover_github_token, SessionToken};
pub use url::{chat_completions_url, token_exchange_url};
