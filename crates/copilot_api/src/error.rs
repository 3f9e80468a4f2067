use std::path::PathBuf;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CopilotApiError {
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API request failed with status {}: {message}", status.as_u16())]
    Status { status: StatusCode, message: String },
    #[error("GitHub token not found in environment or config files")]
    MissingToken,
    #[error("failed to read token file {}: {message}", path.display())]
    TokenFile { path: PathBuf, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid header {name}")]
    InvalidHeader { name: String },
    #[error("request was cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl CopilotApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(error) => error.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Object { message: Option<String> },
    Text(String),
}

/// User-facing message for a failed response: `error.message`, a string `error`, or a
/// top-level `message`; otherwise the raw body, then the status reason.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    let parsed = serde_json::from_str::<ErrorPayload>(body).ok();
    let explicit = parsed.and_then(|payload| {
        let nested = match payload.error {
            Some(ErrorBody::Object { message }) => message,
            Some(ErrorBody::Text(text)) => Some(text),
            None => None,
        };
        nested
            .or(payload.message)
            .filter(|message| !message.trim().is_empty())
    });

    if let Some(message) = explicit {
        return message;
    }
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
