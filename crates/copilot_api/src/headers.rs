use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::CopilotApiConfig;
use crate::token::SessionToken;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_EDITOR_VERSION: &str = "editor-version";
pub const HEADER_INTEGRATION_ID: &str = "copilot-integration-id";
pub const HEADER_USER_AGENT: &str = "user-agent";

/// Editor identification, user agent and configured extra headers.
pub fn editor_headers(config: &CopilotApiConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(
        HEADER_EDITOR_VERSION.to_owned(),
        config.editor_version.trim().to_owned(),
    );
    headers.insert(
        HEADER_INTEGRATION_ID.to_owned(),
        config.integration_id.trim().to_owned(),
    );
    if let Some(agent) = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|agent| !agent.is_empty())
    {
        headers.insert(HEADER_USER_AGENT.to_owned(), agent.to_owned());
    }
    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }
    headers
}

/// Headers for exchanging a GitHub OAuth token for a session token.
pub fn token_exchange_headers(
    config: &CopilotApiConfig,
    github_token: &str,
) -> BTreeMap<String, String> {
    let mut headers = editor_headers(config);
    headers.insert(
        HEADER_AUTHORIZATION.to_owned(),
        format!("Token {}", github_token.trim()),
    );
    headers
}

/// Headers for a streamed chat-completion request.
pub fn chat_headers(config: &CopilotApiConfig, session: &SessionToken) -> BTreeMap<String, String> {
    let mut headers = editor_headers(config);
    headers.insert(HEADER_AUTHORIZATION.to_owned(), session.authorization());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );
    headers.insert(HEADER_ACCEPT.to_owned(), "text/event-stream".to_owned());
    headers
}

pub(crate) fn to_header_map(
    headers: BTreeMap<String, String>,
) -> Result<HeaderMap, crate::CopilotApiError> {
    let mut out = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| crate::CopilotApiError::InvalidHeader { name: key.clone() })?;
        let mut value = HeaderValue::from_str(&value)
            .map_err(|_| crate::CopilotApiError::InvalidHeader { name: key.clone() })?;
        if name == reqwest::header::AUTHORIZATION {
            value.set_sensitive(true);
        }
        out.insert(name, value);
    }
    Ok(out)
}
