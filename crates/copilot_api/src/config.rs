use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::{DEFAULT_BASE_URL, DEFAULT_GITHUB_API_URL};

pub const DEFAULT_EDITOR_VERSION: &str = "vscode/1.100.2";
pub const DEFAULT_INTEGRATION_ID: &str = "vscode-chat";

/// Connection settings for the shared HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    /// How long an idle pooled connection is kept.
    pub idle_conn_timeout: Duration,
    /// TCP connect timeout.
    pub dial_timeout: Duration,
    /// TCP keepalive interval.
    pub keep_alive: Duration,
    /// Request timeout applied when the caller has no deadline.
    pub request_timeout: Duration,
    pub max_idle_conns_per_host: usize,
    /// Disables connection reuse entirely.
    pub disable_keep_alives: bool,
    /// Offer HTTP/2 during TLS negotiation. When false, only HTTP/1.1 is used.
    pub force_http2: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            idle_conn_timeout: Duration::from_secs(90),
            dial_timeout: Duration::from_secs(30),
            keep_alive: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            max_idle_conns_per_host: 100,
            disable_keep_alives: false,
            force_http2: true,
        }
    }
}

/// Transport configuration for Copilot API requests.
#[derive(Debug, Clone)]
pub struct CopilotApiConfig {
    /// Base URL for the chat-completions endpoint.
    pub base_url: String,
    /// Base URL of the GitHub API used for the token exchange.
    pub github_api_url: String,
    /// Sent as `Editor-Version`.
    pub editor_version: String,
    /// Sent as `Copilot-Integration-Id`.
    pub integration_id: String,
    /// Optional `User-Agent` header.
    pub user_agent: Option<String>,
    /// Additional headers merged into every request.
    pub extra_headers: BTreeMap<String, String>,
    /// Timeout for the token exchange request.
    pub token_timeout: Duration,
    pub http: HttpOptions,
}

impl Default for CopilotApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            editor_version: DEFAULT_EDITOR_VERSION.to_string(),
            integration_id: DEFAULT_INTEGRATION_ID.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            token_timeout: Duration::from_secs(10),
            http: HttpOptions::default(),
        }
    }
}

impl CopilotApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_github_api_url(mut self, github_api_url: impl Into<String>) -> Self {
        self.github_api_url = github_api_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_token_timeout(mut self, timeout: Duration) -> Self {
        self.token_timeout = timeout;
        self
    }

    pub fn with_http(mut self, http: HttpOptions) -> Self {
        self.http = http;
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
