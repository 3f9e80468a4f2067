//! GitHub credential discovery and the Copilot session token.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::CopilotApiError;

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const CODESPACES_ENV: &str = "CODESPACES";

const COPILOT_DIR: &str = "github-copilot";
const TOKEN_FILES: [&str; 2] = ["hosts.json", "apps.json"];

/// Short-lived token returned by the exchange endpoint, sent as a bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    token: String,
    expires_at: Option<i64>,
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Parses the exchange response body. An absent or empty token is an error.
    pub fn from_response_body(body: &str) -> Result<Self, CopilotApiError> {
        let response: TokenResponse = serde_json::from_str(body).map_err(|err| {
            CopilotApiError::InvalidResponse(format!("failed to decode token response: {err}"))
        })?;
        let token = response
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                CopilotApiError::InvalidResponse("received empty token in response".to_owned())
            })?;
        Ok(Self {
            token,
            expires_at: response.expires_at,
        })
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// `Authorization` header value.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Where a GitHub OAuth token may come from.
#[derive(Debug, Clone, Default)]
pub struct TokenSources {
    pub codespaces: bool,
    pub github_token: Option<String>,
    pub config_dir: Option<PathBuf>,
}

impl TokenSources {
    pub fn from_env() -> Self {
        Self {
            codespaces: env::var_os(CODESPACES_ENV).is_some_and(|value| !value.is_empty()),
            github_token: env::var(GITHUB_TOKEN_ENV).ok(),
            config_dir: copilot_config_dir(),
        }
    }

    /// `GITHUB_TOKEN` inside Codespaces, else the first `github.com` entry of the Copilot
    /// `hosts.json` or `apps.json`.
    pub fn discover(&self) -> Result<String, CopilotApiError> {
        if self.codespaces {
            if let Some(token) = self
                .github_token
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty())
            {
                tracing::debug!(source = GITHUB_TOKEN_ENV, "using GitHub token");
                return Ok(token.to_owned());
            }
        }

        let Some(dir) = &self.config_dir else {
            return Err(CopilotApiError::MissingToken);
        };
        read_token_from_dir(dir)?.ok_or(CopilotApiError::MissingToken)
    }
}

pub fn discover_github_token() -> Result<String, CopilotApiError> {
    TokenSources::from_env().discover()
}

/// Searches `<config_dir>/github-copilot/{hosts,apps}.json` in that order.
///
/// Missing files are skipped. A file that exists but cannot be read or parsed is reported only
/// when no other file yields a token.
pub fn read_token_from_dir(config_dir: &Path) -> Result<Option<String>, CopilotApiError> {
    let mut failure = None;
    for name in TOKEN_FILES {
        let path = config_dir.join(COPILOT_DIR).join(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                failure = Some(token_file_error(path, err.to_string()));
                continue;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(hosts) => {
                if let Some(token) = extract_oauth_token(&hosts) {
                    tracing::debug!(path = %path.display(), "using GitHub token from config file");
                    return Ok(Some(token));
                }
            }
            Err(err) => failure = Some(token_file_error(path, err.to_string())),
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(None),
    }
}

fn token_file_error(path: PathBuf, message: String) -> CopilotApiError {
    CopilotApiError::TokenFile { path, message }
}

/// `oauth_token` of the first host entry whose key contains `github.com`.
pub fn extract_oauth_token(hosts: &Value) -> Option<String> {
    hosts
        .as_object()?
        .iter()
        .filter(|(host, _)| host.contains("github.com"))
        .find_map(|(_, entry)| {
            entry
                .get("oauth_token")?
                .as_str()
                .filter(|token| !token.is_empty())
                .map(str::to_owned)
        })
}

/// Directory holding `github-copilot/`: `$XDG_CONFIG_HOME` when it is a directory, the
/// Windows local app-data directory, then `~/.config`.
pub fn copilot_config_dir() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").filter(|value| !value.is_empty()) {
        let path = PathBuf::from(xdg);
        if path.is_dir() {
            return Some(path);
        }
    }

    if cfg!(windows) {
        if let Some(path) = windows_config_dir() {
            return Some(path);
        }
    }

    let path = dirs::home_dir()?.join(".config");
    path.is_dir().then_some(path)
}

fn windows_config_dir() -> Option<PathBuf> {
    if let Some(local) = env::var_os("LOCALAPPDATA")
        .map(PathBuf::from)
        .filter(|path| path.is_dir())
    {
        return Some(local);
    }
    let home = env::var_os("HOME").filter(|value| !value.is_empty())?;
    let path = PathBuf::from(home).join("AppData").join("Local");
    path.is_dir().then_some(path)
}
