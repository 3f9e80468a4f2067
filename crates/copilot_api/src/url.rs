/// Default base URL for chat-completion requests.
pub const DEFAULT_BASE_URL: &str = "https://api.githubcopilot.com";
/// Default GitHub API base URL for the token exchange.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const TOKEN_EXCHANGE_PATH: &str = "/copilot_internal/v2/token";

/// Chat-completions endpoint for `base`. A blank base falls back to [`DEFAULT_BASE_URL`]; a
/// base that already names the endpoint is kept as is.
pub fn chat_completions_url(base: &str) -> String {
    join_endpoint(base, DEFAULT_BASE_URL, CHAT_COMPLETIONS_PATH)
}

/// Token-exchange endpoint for `github_api`, normalized the same way.
pub fn token_exchange_url(github_api: &str) -> String {
    join_endpoint(github_api, DEFAULT_GITHUB_API_URL, TOKEN_EXCHANGE_PATH)
}

fn join_endpoint(base: &str, default: &str, path: &str) -> String {
    let base = if base.trim().is_empty() {
        default
    } else {
        base.trim()
    };
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(path) {
        return trimmed.to_string();
    }
    format!("{trimmed}{path}")
}
