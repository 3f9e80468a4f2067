use copilot_api::{chat_completions_url, token_exchange_url};

#[test]
fn chat_url_appends_endpoint_to_base() {
    assert_eq!(
        chat_completions_url("https://api.githubcopilot.com/"),
        "https://api.githubcopilot.com/chat/completions"
    );
}

#[test]
fn chat_url_keeps_existing_endpoint() {
    assert_eq!(
        chat_completions_url("http://127.0.0.1:8080/chat/completions"),
        "http://127.0.0.1:8080/chat/completions"
    );
}

#[test]
fn blank_bases_use_defaults() {
    assert_eq!(
        chat_completions_url("  "),
        "https://api.githubcopilot.com/chat/completions"
    );
    assert_eq!(
        token_exchange_url(""),
        "https://api.github.com/copilot_internal/v2/token"
    );
}
