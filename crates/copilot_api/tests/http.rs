use std::time::Duration;

use copilot_api::{ChatRequest, CopilotApiClient, CopilotApiConfig, SessionToken};

#[test]
fn chat_request_posts_json_to_completions_endpoint() {
    let config = CopilotApiConfig::default().with_base_url("http://127.0.0.1:9/");
    let client = CopilotApiClient::new(config).expect("client");
    let request = ChatRequest::user("gpt-4o", "hi");

    let http_request = client
        .build_chat_request(&SessionToken::new("tid"), &request, Duration::from_secs(5))
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(http_request.method(), "POST");
    assert_eq!(
        http_request.url().as_str(),
        "http://127.0.0.1:9/chat/completions"
    );
    assert_eq!(http_request.timeout(), Some(&Duration::from_secs(5)));
    assert_eq!(
        http_request.headers()["accept"].to_str().unwrap(),
        "text/event-stream"
    );
    assert!(http_request.headers()["authorization"].is_sensitive());

    let body = http_request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("buffered body");
    let value: serde_json::Value = serde_json::from_slice(body).expect("json body");
    assert_eq!(value["stream"], true);
}

#[test]
fn token_request_gets_exchange_endpoint_with_short_timeout() {
    let config = CopilotApiConfig::default().with_github_api_url("http://127.0.0.1:9");
    let client = CopilotApiClient::new(config).expect("client");

    let http_request = client
        .build_token_request("gho_abc")
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(http_request.method(), "GET");
    assert_eq!(
        http_request.url().as_str(),
        "http://127.0.0.1:9/copilot_internal/v2/token"
    );
    assert_eq!(http_request.timeout(), Some(&Duration::from_secs(10)));
}
