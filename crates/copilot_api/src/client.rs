use std::future::Future;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use tokio_util::sync::CancellationToken;

use crate::config::{CopilotApiConfig, HttpOptions};
use crate::error::{parse_error_message, CopilotApiError};
use crate::headers::{chat_headers, to_header_map, token_exchange_headers};
use crate::payload::ChatRequest;
use crate::token::SessionToken;
use crate::url::{chat_completions_url, token_exchange_url};

/// Response body of a chat completion, as raw byte chunks.
pub type ChatStream = BoxStream<'static, Result<Bytes, CopilotApiError>>;

/// Copilot API client. Owns one connection pool; construct it once per invocation and pass it
/// by reference.
#[derive(Debug)]
pub struct CopilotApiClient {
    http: Client,
    config: CopilotApiConfig,
}

impl CopilotApiClient {
    pub fn new(config: CopilotApiConfig) -> Result<Self, CopilotApiError> {
        let http = build_http_client(&config.http)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CopilotApiConfig {
        &self.config
    }

    pub fn chat_endpoint(&self) -> String {
        chat_completions_url(&self.config.base_url)
    }

    pub fn token_endpoint(&self) -> String {
        token_exchange_url(&self.config.github_api_url)
    }

    pub fn build_token_request(
        &self,
        github_token: &str,
    ) -> Result<RequestBuilder, CopilotApiError> {
        let headers = to_header_map(token_exchange_headers(&self.config, github_token))?;
        Ok(self
            .http
            .get(self.token_endpoint())
            .headers(headers)
            .timeout(self.config.token_timeout))
    }

    pub fn build_chat_request(
        &self,
        session: &SessionToken,
        request: &ChatRequest,
        timeout: Duration,
    ) -> Result<RequestBuilder, CopilotApiError> {
        let headers = to_header_map(chat_headers(&self.config, session))?;
        Ok(self
            .http
            .post(self.chat_endpoint())
            .headers(headers)
            .timeout(timeout)
            .json(request))
    }

    /// Time the chat request may take: what is left until `deadline`, or the configured request
    /// timeout without one.
    pub fn request_timeout(&self, deadline: Option<Instant>) -> Result<Duration, CopilotApiError> {
        let Some(deadline) = deadline else {
            return Ok(self.config.http.request_timeout);
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            Err(CopilotApiError::DeadlineExceeded)
        } else {
            Ok(remaining)
        }
    }

    /// Exchanges a GitHub OAuth token for a Copilot session token.
    pub async fn exchange_token(
        &self,
        github_token: &str,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<SessionToken, CopilotApiError> {
        let request = self.build_token_request(github_token)?;
        tracing::debug!(endpoint = %self.token_endpoint(), "exchanging GitHub token");

        let response = race(request.send(), cancel, deadline)
            .await?
            .map_err(|err| send_error(err, deadline))?;
        let response = ensure_success(response, cancel, deadline).await?;
        let body = race(response.text(), cancel, deadline)
            .await?
            .map_err(CopilotApiError::Http)?;
        SessionToken::from_response_body(&body)
    }

    /// Sends `request` and returns the streamed response body once the status is known.
    ///
    /// The send is raced against `cancel`. The request timeout covers the whole body, so it is
    /// bounded by `deadline` when one is given.
    pub async fn open_chat_stream(
        &self,
        session: &SessionToken,
        request: &ChatRequest,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<ChatStream, CopilotApiError> {
        let timeout = self.request_timeout(deadline)?;
        let builder = self.build_chat_request(session, request, timeout)?;
        tracing::debug!(
            endpoint = %self.chat_endpoint(),
            model = %request.model,
            messages = request.messages.len(),
            "opening chat stream"
        );

        let response = race(builder.send(), cancel, deadline)
            .await?
            .map_err(|err| send_error(err, deadline))?;
        let response = ensure_success(response, cancel, deadline).await?;
        tracing::debug!(status = %response.status(), "chat stream opened");

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(CopilotApiError::Http))
            .boxed())
    }
}

fn build_http_client(options: &HttpOptions) -> Result<Client, CopilotApiError> {
    let max_idle = if options.disable_keep_alives {
        0
    } else {
        options.max_idle_conns_per_host
    };
    let mut builder = Client::builder()
        .pool_idle_timeout(options.idle_conn_timeout)
        .pool_max_idle_per_host(max_idle)
        .connect_timeout(options.dial_timeout)
        .tcp_keepalive(options.keep_alive);
    if !options.force_http2 {
        builder = builder.http1_only();
    }
    Ok(builder.build()?)
}

async fn ensure_success(
    response: Response,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<Response, CopilotApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = race(response.text(), cancel, deadline)
        .await?
        .unwrap_or_default();
    let message = parse_error_message(status, &body);
    tracing::debug!(status = status.as_u16(), %message, "request rejected");
    Err(CopilotApiError::Status { status, message })
}

async fn race<F>(
    future: F,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<F::Output, CopilotApiError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancel_error(deadline)),
        output = future => Ok(output),
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

fn cancel_error(deadline: Option<Instant>) -> CopilotApiError {
    if deadline_passed(deadline) {
        CopilotApiError::DeadlineExceeded
    } else {
        CopilotApiError::Cancelled
    }
}

fn send_error(err: reqwest::Error, deadline: Option<Instant>) -> CopilotApiError {
    if err.is_timeout() && deadline_passed(deadline) {
        CopilotApiError::DeadlineExceeded
    } else {
        CopilotApiError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{cancel_error, CopilotApiClient};
    use crate::{CopilotApiConfig, CopilotApiError, HttpOptions};

    fn client() -> CopilotApiClient {
        CopilotApiClient::new(CopilotApiConfig::default()).expect("client")
    }

    #[test]
    fn request_timeout_defaults_without_deadline() {
        assert_eq!(
            client().request_timeout(None).unwrap(),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn request_timeout_is_bounded_by_deadline() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let timeout = client().request_timeout(Some(deadline)).unwrap();
        assert!(timeout <= Duration::from_secs(5));
        assert!(timeout > Duration::from_secs(4));
    }

    #[test]
    fn elapsed_deadline_fails_before_sending() {
        let deadline = Instant::now() - Duration::from_millis(1);
        assert!(matches!(
            client().request_timeout(Some(deadline)),
            Err(CopilotApiError::DeadlineExceeded)
        ));
    }

    #[test]
    fn cancellation_reason_follows_deadline() {
        assert!(matches!(cancel_error(None), CopilotApiError::Cancelled));
        let past = Instant::now() - Duration::from_millis(1);
        assert!(matches!(
            cancel_error(Some(past)),
            CopilotApiError::DeadlineExceeded
        ));
    }

    #[test]
    fn http1_only_client_builds() {
        let options = HttpOptions {
            force_http2: false,
            disable_keep_alives: true,
            ..HttpOptions::default()
        };
        let config = CopilotApiConfig::default().with_http(options);
        assert!(CopilotApiClient::new(config).is_ok());
    }
}
