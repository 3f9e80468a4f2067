use std::io::{self, Write};
use std::time::Instant;

use copilot_api::{
    discover_github_token, ChatRequest, CopilotApiClient, CopilotApiConfig, CopilotApiError,
};
use copilot_stream::platform::terminal::{stdin_is_tty, stdout_is_tty, terminal_columns};
use copilot_stream::{
    run_pipeline, CancelReason, CancelSignal, EnvConfig, MarkdownRenderer, MarkdownTheme,
    StreamError, TerminalRenderer,
};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::args::{ArgsError, Arguments, Flags, USAGE};
use crate::config::{self, Config, ConfigError, RenderConfig, RenderFormat};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Args(#[from] ArgsError),
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),
    #[error(transparent)]
    Api(#[from] CopilotApiError),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Runs one invocation: parse, load config, ask, render.
pub async fn run(argv: Vec<String>, env: EnvConfig) -> Result<(), AppError> {
    let flags = Flags::parse(argv)?;
    if flags.help {
        print!("{USAGE}");
        return Ok(());
    }

    let config = config::load().await?;
    let stdout_tty = stdout_is_tty();
    let piped = if stdin_is_tty() {
        None
    } else {
        Some(read_piped_stdin().await?)
    };
    let plain_default =
        config.render.format == RenderFormat::Plain || env.prefers_plain_output(stdout_tty);
    let args = Arguments::resolve(flags, piped.as_deref(), &config, plain_default)?;
    tracing::debug!(
        model = %args.model,
        command = ?args.command,
        plain = args.plain,
        "resolved arguments"
    );

    let cancel = CancelSignal::new();
    let timeout = config.context_timeout();
    let deadline = Instant::now() + timeout;
    let deadline_task = cancel.arm_deadline(timeout);
    let interrupt_task = watch_interrupt(cancel.clone());

    let result = ask(&config, &args, stdout_tty, &cancel, deadline).await;

    deadline_task.abort();
    interrupt_task.abort();
    result
}

/// Exchanges credentials, opens the completion stream and renders it to stdout.
pub async fn ask(
    config: &Config,
    args: &Arguments,
    stdout_tty: bool,
    cancel: &CancelSignal,
    deadline: Instant,
) -> Result<(), AppError> {
    let client = CopilotApiClient::new(api_config(config))?;
    let github_token = discover_github_token()?;
    let session = client
        .exchange_token(&github_token, cancel.token(), Some(deadline))
        .await?;

    let request = ChatRequest::new(args.model.clone(), args.messages());
    let body = client
        .open_chat_stream(&session, &request, cancel.token(), Some(deadline))
        .await?;

    let mut renderer = build_renderer(io::stdout(), &config.render, args.plain, stdout_tty)?;
    run_pipeline(body, &mut renderer, cancel).await?;
    Ok(())
}

pub fn api_config(config: &Config) -> CopilotApiConfig {
    CopilotApiConfig::default()
        .with_user_agent(concat!("gh-copilot/", env!("CARGO_PKG_VERSION")))
        .with_http(config.http.to_options())
}

/// Plain renderer, or a markdown renderer themed and wrapped per `render`.
pub fn build_renderer<W: Write>(
    out: W,
    render: &RenderConfig,
    plain: bool,
    stdout_tty: bool,
) -> Result<TerminalRenderer<W>, AppError> {
    if plain {
        return Ok(TerminalRenderer::plain(out));
    }
    let theme = MarkdownTheme::named(render.theme_name()?, stdout_tty);
    let markdown = MarkdownRenderer::new(theme)
        .with_wrap_width(render.effective_wrap_width(terminal_columns()));
    Ok(TerminalRenderer::styled(out, markdown))
}

async fn read_piped_stdin() -> Result<String, AppError> {
    let mut raw = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut raw)
        .await
        .map_err(AppError::Stdin)?;
    Ok(String::from_utf8_lossy(&raw).trim().to_string())
}

fn watch_interrupt(cancel: CancelSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    tracing::debug!("interrupt received");
                    cancel.cancel_with(CancelReason::Interrupted);
                }
            }
            _ = cancel.token().cancelled() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{build_renderer, AppError};
    use crate::args::ArgsError;
    use crate::config::{ConfigError, RenderConfig};
    use copilot_stream::{CancelReason, StreamError};

    #[test]
    fn plain_renderer_writes_verbatim() {
        let mut renderer =
            build_renderer(Vec::new(), &RenderConfig::default(), true, false).unwrap();
        renderer.push("**raw**\n\nnext").unwrap();
        renderer.finish().unwrap();
        assert_eq!(renderer.get_ref().as_slice(), b"**raw**\n\nnext\n");
    }

    #[test]
    fn styled_renderer_formats_markdown() {
        let render = RenderConfig {
            theme: "notty".to_string(),
            ..RenderConfig::default()
        };
        let mut renderer = build_renderer(Vec::new(), &render, false, false).unwrap();
        renderer.push("Some **bold** text.\n\n").unwrap();
        renderer.finish().unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(output.contains("bold"));
        assert!(!output.contains("**"));
    }

    #[test]
    fn unknown_theme_is_a_config_error() {
        let render = RenderConfig {
            theme: "solarized".to_string(),
            ..RenderConfig::default()
        };
        let err = match build_renderer(Vec::new(), &render, false, true) {
            Ok(_) => panic!("unknown theme should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, AppError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn errors_display_their_cause() {
        assert_eq!(
            AppError::from(ArgsError::NoPrompt).to_string(),
            "no prompt or command provided"
        );
        assert_eq!(
            AppError::from(StreamError::Cancelled(CancelReason::DeadlineExceeded)).to_string(),
            "deadline exceeded"
        );
    }
}
