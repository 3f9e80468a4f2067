use std::process::ExitCode;

use copilot_cli::app;
use copilot_stream::logging::init_tracing;
use copilot_stream::EnvConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let env = EnvConfig::from_env();
    init_tracing(env.log_filter.as_deref());

    match app::run(std::env::args().skip(1).collect(), env).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "invocation failed");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
