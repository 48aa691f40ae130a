//! Shot detection runner binary.

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rally_worker::{render, run, RunRequest, RunnerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("rally=info".parse()?);

    // Logs go to stderr so stdout carries only the report
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let config = RunnerConfig::from_env();
    info!("Runner config: {:?}", config);

    let request = RunRequest::from_args(std::env::args().skip(1))?;

    let report = match run(&config, &request).await {
        Ok(report) => report,
        Err(e) => {
            error!(key = %request.cache_key, "Shot analysis failed: {:#}", e);
            return Err(e);
        }
    };

    let output = render(&report, config.fps)?;
    let text = serde_json::to_string_pretty(&output).context("Failed to format report")?;
    println!("{}", text);

    info!(
        key = %request.cache_key,
        shots = report.shots.len(),
        "Shot analysis finished"
    );
    Ok(())
}
