use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mailgrab::{Config, Ingestor};

/// Set to `json` for one JSON object per log line.
const LOG_FORMAT_VAR: &str = "MAILGRAB_LOG_FORMAT";

fn setup_logging() {
    // Route `log` records from library modules into tracing.
    let _ = tracing_log::LogTracer::init();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish(),
        )
    };
    if let Err(e) = result {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}

async fn run() -> mailgrab::Result<()> {
    let config = Config::from_env()?;
    info!(
        "Ingesting attachments for {} into {}",
        config.mailbox,
        config.output_directory.display()
    );

    let report = Ingestor::from_config(config)?.run().await?;
    if report.fetch_degraded {
        info!("Message fetch was degraded, cursor left as it was");
    }
    Ok(())
}

fn main() -> ExitCode {
    setup_logging();
    info!("Starting mailgrab v{}", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
