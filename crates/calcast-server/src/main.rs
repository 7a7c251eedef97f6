//! calcast entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use calcast_core::tracing::{TracingConfig, TracingOutputFormat, init_tracing};
use calcast_server::{
    Cli, DigestConfig, DigestJob, Scheduler, ServerError, ServerResult, ServerSettings,
    SignalHandler,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Must happen before parsing so `.env` values reach clap's env fallbacks.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "calcast exiting");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), calcast_core::TracingError> {
    let format = match cli.log_format.as_deref() {
        Some(name) => name.parse::<TracingOutputFormat>()?,
        None => TracingOutputFormat::default(),
    };
    let config = if cli.debug {
        TracingConfig::debug()
    } else {
        TracingConfig::service()
    };
    init_tracing(config.with_format(format))
}

async fn run(cli: Cli) -> ServerResult<()> {
    let settings = match cli.config {
        Some(ref path) => ServerSettings::load_from(path)?,
        None => ServerSettings::load()?,
    }
    .merge_cli(&cli);
    let config = DigestConfig::from_settings(&settings, cli.dry_run)?;
    let job = DigestJob::from_config(&config)?;

    info!(
        feed_host = config.feed.url.host_str().unwrap_or_default(),
        day_range = config.day_range,
        timezone = %config.timezone,
        dry_run = cli.dry_run,
        "Configuration loaded"
    );

    if cli.once {
        job.run().await?;
        return Ok(());
    }

    let job = Arc::new(job);
    let scheduler = Scheduler::new(config.schedule.clone());
    let handle = scheduler.handle();
    let scheduler_task = tokio::spawn(scheduler.run(move || {
        let job = job.clone();
        async move { job.run().await.map(|_| ()) }
    }));

    let signals = SignalHandler::new();
    signals.spawn_listener();

    let mut refresh = signals.refresh();
    let refresh_handle = handle.clone();
    tokio::spawn(async move {
        while refresh.next().await {
            if refresh_handle.run_now().await.is_err() {
                break;
            }
        }
    });

    signals.shutdown().wait().await;

    if handle.stop().await.is_err() {
        warn!("Scheduler already stopped");
    }
    scheduler_task
        .await
        .map_err(|e| ServerError::Io(std::io::Error::other(e)))?;

    info!("Shutdown complete");
    Ok(())
}
