mod config;

use clap::{Parser, Subcommand};
use config::{Config, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(version, about = "Survey authoring, collection and analytics service")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, default_value = "surveyx.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the API and admin listeners
    Serve,
    /// Load and validate the config, then exit
    CheckConfig,
}

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
    #[error("webhooks error: {0}")]
    Webhooks(#[from] webhooks::WebhookError),
    #[error("server error: {0}")]
    Server(#[from] api::ServerError),
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", cli.config.display());
            process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("{}: invalid config: {e}", cli.config.display());
        process::exit(1);
    }

    match cli.command {
        CliCommand::CheckConfig => {
            println!("{}: ok", cli.config.display());
        }
        CliCommand::Serve => {
            let _sentry = init_logging(config.common.logging.as_ref());
            if let Some(metrics) = &config.common.metrics {
                init_metrics(metrics);
            }

            if let Err(e) = serve(config) {
                tracing::error!(error = %e, "Exiting");
                eprintln!("surveyx failed: {e}");
                process::exit(1);
            }
        }
    }
}

/// The returned guard flushes pending sentry events when dropped.
fn init_logging(logging: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let guard = logging.map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(sentry::integrations::tracing::layer())
        .init();

    guard
}

fn init_metrics(metrics: &MetricsConfig) {
    let recorder = match StatsdBuilder::from(metrics.statsd_host.as_str(), metrics.statsd_port)
        .build(Some("surveyx"))
    {
        Ok(recorder) => recorder,
        Err(e) => {
            tracing::warn!(error = %e, "Could not build statsd recorder, metrics disabled");
            return;
        }
    };

    if let Err(e) = metrics::set_global_recorder(recorder) {
        tracing::warn!(error = %e, "Metrics recorder already installed");
        return;
    }

    for defs in [
        surveys::metrics_defs::ALL_METRICS,
        webhooks::metrics_defs::ALL_METRICS,
        api::metrics_defs::ALL_METRICS,
    ] {
        shared::metrics_defs::describe_all(defs);
    }
    tracing::info!(
        host = %metrics.statsd_host,
        port = metrics.statsd_port,
        "Sending metrics to statsd"
    );
}

fn serve(config: Config) -> Result<(), StartupError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let store = store::connect(&config.store).await?;
        let state = api::AppState::new(store, &config.webhooks)?;

        tracing::info!(store = ?config.store, "Starting surveyx");
        api::run(config.api, state).await?;
        Ok::<_, StartupError>(())
    })
}
