use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use clap_serde_derive::ClapSerde;
use tokio::net::TcpListener;
use tracing::{error, info};

use salary_predictor::api::{self, AppState};
use salary_predictor::config::{Config, DEFAULT_CONFIG_FILE};
use salary_predictor::pipeline::loader::load_model;
use salary_predictor::telemetry::init_telemetry;

#[cfg(unix)]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env, default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,

    /// Configuration options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match Config::from_toml(&args.config_file) {
        Ok(conf) => conf.merge(args.opt_config),
        // A missing default file is fine, an explicitly requested one is not
        Err(_) if args.config_file == DEFAULT_CONFIG_FILE => {
            Config::default().merge(args.opt_config)
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("Failed to read configuration file {}", args.config_file)
            })
        }
    };

    let telemetry = init_telemetry(config.otel_endpoint(), config.console)?;

    let model = load_model(Path::new(&config.model_path));
    let router = api::router(AppState::new(model, &config.template_path));

    let listener = TcpListener::bind(format!("{}:{}", config.address, config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
