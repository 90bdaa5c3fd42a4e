use std::{future, io};

use aries_client::HttpServiceGateway;
use aries_domain::{
    services::{init_telemetry, TelemetryConfig, TelemetryError},
    ConfigError, GatewayConfig, GatewayError, StoreConfig,
};
use aries_store::ServiceStore;
use thiserror::Error;
use tokio::signal;
use tracing::{info, warn};

use crate::{
    cli::Cli,
    commands::{self, CommandError},
};

pub async fn run(cli: Cli) -> Result<(), BootstrapError> {
    let gateway_config = GatewayConfig::load_from_env()?;
    let store_config = StoreConfig::load_from_env()?;

    let mut telemetry_config = TelemetryConfig::from_env("ARIES");
    if cli.verbose {
        telemetry_config = telemetry_config.with_log_filter("debug");
    }
    let telemetry = init_telemetry(&telemetry_config)?;

    let gateway = HttpServiceGateway::from_config(&gateway_config)?;
    info!(endpoint = %gateway.services_url(), "service registry client ready");
    let store = ServiceStore::new(gateway, store_config);

    let mut stdout = io::stdout();
    let outcome = commands::execute(&store, cli.command, &mut stdout, shutdown_signal()).await;

    if cli.dump_metrics {
        print!("{}", telemetry.render_metrics());
    }

    outcome.map_err(BootstrapError::from)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(%err, "failed to listen for ctrl-c; watch runs until killed");
        future::pending::<()>().await;
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Command(#[from] CommandError),
}
