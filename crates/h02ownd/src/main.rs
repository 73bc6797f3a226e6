//! h02ownd - H02 GPS tracker to Owntracks MQTT gateway
//!
//! Usage:
//!   h02ownd [-c <config.yaml>] [--verbose] [--debug]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use h02own_core::Gateway;
use h02own_mqtt::{MqttBus, MqttError};
use h02ownd::config::{GatewayConfig, DEFAULT_CONFIG_PATH};
use h02ownd::listener;
use h02ownd::logging::{self, Verbosity};
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

/// Time the MQTT event loop gets to send DISCONNECT on shutdown
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "h02ownd")]
#[command(version, about = "Forward H02 GPS tracker reports to MQTT as Owntracks locations")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "H02OWN_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Debug logging for the gateway
    #[arg(long)]
    verbose: bool,

    /// Trace logging, including frame contents
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = GatewayConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    logging::init(Verbosity::from_flags(cli.verbose, cli.debug));

    tracing::info!(
        config = %cli.config.display(),
        devices = config.devices.len(),
        ignition_bit = ?config.ignition_bit,
        "Starting h02ownd"
    );

    let (bus, connection) = MqttBus::connect(&config.mqtt_settings())
        .await
        .context("MQTT Error")?;

    let gateway = Gateway::new(
        Arc::new(config.device_table()),
        Arc::new(bus.clone()),
        config.gateway_options(),
    );

    let addr = config.listen_addr();
    let tcp = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to listen on {}", addr))?;

    let shutdown = CancellationToken::new();
    let server = tokio::spawn(listener::serve(tcp, gateway, shutdown.clone()));
    let mut mqtt = tokio::spawn(connection.run());

    let result = tokio::select! {
        joined = &mut mqtt => Err(connection_lost(joined)),
        signal = tokio::signal::ctrl_c() => signal.context("Failed to listen for shutdown signal"),
    };

    // stop taking frames before the session goes away
    shutdown.cancel();
    if let Err(e) = server.await {
        tracing::warn!(error = %e, "Listener task ended abnormally");
    }

    if !mqtt.is_finished() {
        tracing::info!("Shutting down");
        bus.disconnect().await;
        match tokio::time::timeout(DISCONNECT_GRACE, &mut mqtt).await {
            Ok(_) => tracing::debug!("MQTT session closed"),
            Err(_) => {
                tracing::warn!(grace = ?DISCONNECT_GRACE, "MQTT disconnect not flushed in time");
                mqtt.abort();
            }
        }
    }

    result
}

fn connection_lost(joined: Result<Result<(), MqttError>, JoinError>) -> anyhow::Error {
    match joined {
        Ok(Ok(())) => anyhow::anyhow!("MQTT connection closed"),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "MQTT connection lost");
            anyhow::Error::new(e).context("MQTT connection lost")
        }
        Err(e) => anyhow::Error::new(e).context("MQTT connection task failed"),
    }
}
