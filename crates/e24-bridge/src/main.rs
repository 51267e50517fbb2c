//! econet24 bridge: polls the econet24 portal and publishes the heat pump's
//! readings to MQTT with Home-Assistant discovery.
//!
//! Usage: `econet24-bridge [config.toml]`. Without a path the configuration
//! is read from environment variables (`ECONET24_USERNAME`, `MQTT_HOST`, ...).

use anyhow::{Context, bail};
use tokio::sync::watch;

use e24_bridge::backoff::Backoff;
use e24_bridge::bridge_loop::{BridgeLoop, LoopSettings};
use e24_bridge::config::BridgeConfig;
use e24_bridge::logging;
use e24_mqtt_channel::{ConnectError, MqttChannel, MqttConfig};
use e24_portal::Econet24Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Load config ─────────────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::from_file(&path)?,
        None => BridgeConfig::from_env().context("reading configuration from environment")?,
    };

    logging::init(config.log_level, config.log_format);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mqtt_host = %config.mqtt_host,
        mqtt_port = config.mqtt_port,
        poll_interval_secs = config.poll_interval,
        device_name = config.device_name().unwrap_or("-"),
        "econet24-bridge starting"
    );

    // ── Shutdown signal ─────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // ── MQTT channel ────────────────────────────────────────────
    let Some(channel) = connect_broker(&config.mqtt_config(), shutdown_rx.clone()).await? else {
        tracing::info!("econet24-bridge stopped before connecting");
        return Ok(());
    };

    // ── Portal client ───────────────────────────────────────────
    let portal = Econet24Client::new(config.portal_config());

    // ── Bridge loop ─────────────────────────────────────────────
    let reason = BridgeLoop::new(portal, &channel, LoopSettings::from(&config), shutdown_rx)
        .run()
        .await;

    if reason.is_fatal() {
        tracing::error!(reason = %reason, "econet24-bridge stopped");
        bail!("bridge stopped: {reason}");
    }
    tracing::info!("econet24-bridge stopped");
    Ok(())
}

/// Connect to the broker, retrying with backoff. `None` means shutdown was
/// requested while waiting.
async fn connect_broker(
    config: &MqttConfig,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<Option<MqttChannel>> {
    let mut backoff = Backoff::default();
    loop {
        let err = match MqttChannel::connect(config).await {
            Ok(channel) => return Ok(Some(channel)),
            Err(ConnectError::Client(reason)) => bail!("invalid MQTT configuration: {reason}"),
            Err(e) => e,
        };

        let Some(delay) = backoff.next_delay() else {
            bail!(
                "could not connect to MQTT broker {}:{} after {} attempts: {err}",
                config.broker_host,
                config.broker_port,
                backoff.failures()
            );
        };
        tracing::warn!(
            error = %err,
            attempt = backoff.failures(),
            retry_in_secs = delay.as_secs(),
            "MQTT connect failed, retrying"
        );

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            Ok(_) = shutdown.wait_for(|stop| *stop) => return Ok(None),
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM, only Ctrl-C stops the bridge");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
