//! Async MQTT client for the Home-Assistant broker.
//!
//! Wraps `rumqttc::AsyncClient`. The event loop is driven by a background
//! task owned by the channel; it tracks whether the broker link is up and
//! counts ConnAcks so callers can tell that a reconnect happened.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS,
};
use secrecy::ExposeSecret;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use e24_protocol::topics::AVAILABILITY_OFFLINE;

use crate::config::MqttConfig;
use crate::error::{ConnectError, PublishError};

/// Pause between reconnect attempts after the broker link fails.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// How long `disconnect` waits for the Disconnect packet to go out.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Bound of the request channel between client and event loop.
const REQUEST_CAPACITY: usize = 64;

// ── Channel trait ─────────────────────────────────────────────

/// Abstraction for MQTT message publishing.
///
/// Enables mocking in tests without a real MQTT broker.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Publish a raw payload to a topic.
    ///
    /// Fails with `PublishError::Disconnected` while the broker is
    /// unreachable. Never retries internally.
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool)
    -> Result<(), PublishError>;

    /// Number of successful broker connections so far. Changes whenever the
    /// link was re-established, which is when retained discovery must be
    /// re-announced.
    fn connection_epoch(&self) -> u64;

    /// Close the broker connection cleanly.
    async fn disconnect(&self) -> Result<(), PublishError>;
}

// ── Link status ───────────────────────────────────────────────

/// Broker link state published by the connection driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStatus {
    pub connected: bool,
    /// Incremented on every ConnAck.
    pub epoch: u64,
    /// Reason of the most recent refusal, cleared on the next ConnAck.
    pub refused: Option<String>,
}

/// Poll the event loop until the client disconnects or is dropped.
async fn drive(mut eventloop: EventLoop, status: watch::Sender<LinkStatus>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                status.send_modify(|s| {
                    s.connected = true;
                    s.epoch += 1;
                    s.refused = None;
                });
                tracing::info!(
                    epoch = status.borrow().epoch,
                    session_present = ack.session_present,
                    "MQTT broker connected"
                );
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                status.send_modify(|s| s.connected = false);
                tracing::debug!("MQTT disconnect sent, stopping driver");
                break;
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                status.send_modify(|s| s.connected = false);
                break;
            }
            Err(ConnectionError::ConnectionRefused(code)) => {
                let reason = format!("{code:?}");
                tracing::warn!(reason = %reason, "MQTT broker refused connection, retrying in 5s");
                status.send_modify(|s| {
                    s.connected = false;
                    s.refused = Some(reason);
                });
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
            Err(e) => {
                if status.borrow().connected {
                    tracing::warn!(error = %e, "MQTT connection lost, reconnecting in 5s");
                } else {
                    tracing::debug!(error = %e, "MQTT broker unreachable, retrying in 5s");
                }
                status.send_modify(|s| s.connected = false);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

// ── MqttChannel ───────────────────────────────────────────────

/// MQTT channel to a plain-TCP broker.
///
/// Owns the `AsyncClient` and the task driving its event loop. The task is
/// aborted when the channel is dropped.
pub struct MqttChannel {
    client: AsyncClient,
    status: watch::Receiver<LinkStatus>,
    driver: JoinHandle<()>,
}

impl MqttChannel {
    /// Build the client and start the connection driver without waiting for
    /// the broker.
    pub fn spawn(config: &MqttConfig) -> Result<Self, ConnectError> {
        let options = mqtt_options(config)?;
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (tx, rx) = watch::channel(LinkStatus::default());
        let driver = tokio::spawn(drive(eventloop, tx));

        Ok(Self {
            client,
            status: rx,
            driver,
        })
    }

    /// Connect and wait for the broker to accept the session.
    pub async fn connect(config: &MqttConfig) -> Result<Self, ConnectError> {
        let channel = Self::spawn(config)?;
        let secs = config.connect_timeout_secs;
        let mut status = channel.status.clone();

        let outcome = tokio::time::timeout(
            Duration::from_secs(secs),
            status.wait_for(|s| s.connected || s.refused.is_some()),
        )
        .await
        .map(|waited| waited.map(|link| (*link).clone()));

        match outcome {
            Ok(Ok(link)) if link.connected => {}
            Ok(Ok(link)) => {
                return Err(ConnectError::Refused(link.refused.unwrap_or_default()));
            }
            Ok(Err(_)) => return Err(ConnectError::Client("connection driver stopped".into())),
            Err(_) => return Err(ConnectError::Timeout { secs }),
        }

        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            client_id = %config.client_id,
            "MQTT channel ready"
        );
        Ok(channel)
    }

    /// Current broker link state.
    pub fn status(&self) -> LinkStatus {
        self.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().connected
    }
}

impl Drop for MqttChannel {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

fn mqtt_options(config: &MqttConfig) -> Result<MqttOptions, ConnectError> {
    // rumqttc panics on these ids.
    if config.client_id.is_empty() || config.client_id.starts_with(' ') {
        return Err(ConnectError::Client(format!(
            "invalid client id {:?}",
            config.client_id
        )));
    }
    if config.broker_host.trim().is_empty() {
        return Err(ConnectError::Client("broker host is empty".into()));
    }

    let mut options = MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
    options.set_keep_alive(Duration::from_secs(config.keepalive_secs.max(5).into()));

    if let Some(username) = &config.username {
        let password = config
            .password
            .as_ref()
            .map(|p| p.expose_secret().to_string())
            .unwrap_or_default();
        options.set_credentials(username, password);
    }

    if let Some(topic) = &config.availability_topic {
        options.set_last_will(LastWill::new(
            topic,
            AVAILABILITY_OFFLINE,
            QoS::AtLeastOnce,
            true,
        ));
    }

    Ok(options)
}

#[async_trait]
impl Channel for MqttChannel {
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), PublishError> {
        if !self.is_connected() {
            return Err(PublishError::Disconnected);
        }
        // A full request queue means the driver is stalled on a dead link.
        self.client
            .try_publish(topic, qos, retain, payload)
            .map_err(|e| {
                tracing::debug!(error = %e, topic, "MQTT publish request rejected");
                PublishError::Disconnected
            })
    }

    fn connection_epoch(&self) -> u64 {
        self.status.borrow().epoch
    }

    async fn disconnect(&self) -> Result<(), PublishError> {
        self.client.disconnect().await.map_err(|e| {
            tracing::debug!(error = %e, "MQTT disconnect request rejected");
            PublishError::Disconnected
        })?;

        let mut status = self.status.clone();
        // Best effort: the driver flags the link down once the packet is out.
        let _ = tokio::time::timeout(DISCONNECT_GRACE, status.wait_for(|s| !s.connected)).await;
        Ok(())
    }
}
