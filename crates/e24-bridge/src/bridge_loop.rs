//! The polling loop: authenticate, fetch, map, publish.
//!
//! Runs as an explicit state machine so every recovery path can be driven
//! step by step in tests:
//!
//! ```text
//! Starting ─► Authenticated ─► Polling ⇄ Recovering
//!     │                           │           │
//!     └───────────────────────────┴───────────┴─► Stopped
//! ```
//!
//! Only invalid credentials, exhausted startup retries and shutdown reach
//! `Stopped`. A failed poll cycle is logged and retried on the next tick.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use e24_mqtt_channel::{Channel, PublishError, SensorPublisher};
use e24_portal::{AuthError, FetchError, PortalClient, Session};
use e24_protocol::topics::TopicPrefixes;
use e24_protocol::{DeviceIdentity, DevicePayload};
use e24_sensors::SensorMapper;

use crate::backoff::Backoff;
use crate::config::BridgeConfig;

/// Why the loop reached `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The portal rejected the configured username or password.
    InvalidCredentials,
    /// Login kept failing at startup until the backoff gave up.
    RetriesExhausted,
    /// A shutdown signal was received.
    Shutdown,
}

impl StopReason {
    /// Whether the process should exit with a failure status.
    pub fn is_fatal(self) -> bool {
        !matches!(self, StopReason::Shutdown)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::InvalidCredentials => "invalid econet24 credentials",
            StopReason::RetriesExhausted => "econet24 login retries exhausted",
            StopReason::Shutdown => "shutdown requested",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Starting,
    Authenticated,
    Polling,
    Recovering,
    Stopped(StopReason),
}

impl BridgeState {
    fn name(self) -> &'static str {
        match self {
            BridgeState::Starting => "STARTING",
            BridgeState::Authenticated => "AUTHENTICATED",
            BridgeState::Polling => "POLLING",
            BridgeState::Recovering => "RECOVERING",
            BridgeState::Stopped(_) => "STOPPED",
        }
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The parts of `BridgeConfig` the loop itself needs.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub prefixes: TopicPrefixes,
    pub device_name: Option<String>,
    pub poll_interval: Duration,
}

impl From<&BridgeConfig> for LoopSettings {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            prefixes: config.topic_prefixes(),
            device_name: config.device_name.clone(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Drives one portal account's controller onto one MQTT channel.
pub struct BridgeLoop<'a, P: PortalClient, C: Channel> {
    portal: P,
    channel: &'a C,
    settings: LoopSettings,
    backoff: Backoff,
    shutdown: watch::Receiver<bool>,
    state: BridgeState,
    session: Option<Session>,
    mapper: Option<SensorMapper>,
    /// Connection epoch discovery was last announced on.
    announced_epoch: Option<u64>,
}

impl<'a, P: PortalClient, C: Channel> BridgeLoop<'a, P, C> {
    pub fn new(
        portal: P,
        channel: &'a C,
        settings: LoopSettings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            portal,
            channel,
            settings,
            backoff: Backoff::default(),
            shutdown,
            state: BridgeState::Starting,
            session: None,
            mapper: None,
            announced_epoch: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Identity of the controller being bridged, once logged in.
    pub fn device(&self) -> Option<&DeviceIdentity> {
        self.mapper.as_ref().map(SensorMapper::device)
    }

    /// Run until the loop stops, then mark the bridge offline and close the
    /// broker connection.
    pub async fn run(mut self) -> StopReason {
        tracing::info!(
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            "bridge loop starting"
        );
        let reason = loop {
            if let BridgeState::Stopped(reason) = self.step().await {
                break reason;
            }
        };
        self.close().await;
        reason
    }

    /// Execute the current state once and move to the next.
    pub async fn step(&mut self) -> BridgeState {
        let next = if self.shutdown_requested() {
            BridgeState::Stopped(StopReason::Shutdown)
        } else {
            match self.state {
                BridgeState::Starting => self.start().await,
                BridgeState::Authenticated => self.announce().await,
                BridgeState::Polling => self.poll().await,
                BridgeState::Recovering => self.recover().await,
                BridgeState::Stopped(reason) => BridgeState::Stopped(reason),
            }
        };

        if next != self.state {
            match next {
                BridgeState::Stopped(reason) => {
                    tracing::info!(from = %self.state, to = %next, reason = %reason, "bridge state changed");
                }
                _ => tracing::info!(from = %self.state, to = %next, "bridge state changed"),
            }
        }
        self.state = next;
        next
    }

    // ── States ──────────────────────────────────────────────────

    async fn start(&mut self) -> BridgeState {
        match self.portal.authenticate().await {
            Ok(session) => {
                self.install_session(session);
                BridgeState::Authenticated
            }
            Err(AuthError::InvalidCredentials(reason)) => {
                tracing::error!(reason = %reason, "econet24 rejected the configured credentials, check econet24_username and econet24_password");
                BridgeState::Stopped(StopReason::InvalidCredentials)
            }
            Err(AuthError::Transient(reason)) => match self.backoff.next_delay() {
                Some(delay) => {
                    tracing::warn!(
                        reason = %reason,
                        attempt = self.backoff.failures(),
                        retry_in_secs = delay.as_secs(),
                        "econet24 login failed, retrying"
                    );
                    if self.pause(delay).await {
                        return BridgeState::Stopped(StopReason::Shutdown);
                    }
                    BridgeState::Starting
                }
                None => {
                    tracing::error!(
                        reason = %reason,
                        attempts = self.backoff.failures(),
                        "econet24 login failed, giving up"
                    );
                    BridgeState::Stopped(StopReason::RetriesExhausted)
                }
            },
        }
    }

    async fn announce(&mut self) -> BridgeState {
        if let Err(e) = self.ensure_announced().await {
            tracing::warn!(error = %e, "discovery not published, will retry next cycle");
        }
        BridgeState::Polling
    }

    async fn poll(&mut self) -> BridgeState {
        let session = match &self.session {
            Some(session) if session.is_stale(Utc::now()) => {
                tracing::info!(
                    established_at = %session.established_at,
                    "econet24 session due for renewal"
                );
                return BridgeState::Recovering;
            }
            Some(session) => session,
            None => return BridgeState::Recovering,
        };

        let fetched = self.portal.fetch_device_state(session).await;
        match fetched {
            Ok(payload) => self.publish_snapshot(&payload).await,
            Err(FetchError::SessionExpired) => {
                tracing::warn!("econet24 session expired");
                self.session = None;
                return BridgeState::Recovering;
            }
            Err(FetchError::Transient(reason)) => {
                tracing::warn!(reason = %reason, "fetching device state failed, skipping cycle");
            }
        }

        self.wait_for_tick().await
    }

    async fn recover(&mut self) -> BridgeState {
        match self.portal.authenticate().await {
            Ok(session) => {
                self.install_session(session);
                tracing::info!("econet24 session re-established");
                BridgeState::Polling
            }
            Err(AuthError::InvalidCredentials(reason)) => {
                tracing::error!(reason = %reason, "econet24 no longer accepts the configured credentials");
                BridgeState::Stopped(StopReason::InvalidCredentials)
            }
            Err(AuthError::Transient(reason)) => match self.backoff.next_delay() {
                Some(delay) => {
                    tracing::warn!(
                        reason = %reason,
                        attempt = self.backoff.failures(),
                        retry_in_secs = delay.as_secs(),
                        "econet24 re-login failed, retrying"
                    );
                    if self.pause(delay).await {
                        return BridgeState::Stopped(StopReason::Shutdown);
                    }
                    BridgeState::Recovering
                }
                None => {
                    tracing::warn!(
                        reason = %reason,
                        "econet24 re-login still failing, trying again next poll"
                    );
                    self.backoff.reset();
                    self.wait_for_tick().await
                }
            },
        }
    }

    // ── Helpers ─────────────────────────────────────────────────

    /// Adopt a fresh session. A different controller UID gets a new mapper
    /// and a fresh discovery announcement.
    fn install_session(&mut self, session: Session) {
        self.backoff.reset();
        let same_device = self
            .mapper
            .as_ref()
            .is_some_and(|m| m.device().uid == session.device_uid);
        if !same_device {
            let device = DeviceIdentity::new(&session.device_uid, self.settings.device_name.as_deref());
            tracing::info!(
                device_uid = %device.uid,
                slug = %device.slug,
                name = %device.display_name,
                "serving econet24 controller"
            );
            self.mapper = Some(SensorMapper::new(device));
            self.announced_epoch = None;
        }
        self.session = Some(session);
    }

    /// Publish discovery and `online` unless already done on the current
    /// broker connection.
    async fn ensure_announced(&mut self) -> Result<(), PublishError> {
        let epoch = self.channel.connection_epoch();
        if self.announced_epoch == Some(epoch) {
            return Ok(());
        }
        let Some(mapper) = &self.mapper else {
            return Ok(());
        };

        let records = mapper.discovery_records(&self.settings.prefixes);
        let publisher = SensorPublisher::new(self.channel, &self.settings.prefixes);
        publisher.publish_discovery(&records).await?;
        publisher.publish_availability(true).await?;

        if self.announced_epoch.is_some() {
            tracing::info!(epoch, "MQTT reconnected, discovery re-announced");
        }
        self.announced_epoch = Some(epoch);
        Ok(())
    }

    async fn publish_snapshot(&mut self, payload: &DevicePayload) {
        let Some(readings) = self.mapper.as_ref().map(|m| m.map_to_sensors(payload)) else {
            return;
        };

        if let Err(e) = self.ensure_announced().await {
            tracing::warn!(error = %e, "MQTT unavailable, skipping publish");
            return;
        }

        let Some(mapper) = &self.mapper else {
            return;
        };
        let publisher = SensorPublisher::new(self.channel, &self.settings.prefixes);
        match publisher.publish_state(mapper.device(), &readings).await {
            Ok(()) => tracing::debug!(sensors = readings.len(), "state published"),
            Err(e) => tracing::warn!(error = %e, "publishing state failed, skipping cycle"),
        }
    }

    /// Sleep one poll interval and stay in `Polling`.
    async fn wait_for_tick(&mut self) -> BridgeState {
        let interval = self.settings.poll_interval;
        if self.pause(interval).await {
            BridgeState::Stopped(StopReason::Shutdown)
        } else {
            BridgeState::Polling
        }
    }

    /// Sleep for `duration`. Returns `true` if shutdown was requested first.
    async fn pause(&mut self, duration: Duration) -> bool {
        tokio::select! {
            () = tokio::time::sleep(duration) => false,
            Ok(_) = self.shutdown.wait_for(|stop| *stop) => true,
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn close(&self) {
        let publisher = SensorPublisher::new(self.channel, &self.settings.prefixes);
        if let Err(e) = publisher.publish_availability(false).await {
            tracing::debug!(error = %e, "could not publish offline status");
        }
        if let Err(e) = self.channel.disconnect().await {
            tracing::debug!(error = %e, "MQTT disconnect failed");
        }
        tracing::info!("bridge loop stopped");
    }
}
