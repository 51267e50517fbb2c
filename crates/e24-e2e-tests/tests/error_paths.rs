//! E2E tests for failure handling across crate boundaries.

mod helpers;

use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use e24_bridge::{BridgeLoop, BridgeState, StopReason};
use e24_mqtt_channel::MockChannel;
use e24_portal::{Econet24Client, PortalConfig};

use helpers::{PortalHarness, bridge, fast_backoff, fast_settings, sample_curr};

/// Wrong password: one login attempt, bridge marked offline, loop stops.
#[tokio::test]
async fn e2e_bad_password_stops_without_retry() {
    let portal = PortalHarness::start().await;
    portal.mount_login_page().await;
    portal.mount_rejected_login().await;
    let channel = MockChannel::new();
    let (bridge, _tx) = bridge(&portal, &channel, Some("Grant"));

    let reason = bridge.run().await;

    assert_eq!(reason, StopReason::InvalidCredentials);
    assert!(reason.is_fatal());
    assert_eq!(portal.count("POST", "/login/").await, 1);
    assert_eq!(channel.last_payload("econet24/bridge/status").as_deref(), Some("offline"));
    assert_eq!(channel.disconnects(), 1);
}

/// A portal that keeps failing at startup exhausts the backoff.
#[tokio::test]
async fn e2e_portal_down_at_startup_gives_up() {
    let portal = PortalHarness::start().await;
    Mock::given(method("GET"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&portal.server)
        .await;
    let channel = MockChannel::new();
    let (bridge, _tx) = bridge(&portal, &channel, None);

    let reason = bridge.run().await;

    assert_eq!(reason, StopReason::RetriesExhausted);
    assert_eq!(portal.count("GET", "/login/").await, 3);
    assert_eq!(portal.count("POST", "/login/").await, 0);
}

/// Configured controller UID not on the account is a configuration error.
#[tokio::test]
async fn e2e_unknown_device_uid_is_fatal() {
    let portal = PortalHarness::with_login().await;
    let channel = MockChannel::new();
    let (_tx, rx) = watch::channel(false);
    let client = Econet24Client::new(
        PortalConfig::new("user@example.com", SecretString::from("hunter2"))
            .with_base_url(portal.server.uri())
            .with_device_uid(Some("000000000000".into())),
    );
    let mut bridge = BridgeLoop::new(client, &channel, fast_settings(None), rx);

    assert_eq!(
        bridge.step().await,
        BridgeState::Stopped(StopReason::InvalidCredentials)
    );
}

/// A 502 from the params endpoint skips one cycle and nothing else.
#[tokio::test]
async fn e2e_transient_fetch_failure_skips_cycle() {
    let portal = PortalHarness::with_login().await;
    portal.mount_params_failure(ResponseTemplate::new(502), 1).await;
    portal.mount_params(sample_curr()).await;
    let channel = MockChannel::new();
    let (mut bridge, _tx) = bridge(&portal, &channel, Some("Grant"));

    bridge.step().await;
    bridge.step().await;
    assert_eq!(bridge.step().await, BridgeState::Polling);
    assert!(channel.published_under("econet24/grant/").is_empty());

    assert_eq!(bridge.step().await, BridgeState::Polling);
    assert_eq!(
        channel.last_payload("econet24/grant/heat_pump_delta_t/state").as_deref(),
        Some("6.5")
    );
    assert_eq!(portal.count("POST", "/login/").await, 1);
}

/// Broker outage: cycle skipped, discovery re-announced after reconnect.
#[tokio::test]
async fn e2e_broker_outage_recovers() {
    let portal = PortalHarness::with_login().await;
    portal.mount_params(sample_curr()).await;
    let channel = MockChannel::new();
    let (mut bridge, _tx) = bridge(&portal, &channel, Some("Grant"));

    bridge.step().await;
    bridge.step().await;
    let discovery_count = channel.published_under("homeassistant/").len();

    channel.set_connected(false);
    assert_eq!(bridge.step().await, BridgeState::Polling);

    channel.set_connected(true);
    channel.reset();
    assert_eq!(bridge.step().await, BridgeState::Polling);
    assert_eq!(channel.published_under("homeassistant/").len(), discovery_count);
    assert_eq!(channel.last_payload("econet24/bridge/status").as_deref(), Some("online"));
    assert_eq!(
        channel.last_payload("econet24/grant/heat_pump_delta_t/state").as_deref(),
        Some("6.5")
    );
}

/// Shutdown mid-run marks the bridge offline and disconnects.
#[tokio::test]
async fn e2e_shutdown_while_polling() {
    let portal = PortalHarness::with_login().await;
    portal.mount_params(sample_curr()).await;
    let channel = MockChannel::new();
    let (tx, rx) = watch::channel(false);
    let bridge = BridgeLoop::new(portal.client(), &channel, fast_settings(Some("Grant")), rx)
        .with_backoff(fast_backoff(3));

    let stop = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.send(true).unwrap();
    };
    let (reason, ()) = tokio::join!(bridge.run(), stop);

    assert_eq!(reason, StopReason::Shutdown);
    assert!(portal.count("GET", "/service/getDeviceParams").await >= 1);
    let last = channel.last_published().unwrap();
    assert_eq!(last.topic, "econet24/bridge/status");
    assert_eq!(last.payload_str(), "offline");
    assert_eq!(channel.disconnects(), 1);
}
