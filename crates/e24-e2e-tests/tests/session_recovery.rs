//! E2E tests for portal session expiry and re-authentication.

mod helpers;

use wiremock::ResponseTemplate;

use e24_bridge::BridgeState;
use e24_mqtt_channel::MockChannel;

use helpers::{PortalHarness, bridge, sample_curr};

/// Indexes of the requests matching `verb route`.
fn positions(requests: &[(String, String)], verb: &str, route: &str) -> Vec<usize> {
    requests
        .iter()
        .enumerate()
        .filter(|(_, (m, p))| m == verb && p == route)
        .map(|(i, _)| i)
        .collect()
}

/// A 401 from the params endpoint triggers exactly one login before the
/// next params request.
#[tokio::test]
async fn e2e_unauthorized_fetch_relogs_once() {
    let portal = PortalHarness::with_login().await;
    portal.mount_params_failure(ResponseTemplate::new(401), 1).await;
    portal.mount_params(sample_curr()).await;
    let channel = MockChannel::new();
    let (mut bridge, _tx) = bridge(&portal, &channel, Some("Grant"));

    assert_eq!(bridge.step().await, BridgeState::Authenticated);
    assert_eq!(bridge.step().await, BridgeState::Polling);
    assert_eq!(bridge.step().await, BridgeState::Recovering);
    assert_eq!(bridge.step().await, BridgeState::Polling);
    assert_eq!(bridge.step().await, BridgeState::Polling);

    let requests = portal.requests().await;
    let params = positions(&requests, "GET", "/service/getDeviceParams");
    let logins = positions(&requests, "POST", "/login/");
    assert_eq!(params.len(), 2);
    assert_eq!(logins.len(), 2);
    assert!(params[0] < logins[1] && logins[1] < params[1]);

    assert_eq!(
        channel.last_payload("econet24/grant/heat_pump_delta_t/state").as_deref(),
        Some("6.5")
    );
}

/// The portal answering with its HTML login page means the session is gone.
#[tokio::test]
async fn e2e_login_page_instead_of_json_relogs() {
    let portal = PortalHarness::with_login().await;
    portal
        .mount_params_failure(
            ResponseTemplate::new(200).set_body_string("<html><form>login</form></html>"),
            1,
        )
        .await;
    portal.mount_params(sample_curr()).await;
    let channel = MockChannel::new();
    let (mut bridge, _tx) = bridge(&portal, &channel, Some("Grant"));

    bridge.step().await;
    bridge.step().await;
    assert_eq!(bridge.step().await, BridgeState::Recovering);
    assert_eq!(bridge.step().await, BridgeState::Polling);
    assert_eq!(bridge.step().await, BridgeState::Polling);

    assert_eq!(portal.count("POST", "/login/").await, 2);
    assert!(channel.last_payload("econet24/grant/compressor_running/state").is_some());
}

/// Re-login to the same controller does not repeat discovery.
#[tokio::test]
async fn e2e_relogin_keeps_discovery() {
    let portal = PortalHarness::with_login().await;
    portal.mount_params_failure(ResponseTemplate::new(403), 1).await;
    portal.mount_params(sample_curr()).await;
    let channel = MockChannel::new();
    let (mut bridge, _tx) = bridge(&portal, &channel, Some("Grant"));

    bridge.step().await;
    bridge.step().await;
    let discovery_count = channel.published_under("homeassistant/").len();
    assert!(discovery_count > 0);

    bridge.step().await;
    bridge.step().await;
    bridge.step().await;
    assert_eq!(channel.published_under("homeassistant/").len(), discovery_count);
}
