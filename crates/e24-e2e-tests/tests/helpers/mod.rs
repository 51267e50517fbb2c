//! Shared test harness for E2E integration tests.
//!
//! Stands up a wiremock econet24 portal and wires the real `Econet24Client`
//! and `BridgeLoop` to it, with a `MockChannel` in place of the broker.

#![allow(dead_code)]

use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use e24_bridge::{Backoff, BridgeLoop, LoopSettings};
use e24_mqtt_channel::MockChannel;
use e24_portal::{Econet24Client, PortalConfig};
use e24_protocol::topics::TopicPrefixes;

pub const UID: &str = "A1B2C3D4E5F6";

/// The sample snapshot: 45.2 °C flow, 38.7 °C return, compressor at 60 Hz.
pub fn sample_curr() -> Value {
    json!({
        "GrantOutgoingTemp": 45.2,
        "GrantReturnTemp": 38.7,
        "GrantCompressorFreq": 60,
    })
}

/// Wiremock econet24 portal.
pub struct PortalHarness {
    pub server: MockServer,
}

impl PortalHarness {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Login page, accepted login redirecting to the dashboard, device list.
    pub async fn with_login() -> Self {
        let h = Self::start().await;
        h.mount_login_page().await;
        h.mount_accepted_login().await;
        h.mount_device_list(json!({"devices": [UID]})).await;
        h
    }

    pub async fn mount_login_page(&self) {
        Mock::given(method("GET"))
            .and(path("/login/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "csrftoken=tok123; Path=/")
                    .set_body_string("<form>login</form>"),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_accepted_login(&self) {
        Mock::given(method("POST"))
            .and(path("/login/"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("/view/device/{UID}/main/").as_str())
                    .insert_header("set-cookie", "_mlmsc=session-abc; Path=/"),
            )
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/view/device/{UID}/main/")))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>dashboard</html>"))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_rejected_login(&self) {
        Mock::given(method("POST"))
            .and(path("/login/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<div class=\"error\">Invalid username or password</div>"),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_device_list(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/service/getUserDevices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Live parameters answered with `{"curr": curr}`.
    pub async fn mount_params(&self, curr: Value) {
        Mock::given(method("GET"))
            .and(path("/service/getDeviceParams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "curr": curr })))
            .mount(&self.server)
            .await;
    }

    /// The next `times` parameter requests get `response` instead of data.
    /// Mount before `mount_params`.
    pub async fn mount_params_failure(&self, response: ResponseTemplate, times: u64) {
        Mock::given(method("GET"))
            .and(path("/service/getDeviceParams"))
            .respond_with(response)
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    pub fn client(&self) -> Econet24Client {
        Econet24Client::new(
            PortalConfig::new("user@example.com", SecretString::from("hunter2"))
                .with_base_url(self.server.uri())
                .with_request_timeout(5),
        )
    }

    /// Methods and paths of every request the portal received, in order.
    pub async fn requests(&self) -> Vec<(String, String)> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| (r.method.to_string(), r.url.path().to_string()))
            .collect()
    }

    pub async fn count(&self, verb: &str, route: &str) -> usize {
        self.requests()
            .await
            .iter()
            .filter(|(m, p)| m == verb && p == route)
            .count()
    }
}

/// Loop settings with a short tick so tests run in real time.
pub fn fast_settings(device_name: Option<&str>) -> LoopSettings {
    LoopSettings {
        prefixes: TopicPrefixes::default(),
        device_name: device_name.map(str::to_string),
        poll_interval: Duration::from_millis(20),
    }
}

pub fn fast_backoff(attempts: u32) -> Backoff {
    Backoff::new(Duration::from_millis(5), Duration::from_millis(20), attempts)
}

/// Bridge over the harness portal and `channel`. Keep the sender alive for
/// as long as the loop should run.
pub fn bridge<'a>(
    portal: &PortalHarness,
    channel: &'a MockChannel,
    device_name: Option<&str>,
) -> (BridgeLoop<'a, Econet24Client, MockChannel>, watch::Sender<bool>) {
    let (tx, rx) = watch::channel(false);
    let bridge = BridgeLoop::new(portal.client(), channel, fast_settings(device_name), rx)
        .with_backoff(fast_backoff(3));
    (bridge, tx)
}
