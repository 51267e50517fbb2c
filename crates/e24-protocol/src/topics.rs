//! MQTT topic builders for the bridge.
//!
//! Topic structure:
//! ```text
//! {discovery_prefix}/sensor/{unique_id}/config
//! {discovery_prefix}/binary_sensor/{unique_id}/config
//! {topic_prefix}/{device_slug}/{metric}/state
//! {topic_prefix}/bridge/status
//! ```

use crate::sensor::SensorKind;

/// Home-Assistant's default discovery prefix.
pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

/// Root of all state topics owned by the bridge.
pub const DEFAULT_TOPIC_PREFIX: &str = "econet24";

/// Retained availability payloads for the bridge status topic.
pub const AVAILABILITY_ONLINE: &str = "online";
pub const AVAILABILITY_OFFLINE: &str = "offline";

/// Prefixes every topic is built from, configurable per installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPrefixes {
    /// Home-Assistant discovery prefix.
    pub discovery: String,
    /// Root for state and availability topics.
    pub state: String,
}

impl Default for TopicPrefixes {
    fn default() -> Self {
        Self {
            discovery: DEFAULT_DISCOVERY_PREFIX.to_string(),
            state: DEFAULT_TOPIC_PREFIX.to_string(),
        }
    }
}

// ─── Discovery ───

pub fn discovery_config(prefix: &str, kind: SensorKind, unique_id: &str) -> String {
    format!("{prefix}/{}/{unique_id}/config", kind.component())
}

// ─── State ───

pub fn sensor_state(prefix: &str, device_slug: &str, metric: &str) -> String {
    format!("{prefix}/{device_slug}/{metric}/state")
}

// ─── Availability ───

pub fn bridge_status(prefix: &str) -> String {
    format!("{prefix}/bridge/status")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_topics() {
        assert_eq!(
            discovery_config("homeassistant", SensorKind::Sensor, "econet24_grant_pump_speed"),
            "homeassistant/sensor/econet24_grant_pump_speed/config"
        );
        assert_eq!(
            discovery_config(
                "homeassistant",
                SensorKind::BinarySensor,
                "econet24_grant_compressor_running"
            ),
            "homeassistant/binary_sensor/econet24_grant_compressor_running/config"
        );
    }

    #[test]
    fn state_topic() {
        assert_eq!(
            sensor_state("econet24", "grant", "heat_pump_delta_t"),
            "econet24/grant/heat_pump_delta_t/state"
        );
    }

    #[test]
    fn default_prefixes() {
        let prefixes = TopicPrefixes::default();
        assert_eq!(prefixes.discovery, "homeassistant");
        assert_eq!(prefixes.state, "econet24");
    }

    #[test]
    fn status_topic() {
        assert_eq!(bridge_status("econet24"), "econet24/bridge/status");
    }
}
