use secrecy::SecretString;
use serde::Deserialize;

/// Client id used when none is configured.
pub const DEFAULT_CLIENT_ID: &str = "econet24_bridge";

/// MQTT connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    /// Broker hostname or address.
    #[serde(default = "default_host")]
    pub broker_host: String,
    /// Broker port (plain TCP).
    #[serde(default = "default_port")]
    pub broker_port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Keep-alive interval in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u16,
    /// How long `MqttChannel::connect` waits for the first ConnAck.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Topic that receives a retained `offline` last-will.
    #[serde(default)]
    pub availability_topic: Option<String>,
}

impl MqttConfig {
    pub fn new(broker_host: impl Into<String>, broker_port: u16) -> Self {
        Self {
            broker_host: broker_host.into(),
            broker_port,
            client_id: default_client_id(),
            username: None,
            password: None,
            keepalive_secs: default_keepalive(),
            connect_timeout_secs: default_connect_timeout(),
            availability_topic: None,
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.into()
}

fn default_keepalive() -> u16 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}
