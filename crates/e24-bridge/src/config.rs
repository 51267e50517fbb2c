//! Bridge configuration, loadable from TOML or environment.
//!
//! Keys match the add-on options (`econet24_username`, `mqtt_host`, ...);
//! environment variables are the same names upper-cased.

use std::time::Duration;

use anyhow::{Context, bail, ensure};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use e24_mqtt_channel::MqttConfig;
use e24_mqtt_channel::config::DEFAULT_CLIENT_ID;
use e24_portal::PortalConfig;
use e24_portal::config::{DEFAULT_PORTAL_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use e24_protocol::topics::{
    self, DEFAULT_DISCOVERY_PREFIX, DEFAULT_TOPIC_PREFIX, TopicPrefixes,
};

/// Log verbosity as configured for the add-on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }

    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => bail!("unknown log level {other:?} (expected debug, info, warning or error)"),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("unknown log format {other:?} (expected text or json)"),
        }
    }
}

/// Top-level configuration for the bridge. Read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub econet24_username: String,
    pub econet24_password: SecretString,
    #[serde(default = "default_mqtt_host")]
    pub mqtt_host: String,
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,
    #[serde(default)]
    pub mqtt_username: Option<String>,
    #[serde(default)]
    pub mqtt_password: Option<SecretString>,
    /// Seconds between the end of one poll cycle and the start of the next.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    #[serde(default)]
    pub log_level: LogLevel,
    /// Overrides the controller name and the slug used in sensor ids.
    #[serde(default)]
    pub device_name: Option<String>,

    #[serde(default = "default_portal_url")]
    pub portal_url: String,
    /// Controller to serve when the account has several.
    #[serde(default)]
    pub device_uid: Option<String>,
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    #[serde(default = "default_mqtt_client_id")]
    pub mqtt_client_id: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_mqtt_host() -> String {
    "localhost".into()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_poll_interval() -> u64 {
    60
}
fn default_portal_url() -> String {
    DEFAULT_PORTAL_URL.into()
}
fn default_discovery_prefix() -> String {
    DEFAULT_DISCOVERY_PREFIX.into()
}
fn default_topic_prefix() -> String {
    DEFAULT_TOPIC_PREFIX.into()
}
fn default_mqtt_client_id() -> String {
    DEFAULT_CLIENT_ID.into()
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl BridgeConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading config file {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("loading config file {path}"))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.finish()
    }

    /// Load config from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from a variable lookup (`ECONET24_USERNAME`, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).with_context(|| format!("{key} is not set"));

        let config = Self {
            econet24_username: required("ECONET24_USERNAME")?,
            econet24_password: SecretString::from(required("ECONET24_PASSWORD")?),
            mqtt_host: get("MQTT_HOST").unwrap_or_else(default_mqtt_host),
            mqtt_port: parse_number(get("MQTT_PORT"), "MQTT_PORT")?.unwrap_or_else(default_mqtt_port),
            mqtt_username: get("MQTT_USERNAME"),
            mqtt_password: get("MQTT_PASSWORD").map(SecretString::from),
            poll_interval: parse_number(get("POLL_INTERVAL"), "POLL_INTERVAL")?
                .unwrap_or_else(default_poll_interval),
            log_level: get("LOG_LEVEL")
                .map(|v| LogLevel::parse(&v))
                .transpose()?
                .unwrap_or_default(),
            device_name: get("DEVICE_NAME"),
            portal_url: get("PORTAL_URL").unwrap_or_else(default_portal_url),
            device_uid: get("DEVICE_UID"),
            discovery_prefix: get("DISCOVERY_PREFIX").unwrap_or_else(default_discovery_prefix),
            topic_prefix: get("TOPIC_PREFIX").unwrap_or_else(default_topic_prefix),
            mqtt_client_id: get("MQTT_CLIENT_ID").unwrap_or_else(default_mqtt_client_id),
            request_timeout_secs: parse_number(get("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS")?
                .unwrap_or_else(default_request_timeout),
            log_format: get("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .transpose()?
                .unwrap_or_default(),
        };
        config.finish()
    }

    /// Normalise optional strings, then validate.
    fn finish(mut self) -> anyhow::Result<Self> {
        fn blank_to_none(value: &mut Option<String>) {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
        blank_to_none(&mut self.device_name);
        blank_to_none(&mut self.device_uid);
        blank_to_none(&mut self.mqtt_username);
        if let Some(name) = &mut self.device_name {
            *name = name.trim().to_string();
        }
        self.portal_url = self.portal_url.trim_end_matches('/').to_string();

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.econet24_username.trim().is_empty(), "econet24_username must not be empty");
        ensure!(
            !self.econet24_password.expose_secret().is_empty(),
            "econet24_password must not be empty"
        );
        ensure!(self.poll_interval >= 1, "poll_interval must be at least 1 second");
        ensure!(self.mqtt_port != 0, "mqtt_port must not be 0");
        ensure!(!self.mqtt_host.trim().is_empty(), "mqtt_host must not be empty");
        ensure!(!self.mqtt_client_id.trim().is_empty(), "mqtt_client_id must not be empty");
        ensure!(self.request_timeout_secs >= 1, "request_timeout_secs must be at least 1");
        for (key, prefix) in [
            ("discovery_prefix", &self.discovery_prefix),
            ("topic_prefix", &self.topic_prefix),
        ] {
            ensure!(
                !prefix.is_empty() && !prefix.contains(['+', '#']) && !prefix.ends_with('/'),
                "{key} {prefix:?} is not a valid topic prefix"
            );
        }
        reqwest::Url::parse(&self.portal_url)
            .with_context(|| format!("portal_url {:?} is not a valid URL", self.portal_url))?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn topic_prefixes(&self) -> TopicPrefixes {
        TopicPrefixes {
            discovery: self.discovery_prefix.clone(),
            state: self.topic_prefix.clone(),
        }
    }

    pub fn portal_config(&self) -> PortalConfig {
        PortalConfig::new(&self.econet24_username, self.econet24_password.clone())
            .with_base_url(&self.portal_url)
            .with_device_uid(self.device_uid.clone())
            .with_request_timeout(self.request_timeout_secs)
    }

    pub fn mqtt_config(&self) -> MqttConfig {
        let mut mqtt = MqttConfig::new(&self.mqtt_host, self.mqtt_port);
        mqtt.client_id = self.mqtt_client_id.clone();
        mqtt.username = self.mqtt_username.clone();
        mqtt.password = self.mqtt_password.clone();
        mqtt.availability_topic = Some(topics::bridge_status(&self.topic_prefix));
        mqtt
    }
}

fn parse_number<T: std::str::FromStr>(raw: Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|v| v.trim().parse::<T>().with_context(|| format!("{key}={v:?} is not a valid number")))
        .transpose()
}
