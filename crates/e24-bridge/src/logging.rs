//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogLevel};

/// Filter used when neither `RUST_LOG` nor the config says otherwise.
/// HTTP and MQTT internals stay at `warn` unless asked for explicitly.
pub fn default_filter(level: LogLevel) -> String {
    let level = level.as_filter();
    format!("{level},hyper=warn,reqwest=warn,rumqttc=warn")
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(level: LogLevel, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_target(false).init(),
    }
}
