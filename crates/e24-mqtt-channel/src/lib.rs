//! MQTT side of the econet24 bridge.
//!
//! - `Channel` trait for publishing (mockable in tests)
//! - `MqttChannel` backed by rumqttc, with a background connection driver
//! - `MockChannel` for testing without a broker
//! - `SensorPublisher` for discovery, state and availability messages

pub mod channel;
pub mod config;
pub mod error;
pub mod mock;
pub mod publisher;

// Re-exports for convenience.
pub use channel::{Channel, LinkStatus, MqttChannel};
pub use config::MqttConfig;
pub use error::{ConnectError, PublishError};
pub use mock::{MockChannel, PublishedMessage};
pub use publisher::SensorPublisher;
pub use rumqttc::QoS;
