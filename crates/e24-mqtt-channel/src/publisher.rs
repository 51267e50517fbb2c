//! Home-Assistant discovery, state and availability publishing.
//!
//! Every message is retained so Home-Assistant picks up the latest state
//! and entity configuration after its own restart.

use rumqttc::QoS;

use e24_protocol::topics::{self, AVAILABILITY_OFFLINE, AVAILABILITY_ONLINE, TopicPrefixes};
use e24_protocol::{DeviceIdentity, DiscoveryRecord, SensorReading};

use crate::channel::Channel;
use crate::error::PublishError;

/// Sensor publishing backed by a `Channel` implementation.
///
/// Wraps any `Channel` (real or mock). Stops at the first failed publish and
/// reports it; retrying is up to the caller.
pub struct SensorPublisher<'a, C: Channel> {
    channel: &'a C,
    prefixes: &'a TopicPrefixes,
}

impl<'a, C: Channel> SensorPublisher<'a, C> {
    pub fn new(channel: &'a C, prefixes: &'a TopicPrefixes) -> Self {
        Self { channel, prefixes }
    }

    /// Announce every record on its discovery topic.
    pub async fn publish_discovery(&self, records: &[DiscoveryRecord]) -> Result<(), PublishError> {
        for record in records {
            let bytes = serde_json::to_vec(&record.payload)?;
            self.channel
                .publish(&record.topic, &bytes, QoS::AtLeastOnce, true)
                .await?;
        }
        tracing::info!(count = records.len(), "discovery published");
        Ok(())
    }

    /// Publish one snapshot of readings to their state topics.
    pub async fn publish_state(
        &self,
        device: &DeviceIdentity,
        readings: &[SensorReading],
    ) -> Result<(), PublishError> {
        for reading in readings {
            let topic = topics::sensor_state(&self.prefixes.state, &device.slug, &reading.metric);
            let payload = reading.value.to_payload();
            tracing::debug!(topic = %topic, value = %payload, "publishing state");
            self.channel
                .publish(&topic, payload.as_bytes(), QoS::AtLeastOnce, true)
                .await?;
        }
        Ok(())
    }

    /// Mark the bridge online or offline for Home-Assistant.
    pub async fn publish_availability(&self, online: bool) -> Result<(), PublishError> {
        let payload = if online {
            AVAILABILITY_ONLINE
        } else {
            AVAILABILITY_OFFLINE
        };
        self.channel
            .publish(&self.availability_topic(), payload.as_bytes(), QoS::AtLeastOnce, true)
            .await
    }

    pub fn availability_topic(&self) -> String {
        topics::bridge_status(&self.prefixes.state)
    }
}
