use std::collections::HashSet;

use e24_protocol::topics::{self, TopicPrefixes};
use e24_protocol::{
    DeviceIdentity, DevicePayload, DiscoveryDevice, DiscoveryPayload, DiscoveryRecord, SensorKind,
    SensorReading, SensorValue, MANUFACTURER, MODEL, PAYLOAD_OFF, PAYLOAD_ON,
};
use serde_json::Value;

use crate::catalog::{
    Derivation, FieldDef, Source, Transform, COMPRESSOR_FREQUENCY, FIELDS,
    FLOW_TEMPERATURE, RETURN_TEMPERATURE, WORK_STATE,
};
use crate::transform;

/// Turns controller payloads into sensor readings for one device.
///
/// Pure and infallible: a field that is missing or malformed is left out of
/// the snapshot, the rest is still produced.
#[derive(Debug, Clone)]
pub struct SensorMapper {
    device: DeviceIdentity,
}

impl SensorMapper {
    pub fn new(device: DeviceIdentity) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    /// Map one payload to its readings, in catalog order.
    pub fn map_to_sensors(&self, payload: &DevicePayload) -> Vec<SensorReading> {
        let readings: Vec<SensorReading> = FIELDS
            .iter()
            .filter_map(|field| {
                let value = value_of(field, payload)?;
                Some(self.reading(field, value))
            })
            .collect();

        let unknown = payload
            .current_keys()
            .filter(|key| !FIELDS.iter().any(|f| matches!(f.source, Source::Current(k) if k == *key)))
            .count();

        tracing::debug!(
            device = %self.device.slug,
            readings = readings.len(),
            omitted = FIELDS.len() - readings.len(),
            unknown_fields = unknown,
            "mapped device payload"
        );

        readings
    }

    /// Discovery announcements for every sensor this mapper can produce.
    pub fn discovery_records(&self, prefixes: &TopicPrefixes) -> Vec<DiscoveryRecord> {
        let device = DiscoveryDevice {
            identifiers: self.device.identifiers(),
            name: self.device.display_name.clone(),
            manufacturer: MANUFACTURER.to_string(),
            model: MODEL.to_string(),
        };
        let availability_topic = topics::bridge_status(&prefixes.state);

        let mut seen = HashSet::new();
        FIELDS
            .iter()
            .filter(|field| seen.insert(field.metric))
            .map(|field| {
                let unique_id = self.unique_id(field.metric);
                let binary = field.kind == SensorKind::BinarySensor;
                DiscoveryRecord {
                    kind: field.kind,
                    topic: topics::discovery_config(&prefixes.discovery, field.kind, &unique_id),
                    payload: DiscoveryPayload {
                        name: field.name.to_string(),
                        object_id: unique_id.clone(),
                        unique_id,
                        state_topic: topics::sensor_state(&prefixes.state, &self.device.slug, field.metric),
                        unit_of_measurement: field.unit.map(str::to_string),
                        device_class: field.device_class.map(str::to_string),
                        state_class: field.state_class().map(str::to_string),
                        icon: field.icon.map(str::to_string),
                        payload_on: binary.then(|| PAYLOAD_ON.to_string()),
                        payload_off: binary.then(|| PAYLOAD_OFF.to_string()),
                        availability_topic: availability_topic.clone(),
                        device: device.clone(),
                    },
                }
            })
            .collect()
    }

    /// `<device slug>_<metric>`.
    pub fn sensor_id(&self, metric: &str) -> String {
        format!("{}_{metric}", self.device.slug)
    }

    /// Discovery `unique_id` for a metric.
    pub fn unique_id(&self, metric: &str) -> String {
        format!("econet24_{}", self.sensor_id(metric))
    }

    fn reading(&self, field: &FieldDef, value: SensorValue) -> SensorReading {
        SensorReading {
            id: self.sensor_id(field.metric),
            metric: field.metric.to_string(),
            friendly_name: field.name.to_string(),
            unit: field.unit.map(str::to_string),
            device_class: field.device_class.map(str::to_string),
            kind: field.kind,
            value,
        }
    }
}

fn lookup(source: Source, payload: &DevicePayload) -> Option<&Value> {
    match source {
        Source::Current(key) => payload.current(key),
        Source::Root(key) => payload.root(key),
        Source::Editable(name) => payload.editable_param(name),
        Source::Information(key) => payload.information_param(key),
        Source::Derived(_) => None,
    }
}

fn number_at(source: Source, payload: &DevicePayload) -> Option<f64> {
    lookup(source, payload).and_then(transform::number)
}

fn value_of(field: &FieldDef, payload: &DevicePayload) -> Option<SensorValue> {
    if let Source::Derived(derivation) = field.source {
        return derive(derivation, payload);
    }

    let raw = lookup(field.source, payload)?;
    match field.transform {
        Transform::Number => transform::number(raw).map(SensorValue::Number),
        Transform::Code => transform::code(raw).map(|c| SensorValue::Number(c as f64)),
        Transform::WorkState => transform::code(raw).map(|c| SensorValue::Text(transform::work_state_label(c))),
    }
}

fn derive(derivation: Derivation, payload: &DevicePayload) -> Option<SensorValue> {
    let work_state = || lookup(WORK_STATE, payload).and_then(transform::code);

    match derivation {
        Derivation::DeltaT => {
            let flow = number_at(FLOW_TEMPERATURE, payload)?;
            let ret = number_at(RETURN_TEMPERATURE, payload)?;
            Some(SensorValue::Number(flow - ret))
        }
        Derivation::CompressorRunning => match number_at(COMPRESSOR_FREQUENCY, payload) {
            Some(freq) => Some(SensorValue::Bool(freq > 0.0)),
            None => work_state().map(|s| SensorValue::Bool(transform::compressor_active(s))),
        },
        Derivation::HeatPumpRunning => work_state().map(|s| SensorValue::Bool(s > 0)),
    }
}

/// All metric slugs the catalog defines.
pub fn known_metrics() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.metric)
}
