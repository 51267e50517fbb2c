use serde::{Deserialize, Serialize};

/// Payload published for a binary sensor in the "on" state.
pub const PAYLOAD_ON: &str = "ON";
/// Payload published for a binary sensor in the "off" state.
pub const PAYLOAD_OFF: &str = "OFF";

/// Decimal places kept when rendering numbers; strips float noise such as
/// `6.500000000000004` without touching real vendor precision.
const RENDER_DECIMALS: usize = 6;

/// Home-Assistant entity platform a reading is announced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Sensor,
    BinarySensor,
}

impl SensorKind {
    /// Discovery component segment (`homeassistant/<component>/...`).
    pub fn component(self) -> &'static str {
        match self {
            SensorKind::Sensor => "sensor",
            SensorKind::BinarySensor => "binary_sensor",
        }
    }
}

/// A typed, already-converted sensor value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SensorValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SensorValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SensorValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Render the value as a plain MQTT state payload.
    ///
    /// Numbers use their shortest canonical form (`60`, `45.2`, `-3.5`),
    /// booleans become `ON`/`OFF`, text is passed through.
    pub fn to_payload(&self) -> String {
        match self {
            SensorValue::Bool(true) => PAYLOAD_ON.to_string(),
            SensorValue::Bool(false) => PAYLOAD_OFF.to_string(),
            SensorValue::Number(n) => format_number(*n),
            SensorValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for SensorValue {
    fn from(n: f64) -> Self {
        SensorValue::Number(n)
    }
}

impl From<bool> for SensorValue {
    fn from(b: bool) -> Self {
        SensorValue::Bool(b)
    }
}

impl From<String> for SensorValue {
    fn from(s: String) -> Self {
        SensorValue::Text(s)
    }
}

fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let fixed = format!("{:.*}", RENDER_DECIMALS, n);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// One sensor value in a published snapshot.
///
/// `id` is unique within a snapshot and stable across restarts for the same
/// configuration; `metric` is the per-device part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// `<device slug>_<metric slug>`.
    pub id: String,
    /// Slug of the metric name, e.g. `heat_pump_flow_temperature`.
    pub metric: String,
    pub friendly_name: String,
    pub unit: Option<String>,
    pub device_class: Option<String>,
    pub kind: SensorKind,
    pub value: SensorValue,
}
