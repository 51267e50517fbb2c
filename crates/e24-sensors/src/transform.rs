//! Raw vendor value conversion.

use serde_json::Value;

/// Placeholder the controller reports for a sensor that is not wired up.
pub const NOT_CONNECTED: f64 = 999.0;

/// Heat-pump work states as shown on the controller panel.
const WORK_STATES: &[(i64, &str)] = &[
    (0, "Off"),
    (1, "Running"),
    (2, "Heating"),
    (3, "Hot Water"),
    (4, "Defrost"),
    (5, "Standby"),
    (6, "Cooling"),
    (7, "Error"),
];

/// Work states in which the compressor is assumed to be running when no
/// frequency reading is available.
const COMPRESSOR_ACTIVE_STATES: &[i64] = &[1, 2, 3, 4, 6];

/// Coerce a vendor value to a number.
///
/// Accepts JSON numbers and numeric strings. Returns `None` for null,
/// non-numeric text, non-finite values and the not-connected placeholder.
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !n.is_finite() || n == NOT_CONNECTED {
        return None;
    }
    Some(n)
}

/// Coerce a vendor value to an integer code. Fractional values are rejected.
pub fn code(value: &Value) -> Option<i64> {
    let n = number(value)?;
    (n.fract() == 0.0).then_some(n as i64)
}

/// Human label for a heat-pump work-state code.
pub fn work_state_label(code: i64) -> String {
    WORK_STATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| format!("Unknown ({code})"))
}

/// Whether a work state implies the compressor is running.
pub fn compressor_active(work_state: i64) -> bool {
    COMPRESSOR_ACTIVE_STATES.contains(&work_state)
}
