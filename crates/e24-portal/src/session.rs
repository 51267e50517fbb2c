use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long the portal is assumed to honour a login.
///
/// The real lifetime is not published and the portal may revoke a session
/// at any time; this is only the point at which the bridge re-authenticates
/// proactively.
pub const SESSION_LIFETIME_HOURS: i64 = 12;

/// An authenticated portal session for one controller.
///
/// The cookies themselves stay inside the client that created the session.
/// A `Session` is the caller's handle on it: which controller it covers and
/// when it was established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub device_uid: String,
    pub established_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(device_uid: impl Into<String>, established_at: DateTime<Utc>) -> Self {
        Self {
            device_uid: device_uid.into(),
            established_at,
            expires_at: established_at + Duration::hours(SESSION_LIFETIME_HOURS),
        }
    }

    /// Whether the expiry estimate has passed at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
