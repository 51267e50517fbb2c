use serde::{Deserialize, Serialize};

use crate::slug::slugify;

/// Number of UID characters used when no device name override is configured.
const UID_SLUG_LEN: usize = 8;

/// Identity of the one controller this bridge instance serves.
///
/// `slug` is the stable component of every sensor id and topic. It comes from
/// the configured device name when there is one, so renaming the controller in
/// the portal (or replacing its Wi-Fi module, which changes the UID) does not
/// orphan Home-Assistant entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Vendor controller UID as reported by the portal.
    pub uid: String,
    /// Slug-safe identifier used in ids and topics.
    pub slug: String,
    /// Human-facing device name shown in Home-Assistant.
    pub display_name: String,
}

impl DeviceIdentity {
    /// Build the identity for `uid`, honoring an optional name override.
    ///
    /// An override that slugifies to nothing (e.g. `"???"`) is ignored.
    pub fn new(uid: &str, device_name: Option<&str>) -> Self {
        let short_uid: String = uid.chars().take(UID_SLUG_LEN).collect();

        match device_name.map(str::trim).filter(|n| !slugify(n).is_empty()) {
            Some(name) => Self {
                uid: uid.to_string(),
                slug: slugify(name),
                display_name: name.to_string(),
            },
            None => Self {
                uid: uid.to_string(),
                slug: slugify(&short_uid),
                display_name: format!("Econet24 {short_uid}"),
            },
        }
    }

    /// Identifier list for the discovery `device` block.
    pub fn identifiers(&self) -> Vec<String> {
        vec![format!("econet24_{}", self.slug)]
    }
}
