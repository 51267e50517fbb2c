use secrecy::SecretString;

/// Production portal.
pub const DEFAULT_PORTAL_URL: &str = "https://www.econet24.com";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings for [`Econet24Client`](crate::Econet24Client).
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal base URL without a trailing slash.
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
    /// Controller to select when the account lists several.
    pub device_uid: Option<String>,
    pub request_timeout_secs: u64,
}

impl PortalConfig {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            base_url: DEFAULT_PORTAL_URL.to_string(),
            username: username.into(),
            password,
            device_uid: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_device_uid(mut self, device_uid: Option<String>) -> Self {
        self.device_uid = device_uid;
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}
