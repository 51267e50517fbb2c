//! `PortalClient` trait and the reqwest-backed econet24 implementation.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use e24_protocol::DevicePayload;
use regex::Regex;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ORIGIN, REFERER};
use reqwest::{Client, StatusCode, Url};
use secrecy::ExposeSecret;
use serde_json::Value;

use crate::config::PortalConfig;
use crate::error::{AuthError, FetchError};
use crate::session::Session;

// Successful logins land on the controller dashboard: /view/device/<UID>/main/
static DEVICE_REDIRECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/view/device/([A-Z0-9]+)/").unwrap());

const LOGIN_PATH: &str = "/login/";
const USER_DEVICES_PATH: &str = "/service/getUserDevices";
const DEVICE_PARAMS_PATH: &str = "/service/getDeviceParams";
const EDITABLE_PARAMS_PATH: &str = "/service/getDeviceEditableParams";

const CSRF_COOKIE: &str = "csrftoken";
/// Any of these marks an authenticated portal session.
const SESSION_COOKIES: &[&str] = &["_mlmsc", "_mlmlc", "sessionid"];

const USER_AGENT: &str = concat!("econet24-bridge/", env!("CARGO_PKG_VERSION"));

/// Access to one controller's data on the vendor portal.
///
/// `authenticate` replaces whatever session the client held before.
/// `fetch_device_state` never re-authenticates on its own: an expired session
/// is reported to the caller, which decides when to log in again.
#[async_trait]
pub trait PortalClient: Send + Sync {
    async fn authenticate(&mut self) -> Result<Session, AuthError>;

    async fn fetch_device_state(&self, session: &Session) -> Result<DevicePayload, FetchError>;
}

// ── Connection ──────────────────────────────────────────────────

/// HTTP client and cookie jar belonging to one login.
struct Connection {
    http: Client,
    jar: Arc<Jar>,
    base: Url,
}

impl Connection {
    fn open(base: Url, timeout_secs: u64) -> Result<Self, AuthError> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, jar, base })
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let header = header.to_str().ok()?;
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
    }

    fn has_session_cookie(&self) -> bool {
        SESSION_COOKIES.iter().any(|name| self.cookie(name).is_some())
    }

    async fn csrf_token(&self) -> Result<String, AuthError> {
        let resp = self.http.get(self.url(LOGIN_PATH)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::Transient(format!("login page returned HTTP {status}")));
        }

        self.cookie(CSRF_COOKIE)
            .ok_or_else(|| AuthError::Transient("login page did not set a CSRF token".into()))
    }

    /// Submit the login form. Returns the controller UID when the portal
    /// redirected straight to a device dashboard.
    async fn login(&self, config: &PortalConfig, csrf: &str) -> Result<Option<String>, AuthError> {
        let login_url = self.url(LOGIN_PATH);
        let form = [
            ("username", config.username.as_str()),
            ("password", config.password.expose_secret()),
            ("csrfmiddlewaretoken", csrf),
        ];

        let resp = self
            .http
            .post(login_url.clone())
            .header("X-CSRFToken", csrf)
            .header(REFERER, login_url.as_str())
            .header(ORIGIN, self.base.origin().ascii_serialization())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let final_url = resp.url().clone();
        let body = resp.text().await?;
        tracing::debug!(%status, url = %final_url, "login form submitted");

        if status.is_server_error() {
            return Err(AuthError::Transient(format!("login returned HTTP {status}")));
        }
        if status == StatusCode::FORBIDDEN && body.contains("CSRF") {
            return Err(AuthError::Transient("portal rejected the CSRF token".into()));
        }
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(AuthError::InvalidCredentials(format!("login rejected (HTTP {status})")));
        }
        if !status.is_success() {
            return Err(AuthError::Transient(format!("login returned HTTP {status}")));
        }

        if final_url.path().contains("/login") {
            let lower = body.to_lowercase();
            if lower.contains("error") || lower.contains("invalid") {
                return Err(AuthError::InvalidCredentials(
                    "portal rejected the username or password".into(),
                ));
            }
        }

        let redirect_uid = DEVICE_REDIRECT
            .captures(final_url.path())
            .map(|caps| caps[1].to_string());

        if redirect_uid.is_none() && !self.has_session_cookie() {
            return Err(AuthError::InvalidCredentials(
                "login did not establish a portal session".into(),
            ));
        }

        Ok(redirect_uid)
    }

    async fn user_devices(&self) -> Result<Vec<String>, AuthError> {
        let resp = self.http.get(self.url(USER_DEVICES_PATH)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::Transient(format!("device list returned HTTP {status}")));
        }

        let body: Value = resp.json().await?;
        Ok(parse_device_list(&body))
    }

    /// GET a `/service/*` JSON document for `uid`.
    async fn service_json(&self, path: &str, uid: &str) -> Result<Value, FetchError> {
        let resp = self
            .http
            .get(self.url(path))
            .query(&[("uid", uid)])
            .send()
            .await?;

        let status = resp.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(FetchError::SessionExpired);
        }
        if resp.url().path().contains("/login") {
            return Err(FetchError::SessionExpired);
        }
        if !status.is_success() {
            return Err(FetchError::Transient(format!("{path} returned HTTP {status}")));
        }

        let body = resp.text().await?;
        // An expired session gets the HTML login page instead of JSON.
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(error = %e, path, "portal answered with a non-JSON body");
            FetchError::SessionExpired
        })
    }
}

/// Device list entries are bare UID strings on some accounts and objects
/// with a `uid` field on others.
fn parse_device_list(body: &Value) -> Vec<String> {
    body.get("devices")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| match entry {
            Value::String(uid) => Some(uid.clone()),
            Value::Object(obj) => obj.get("uid").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Pick the controller this bridge serves.
///
/// `listed` is `None` when the device list could not be fetched. A
/// configured controller is only reported missing against a non-empty list;
/// anything less is treated as a portal hiccup and retried.
fn select_device(
    configured: Option<&str>,
    redirect_uid: Option<String>,
    listed: Option<Vec<String>>,
) -> Result<String, AuthError> {
    match listed.filter(|devices| !devices.is_empty()) {
        Some(devices) => match configured {
            Some(uid) if devices.iter().any(|d| d == uid) => Ok(uid.to_string()),
            Some(uid) => Err(AuthError::InvalidCredentials(format!(
                "controller {uid} is not visible to this account (found: {})",
                devices.join(", ")
            ))),
            None => devices
                .into_iter()
                .next()
                .ok_or_else(|| AuthError::Transient("device list is empty".into())),
        },
        None => match (configured, redirect_uid) {
            (Some(uid), Some(redirect)) if uid == redirect => Ok(redirect),
            (Some(uid), _) => Err(AuthError::Transient(format!(
                "device list unavailable, cannot confirm controller {uid}"
            ))),
            (None, Some(redirect)) => Ok(redirect),
            (None, None) => Err(AuthError::Transient(
                "portal returned no controllers for this account".into(),
            )),
        },
    }
}

// ── Econet24Client ──────────────────────────────────────────────

/// `PortalClient` for econet24.com.
pub struct Econet24Client {
    config: PortalConfig,
    connection: Option<Connection>,
}

impl Econet24Client {
    pub fn new(config: PortalConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    fn base_url(&self) -> Result<Url, AuthError> {
        Url::parse(&self.config.base_url)
            .map_err(|e| AuthError::Transient(format!("invalid portal url {}: {e}", self.config.base_url)))
    }
}

#[async_trait]
impl PortalClient for Econet24Client {
    async fn authenticate(&mut self) -> Result<Session, AuthError> {
        // Always start from an empty jar.
        self.connection = None;
        let conn = Connection::open(self.base_url()?, self.config.request_timeout_secs)?;

        let csrf = conn.csrf_token().await?;
        let redirect_uid = conn.login(&self.config, &csrf).await?;

        let listed = match conn.user_devices().await {
            Ok(devices) => Some(devices),
            Err(e) if redirect_uid.is_some() => {
                tracing::debug!(error = %e, "device list unavailable, using login redirect");
                None
            }
            Err(e) => return Err(e),
        };

        let device_uid = select_device(self.config.device_uid.as_deref(), redirect_uid, listed)?;
        let session = Session::new(device_uid, Utc::now());

        tracing::info!(
            device_uid = %session.device_uid,
            expires_at = %session.expires_at,
            "portal session established"
        );

        self.connection = Some(conn);
        Ok(session)
    }

    async fn fetch_device_state(&self, session: &Session) -> Result<DevicePayload, FetchError> {
        let conn = self.connection.as_ref().ok_or(FetchError::SessionExpired)?;
        if !conn.has_session_cookie() {
            tracing::debug!("portal session cookie missing");
            return Err(FetchError::SessionExpired);
        }

        let uid = session.device_uid.as_str();
        let params = conn.service_json(DEVICE_PARAMS_PATH, uid).await?;
        let mut payload = DevicePayload::new(uid, params);

        match conn.service_json(EDITABLE_PARAMS_PATH, uid).await {
            Ok(editable) => payload = payload.with_editable(editable),
            Err(e) => tracing::debug!(error = %e, "editable params unavailable"),
        }

        Ok(payload)
    }
}
