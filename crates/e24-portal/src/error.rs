//! Portal error types.

use thiserror::Error;

/// Why a login attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The portal rejected the credentials, or the account cannot see the
    /// requested controller. Retrying will not help.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Network failure, timeout, or a portal-side error.
    #[error("transient authentication failure: {0}")]
    Transient(String),
}

impl AuthError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Transient(_))
    }
}

/// Why a device-state fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The portal no longer honours the session; re-authenticate first.
    #[error("portal session expired")]
    SessionExpired,

    /// Network failure, timeout, or a portal-side error.
    #[error("transient fetch failure: {0}")]
    Transient(String),
}

impl FetchError {
    /// Whether the same session may be used again on the next attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Transient(e.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transient(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability() {
        assert!(AuthError::Transient("timeout".into()).is_retryable());
        assert!(!AuthError::InvalidCredentials("bad password".into()).is_retryable());
        assert!(FetchError::Transient("502".into()).is_retryable());
        assert!(!FetchError::SessionExpired.is_retryable());
    }

    #[test]
    fn display() {
        assert_eq!(
            AuthError::InvalidCredentials("login rejected".into()).to_string(),
            "invalid credentials: login rejected"
        );
        assert_eq!(FetchError::SessionExpired.to_string(), "portal session expired");
    }
}
