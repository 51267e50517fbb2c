//! Scripted portal for testing the bridge loop without HTTP.
//!
//! Outcomes are queued per operation and consumed in order. Every call is
//! recorded so tests can assert on the exact sequence of portal traffic.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use e24_protocol::DevicePayload;

use crate::client::PortalClient;
use crate::error::{AuthError, FetchError};
use crate::session::Session;

/// A recorded portal call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalCall {
    Authenticate,
    Fetch { device_uid: String },
}

#[derive(Default)]
struct State {
    auth: VecDeque<Result<Session, AuthError>>,
    fetch: VecDeque<Result<DevicePayload, FetchError>>,
    fallback_payload: Option<DevicePayload>,
    calls: Vec<PortalCall>,
}

/// Mock implementation of `PortalClient`.
///
/// Clones share state, so a test can hand one clone to the loop and keep
/// another for assertions. With an empty queue, `authenticate` succeeds for
/// the default UID and `fetch_device_state` returns the fallback payload (or
/// a transient error when none is set).
#[derive(Clone)]
pub struct MockPortal {
    device_uid: String,
    state: Arc<Mutex<State>>,
}

impl MockPortal {
    pub fn new(device_uid: impl Into<String>) -> Self {
        Self {
            device_uid: device_uid.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Queue the outcome of the next unanswered `authenticate` call.
    pub fn push_auth(&self, result: Result<Session, AuthError>) {
        self.state.lock().unwrap().auth.push_back(result);
    }

    /// Queue a successful login for the default UID.
    pub fn push_auth_ok(&self) {
        let session = Session::new(self.device_uid.clone(), Utc::now());
        self.push_auth(Ok(session));
    }

    /// Queue the outcome of the next unanswered `fetch_device_state` call.
    pub fn push_fetch(&self, result: Result<DevicePayload, FetchError>) {
        self.state.lock().unwrap().fetch.push_back(result);
    }

    /// Payload returned once the fetch queue is drained.
    pub fn set_fallback_payload(&self, payload: DevicePayload) {
        self.state.lock().unwrap().fallback_payload = Some(payload);
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<PortalCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn auth_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == PortalCall::Authenticate)
            .count()
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, PortalCall::Fetch { .. }))
            .count()
    }
}

#[async_trait]
impl PortalClient for MockPortal {
    async fn authenticate(&mut self) -> Result<Session, AuthError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PortalCall::Authenticate);
        state
            .auth
            .pop_front()
            .unwrap_or_else(|| Ok(Session::new(self.device_uid.clone(), Utc::now())))
    }

    async fn fetch_device_state(&self, session: &Session) -> Result<DevicePayload, FetchError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PortalCall::Fetch {
            device_uid: session.device_uid.clone(),
        });
        match state.fetch.pop_front() {
            Some(result) => result,
            None => state
                .fallback_payload
                .clone()
                .ok_or_else(|| FetchError::Transient("no scripted response".into())),
        }
    }
}
