//! End-to-end tests for the econet24 bridge live in `tests/`.
//!
//! They run the real `BridgeLoop` against a wiremock econet24 portal and a
//! `MockChannel` broker, crossing every crate boundary.
