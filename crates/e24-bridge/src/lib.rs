//! Library half of the econet24 bridge.
//!
//! Re-exports all modules so external crates (e.g. `e24-e2e-tests`) can
//! drive the real `BridgeLoop` against mock collaborators.

pub mod backoff;
pub mod bridge_loop;
pub mod config;
pub mod logging;

pub use backoff::Backoff;
pub use bridge_loop::{BridgeLoop, BridgeState, LoopSettings, StopReason};
pub use config::BridgeConfig;
