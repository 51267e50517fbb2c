//! Client for the econet24 cloud portal.
//!
//! The portal is a Django web application without a public API. Logging in
//! is a CSRF-protected form post; data comes from the `/service/*` JSON
//! endpoints the portal's own frontend uses, authorised by session cookies.

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod session;

pub use client::{Econet24Client, PortalClient};
pub use config::PortalConfig;
pub use error::{AuthError, FetchError};
pub use mock::{MockPortal, PortalCall};
pub use session::Session;
