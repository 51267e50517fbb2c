//! Sensor catalog and mapper for econet24 controllers.
//!
//! The catalog is a static table describing every vendor field the bridge
//! knows how to publish. The mapper walks that table against one
//! [`DevicePayload`](e24_protocol::DevicePayload) and produces the typed
//! readings and discovery records for it.

pub mod catalog;
pub mod mapper;
pub mod transform;

pub use mapper::SensorMapper;
