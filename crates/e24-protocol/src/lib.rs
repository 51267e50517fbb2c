pub mod device;
pub mod discovery;
pub mod payload;
pub mod sensor;
pub mod slug;
pub mod topics;

pub use device::*;
pub use discovery::*;
pub use payload::*;
pub use sensor::*;
pub use slug::slugify;
