//! The core module holds the error type, settings and the interfaces this crate consumes from the device layer.

pub mod device;
pub mod error;
pub mod settings;
