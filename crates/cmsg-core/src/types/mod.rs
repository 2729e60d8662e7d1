//! Unified schema: enumerations and message structures.

pub mod enums;
pub mod message;

pub use enums::*;
pub use message::*;
