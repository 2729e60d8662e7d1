//! # cmsg-core
//!
//! Unified market-data schema and the plumbing around an exchange-aware
//! parsing engine:
//!
//! - **Types** (`types`) — enums with wire string tables, unified messages
//! - **Codec** (`codec`) — strict JSON encode/decode of the unified schema
//! - **Bridge** (`bridge`) — zero-copy-when-possible C-string bridging
//! - **Engine** (`engine`) — the [`engine::MsgEngine`] boundary trait
//! - **Façade** (`facade`) — [`facade::MsgParser`], the public operations
//! - **Configuration** (`config`) — JSON config deserialization
//! - **Error types** (`error`) — `CmsgError` via thiserror
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod bridge;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod facade;
pub mod logging;
pub mod types;

// Re-export types at crate root for convenience.
pub use error::{CmsgError, EngineError, Result, SchemaError};
pub use facade::MsgParser;
pub use types::*;
