//! Boundary to the external, exchange-aware parsing engine.
//!
//! The engine owns every exchange-specific detail: symbol extraction,
//! message classification and field-by-field decoding of native payloads.
//! It speaks C strings in both directions; [`crate::facade::MsgParser`] does
//! the bridging on this side.
//!
//! Implementations must be reentrant: the façade may call them from several
//! threads at once and holds no lock around them.

use std::ffi::{CStr, CString};

use crate::error::EngineError;
use crate::types::MarketType;

/// What every engine operation returns: NUL-terminated text or a failure.
pub type EngineResult = Result<CString, EngineError>;

/// The five text-in/text-out operations of the parsing engine.
///
/// Every `exchange` and `msg` argument is valid only for the duration of the
/// call and must not be retained.
pub trait MsgEngine: Send + Sync {
    /// Exchange-native symbol of the message.
    fn extract_symbol(&self, exchange: &CStr, market_type: MarketType, msg: &CStr) -> EngineResult;

    /// Wire string of the message's [`crate::types::MessageType`].
    fn get_msg_type(&self, exchange: &CStr, msg: &CStr) -> EngineResult;

    /// JSON array of trade messages.
    fn parse_trade(&self, exchange: &CStr, market_type: MarketType, msg: &CStr) -> EngineResult;

    /// JSON array of order book messages. `timestamp` (ms) is used when the
    /// payload carries none of its own.
    fn parse_l2(&self, exchange: &CStr, market_type: MarketType, msg: &CStr, timestamp: i64) -> EngineResult;

    /// JSON array of funding rate messages.
    fn parse_funding_rate(&self, exchange: &CStr, market_type: MarketType, msg: &CStr) -> EngineResult;
}

impl<E: MsgEngine + ?Sized> MsgEngine for Box<E> {
    fn extract_symbol(&self, exchange: &CStr, market_type: MarketType, msg: &CStr) -> EngineResult {
        (**self).extract_symbol(exchange, market_type, msg)
    }

    fn get_msg_type(&self, exchange: &CStr, msg: &CStr) -> EngineResult {
        (**self).get_msg_type(exchange, msg)
    }

    fn parse_trade(&self, exchange: &CStr, market_type: MarketType, msg: &CStr) -> EngineResult {
        (**self).parse_trade(exchange, market_type, msg)
    }

    fn parse_l2(&self, exchange: &CStr, market_type: MarketType, msg: &CStr, timestamp: i64) -> EngineResult {
        (**self).parse_l2(exchange, market_type, msg, timestamp)
    }

    fn parse_funding_rate(&self, exchange: &CStr, market_type: MarketType, msg: &CStr) -> EngineResult {
        (**self).parse_funding_rate(exchange, market_type, msg)
    }
}
