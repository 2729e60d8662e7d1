//! # cmsg-engine
//!
//! Reference implementation of the exchange-aware parsing engine behind
//! [`cmsg_core::engine::MsgEngine`].
//!
//! ## Architecture
//!
//! Each exchange provides an [`ExchangeParser`] that turns native WebSocket
//! JSON into unified messages. [`ExchangeEngine`] picks the parser by
//! exchange name, runs it, and encodes the result through the unified codec
//! as C-string text, exactly as a foreign engine would hand it back.
//!
//! ## Shared infrastructure
//!
//! - [`registry`] — exchange name → parser
//! - [`json_util`] — JSON parsing helpers
//! - [`pair`] — exchange symbol → `BASE/QUOTE`
//! - [`contract`] — contract values and quantity derivation
//!
//! The free functions at the crate root run the public operations over a
//! default engine.

pub mod binance;
pub mod bybit;
pub mod contract;
pub mod json_util;
pub mod okx;
pub mod pair;
pub mod registry;

use std::ffi::{CStr, CString};

use anyhow::{Context, Result};
use cmsg_core::codec;
use cmsg_core::config::EngineConfig;
use cmsg_core::engine::{EngineResult, MsgEngine};
use cmsg_core::*;
use tracing::debug;

/// Trait implemented by all exchange parsers.
///
/// Parsers are stateless; one static instance serves every thread.
pub trait ExchangeParser: Send + Sync {
    /// Canonical exchange name, as written into every envelope.
    fn name(&self) -> &'static str;

    fn extract_symbol(&self, market_type: MarketType, msg: &str) -> Result<String>;

    /// Classify a message; anything unrecognized is [`MessageType::Other`].
    fn get_msg_type(&self, msg: &str) -> MessageType;

    fn parse_trade(&self, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>>;

    fn parse_l2(&self, market_type: MarketType, msg: &str, timestamp: i64) -> Result<Vec<OrderBookMsg>>;

    fn parse_funding_rate(&self, market_type: MarketType, msg: &str) -> Result<Vec<FundingRateMsg>>;
}

/// The reference engine: dispatches to the built-in exchange parsers.
#[derive(Debug, Clone, Default)]
pub struct ExchangeEngine {
    /// Lowercase exchange names accepted; empty accepts all.
    enabled: Vec<String>,
}

impl ExchangeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            enabled: config.exchanges.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    fn parser(&self, exchange: &str) -> Result<&'static dyn ExchangeParser> {
        let name = exchange.to_lowercase();
        if !self.enabled.is_empty() && !self.enabled.contains(&name) {
            anyhow::bail!("exchange `{exchange}` is not enabled");
        }
        registry::parser_for(&name).with_context(|| format!("unsupported exchange `{exchange}`"))
    }

    /// Decode the C inputs, run `f` on the right parser, encode the output.
    fn run<F>(&self, exchange: &CStr, msg: &CStr, f: F) -> EngineResult
    where
        F: FnOnce(&'static dyn ExchangeParser, &str) -> Result<String>,
    {
        let result = exchange
            .to_str()
            .context("exchange name is not UTF-8")
            .and_then(|exchange| self.parser(exchange))
            .and_then(|parser| {
                let msg = msg.to_str().context("message is not UTF-8")?;
                f(parser, msg).with_context(|| format!("{} parser", parser.name()))
            });

        let text = result.map_err(|e| {
            debug!(exchange = %exchange.to_string_lossy(), error = %format!("{e:#}"), "engine call failed");
            EngineError::new(format!("{e:#}"))
        })?;
        CString::new(text).map_err(|e| EngineError::new(e.to_string()))
    }
}

impl MsgEngine for ExchangeEngine {
    fn extract_symbol(&self, exchange: &CStr, market_type: MarketType, msg: &CStr) -> EngineResult {
        self.run(exchange, msg, |p, msg| p.extract_symbol(market_type, msg))
    }

    fn get_msg_type(&self, exchange: &CStr, msg: &CStr) -> EngineResult {
        self.run(exchange, msg, |p, msg| Ok(p.get_msg_type(msg).as_str().to_string()))
    }

    fn parse_trade(&self, exchange: &CStr, market_type: MarketType, msg: &CStr) -> EngineResult {
        self.run(exchange, msg, |p, msg| Ok(codec::encode_array(&p.parse_trade(market_type, msg)?)))
    }

    fn parse_l2(&self, exchange: &CStr, market_type: MarketType, msg: &CStr, timestamp: i64) -> EngineResult {
        self.run(exchange, msg, |p, msg| {
            Ok(codec::encode_array(&p.parse_l2(market_type, msg, timestamp)?))
        })
    }

    fn parse_funding_rate(&self, exchange: &CStr, market_type: MarketType, msg: &CStr) -> EngineResult {
        self.run(exchange, msg, |p, msg| {
            Ok(codec::encode_array(&p.parse_funding_rate(market_type, msg)?))
        })
    }
}

/// Build the envelope shared by every message a parser emits.
pub(crate) fn envelope(
    exchange: &str,
    market_type: MarketType,
    msg_type: MessageType,
    symbol: &str,
    pair: &str,
    timestamp: u64,
    json: &str,
) -> Envelope {
    Envelope {
        exchange: exchange.to_string(),
        market_type,
        msg_type,
        symbol: symbol.to_string(),
        pair: pair.to_string(),
        timestamp,
        json: json.to_string(),
    }
}

/// Unified pair for `symbol`, or an error naming it.
pub(crate) fn require_pair(exchange: &str, symbol: &str) -> Result<String> {
    pair::normalize_pair(exchange, symbol).with_context(|| format!("cannot derive pair from symbol `{symbol}`"))
}

// ---------------------------------------------------------------------------
// Convenience operations over a default engine
// ---------------------------------------------------------------------------

/// A façade over the reference engine with default options.
pub fn default_parser() -> MsgParser<ExchangeEngine> {
    MsgParser::new(ExchangeEngine::new())
}

/// Extract the symbol from a message.
pub fn extract_symbol(exchange: &str, market_type: MarketType, msg: &str) -> cmsg_core::Result<String> {
    default_parser().extract_symbol(exchange, market_type, msg)
}

/// Infer the message type of a message.
pub fn get_msg_type(exchange: &str, msg: &str) -> cmsg_core::Result<MessageType> {
    default_parser().get_msg_type(exchange, msg)
}

/// Parse a raw trade message into unified trades.
pub fn parse_trade(exchange: &str, market_type: MarketType, msg: &str) -> cmsg_core::Result<Vec<TradeMsg>> {
    default_parser().parse_trade(exchange, market_type, msg)
}

/// Parse a raw level-2 order book message.
pub fn parse_l2(
    exchange: &str,
    market_type: MarketType,
    msg: &str,
    timestamp: i64,
) -> cmsg_core::Result<Vec<OrderBookMsg>> {
    default_parser().parse_l2(exchange, market_type, msg, timestamp)
}

/// Parse a raw funding rate message.
pub fn parse_funding_rate(
    exchange: &str,
    market_type: MarketType,
    msg: &str,
) -> cmsg_core::Result<Vec<FundingRateMsg>> {
    default_parser().parse_funding_rate(exchange, market_type, msg)
}
