//! OKX market data (v5 public channels).
//!
//! Every push frame is `{"arg":{"channel":..,"instId":..},"data":[..]}`;
//! the channel decides the message type.

pub mod json_parser;

use anyhow::Result;
use cmsg_core::*;
use serde_json::Value;

use crate::ExchangeParser;

pub const EXCHANGE: &str = "okx";

/// OKX parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct OkxParser;

/// Message type of an OKX channel name.
pub(crate) fn channel_msg_type(channel: &str) -> MessageType {
    match channel {
        "trades" | "trades-all" => MessageType::Trade,
        "books" | "books-l2-tbt" | "books50-l2-tbt" => MessageType::L2Event,
        "books5" => MessageType::L2TopK,
        "bbo-tbt" => MessageType::BBO,
        "tickers" => MessageType::Ticker,
        "funding-rate" => MessageType::FundingRate,
        "open-interest" => MessageType::OpenInterest,
        c if c.starts_with("candle") => MessageType::Candlestick,
        _ => MessageType::Other,
    }
}

/// `arg.channel` of a push frame.
pub(crate) fn channel(v: &Value) -> Option<&str> {
    v.get("arg")?.get("channel")?.as_str()
}

impl ExchangeParser for OkxParser {
    fn name(&self) -> &'static str {
        EXCHANGE
    }

    fn extract_symbol(&self, _market_type: MarketType, msg: &str) -> Result<String> {
        json_parser::extract_symbol(msg)
    }

    fn get_msg_type(&self, msg: &str) -> MessageType {
        // OKX answers a text `ping` with a bare `pong`.
        serde_json::from_str::<Value>(msg)
            .ok()
            .and_then(|v| channel(&v).map(channel_msg_type))
            .unwrap_or(MessageType::Other)
    }

    fn parse_trade(&self, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
        json_parser::parse_trade(market_type, msg)
    }

    fn parse_l2(&self, market_type: MarketType, msg: &str, timestamp: i64) -> Result<Vec<OrderBookMsg>> {
        json_parser::parse_l2(market_type, msg, timestamp)
    }

    fn parse_funding_rate(&self, market_type: MarketType, msg: &str) -> Result<Vec<FundingRateMsg>> {
        json_parser::parse_funding_rate(market_type, msg)
    }
}
