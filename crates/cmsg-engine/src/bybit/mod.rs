//! Bybit market data (v5 public topics).
//!
//! Frames are `{"topic":"<channel>[.<depth>].<symbol>","type":..,"ts":..,"data":..}`.
//! `orderbook.1` is the best bid/offer feed; deeper `orderbook.N` topics are
//! level-2 books. Funding rates ride on derivative `tickers`.

pub mod json_parser;

use anyhow::Result;
use cmsg_core::*;
use serde_json::Value;

use crate::ExchangeParser;

pub const EXCHANGE: &str = "bybit";

/// Bybit parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BybitParser;

/// A topic split into channel, optional depth and symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Topic<'a> {
    pub channel: &'a str,
    pub depth: Option<u32>,
    pub symbol: &'a str,
}

impl<'a> Topic<'a> {
    pub fn parse(topic: &'a str) -> Option<Self> {
        let (channel, rest) = topic.split_once('.')?;
        match channel {
            "orderbook" | "kline" => {
                let (param, symbol) = rest.split_once('.')?;
                Some(Self {
                    channel,
                    depth: param.parse().ok(),
                    symbol,
                })
            }
            _ => Some(Self {
                channel,
                depth: None,
                symbol: rest,
            }),
        }
    }

    pub fn of(v: &'a Value) -> Option<Self> {
        Self::parse(v.get("topic")?.as_str()?)
    }

    pub fn msg_type(&self) -> MessageType {
        match (self.channel, self.depth) {
            ("publicTrade", _) => MessageType::Trade,
            ("orderbook", Some(1)) => MessageType::BBO,
            ("orderbook", Some(_)) => MessageType::L2Event,
            ("tickers", _) => MessageType::Ticker,
            ("kline", _) => MessageType::Candlestick,
            _ => MessageType::Other,
        }
    }
}

impl ExchangeParser for BybitParser {
    fn name(&self) -> &'static str {
        EXCHANGE
    }

    fn extract_symbol(&self, _market_type: MarketType, msg: &str) -> Result<String> {
        json_parser::extract_symbol(msg)
    }

    fn get_msg_type(&self, msg: &str) -> MessageType {
        serde_json::from_str::<Value>(msg)
            .ok()
            .and_then(|v| Topic::of(&v).map(|t| t.msg_type()))
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
