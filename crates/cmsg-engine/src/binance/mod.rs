//! Binance market data.
//!
//! Accepts raw frames (`{"e":"aggTrade",...}`) and combined-stream frames
//! (`{"stream":"btcusdt@aggTrade","data":{...}}`). With a combined frame the
//! stream name decides the channel; otherwise the `e` event field does.

pub mod json_parser;

use anyhow::Result;
use cmsg_core::*;
use serde_json::Value;

use crate::ExchangeParser;

pub const EXCHANGE: &str = "binance";

/// Binance parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinanceParser;

/// Channel of a Binance frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Channel {
    AggTrade,
    Trade,
    /// `@depth` / `@depth@100ms` diff stream.
    DepthDiff,
    /// `@depth5`, `@depth10`, `@depth20` partial book.
    DepthTopK,
    MarkPrice,
    BookTicker,
    Ticker,
    Kline,
    Other,
}

impl Channel {
    fn msg_type(self) -> MessageType {
        match self {
            Self::AggTrade | Self::Trade => MessageType::Trade,
            Self::DepthDiff => MessageType::L2Event,
            Self::DepthTopK => MessageType::L2TopK,
            Self::MarkPrice => MessageType::FundingRate,
            Self::BookTicker => MessageType::BBO,
            Self::Ticker => MessageType::Ticker,
            Self::Kline => MessageType::Candlestick,
            Self::Other => MessageType::Other,
        }
    }
}

/// A frame split into its optional stream name and its payload.
pub(crate) struct Frame<'a> {
    pub stream: Option<&'a str>,
    pub data: &'a Value,
}

impl<'a> Frame<'a> {
    pub fn new(v: &'a Value) -> Self {
        match (v.get("stream").and_then(Value::as_str), v.get("data")) {
            (Some(stream), Some(data)) => Self {
                stream: Some(stream),
                data,
            },
            _ => Self { stream: None, data: v },
        }
    }

    pub fn channel(&self) -> Channel {
        match self.stream {
            Some(stream) => channel_from_stream(stream),
            None => channel_from_event(self.data),
        }
    }

    /// Symbol prefix of the stream name (`btcusdt@depth5` → `BTCUSDT`).
    pub fn stream_symbol(&self) -> Option<String> {
        let stream = self.stream?;
        if stream.starts_with('!') {
            return None;
        }
        let (symbol, _) = stream.split_once('@')?;
        Some(symbol.to_uppercase())
    }
}

fn channel_from_stream(stream: &str) -> Channel {
    // `!markPrice@arr` style all-market streams carry the channel first.
    let name = match stream.strip_prefix('!') {
        Some(rest) => rest.split('@').next().unwrap_or(rest),
        None => stream.split('@').nth(1).unwrap_or(""),
    };
    match name {
        "aggTrade" => Channel::AggTrade,
        "trade" => Channel::Trade,
        "depth" => Channel::DepthDiff,
        "depth5" | "depth10" | "depth20" => Channel::DepthTopK,
        "markPrice" => Channel::MarkPrice,
        "bookTicker" => Channel::BookTicker,
        "ticker" | "miniTicker" => Channel::Ticker,
        k if k.starts_with("kline_") => Channel::Kline,
        _ => Channel::Other,
    }
}

fn channel_from_event(data: &Value) -> Channel {
    let first = match data {
        Value::Array(items) => items.first().unwrap_or(data),
        _ => data,
    };
    match first.get("e").and_then(Value::as_str) {
        Some("aggTrade") => Channel::AggTrade,
        Some("trade") => Channel::Trade,
        Some("depthUpdate") => Channel::DepthDiff,
        Some("markPriceUpdate") => Channel::MarkPrice,
        Some("bookTicker") => Channel::BookTicker,
        Some("24hrTicker" | "24hrMiniTicker") => Channel::Ticker,
        Some("kline") => Channel::Kline,
        Some(_) => Channel::Other,
        // Spot partial books and spot book tickers carry no event field.
        None if first.get("lastUpdateId").is_some() => Channel::DepthTopK,
        None if ["u", "s", "b", "a"].iter().all(|k| first.get(k).is_some()) => Channel::BookTicker,
        None => Channel::Other,
    }
}

impl ExchangeParser for BinanceParser {
    fn name(&self) -> &'static str {
        EXCHANGE
    }

    fn extract_symbol(&self, _market_type: MarketType, msg: &str) -> Result<String> {
        let v: Value = serde_json::from_str(msg)?;
        json_parser::extract_symbol(&Frame::new(&v))
    }

    fn get_msg_type(&self, msg: &str) -> MessageType {
        match serde_json::from_str::<Value>(msg) {
            Ok(v) => Frame::new(&v).channel().msg_type(),
            Err(_) => MessageType::Other,
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn msg_type(msg: &str) -> MessageType {
        BinanceParser.get_msg_type(msg)
    }

    #[test]
    fn classify_combined_streams() {
        assert_eq!(msg_type(r#"{"stream":"btcusdt@aggTrade","data":{}}"#), MessageType::Trade);
        assert_eq!(msg_type(r#"{"stream":"btcusdt@trade","data":{}}"#), MessageType::Trade);
        assert_eq!(msg_type(r#"{"stream":"btcusdt@depth@100ms","data":{}}"#), MessageType::L2Event);
        assert_eq!(msg_type(r#"{"stream":"btcusdt@depth5@100ms","data":{}}"#), MessageType::L2TopK);
        assert_eq!(msg_type(r#"{"stream":"btcusdt@markPrice@1s","data":{}}"#), MessageType::FundingRate);
        assert_eq!(msg_type(r#"{"stream":"!markPrice@arr","data":[]}"#), MessageType::FundingRate);
        assert_eq!(msg_type(r#"{"stream":"btcusdt@bookTicker","data":{}}"#), MessageType::BBO);
        assert_eq!(msg_type(r#"{"stream":"btcusdt@kline_1m","data":{}}"#), MessageType::Candlestick);
        assert_eq!(msg_type(r#"{"stream":"!miniTicker@arr","data":[]}"#), MessageType::Ticker);
        assert_eq!(msg_type(r#"{"stream":"btcusdt@forceOrder","data":{}}"#), MessageType::Other);
    }

    #[test]
    fn classify_raw_events() {
        assert_eq!(msg_type(r#"{"e":"aggTrade","s":"BTCUSDT"}"#), MessageType::Trade);
        assert_eq!(msg_type(r#"{"e":"depthUpdate","s":"BTCUSDT"}"#), MessageType::L2Event);
        assert_eq!(msg_type(r#"[{"e":"markPriceUpdate","s":"BTCUSDT"}]"#), MessageType::FundingRate);
        assert_eq!(msg_type(r#"{"lastUpdateId":1,"bids":[],"asks":[]}"#), MessageType::L2TopK);
        assert_eq!(msg_type(r#"{"u":1,"s":"BNBUSDT","b":"1","B":"1","a":"2","A":"1"}"#), MessageType::BBO);
        assert_eq!(msg_type(r#"{"result":null,"id":1}"#), MessageType::Other);
        assert_eq!(msg_type("not json"), MessageType::Other);
    }

    #[test]
    fn stream_symbol() {
        let v: Value = serde_json::from_str(r#"{"stream":"ethusdt@depth10","data":{}}"#).unwrap();
        assert_eq!(Frame::new(&v).stream_symbol().as_deref(), Some("ETHUSDT"));
        let v: Value = serde_json::from_str(r#"{"stream":"!markPrice@arr","data":[]}"#).unwrap();
        assert_eq!(Frame::new(&v).stream_symbol(), None);
    }
}
