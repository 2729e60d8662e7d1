//! Bybit JSON message parser.
//!
//! Linear contracts are sized in base coins and inverse contracts in USD, so
//! the contract value is always one unit.

use anyhow::{Context, Result, bail, ensure};
use cmsg_core::*;
use serde_json::Value;

use super::{EXCHANGE, Topic};
use crate::contract;
use crate::json_util::{
    field_amount, field_array, field_f64, field_i64, field_str, field_u64, id_string, parse_levels, parse_side,
    parse_str_u64, sort_snapshot, timestamp_from_caller,
};
use crate::{envelope, require_pair};

fn frame(msg: &str) -> Result<(Value, String)> {
    let v: Value = serde_json::from_str(msg)?;
    let topic = v.get("topic").and_then(Value::as_str).context("missing `topic`")?.to_string();
    Ok((v, topic))
}

pub fn extract_symbol(msg: &str) -> Result<String> {
    let (_, topic) = frame(msg)?;
    let topic = Topic::parse(&topic).with_context(|| format!("malformed topic `{topic}`"))?;
    Ok(topic.symbol.to_string())
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Parse a `publicTrade` message; one frame may carry several trades.
pub fn parse_trade(market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
    let (v, topic) = frame(msg)?;
    ensure!(topic.starts_with("publicTrade."), "topic `{topic}` is not a trade topic");

    field_array(&v, "data")?
        .iter()
        .map(|item| {
            let symbol = field_str(item, "s")?;
            let pair = require_pair(EXCHANGE, symbol)?;
            let price = field_amount(item, "p")?;
            let size = field_amount(item, "v")?;
            let q = contract::quantities(EXCHANGE, market_type, &pair, price, size)?;
            Ok(TradeMsg {
                envelope: envelope(EXCHANGE, market_type, MessageType::Trade, symbol, &pair, field_u64(item, "T")?, msg),
                price,
                quantity_base: q.base,
                quantity_quote: q.quote,
                quantity_contract: q.contract,
                side: parse_side(field_str(item, "S")?)?,
                trade_id: id_string(item.get("i")).context("missing trade id `i`")?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Order books
// ---------------------------------------------------------------------------

/// Parse an `orderbook.N` message (N > 1).
///
/// `type` distinguishes full snapshots from deltas; `u` is the update id.
/// A zero size in a delta deletes the level.
pub fn parse_l2(market_type: MarketType, msg: &str, timestamp: i64) -> Result<Vec<OrderBookMsg>> {
    let (v, topic) = frame(msg)?;
    let topic = Topic::parse(&topic).with_context(|| format!("malformed topic `{topic}`"))?;
    if topic.msg_type() != MessageType::L2Event {
        bail!("topic `{}` is not a level-2 order book", topic.channel);
    }
    let data = v.get("data").context("missing `data`")?;
    let snapshot = match v.get("type").and_then(Value::as_str) {
        Some("snapshot") => true,
        Some("delta") => false,
        other => bail!("unknown order book type {other:?}"),
    };

    let symbol = data.get("s").and_then(Value::as_str).unwrap_or(topic.symbol);
    let pair = require_pair(EXCHANGE, symbol)?;
    let convert = |key: &str| -> Result<Vec<Order>> {
        parse_levels(field_array(data, key)?)?
            .into_iter()
            .map(|level| contract::order(EXCHANGE, market_type, &pair, level))
            .collect()
    };
    let mut asks = convert("a")?;
    let mut bids = convert("b")?;
    if snapshot {
        sort_snapshot(&mut asks, &mut bids);
    }
    let ts = match parse_str_u64(v.get("ts")) {
        Some(ts) => ts,
        None => timestamp_from_caller(timestamp)?,
    };

    Ok(vec![OrderBookMsg {
        envelope: envelope(EXCHANGE, market_type, MessageType::L2Event, symbol, &pair, ts, msg),
        asks,
        bids,
        snapshot,
        seq_id: parse_str_u64(data.get("u")),
        prev_seq_id: None,
    }])
}

// ---------------------------------------------------------------------------
// Funding rates
// ---------------------------------------------------------------------------

/// Extract the funding rate from a derivative `tickers` message.
///
/// Ticker deltas only carry changed fields; one without `fundingRate` yields
/// no messages.
pub fn parse_funding_rate(market_type: MarketType, msg: &str) -> Result<Vec<FundingRateMsg>> {
    ensure!(
        matches!(market_type, MarketType::LinearSwap | MarketType::InverseSwap),
        "bybit funding rates exist only for perpetual swaps, not {market_type}"
    );
    let (v, topic) = frame(msg)?;
    ensure!(topic.starts_with("tickers."), "topic `{topic}` is not a ticker topic");
    let data = v.get("data").context("missing `data`")?;

    if data.get("fundingRate").is_none() {
        return Ok(Vec::new());
    }
    let funding_rate = field_f64(data, "fundingRate")?;
    let symbol = field_str(data, "symbol")?;
    let pair = require_pair(EXCHANGE, symbol)?;
    Ok(vec![FundingRateMsg {
        envelope: envelope(EXCHANGE, market_type, MessageType::FundingRate, symbol, &pair, field_u64(&v, "ts")?, msg),
        funding_rate,
        funding_time: field_i64(data, "nextFundingTime")?,
        estimated_rate: None,
    }])
}
