//! Binance JSON message parser.
//!
//! Turns Binance Spot, USDⓈ-M and COIN-M WebSocket payloads into unified
//! messages. Numbers arrive as strings and go through `fast-float2`.

use anyhow::{Context, Result, bail, ensure};
use cmsg_core::*;
use serde_json::Value;

use super::{Channel, EXCHANGE, Frame};
use crate::contract;
use crate::json_util::{
    field_amount, field_array, field_f64, field_str, field_u64, id_string, parse_levels, parse_str_u64, sort_snapshot,
    timestamp_from_caller,
};
use crate::{envelope, require_pair};

pub(crate) fn extract_symbol(frame: &Frame) -> Result<String> {
    if let Some(symbol) = frame.data.get("s").and_then(Value::as_str) {
        return Ok(symbol.to_string());
    }
    if let Some(symbol) = frame.stream_symbol() {
        return Ok(symbol);
    }
    if frame.data.is_array() || frame.stream.is_some_and(|s| s.starts_with('!')) {
        return Ok("ALL".to_string());
    }
    bail!("no symbol in message")
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Parse an `aggTrade` or `trade` event.
///
/// The taker side is the opposite of the maker flag `m`. The trade id is the
/// aggregate id `a` or the trade id `t`, falling back to the trade time `T`.
pub fn parse_trade(market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
    let v: Value = serde_json::from_str(msg)?;
    let frame = Frame::new(&v);
    ensure!(
        matches!(frame.channel(), Channel::AggTrade | Channel::Trade),
        "not a trade message"
    );
    let data = frame.data;

    let symbol = field_str(data, "s")?;
    let pair = require_pair(EXCHANGE, symbol)?;
    let price = field_amount(data, "p")?;
    let size = field_amount(data, "q")?;
    let trade_time = field_u64(data, "T")?;
    let buyer_is_maker = data.get("m").and_then(Value::as_bool).context("missing bool field `m`")?;
    let trade_id = id_string(data.get("a").or_else(|| data.get("t"))).unwrap_or_else(|| trade_time.to_string());

    let q = contract::quantities(EXCHANGE, market_type, &pair, price, size)?;
    Ok(vec![TradeMsg {
        envelope: envelope(EXCHANGE, market_type, MessageType::Trade, symbol, &pair, trade_time, msg),
        price,
        quantity_base: q.base,
        quantity_quote: q.quote,
        quantity_contract: q.contract,
        side: if buyer_is_maker { TradeSide::Sell } else { TradeSide::Buy },
        trade_id,
    }])
}

// ---------------------------------------------------------------------------
// Order books
// ---------------------------------------------------------------------------

pub fn parse_l2(market_type: MarketType, msg: &str, timestamp: i64) -> Result<Vec<OrderBookMsg>> {
    let v: Value = serde_json::from_str(msg)?;
    let frame = Frame::new(&v);
    match frame.channel() {
        Channel::DepthDiff => parse_depth_update(market_type, frame.data, msg).map(|m| vec![m]),
        Channel::DepthTopK => parse_partial_depth(market_type, &frame, msg, timestamp).map(|m| vec![m]),
        _ => bail!("not an order book message"),
    }
}

/// Diff depth stream: incremental update, sequenced by `u`.
///
/// Futures frames link to the previous update through `pu`; spot frames only
/// carry the first update id `U` of the batch.
fn parse_depth_update(market_type: MarketType, data: &Value, msg: &str) -> Result<OrderBookMsg> {
    let symbol = field_str(data, "s")?;
    let pair = require_pair(EXCHANGE, symbol)?;
    let event_time = field_u64(data, "E")?;
    let seq_id = field_u64(data, "u")?;
    let prev_seq_id = parse_str_u64(data.get("pu"))
        .or_else(|| parse_str_u64(data.get("U")).and_then(|first| first.checked_sub(1)));

    let (asks, bids) = orders(market_type, &pair, field_array(data, "a")?, field_array(data, "b")?)?;
    Ok(OrderBookMsg {
        envelope: envelope(EXCHANGE, market_type, MessageType::L2Event, symbol, &pair, event_time, msg),
        asks,
        bids,
        snapshot: false,
        seq_id: Some(seq_id),
        prev_seq_id,
    })
}

/// Partial book depth (`@depthN`): a top-N snapshot.
///
/// Spot frames are `{"lastUpdateId","bids","asks"}` with neither symbol nor
/// event time, so the symbol comes from the stream name and the timestamp from
/// the caller. Futures frames look like a `depthUpdate` event.
fn parse_partial_depth(market_type: MarketType, frame: &Frame, msg: &str, timestamp: i64) -> Result<OrderBookMsg> {
    let data = frame.data;
    let (symbol, seq_id, prev_seq_id, asks, bids) = if let Some(last_update_id) = parse_str_u64(data.get("lastUpdateId")) {
        let symbol = frame.stream_symbol().context("partial depth frame without stream name")?;
        (symbol, last_update_id, None, field_array(data, "asks")?, field_array(data, "bids")?)
    } else {
        (
            field_str(data, "s")?.to_string(),
            field_u64(data, "u")?,
            parse_str_u64(data.get("pu")),
            field_array(data, "a")?,
            field_array(data, "b")?,
        )
    };
    let ts = match parse_str_u64(data.get("E")) {
        Some(event_time) => event_time,
        None => timestamp_from_caller(timestamp)?,
    };

    let pair = require_pair(EXCHANGE, &symbol)?;
    let (mut asks, mut bids) = orders(market_type, &pair, asks, bids)?;
    sort_snapshot(&mut asks, &mut bids);
    Ok(OrderBookMsg {
        envelope: envelope(EXCHANGE, market_type, MessageType::L2TopK, &symbol, &pair, ts, msg),
        asks,
        bids,
        snapshot: true,
        seq_id: Some(seq_id),
        prev_seq_id,
    })
}

fn orders(market_type: MarketType, pair: &str, asks: &[Value], bids: &[Value]) -> Result<(Vec<Order>, Vec<Order>)> {
    let convert = |levels: &[Value]| -> Result<Vec<Order>> {
        parse_levels(levels)?
            .into_iter()
            .map(|level| contract::order(EXCHANGE, market_type, pair, level))
            .collect()
    };
    Ok((convert(asks).context("asks")?, convert(bids).context("bids")?))
}

// ---------------------------------------------------------------------------
// Funding rates
// ---------------------------------------------------------------------------

/// Parse a `markPriceUpdate` event, or the `!markPrice@arr` array of them.
///
/// Delivery contracts report an empty funding rate and are skipped.
pub fn parse_funding_rate(market_type: MarketType, msg: &str) -> Result<Vec<FundingRateMsg>> {
    ensure!(
        matches!(market_type, MarketType::LinearSwap | MarketType::InverseSwap),
        "binance funding rates exist only for perpetual swaps, not {market_type}"
    );
    let v: Value = serde_json::from_str(msg)?;
    let frame = Frame::new(&v);
    ensure!(frame.channel() == Channel::MarkPrice, "not a funding rate message");

    let items = match frame.data {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .filter(|item| item.get("r").and_then(Value::as_str) != Some(""))
        .map(|item| {
            let symbol = field_str(item, "s")?;
            let pair = require_pair(EXCHANGE, symbol)?;
            let funding_time = field_u64(item, "T")?;
            Ok(FundingRateMsg {
                envelope: envelope(
                    EXCHANGE,
                    market_type,
                    MessageType::FundingRate,
                    symbol,
                    &pair,
                    field_u64(item, "E")?,
                    msg,
                ),
                funding_rate: field_f64(item, "r")?,
                funding_time: i64::try_from(funding_time).context("funding time out of range")?,
                estimated_rate: None,
            })
        })
        .collect()
}
