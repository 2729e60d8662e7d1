//! OKX JSON message parser.
//!
//! Routes by `arg.channel`:
//!
//! - `trades` → [`TradeMsg`]
//! - `books`, `books-l2-tbt`, `books50-l2-tbt` → [`OrderBookMsg`] events,
//!   or a snapshot when `action` is `snapshot`
//! - `books5` → top-5 [`OrderBookMsg`] snapshot
//! - `funding-rate` → [`FundingRateMsg`]
//!
//! Derivative sizes are in contracts; see [`crate::contract`].

use anyhow::{Context, Result, bail, ensure};
use cmsg_core::*;
use serde_json::Value;

use super::{EXCHANGE, channel, channel_msg_type};
use crate::contract;
use crate::json_util::{
    field_amount, field_array, field_f64, field_i64, field_str, field_u64, id_string, parse_levels, parse_side,
    parse_str_i64, parse_str_u64, sort_snapshot, timestamp_from_caller,
};
use crate::{envelope, require_pair};

/// A parsed push frame: channel, instrument and data items.
struct Push<'a> {
    channel: &'a str,
    inst_id: Option<&'a str>,
    data: &'a [Value],
}

impl<'a> Push<'a> {
    fn new(v: &'a Value) -> Result<Self> {
        let channel = channel(v).context("missing `arg.channel`")?;
        let inst_id = v.get("arg").and_then(|arg| arg.get("instId")).and_then(Value::as_str);
        Ok(Self {
            channel,
            inst_id,
            data: field_array(v, "data")?,
        })
    }

    fn require(&self, msg_type: MessageType) -> Result<()> {
        ensure!(
            channel_msg_type(self.channel) == msg_type,
            "channel `{}` does not carry {msg_type} messages",
            self.channel
        );
        Ok(())
    }

    /// Instrument of a data item, falling back to the subscription's.
    fn inst_id(&self, item: &'a Value) -> Result<&'a str> {
        item.get("instId")
            .and_then(Value::as_str)
            .or(self.inst_id)
            .context("missing `instId`")
    }
}

pub fn extract_symbol(msg: &str) -> Result<String> {
    let v: Value = serde_json::from_str(msg)?;
    let from_arg = v.get("arg").and_then(|arg| arg.get("instId")).and_then(Value::as_str);
    let from_data = v
        .get("data")
        .and_then(|d| d.get(0))
        .and_then(|item| item.get("instId"))
        .and_then(Value::as_str);
    match from_arg.or(from_data) {
        Some(inst_id) => Ok(inst_id.to_string()),
        // Subscriptions by instrument type or family cover every symbol.
        None if v.get("arg").is_some_and(|arg| arg.get("instType").is_some() || arg.get("instFamily").is_some()) => {
            Ok("ALL".to_string())
        }
        None => bail!("no symbol in message"),
    }
}

pub fn parse_trade(market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
    let v: Value = serde_json::from_str(msg)?;
    let push = Push::new(&v)?;
    push.require(MessageType::Trade)?;

    push.data
        .iter()
        .map(|item| {
            let inst_id = push.inst_id(item)?;
            let pair = require_pair(EXCHANGE, inst_id)?;
            let price = field_amount(item, "px")?;
            let size = field_amount(item, "sz")?;
            let q = contract::quantities(EXCHANGE, market_type, &pair, price, size)?;
            Ok(TradeMsg {
                envelope: envelope(EXCHANGE, market_type, MessageType::Trade, inst_id, &pair, field_u64(item, "ts")?, msg),
                price,
                quantity_base: q.base,
                quantity_quote: q.quote,
                quantity_contract: q.contract,
                side: parse_side(field_str(item, "side")?)?,
                trade_id: id_string(item.get("tradeId")).context("missing `tradeId`")?,
            })
        })
        .collect()
}

/// `seqId` / `prevSeqId`; OKX sends `-1` when there is none.
fn seq(v: Option<&Value>) -> Option<u64> {
    parse_str_i64(v).and_then(|n| u64::try_from(n).ok())
}

pub fn parse_l2(market_type: MarketType, msg: &str, timestamp: i64) -> Result<Vec<OrderBookMsg>> {
    let v: Value = serde_json::from_str(msg)?;
    let push = Push::new(&v)?;
    let msg_type = channel_msg_type(push.channel);
    let snapshot = match msg_type {
        MessageType::L2Event => v.get("action").and_then(Value::as_str) == Some("snapshot"),
        MessageType::L2TopK => true,
        _ => bail!("channel `{}` is not an order book channel", push.channel),
    };

    push.data
        .iter()
        .map(|item| {
            let inst_id = push.inst_id(item)?;
            let pair = require_pair(EXCHANGE, inst_id)?;
            let convert = |key: &str| -> Result<Vec<Order>> {
                parse_levels(field_array(item, key)?)?
                    .into_iter()
                    .map(|level| contract::order(EXCHANGE, market_type, &pair, level))
                    .collect()
            };
            let mut asks = convert("asks")?;
            let mut bids = convert("bids")?;
            if snapshot {
                sort_snapshot(&mut asks, &mut bids);
            }
            let ts = match parse_str_u64(item.get("ts")) {
                Some(ts) => ts,
                None => timestamp_from_caller(timestamp)?,
            };
            Ok(OrderBookMsg {
                envelope: envelope(EXCHANGE, market_type, msg_type, inst_id, &pair, ts, msg),
                asks,
                bids,
                snapshot,
                seq_id: seq(item.get("seqId")),
                prev_seq_id: seq(item.get("prevSeqId")),
            })
        })
        .collect()
}

/// Parse a `funding-rate` push. `nextFundingRate` becomes the estimated rate
/// and is absent when OKX sends it empty.
pub fn parse_funding_rate(market_type: MarketType, msg: &str) -> Result<Vec<FundingRateMsg>> {
    ensure!(
        matches!(market_type, MarketType::LinearSwap | MarketType::InverseSwap),
        "okx funding rates exist only for perpetual swaps, not {market_type}"
    );
    let v: Value = serde_json::from_str(msg)?;
    let push = Push::new(&v)?;
    push.require(MessageType::FundingRate)?;

    push.data
        .iter()
        .map(|item| {
            let inst_id = push.inst_id(item)?;
            let pair = require_pair(EXCHANGE, inst_id)?;
            let funding_time = field_i64(item, "fundingTime")?;
            let ts = match parse_str_u64(item.get("ts")) {
                Some(ts) => ts,
                None => u64::try_from(funding_time).context("negative funding time")?,
            };
            Ok(FundingRateMsg {
                envelope: envelope(EXCHANGE, market_type, MessageType::FundingRate, inst_id, &pair, ts, msg),
                funding_rate: field_f64(item, "fundingRate")?,
                funding_time,
                estimated_rate: match item.get("nextFundingRate") {
                    None => None,
                    Some(Value::String(s)) if s.is_empty() => None,
                    Some(_) => Some(field_f64(item, "nextFundingRate")?),
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trade_msg() {
        let json = r#"{
            "arg": {"channel": "trades", "instId": "BTC-USDT-SWAP"},
            "data": [{
                "instId": "BTC-USDT-SWAP",
                "tradeId": "987654321",
                "px": "30001.5",
                "sz": "2",
                "side": "sell",
                "ts": "1672515782200"
            }]
        }"#;
        let trades = parse_trade(MarketType::LinearSwap, json).unwrap();
        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!(t.symbol(), "BTC-USDT-SWAP");
        assert_eq!(t.envelope.pair, "BTC/USDT");
        assert_eq!(t.price, 30001.5);
        assert_eq!(t.side, TradeSide::Sell);
        assert_eq!(t.trade_id, "987654321");
        assert_eq!(t.quantity_contract, Some(2.0));
        assert!((t.quantity_base - 0.02).abs() < 1e-12);
        assert_eq!(t.timestamp(), 1672515782200);
    }

    #[test]
    fn spot_trades_are_base_sized() {
        let json = r#"{"arg":{"channel":"trades","instId":"ETH-USDT"},"data":[
            {"tradeId":"1","px":"2000","sz":"0.5","side":"buy","ts":"1"},
            {"tradeId":"2","px":"2001","sz":"1","side":"sell","ts":"2"}]}"#;
        let trades = parse_trade(MarketType::Spot, json).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].symbol(), "ETH-USDT");
        assert_eq!(trades[0].quantity_quote, 1000.0);
        assert_eq!(trades[0].quantity_contract, None);
        assert_eq!(trades[1].side, TradeSide::Sell);
    }

    #[test]
    fn trade_on_wrong_channel() {
        let json = r#"{"arg":{"channel":"books5","instId":"BTC-USDT"},"data":[]}"#;
        assert!(parse_trade(MarketType::Spot, json).is_err());
        assert!(parse_trade(MarketType::Spot, "pong").is_err());
    }

    #[test]
    fn books_snapshot_and_update() {
        let snapshot = r#"{"arg":{"channel":"books","instId":"BTC-USD-SWAP"},"action":"snapshot","data":[{
            "asks":[["30002","5","0","1"],["30001","10","0","2"]],
            "bids":[["29999","3","0","1"],["30000","1","0","1"]],
            "ts":"1597026383085","checksum":-855196043,"prevSeqId":-1,"seqId":123456}]}"#;
        let book = &parse_l2(MarketType::InverseSwap, snapshot, 0).unwrap()[0];
        assert!(book.snapshot);
        assert_eq!(book.envelope.msg_type, MessageType::L2Event);
        assert_eq!(book.seq_id, Some(123456));
        assert_eq!(book.prev_seq_id, None);
        assert_eq!(book.asks[0].price, 30001.0);
        assert_eq!(book.bids[0].price, 30000.0);
        assert_eq!(book.asks[0].quantity_quote, 1000.0);
        assert_eq!(book.asks[0].quantity_contract, Some(10.0));
        assert!(book.is_well_ordered());

        let update = r#"{"arg":{"channel":"books","instId":"BTC-USD-SWAP"},"action":"update","data":[{
            "asks":[["30003","0","0","0"]],"bids":[],
            "ts":"1597026383185","prevSeqId":123456,"seqId":123457}]}"#;
        let book = &parse_l2(MarketType::InverseSwap, update, 0).unwrap()[0];
        assert!(!book.snapshot);
        assert_eq!(book.seq_id, Some(123457));
        assert_eq!(book.prev_seq_id, Some(123456));
        assert_eq!(book.timestamp(), 1597026383185);
    }

    #[test]
    fn books5_is_top_k_snapshot() {
        let json = r#"{"arg":{"channel":"books5","instId":"BTC-USDT"},"data":[{
            "asks":[["8446.1","0.3","0","1"]],"bids":[["8446","0.1","0","1"]],
            "instId":"BTC-USDT","ts":"1597026383085","seqId":3}]}"#;
        let book = &parse_l2(MarketType::Spot, json, 0).unwrap()[0];
        assert!(book.snapshot);
        assert_eq!(book.envelope.msg_type, MessageType::L2TopK);
        assert_eq!(book.seq_id, Some(3));
    }

    #[test]
    fn l2_on_trade_channel() {
        let json = r#"{"arg":{"channel":"trades","instId":"BTC-USDT"},"data":[]}"#;
        assert!(parse_l2(MarketType::Spot, json, 0).is_err());
    }

    #[test]
    fn funding_rate() {
        let json = r#"{"arg":{"channel":"funding-rate","instId":"BTC-USD-SWAP"},"data":[{
            "fundingRate":"0.0001875391284828","fundingTime":"1700726400000","instId":"BTC-USD-SWAP",
            "instType":"SWAP","method":"current_period","nextFundingRate":"","nextFundingTime":"1700755200000"
            ,"ts":"1700724675402"}]}"#;
        let rates = parse_funding_rate(MarketType::InverseSwap, json).unwrap();
        let r = &rates[0];
        assert_eq!(r.funding_rate, 0.0001875391284828);
        assert_eq!(r.funding_time, 1700726400000);
        assert_eq!(r.estimated_rate, None);
        assert_eq!(r.timestamp(), 1700724675402);
        assert_eq!(r.envelope.pair, "BTC/USD");

        let with_next = json.replace(r#""nextFundingRate":"""#, r#""nextFundingRate":"0.0002""#);
        let rates = parse_funding_rate(MarketType::InverseSwap, &with_next).unwrap();
        assert_eq!(rates[0].estimated_rate, Some(0.0002));

        let bad_next = json.replace(r#""nextFundingRate":"""#, r#""nextFundingRate":"inf""#);
        let err = parse_funding_rate(MarketType::InverseSwap, &bad_next).unwrap_err();
        assert!(err.to_string().contains("`nextFundingRate`"), "{err}");

        let no_ts = json.replace(r#","ts":"1700724675402""#, "");
        let rates = parse_funding_rate(MarketType::InverseSwap, &no_ts).unwrap();
        assert_eq!(rates[0].timestamp(), 1700726400000);

        assert!(parse_funding_rate(MarketType::Spot, json).is_err());
    }

    #[test]
    fn symbols() {
        assert_eq!(
            extract_symbol(r#"{"arg":{"channel":"trades","instId":"BTC-USDT"},"data":[]}"#).unwrap(),
            "BTC-USDT"
        );
        assert_eq!(
            extract_symbol(r#"{"arg":{"channel":"tickers"},"data":[{"instId":"ETH-USDT"}]}"#).unwrap(),
            "ETH-USDT"
        );
        assert_eq!(
            extract_symbol(r#"{"arg":{"channel":"funding-rate","instType":"SWAP"},"data":[]}"#).unwrap(),
            "ALL"
        );
        assert!(extract_symbol("pong").is_err());
    }
}
