//! Dispatch façade — the public parsing operations.
//!
//! Each operation bridges its two text inputs to C strings, calls the engine
//! once, bridges the engine's text back, and (for the parse operations)
//! decodes it through [`crate::codec`]. Bridged buffers live only for the
//! engine call and are dropped on every exit path.
//!
//! ```text
//! &str ──► bridge ──► MsgEngine ──► CString ──► String ──► codec ──► Vec<Msg>
//! ```

use std::ffi::CStr;

use tracing::{debug, trace};

use crate::bridge::{self, BridgeMode, is_nul_terminated};
use crate::codec::{self, WireMessage};
use crate::config::ParserOptions;
use crate::engine::{EngineResult, MsgEngine};
use crate::error::{CmsgError, Result};
use crate::types::*;

/// Parses exchange messages into the unified schema through an engine.
///
/// Holds no mutable state; share it across threads when the engine allows.
#[derive(Debug, Clone, Default)]
pub struct MsgParser<E> {
    engine: E,
    options: ParserOptions,
}

impl<E: MsgEngine> MsgParser<E> {
    pub fn new(engine: E) -> Self {
        Self::with_options(engine, ParserOptions::default())
    }

    pub fn with_options(engine: E, options: ParserOptions) -> Self {
        Self { engine, options }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Extract the exchange-native symbol from a message, untouched.
    pub fn extract_symbol(&self, exchange: &str, market_type: MarketType, msg: &str) -> Result<String> {
        self.call(exchange, msg, |e, m| self.engine.extract_symbol(e, market_type, m))
    }

    /// Infer the message type of a message.
    pub fn get_msg_type(&self, exchange: &str, msg: &str) -> Result<MessageType> {
        let text = self.call(exchange, msg, |e, m| self.engine.get_msg_type(e, m))?;
        MessageType::from_wire(&text).ok_or_else(|| CmsgError::unknown_variant("msg_type", text))
    }

    /// Parse a raw trade message into zero or more trades.
    pub fn parse_trade(&self, exchange: &str, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
        let text = self.call(exchange, msg, |e, m| self.engine.parse_trade(e, market_type, m))?;
        self.decode(exchange, &text)
    }

    /// Parse a raw level-2 order book message.
    ///
    /// `timestamp` is forwarded to the engine for payloads without their own;
    /// it is not validated here.
    pub fn parse_l2(
        &self,
        exchange: &str,
        market_type: MarketType,
        msg: &str,
        timestamp: i64,
    ) -> Result<Vec<OrderBookMsg>> {
        let text = self.call(exchange, msg, |e, m| self.engine.parse_l2(e, market_type, m, timestamp))?;
        let books: Vec<OrderBookMsg> = self.decode(exchange, &text)?;
        if self.options.verify_snapshot_order {
            for book in &books {
                if let Some((side, index)) = book.ordering_violation() {
                    return Err(CmsgError::UnorderedSnapshot { side, index });
                }
            }
        }
        Ok(books)
    }

    /// Parse a raw funding rate message.
    pub fn parse_funding_rate(
        &self,
        exchange: &str,
        market_type: MarketType,
        msg: &str,
    ) -> Result<Vec<FundingRateMsg>> {
        let text = self.call(exchange, msg, |e, m| self.engine.parse_funding_rate(e, market_type, m))?;
        self.decode(exchange, &text)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Bridge both inputs independently, run one engine call, bridge back.
    fn call<F>(&self, exchange: &str, msg: &str, f: F) -> Result<String>
    where
        F: FnOnce(&CStr, &CStr) -> EngineResult,
    {
        let mode = self.options.bridge_mode();
        let exchange_c = mode.bridge(exchange);
        let msg_c = mode.bridge(msg);
        trace!(
            exchange = %exchange_c.to_string_lossy(),
            exchange_zero_copy = zero_copy(mode, exchange),
            msg_zero_copy = zero_copy(mode, msg),
            msg_len = msg.len(),
            "calling engine"
        );

        let out = f(&exchange_c, &msg_c).map_err(|e| {
            debug!(exchange = %exchange_c.to_string_lossy(), error = %e, "engine rejected message");
            CmsgError::Engine(e)
        })?;
        Ok(bridge::from_c_str(&out))
    }

    fn decode<M: WireMessage>(&self, exchange: &str, text: &str) -> Result<Vec<M>> {
        let msgs = codec::decode_array(text).inspect_err(|e| {
            debug!(exchange, error = %e, "engine output failed to decode");
        })?;
        trace!(exchange, count = msgs.len(), "decoded engine output");
        Ok(msgs)
    }
}

fn zero_copy(mode: BridgeMode, text: &str) -> bool {
    mode == BridgeMode::ZeroCopy && is_nul_terminated(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use std::ffi::CString;
    use std::sync::Mutex;

    use proptest::prelude::*;

    use super::*;
    use crate::error::{EngineError, SchemaError};

    /// Engine double: echoes inputs and returns canned documents.
    #[derive(Default)]
    struct StubEngine {
        trade_json: String,
        l2_json: String,
        msg_type: String,
        seen: Mutex<Vec<(usize, usize, Option<i64>)>>,
    }

    impl StubEngine {
        fn record(&self, exchange: &CStr, msg: &CStr, ts: Option<i64>) {
            let mut seen = self.seen.lock().unwrap();
            seen.push((exchange.as_ptr() as usize, msg.as_ptr() as usize, ts));
        }

        fn text(s: &str) -> EngineResult {
            CString::new(s).map_err(|e| EngineError::new(e.to_string()))
        }
    }

    impl MsgEngine for StubEngine {
        fn extract_symbol(&self, exchange: &CStr, _: MarketType, msg: &CStr) -> EngineResult {
            self.record(exchange, msg, None);
            let mut out = exchange.to_bytes().to_vec();
            out.push(b'|');
            out.extend_from_slice(msg.to_bytes());
            CString::new(out).map_err(|e| EngineError::new(e.to_string()))
        }

        fn get_msg_type(&self, exchange: &CStr, msg: &CStr) -> EngineResult {
            self.record(exchange, msg, None);
            Self::text(&self.msg_type)
        }

        fn parse_trade(&self, exchange: &CStr, _: MarketType, msg: &CStr) -> EngineResult {
            self.record(exchange, msg, None);
            if exchange.to_bytes() == b"nope" {
                return Err(EngineError::new("unsupported exchange nope"));
            }
            Self::text(&self.trade_json)
        }

        fn parse_l2(&self, exchange: &CStr, _: MarketType, msg: &CStr, timestamp: i64) -> EngineResult {
            self.record(exchange, msg, Some(timestamp));
            Self::text(&self.l2_json)
        }

        fn parse_funding_rate(&self, exchange: &CStr, _: MarketType, msg: &CStr) -> EngineResult {
            self.record(exchange, msg, None);
            Self::text("[]")
        }
    }

    fn trade_doc() -> String {
        r#"[{"exchange":"binance","market_type":"spot","msg_type":"trade","symbol":"BTCUSDT",
            "pair":"BTC/USDT","timestamp":1,"json":"{}","price":2.0,"quantity_base":3.0,
            "quantity_quote":6.0,"side":"sell","trade_id":"7"}]"#
            .to_string()
    }

    fn l2_doc(asks: &str) -> String {
        format!(
            r#"[{{"exchange":"okx","market_type":"spot","msg_type":"l2_topk","symbol":"BTC-USDT",
                "pair":"BTC/USDT","timestamp":1,"json":"{{}}","snapshot":true,"bids":[],
                "asks":{asks}}}]"#
        )
    }

    fn level(price: f64) -> String {
        format!(r#"{{"price":{price:?},"quantity_base":1.0,"quantity_quote":{price:?}}}"#)
    }

    #[test]
    fn parse_trade_decodes_engine_output() {
        let parser = MsgParser::new(StubEngine {
            trade_json: trade_doc(),
            ..Default::default()
        });
        let trades = parser.parse_trade("binance", MarketType::Spot, "{}").unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Sell);
        assert_eq!(trades[0].quantity_contract, None);
        assert_eq!(trades[0].envelope.pair, "BTC/USDT");
    }

    #[test]
    fn engine_failure_is_surfaced() {
        let parser = MsgParser::new(StubEngine::default());
        match parser.parse_trade("nope", MarketType::Spot, "{}") {
            Err(CmsgError::Engine(e)) => assert!(e.0.contains("nope")),
            other => panic!("expected engine error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_engine_output_is_parse_error() {
        let parser = MsgParser::new(StubEngine {
            trade_json: "not json".into(),
            ..Default::default()
        });
        assert!(matches!(
            parser.parse_trade("binance", MarketType::Spot, "{}"),
            Err(CmsgError::Parse(_))
        ));
    }

    #[test]
    fn msg_type_is_decoded_through_table() {
        let parser = MsgParser::new(StubEngine {
            msg_type: "l2_topk".into(),
            ..Default::default()
        });
        assert_eq!(parser.get_msg_type("okx", "{}").unwrap(), MessageType::L2TopK);

        let parser = MsgParser::new(StubEngine {
            msg_type: "orderbook".into(),
            ..Default::default()
        });
        match parser.get_msg_type("okx", "{}") {
            Err(CmsgError::Schema(SchemaError::UnknownVariant { field, value })) => {
                assert_eq!(field, "msg_type");
                assert_eq!(value, "orderbook");
            }
            other => panic!("expected unknown variant, got {other:?}"),
        }
    }

    #[test]
    fn timestamp_is_forwarded() {
        let parser = MsgParser::new(StubEngine {
            l2_json: "[]".into(),
            ..Default::default()
        });
        parser.parse_l2("okx", MarketType::Spot, "{}", -5).unwrap();
        let seen = parser.engine().seen.lock().unwrap();
        assert_eq!(seen[0].2, Some(-5));
    }

    #[test]
    fn terminated_inputs_reach_engine_without_copy() {
        let parser = MsgParser::new(StubEngine::default());
        let exchange = "binance\0";
        let msg = "{\"s\":\"BTCUSDT\"}";
        assert_eq!(
            parser.extract_symbol(exchange, MarketType::Spot, msg).unwrap(),
            "binance|{\"s\":\"BTCUSDT\"}"
        );
        let seen = parser.engine().seen.lock().unwrap();
        assert_eq!(seen[0].0, exchange.as_ptr() as usize);
        assert_ne!(seen[0].1, msg.as_ptr() as usize);
    }

    #[test]
    fn forced_copy_never_passes_caller_storage() {
        let options = ParserOptions {
            force_copy: true,
            ..Default::default()
        };
        let parser = MsgParser::with_options(StubEngine::default(), options);
        let exchange = "binance\0";
        let msg = "{}\0";
        parser.extract_symbol(exchange, MarketType::Spot, msg).unwrap();
        let seen = parser.engine().seen.lock().unwrap();
        assert_ne!(seen[0].0, exchange.as_ptr() as usize);
        assert_ne!(seen[0].1, msg.as_ptr() as usize);
    }

    #[test]
    fn unordered_snapshot_rejected_only_when_verifying() {
        let doc = l2_doc(&format!("[{},{}]", level(101.0), level(100.0)));
        let engine = || StubEngine {
            l2_json: doc.clone(),
            ..Default::default()
        };

        let lenient = MsgParser::new(engine());
        assert_eq!(lenient.parse_l2("okx", MarketType::Spot, "{}", 0).unwrap().len(), 1);

        let strict = MsgParser::with_options(
            engine(),
            ParserOptions {
                verify_snapshot_order: true,
                ..Default::default()
            },
        );
        match strict.parse_l2("okx", MarketType::Spot, "{}", 0) {
            Err(CmsgError::UnorderedSnapshot { side, index }) => {
                assert_eq!(side, "asks");
                assert_eq!(index, 1);
            }
            other => panic!("expected unordered snapshot, got {other:?}"),
        }

        let ordered = l2_doc(&format!("[{},{}]", level(100.0), level(101.0)));
        let strict = MsgParser::with_options(
            StubEngine {
                l2_json: ordered,
                ..Default::default()
            },
            ParserOptions {
                verify_snapshot_order: true,
                ..Default::default()
            },
        );
        assert!(strict.parse_l2("okx", MarketType::Spot, "{}", 0).is_ok());
    }

    proptest! {
        #[test]
        fn fast_and_forced_copy_give_same_output(
            exchange in "[a-z]{1,8}",
            msg in "[ -~]{0,64}",
            term_exchange in any::<bool>(),
            term_msg in any::<bool>(),
        ) {
            let exchange = if term_exchange { format!("{exchange}\0") } else { exchange };
            let msg = if term_msg { format!("{msg}\0") } else { msg };

            let fast = MsgParser::new(StubEngine::default());
            let slow = MsgParser::with_options(
                StubEngine::default(),
                ParserOptions { force_copy: true, ..Default::default() },
            );
            prop_assert_eq!(
                fast.extract_symbol(&exchange, MarketType::Spot, &msg).unwrap(),
                slow.extract_symbol(&exchange, MarketType::Spot, &msg).unwrap()
            );
        }
    }
}
