//! JSON codec between the unified schema and its wire representation.
//!
//! The wire shape is flat: envelope fields sit beside the message's own
//! fields in one object. Encoding always emits required fields and emits an
//! optional field (`quantity_contract`, `seq_id`, `prev_seq_id`,
//! `estimated_rate`) only when it is set; an absent optional is an absent
//! key, never `null`.
//!
//! Decoding is strict:
//!
//! - a missing required field is a [`SchemaError::MissingField`]
//! - an enum string outside its table is a [`SchemaError::UnknownVariant`]
//! - a value of the wrong JSON kind (including a number sent as a string, or
//!   `null` for an optional field) is a [`CmsgError::Type`]
//! - text that is not JSON at all is a [`CmsgError::Parse`]
//!
//! Engine results are always arrays of one message type; see
//! [`decode_array`].
//!
//! [`SchemaError::MissingField`]: crate::error::SchemaError::MissingField
//! [`SchemaError::UnknownVariant`]: crate::error::SchemaError::UnknownVariant

use serde_json::{Map, Value};

use crate::error::{CmsgError, Result};
use crate::types::*;

/// Field name used in errors about the document root.
const ROOT: &str = "<root>";

/// A unified message with a wire representation.
pub trait WireMessage: Sized {
    /// Encode into a JSON object.
    fn encode(&self) -> Value;

    /// Decode from a JSON object.
    fn decode(v: &Value) -> Result<Self>;
}

/// Encode one message into a JSON object.
pub fn encode<M: WireMessage>(msg: &M) -> Value {
    msg.encode()
}

/// Decode one message from a JSON object.
pub fn decode<M: WireMessage>(v: &Value) -> Result<M> {
    M::decode(v)
}

/// Encode a sequence of messages as JSON array text.
pub fn encode_array<M: WireMessage>(msgs: &[M]) -> String {
    Value::Array(msgs.iter().map(WireMessage::encode).collect()).to_string()
}

/// Decode JSON array text into a sequence of messages.
///
/// The root must be an array, even when it holds a single message.
pub fn decode_array<M: WireMessage>(text: &str) -> Result<Vec<M>> {
    let v: Value = serde_json::from_str(text)?;
    match &v {
        Value::Array(items) => items.iter().map(M::decode).collect(),
        other => Err(type_error(ROOT.to_string(), "array", other)),
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn encode_envelope(env: &Envelope) -> Map<String, Value> {
    let mut j = Map::new();
    j.insert("exchange".into(), Value::from(env.exchange.as_str()));
    j.insert("market_type".into(), Value::from(env.market_type.as_str()));
    j.insert("msg_type".into(), Value::from(env.msg_type.as_str()));
    j.insert("symbol".into(), Value::from(env.symbol.as_str()));
    j.insert("pair".into(), Value::from(env.pair.as_str()));
    j.insert("timestamp".into(), Value::from(env.timestamp));
    j.insert("json".into(), Value::from(env.json.as_str()));
    j
}

fn insert_opt<T: Into<Value>>(j: &mut Map<String, Value>, key: &str, v: Option<T>) {
    if let Some(v) = v {
        j.insert(key.into(), v.into());
    }
}

fn encode_order(order: &Order) -> Value {
    let mut j = Map::new();
    j.insert("price".into(), Value::from(order.price));
    j.insert("quantity_base".into(), Value::from(order.quantity_base));
    j.insert("quantity_quote".into(), Value::from(order.quantity_quote));
    insert_opt(&mut j, "quantity_contract", order.quantity_contract);
    Value::Object(j)
}

impl WireMessage for TradeMsg {
    fn encode(&self) -> Value {
        let mut j = encode_envelope(&self.envelope);
        j.insert("price".into(), Value::from(self.price));
        j.insert("quantity_base".into(), Value::from(self.quantity_base));
        j.insert("quantity_quote".into(), Value::from(self.quantity_quote));
        insert_opt(&mut j, "quantity_contract", self.quantity_contract);
        j.insert("side".into(), Value::from(self.side.as_str()));
        j.insert("trade_id".into(), Value::from(self.trade_id.as_str()));
        Value::Object(j)
    }

    fn decode(v: &Value) -> Result<Self> {
        let f = Fields::of(v, Scope::Root)?;
        Ok(Self {
            envelope: f.envelope()?,
            price: f.f64("price")?,
            quantity_base: f.f64("quantity_base")?,
            quantity_quote: f.f64("quantity_quote")?,
            quantity_contract: f.opt_f64("quantity_contract")?,
            side: f.wire_enum("side")?,
            trade_id: f.string("trade_id")?,
        })
    }
}

impl WireMessage for OrderBookMsg {
    fn encode(&self) -> Value {
        let mut j = encode_envelope(&self.envelope);
        j.insert("asks".into(), Value::Array(self.asks.iter().map(encode_order).collect()));
        j.insert("bids".into(), Value::Array(self.bids.iter().map(encode_order).collect()));
        j.insert("snapshot".into(), Value::from(self.snapshot));
        insert_opt(&mut j, "seq_id", self.seq_id);
        insert_opt(&mut j, "prev_seq_id", self.prev_seq_id);
        Value::Object(j)
    }

    fn decode(v: &Value) -> Result<Self> {
        let f = Fields::of(v, Scope::Root)?;
        Ok(Self {
            envelope: f.envelope()?,
            asks: f.orders("asks")?,
            bids: f.orders("bids")?,
            snapshot: f.bool("snapshot")?,
            seq_id: f.opt_u64("seq_id")?,
            prev_seq_id: f.opt_u64("prev_seq_id")?,
        })
    }
}

impl WireMessage for FundingRateMsg {
    fn encode(&self) -> Value {
        let mut j = encode_envelope(&self.envelope);
        j.insert("funding_rate".into(), Value::from(self.funding_rate));
        j.insert("funding_time".into(), Value::from(self.funding_time));
        insert_opt(&mut j, "estimated_rate", self.estimated_rate);
        Value::Object(j)
    }

    fn decode(v: &Value) -> Result<Self> {
        let f = Fields::of(v, Scope::Root)?;
        Ok(Self {
            envelope: f.envelope()?,
            funding_rate: f.f64("funding_rate")?,
            funding_time: f.i64("funding_time")?,
            estimated_rate: f.opt_f64("estimated_rate")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Decoding helpers
// ---------------------------------------------------------------------------

/// Where an object sits in the document, for error paths.
#[derive(Clone, Copy)]
enum Scope {
    Root,
    Level(&'static str, usize),
}

/// Typed, strict accessors over one JSON object.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    scope: Scope,
}

impl<'a> Fields<'a> {
    fn of(v: &'a Value, scope: Scope) -> Result<Self> {
        match v {
            Value::Object(map) => Ok(Self { map, scope }),
            other => {
                let field = match scope {
                    Scope::Root => ROOT.to_string(),
                    Scope::Level(side, i) => format!("{side}[{i}]"),
                };
                Err(type_error(field, "object", other))
            }
        }
    }

    fn path(&self, key: &str) -> String {
        match self.scope {
            Scope::Root => key.to_string(),
            Scope::Level(side, i) => format!("{side}[{i}].{key}"),
        }
    }

    fn required(&self, key: &str) -> Result<&'a Value> {
        self.map.get(key).ok_or_else(|| CmsgError::missing(self.path(key)))
    }

    fn mismatch(&self, key: &str, expected: &'static str, found: &Value) -> CmsgError {
        type_error(self.path(key), expected, found)
    }

    fn string(&self, key: &str) -> Result<String> {
        match self.required(key)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(self.mismatch(key, "string", other)),
        }
    }

    fn bool(&self, key: &str) -> Result<bool> {
        match self.required(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(self.mismatch(key, "boolean", other)),
        }
    }

    fn f64(&self, key: &str) -> Result<f64> {
        self.to_f64(key, self.required(key)?)
    }

    fn to_f64(&self, key: &str, v: &Value) -> Result<f64> {
        v.as_f64().ok_or_else(|| self.mismatch(key, "number", v))
    }

    fn u64(&self, key: &str) -> Result<u64> {
        self.to_u64(key, self.required(key)?)
    }

    fn to_u64(&self, key: &str, v: &Value) -> Result<u64> {
        v.as_u64().ok_or_else(|| self.mismatch(key, "unsigned integer", v))
    }

    fn i64(&self, key: &str) -> Result<i64> {
        let v = self.required(key)?;
        v.as_i64().ok_or_else(|| self.mismatch(key, "integer", v))
    }

    fn opt_f64(&self, key: &str) -> Result<Option<f64>> {
        self.map.get(key).map(|v| self.to_f64(key, v)).transpose()
    }

    fn opt_u64(&self, key: &str) -> Result<Option<u64>> {
        self.map.get(key).map(|v| self.to_u64(key, v)).transpose()
    }

    fn wire_enum<T: WireEnum>(&self, key: &str) -> Result<T> {
        match self.required(key)? {
            Value::String(s) => T::from_wire(s).ok_or_else(|| CmsgError::unknown_variant(self.path(key), s.as_str())),
            other => Err(self.mismatch(key, "string", other)),
        }
    }

    fn envelope(&self) -> Result<Envelope> {
        Ok(Envelope {
            exchange: self.string("exchange")?,
            market_type: self.wire_enum("market_type")?,
            msg_type: self.wire_enum("msg_type")?,
            symbol: self.string("symbol")?,
            pair: self.string("pair")?,
            timestamp: self.u64("timestamp")?,
            json: self.string("json")?,
        })
    }

    fn orders(&self, key: &'static str) -> Result<Vec<Order>> {
        let levels = match self.required(key)? {
            Value::Array(levels) => levels,
            other => return Err(self.mismatch(key, "array", other)),
        };
        levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                let f = Fields::of(level, Scope::Level(key, i))?;
                Ok(Order {
                    price: f.f64("price")?,
                    quantity_base: f.f64("quantity_base")?,
                    quantity_quote: f.f64("quantity_quote")?,
                    quantity_contract: f.opt_f64("quantity_contract")?,
                })
            })
            .collect()
    }
}

fn type_error(field: String, expected: &'static str, found: &Value) -> CmsgError {
    CmsgError::Type {
        field,
        expected,
        found: json_kind(found),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(n) if n.is_i64() && !n.is_u64() => "negative integer",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
