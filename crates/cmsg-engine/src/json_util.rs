//! Shared JSON helpers used by all exchange parsers.
//!
//! Exchanges encode numbers as either JSON strings (`"30000.5"`) or native
//! numbers (`30000.5`); every numeric accessor here accepts both. This
//! leniency applies to exchange payloads only, never to unified documents.
//!
//! Floating-point accessors only ever yield finite values: `"inf"` and
//! `"NaN"` parse with `fast-float2` but are treated as malformed.

use anyhow::{Context, Result, ensure};
use cmsg_core::{Order, TradeSide};
use serde_json::Value;

/// Parse a JSON value (string or number) as a finite `f64`.
#[inline]
pub fn parse_str_f64(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    let x = if let Some(s) = v.as_str() {
        fast_float2::parse(s).ok()
    } else {
        v.as_f64()
    };
    x.filter(|x| x.is_finite())
}

/// Parse a JSON value (string or number) as `u64`.
#[inline]
pub fn parse_str_u64(v: Option<&Value>) -> Option<u64> {
    let v = v?;
    if let Some(s) = v.as_str() {
        s.parse().ok()
    } else {
        v.as_u64()
    }
}

/// Parse a JSON value (string or number) as `i64`.
#[inline]
pub fn parse_str_i64(v: Option<&Value>) -> Option<i64> {
    let v = v?;
    if let Some(s) = v.as_str() {
        s.parse().ok()
    } else {
        v.as_i64()
    }
}

pub fn field_str<'a>(v: &'a Value, key: &str) -> Result<&'a str> {
    v.get(key).and_then(Value::as_str).with_context(|| format!("missing string field `{key}`"))
}

pub fn field_f64(v: &Value, key: &str) -> Result<f64> {
    let raw = v.get(key).with_context(|| format!("missing numeric field `{key}`"))?;
    parse_str_f64(Some(raw)).with_context(|| format!("field `{key}` is not a finite number: {raw}"))
}

/// A price or size: finite and not negative.
pub fn field_amount(v: &Value, key: &str) -> Result<f64> {
    let x = field_f64(v, key)?;
    ensure!(x >= 0.0, "field `{key}` is negative: {x}");
    Ok(x)
}

pub fn field_u64(v: &Value, key: &str) -> Result<u64> {
    parse_str_u64(v.get(key)).with_context(|| format!("missing integer field `{key}`"))
}

pub fn field_i64(v: &Value, key: &str) -> Result<i64> {
    parse_str_i64(v.get(key)).with_context(|| format!("missing integer field `{key}`"))
}

pub fn field_array<'a>(v: &'a Value, key: &str) -> Result<&'a [Value]> {
    v.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .with_context(|| format!("missing array field `{key}`"))
}

/// An identifier that may be sent as a string or a number.
pub fn id_string(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Taker side from an exchange side string (`"buy"`, `"Sell"`, ...).
pub fn parse_side(s: &str) -> Result<TradeSide> {
    if s.eq_ignore_ascii_case("buy") {
        Ok(TradeSide::Buy)
    } else if s.eq_ignore_ascii_case("sell") {
        Ok(TradeSide::Sell)
    } else {
        anyhow::bail!("unknown trade side `{s}`")
    }
}

/// `[price, size, ...]` levels as `(price, size)` pairs.
///
/// Both must be finite and non-negative; a zero size deletes a level.
pub fn parse_levels(levels: &[Value]) -> Result<Vec<(f64, f64)>> {
    levels
        .iter()
        .enumerate()
        .map(|(i, level)| {
            let arr = level.as_array().with_context(|| format!("level {i} is not an array"))?;
            let price = level_amount(arr.first()).with_context(|| format!("level {i} price"))?;
            let size = level_amount(arr.get(1)).with_context(|| format!("level {i} size"))?;
            Ok((price, size))
        })
        .collect()
}

fn level_amount(v: Option<&Value>) -> Result<f64> {
    let raw = v.context("missing")?;
    let x = parse_str_f64(Some(raw)).with_context(|| format!("not a finite number: {raw}"))?;
    ensure!(x >= 0.0, "negative: {x}");
    Ok(x)
}

/// Sort a snapshot: asks ascending, bids descending by price.
pub fn sort_snapshot(asks: &mut [Order], bids: &mut [Order]) {
    asks.sort_by(|a, b| a.price.total_cmp(&b.price));
    bids.sort_by(|a, b| b.price.total_cmp(&a.price));
}

/// Millisecond timestamp from a caller-supplied `i64`.
pub fn timestamp_from_caller(timestamp: i64) -> Result<u64> {
    u64::try_from(timestamp).with_context(|| format!("negative timestamp {timestamp}"))
}
