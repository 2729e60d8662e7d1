//! Unified message structures — what every exchange payload is normalized into.
//!
//! The fields shared by all messages live in [`Envelope`], which each concrete
//! message embeds by value. Callers that only need the shared fields go
//! through the [`Message`] trait instead of inspecting the concrete type.
//!
//! # Timestamp convention
//!
//! All timestamps are in **milliseconds since Unix epoch**. They are
//! monotonic within a single stream only.

use super::enums::{MarketType, MessageType, TradeSide};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Fields common to every unified message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope {
    /// Exchange name, case as provided by the engine (e.g. `"binance"`).
    pub exchange: String,
    pub market_type: MarketType,
    pub msg_type: MessageType,
    /// Exchange-specific trading symbol, recognized by its REST API.
    pub symbol: String,
    /// Unified pair, `BASE/QUOTE` (e.g. `"BTC/USDT"`).
    pub pair: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// The original, untouched message text.
    pub json: String,
}

/// Anything that carries an [`Envelope`].
pub trait Message {
    fn envelope(&self) -> &Envelope;

    fn exchange(&self) -> &str {
        &self.envelope().exchange
    }

    fn symbol(&self) -> &str {
        &self.envelope().symbol
    }

    fn timestamp(&self) -> u64 {
        self.envelope().timestamp
    }
}

// ---------------------------------------------------------------------------
// Trade
// ---------------------------------------------------------------------------

/// Realtime trade message.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeMsg {
    pub envelope: Envelope,
    pub price: f64,
    /// Number of base coins.
    pub quantity_base: f64,
    /// Number of quote coins, as reported; not re-validated against price.
    pub quantity_quote: f64,
    /// Number of contracts, always `None` for spot.
    pub quantity_contract: Option<f64>,
    /// Which side is taker.
    pub side: TradeSide,
    /// Exchange-supplied trade ID, not assumed globally unique.
    pub trade_id: String,
}

// ---------------------------------------------------------------------------
// Order book
// ---------------------------------------------------------------------------

/// One price level in an order book's asks or bids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub price: f64,
    /// Number of base coins; `0` means the price level can be removed.
    pub quantity_base: f64,
    pub quantity_quote: f64,
    /// Number of contracts, always `None` for spot.
    pub quantity_contract: Option<f64>,
}

/// Level-2 order book message.
///
/// When `snapshot` is true, `asks` are sorted ascending by price and `bids`
/// descending. Incremental updates carry no ordering guarantee.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookMsg {
    pub envelope: Envelope,
    pub asks: Vec<Order>,
    pub bids: Vec<Order>,
    /// `true` means snapshot, `false` means incremental update.
    pub snapshot: bool,
    /// Sequence ID of this update, when the exchange provides one.
    pub seq_id: Option<u64>,
    /// Sequence ID of the previous update, when the exchange provides one.
    pub prev_seq_id: Option<u64>,
}

impl OrderBookMsg {
    /// Index of the first level breaking the snapshot ordering, per side.
    ///
    /// Returns `None` for incremental updates and for well-ordered snapshots.
    pub fn ordering_violation(&self) -> Option<(&'static str, usize)> {
        if !self.snapshot {
            return None;
        }
        if let Some(i) = self.asks.windows(2).position(|w| w[0].price > w[1].price) {
            return Some(("asks", i + 1));
        }
        if let Some(i) = self.bids.windows(2).position(|w| w[0].price < w[1].price) {
            return Some(("bids", i + 1));
        }
        None
    }

    pub fn is_well_ordered(&self) -> bool {
        self.ordering_violation().is_none()
    }
}

// ---------------------------------------------------------------------------
// Funding rate
// ---------------------------------------------------------------------------

/// Funding rate of a perpetual swap.
#[derive(Debug, Clone, PartialEq)]
pub struct FundingRateMsg {
    pub envelope: Envelope,
    /// May be negative.
    pub funding_rate: f64,
    /// The moment the rate applies (ms since epoch).
    pub funding_time: i64,
    /// Estimated next rate; only present before `funding_time`.
    pub estimated_rate: Option<f64>,
}

impl Message for TradeMsg {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

impl Message for OrderBookMsg {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

impl Message for FundingRateMsg {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

// ---------------------------------------------------------------------------
// Display impls
// ---------------------------------------------------------------------------

impl std::fmt::Display for TradeMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade({} {} {} {:.8}x{:.8} id={})",
            self.envelope.exchange,
            self.envelope.symbol,
            self.side,
            self.price,
            self.quantity_base,
            self.trade_id
        )
    }
}

impl std::fmt::Display for OrderBookMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.snapshot { "snapshot" } else { "update" };
        write!(
            f,
            "OrderBook({} {} {kind} asks={} bids={})",
            self.envelope.exchange,
            self.envelope.symbol,
            self.asks.len(),
            self.bids.len()
        )
    }
}

impl std::fmt::Display for FundingRateMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FundingRate({} {} rate={} at={})",
            self.envelope.exchange, self.envelope.symbol, self.funding_rate, self.funding_time
        )
    }
}
