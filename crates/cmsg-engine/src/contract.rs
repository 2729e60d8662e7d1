//! Contract sizing and base/quote/contract quantity derivation.
//!
//! - Spot: the native size is base coins; no contract quantity.
//! - Linear derivatives: the native size is contracts, each worth a fixed
//!   amount of the base asset.
//! - Inverse derivatives: the native size is contracts, each worth a fixed
//!   amount of the quote asset (USD).

use std::sync::LazyLock;

use ahash::AHashMap;
use anyhow::{Result, ensure};
use cmsg_core::{MarketType, Order};

/// OKX linear swap/futures contract values in base coins.
static OKX_LINEAR_CT_VAL: LazyLock<AHashMap<&'static str, f64>> = LazyLock::new(|| {
    AHashMap::from_iter([
        ("BTC", 0.01),
        ("ETH", 0.1),
        ("SOL", 1.0),
        ("LTC", 1.0),
        ("BCH", 0.1),
        ("XRP", 100.0),
        ("DOGE", 1000.0),
        ("ADA", 100.0),
        ("LINK", 1.0),
        ("DOT", 1.0),
        ("AVAX", 1.0),
        ("TRX", 1000.0),
    ])
});

/// Base asset of a unified `BASE/QUOTE` pair.
fn base_asset(pair: &str) -> &str {
    pair.split('/').next().unwrap_or(pair)
}

/// Value of one contract: base coins for linear, quote coins for inverse.
pub fn contract_value(exchange: &str, market_type: MarketType, pair: &str) -> f64 {
    let base = base_asset(pair);
    match (exchange, market_type.is_inverse()) {
        ("binance", true) | ("okx", true) => {
            if base == "BTC" {
                100.0
            } else {
                10.0
            }
        }
        ("okx", false) => OKX_LINEAR_CT_VAL.get(base).copied().unwrap_or(1.0),
        _ => 1.0,
    }
}

/// Quantities of one trade or price level in all three units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantities {
    pub base: f64,
    pub quote: f64,
    pub contract: Option<f64>,
}

/// Derive base, quote and contract quantities from an exchange-native size.
///
/// Fails if a derived quantity overflows to infinity.
pub fn quantities(exchange: &str, market_type: MarketType, pair: &str, price: f64, size: f64) -> Result<Quantities> {
    let q = if !market_type.is_derivative() {
        Quantities {
            base: size,
            quote: price * size,
            contract: None,
        }
    } else if market_type.is_inverse() {
        let quote = size * contract_value(exchange, market_type, pair);
        Quantities {
            base: if price > 0.0 { quote / price } else { 0.0 },
            quote,
            contract: Some(size),
        }
    } else {
        let base = size * contract_value(exchange, market_type, pair);
        Quantities {
            base,
            quote: base * price,
            contract: Some(size),
        }
    };
    ensure!(
        q.base.is_finite() && q.quote.is_finite(),
        "quantity overflow for price {price} and size {size}"
    );
    Ok(q)
}

/// One order book level from a native `(price, size)` pair.
pub fn order(exchange: &str, market_type: MarketType, pair: &str, (price, size): (f64, f64)) -> Result<Order> {
    let q = quantities(exchange, market_type, pair, price, size)?;
    Ok(Order {
        price,
        quantity_base: q.base,
        quantity_quote: q.quote,
        quantity_contract: q.contract,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_has_no_contracts() {
        let q = quantities("binance", MarketType::Spot, "BTC/USDT", 100.0, 2.0).unwrap();
        assert_eq!(q, Quantities { base: 2.0, quote: 200.0, contract: None });
    }

    #[test]
    fn binance_linear_contract_is_one_coin() {
        let q = quantities("binance", MarketType::LinearSwap, "BTC/USDT", 58665.0, 0.043).unwrap();
        assert_eq!(q.base, 0.043);
        assert_eq!(q.quote, 0.043 * 58665.0);
        assert_eq!(q.contract, Some(0.043));
    }

    #[test]
    fn inverse_contracts_are_usd() {
        let q = quantities("binance", MarketType::InverseSwap, "BTC/USD", 50000.0, 3.0).unwrap();
        assert_eq!(q.quote, 300.0);
        assert!((q.base - 0.006).abs() < 1e-12);
        assert_eq!(q.contract, Some(3.0));

        let q = quantities("okx", MarketType::InverseFuture, "ETH/USD", 2000.0, 4.0).unwrap();
        assert_eq!(q.quote, 40.0);
    }

    #[test]
    fn okx_linear_uses_instrument_value() {
        let q = quantities("okx", MarketType::LinearSwap, "BTC/USDT", 30000.0, 5.0).unwrap();
        assert!((q.base - 0.05).abs() < 1e-12);
        assert!((q.quote - 1500.0).abs() < 1e-9);
        assert_eq!(contract_value("okx", MarketType::LinearSwap, "PEPE/USDT"), 1.0);
    }

    #[test]
    fn zero_size_level_stays_zero() {
        let o = order("bybit", MarketType::InverseSwap, "BTC/USD", (0.0, 0.0)).unwrap();
        assert_eq!(o.quantity_base, 0.0);
        assert_eq!(o.quantity_quote, 0.0);
    }

    #[test]
    fn overflowing_quantity_rejected() {
        assert!(quantities("binance", MarketType::Spot, "BTC/USDT", 1e200, 1e200).is_err());
        assert!(order("okx", MarketType::LinearSwap, "DOGE/USDT", (f64::MAX, 2.0)).is_err());
    }
}
