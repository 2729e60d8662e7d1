//! Parser registry: exchange name → [`ExchangeParser`].

use crate::ExchangeParser;
use crate::binance::BinanceParser;
use crate::bybit::BybitParser;
use crate::okx::OkxParser;

/// Exchanges with a built-in parser.
pub const SUPPORTED_EXCHANGES: &[&str] = &["binance", "bybit", "okx"];

/// Look up the parser for a lowercase exchange name.
pub fn parser_for(exchange: &str) -> Option<&'static dyn ExchangeParser> {
    match exchange {
        "binance" => Some(&BinanceParser),
        "bybit" => Some(&BybitParser),
        "okx" => Some(&OkxParser),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_exchange_resolves() {
        for name in SUPPORTED_EXCHANGES {
            assert_eq!(parser_for(name).map(|p| p.name()), Some(*name));
        }
        assert!(parser_for("bitmex").is_none());
        assert!(parser_for("Binance").is_none());
    }
}
