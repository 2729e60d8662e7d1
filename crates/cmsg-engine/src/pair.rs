//! Exchange symbol → unified `BASE/QUOTE` pair.
//!
//! Binance and Bybit concatenate assets (`BTCUSDT`) and decorate derivatives
//! with suffixes (`BTCUSD_PERP`, `BTCUSDH25`); OKX separates them with dashes
//! (`BTC-USDT-SWAP`).

/// Quote assets recognized at the end of a concatenated symbol, longest first
/// so that `USDT` wins over `USD`.
const COMMON_QUOTES: &[&str] = &[
    "FDUSD", "USDT", "USDC", "BUSD", "TUSD", "USD", "BTC", "ETH", "BNB", "EUR", "TRY",
];

/// Bybit inverse-futures month codes (`BTCUSDH25` = March 2025).
const MONTH_CODES: &[u8] = b"FGHJKMNQUVXZ";

/// Normalize an exchange symbol into `BASE/QUOTE`.
///
/// Returns `None` if no known quote asset can be found.
pub fn normalize_pair(exchange: &str, symbol: &str) -> Option<String> {
    match exchange {
        "okx" => dashed(symbol),
        "bybit" => bybit(symbol),
        _ => concatenated(strip_delivery_suffix(symbol)),
    }
}

/// `BTC-USDT-SWAP` → `BTC/USDT`.
fn dashed(symbol: &str) -> Option<String> {
    let mut parts = symbol.split('-');
    let base = parts.next().filter(|s| !s.is_empty())?;
    let quote = parts.next().filter(|s| !s.is_empty())?;
    Some(format!("{}/{}", base.to_uppercase(), quote.to_uppercase()))
}

/// `BTCUSD_PERP`, `BTCUSDT_240628` → `BTCUSD`, `BTCUSDT`.
fn strip_delivery_suffix(symbol: &str) -> &str {
    symbol.split('_').next().unwrap_or(symbol)
}

/// `BTCUSDT` → `BTC/USDT`.
fn concatenated(symbol: &str) -> Option<String> {
    let upper = symbol.to_uppercase();
    COMMON_QUOTES.iter().find_map(|quote| {
        let base = upper.strip_suffix(quote)?;
        (!base.is_empty()).then(|| format!("{base}/{quote}"))
    })
}

fn bybit(symbol: &str) -> Option<String> {
    // USDC perpetuals and futures: `BTCPERP`, `BTC-27JUN25`.
    if let Some(base) = symbol.strip_suffix("PERP") {
        return (!base.is_empty()).then(|| format!("{base}/USDC"));
    }
    if let Some((base, _)) = symbol.split_once('-') {
        return (!base.is_empty()).then(|| format!("{base}/USDC"));
    }
    concatenated(strip_month_code(symbol))
}

/// `BTCUSDH25` → `BTCUSD`.
fn strip_month_code(symbol: &str) -> &str {
    let b = symbol.as_bytes();
    let n = b.len();
    if n > 6
        && b[n - 2..].iter().all(u8::is_ascii_digit)
        && MONTH_CODES.contains(&b[n - 3])
        && symbol[..n - 3].ends_with("USD")
    {
        &symbol[..n - 3]
    } else {
        symbol
    }
}
