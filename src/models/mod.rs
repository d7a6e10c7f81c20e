use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod lenient;
pub mod recommendation;
pub mod validator;

pub use recommendation::*;
pub use validator::CandleValidator;

/// OHLCV candlestick data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// True Range against the previous candle's close
    pub fn true_range(&self, prev_close: f64) -> f64 {
        (self.high - self.low)
            .max((self.high - prev_close).abs())
            .max((self.low - prev_close).abs())
    }
}

/// Extract closing prices
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Trend classification shared by the indicator set and the validator
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

/// A single aggregated trade print
///
/// Accepts the exchange short-hand keys (`p`, `q`, `m`) as well.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TradePrint {
    #[serde(alias = "p", deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(alias = "q", deserialize_with = "lenient::number")]
    pub quantity: f64,
    /// `true` when the buyer was the maker, i.e. the aggressor sold
    #[serde(alias = "m", default)]
    pub is_buyer_maker: bool,
}

/// One resting price level in the order book
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BookLevel {
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookPressure {
    BuyPressure,
    SellPressure,
    #[default]
    Balanced,
}

/// Order-book depth summary
///
/// Either supplied pre-aggregated by the data collaborator or built from raw
/// depth with [`OrderBookSummary::from_depth`](crate::risk::microstructure).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrderBookSummary {
    #[serde(deserialize_with = "lenient::number")]
    pub bid_ask_ratio: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub total_bid_volume: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub total_ask_volume: f64,
    pub major_support: BookLevel,
    pub major_resistance: BookLevel,
    #[serde(deserialize_with = "lenient::number")]
    pub nearby_bid_1pct: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub nearby_ask_1pct: f64,
    pub nearby_pressure: BookPressure,
    pub large_bids: Vec<BookLevel>,
    pub large_asks: Vec<BookLevel>,
}

/// Fear & greed reading from the sentiment collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FearGreedIndex {
    #[serde(deserialize_with = "lenient::number")]
    pub value: f64,
    pub classification: String,
}

fn default_timeframe() -> String {
    "4h".to_string()
}

/// Everything the engine needs for one instrument, captured at one instant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    pub symbol: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default)]
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub higher_timeframe_candles: Vec<Candle>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub funding_rate: Option<f64>,
    #[serde(default)]
    pub long_short_ratio: Option<f64>,
    #[serde(default)]
    pub open_interest: Option<f64>,
    #[serde(default)]
    pub trades: Vec<TradePrint>,
    #[serde(default)]
    pub order_book: Option<OrderBookSummary>,
    #[serde(default)]
    pub fear_greed: Option<FearGreedIndex>,
}

impl MarketSnapshot {
    pub fn new(symbol: &str, timeframe: &str, candles: Vec<Candle>) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            timeframe: timeframe.to_string(),
            candles,
            higher_timeframe_candles: Vec::new(),
            current_price: None,
            funding_rate: None,
            long_short_ratio: None,
            open_interest: None,
            trades: Vec::new(),
            order_book: None,
            fear_greed: None,
        }
    }

    /// Decode a snapshot payload and check its candles
    pub fn from_json(payload: &str) -> crate::Result<Self> {
        let mut snapshot: MarketSnapshot = serde_json::from_str(payload)?;
        snapshot.symbol = normalize_symbol(&snapshot.symbol);

        let validator = CandleValidator::new();
        validator.validate_series(&snapshot.candles)?;
        validator.validate_series(&snapshot.higher_timeframe_candles)?;

        Ok(snapshot)
    }

    /// The live price: the explicit quote when usable, otherwise the last close
    pub fn price(&self) -> f64 {
        self.current_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .or_else(|| self.candles.last().map(|c| c.close))
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
    }
}

/// Normalize an exchange symbol to the perpetual-contract form
///
/// Upper-cases, strips separators, maps low-priced tokens to their
/// 1000-multiplier contract and appends `USDT` when missing.
pub fn normalize_symbol(symbol: &str) -> String {
    const THOUSAND_MULTIPLIER: &[&str] = &[
        "PEPE", "SHIB", "LUNC", "XEC", "FLOKI", "BONK", "RATS", "SATS",
    ];

    if symbol.trim().is_empty() {
        return String::new();
    }

    let s: String = symbol
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '-' | '/' | '_' | '.'))
        .collect();

    let base = s.strip_suffix("USDT").unwrap_or(&s);
    let bare = base.replace("1000", "");

    if THOUSAND_MULTIPLIER.contains(&bare.as_str()) {
        format!("1000{}USDT", bare)
    } else if s.ends_with("USDT") {
        s
    } else {
        format!("{}USDT", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc::now() - Duration::hours(1),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_candle_anatomy() {
        let candle = make_candle(100.0, 106.0, 90.0, 102.0);

        assert_eq!(candle.body(), 2.0);
        assert_eq!(candle.upper_shadow(), 4.0);
        assert_eq!(candle.lower_shadow(), 10.0);
        assert!(candle.is_bullish());
        assert!(!candle.is_bearish());
    }

    #[test]
    fn test_true_range_uses_gap() {
        let candle = make_candle(110.0, 112.0, 108.0, 111.0);
        // Gap up from 100: |112 - 100| dominates the 4.0 intrabar range
        assert_eq!(candle.true_range(100.0), 12.0);
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("btc/usdt"), "BTCUSDT");
        assert_eq!(normalize_symbol("eth-usdt"), "ETHUSDT");
        assert_eq!(normalize_symbol("SOL"), "SOLUSDT");
        assert_eq!(normalize_symbol("pepe"), "1000PEPEUSDT");
        assert_eq!(normalize_symbol("1000PEPEUSDT"), "1000PEPEUSDT");
        assert_eq!(normalize_symbol(""), "");
    }

    #[test]
    fn test_snapshot_price_falls_back_to_last_close() {
        let mut snapshot = MarketSnapshot::new(
            "BTCUSDT",
            "4h",
            vec![make_candle(100.0, 101.0, 99.0, 100.5)],
        );
        assert_eq!(snapshot.price(), 100.5);

        snapshot.current_price = Some(f64::NAN);
        assert_eq!(snapshot.price(), 100.5);

        snapshot.current_price = Some(101.0);
        assert_eq!(snapshot.price(), 101.0);
    }

    #[test]
    fn test_snapshot_from_json_accepts_exchange_trade_keys() {
        let payload = r#"{
            "symbol": "eth/usdt",
            "candles": [],
            "trades": [{"p": "2500.5", "q": 30, "m": true}]
        }"#;

        let snapshot = MarketSnapshot::from_json(payload).unwrap();
        assert_eq!(snapshot.symbol, "ETHUSDT");
        assert_eq!(snapshot.timeframe, "4h");
        assert_eq!(snapshot.trades[0].price, 2500.5);
        assert!(snapshot.trades[0].is_buyer_maker);
    }
}
