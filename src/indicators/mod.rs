// Technical indicators module
// Implements MA, RSI, MACD, Bollinger, ATR and ADX plus the per-snapshot IndicatorSet

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use adx::{calculate_adx, Adx};
pub use atr::{calculate_atr, calculate_atr_or_mean, calculate_atr_series, true_ranges};
pub use bollinger::{calculate_bollinger, BollingerBands};
pub use macd::{calculate_macd, Macd};
pub use moving_average::{calculate_ema, calculate_ema_series, calculate_sma};
pub use rsi::calculate_rsi;

use serde::{Deserialize, Serialize};

use crate::models::{closes, Candle, Trend};

/// Configuration for indicator computation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub fast_ma_period: usize,
    pub slow_ma_period: usize,
    pub ema_fast_period: usize, // EMA cross pair
    pub ema_slow_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub atr_period: usize,
    pub adx_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fast_ma_period: 20,
            slow_ma_period: 50,
            ema_fast_period: 9,
            ema_slow_period: 21,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            atr_period: 14,
            adx_period: 14,
        }
    }
}

/// Relationship between a fast and a slow average
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrossState {
    /// Fast crossed above slow on the last bar
    GoldenCross,
    /// Fast crossed below slow on the last bar
    DeathCross,
    BullishAlignment,
    BearishAlignment,
    #[default]
    Undetermined,
}

impl CrossState {
    fn from_pairs(prev: Option<(f64, f64)>, curr: Option<(f64, f64)>) -> Self {
        match (prev, curr) {
            (Some((pf, ps)), Some((cf, cs))) if pf <= ps && cf > cs => CrossState::GoldenCross,
            (Some((pf, ps)), Some((cf, cs))) if pf >= ps && cf < cs => CrossState::DeathCross,
            (_, Some((cf, cs))) if cf > cs => CrossState::BullishAlignment,
            (_, Some((cf, cs))) if cf < cs => CrossState::BearishAlignment,
            _ => CrossState::Undetermined,
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, CrossState::GoldenCross | CrossState::BullishAlignment)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, CrossState::DeathCross | CrossState::BearishAlignment)
    }
}

/// Volatility bucket from ATR as a percentage of price
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityLevel {
    #[default]
    Low,
    Moderate,
    High,
    Extreme,
}

impl VolatilityLevel {
    pub fn from_atr_percent(atr_pct: f64) -> Self {
        match atr_pct {
            p if p > 3.0 => VolatilityLevel::Extreme,
            p if p > 2.0 => VolatilityLevel::High,
            p if p > 1.0 => VolatilityLevel::Moderate,
            _ => VolatilityLevel::Low,
        }
    }
}

/// Every indicator for one candle series, computed once
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorSet {
    pub price: f64,
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub macd: Macd,
    pub bollinger: BollingerBands,
    pub atr: f64,
    pub atr_percent: f64,
    pub adx: Adx,
    pub trend: Trend,
    pub ma_cross: CrossState,
    pub ema_cross: CrossState,
    pub volatility: VolatilityLevel,
}

impl Default for IndicatorSet {
    fn default() -> Self {
        Self {
            price: 0.0,
            sma_fast: 0.0,
            sma_slow: 0.0,
            ema_fast: 0.0,
            ema_slow: 0.0,
            rsi: 50.0,
            macd: Macd::default(),
            bollinger: BollingerBands::default(),
            atr: 0.0,
            atr_percent: 0.0,
            adx: Adx::default(),
            trend: Trend::Neutral,
            ma_cross: CrossState::Undetermined,
            ema_cross: CrossState::Undetermined,
            volatility: VolatilityLevel::Low,
        }
    }
}

impl IndicatorSet {
    /// Price is above the upper band
    pub fn above_upper_band(&self) -> bool {
        self.bollinger.upper > 0.0 && self.price > self.bollinger.upper
    }

    /// Price is below the lower band
    pub fn below_lower_band(&self) -> bool {
        self.bollinger.lower > 0.0 && self.price < self.bollinger.lower
    }
}

/// Classify the trend from price and the two moving averages
///
/// Bullish iff price > fast > slow, bearish iff price < fast < slow.
pub fn classify_trend(price: f64, fast_ma: f64, slow_ma: f64) -> Trend {
    if price > fast_ma && fast_ma > slow_ma {
        Trend::Bullish
    } else if price < fast_ma && fast_ma < slow_ma {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Compute the full indicator set for a candle series
///
/// Never fails: with fewer than three candles the defaults are returned
/// (price-like fields carry the last close when there is one). Indicators
/// lacking history fall back to the last price, the RSI midpoint or zero.
pub fn calculate_indicators(candles: &[Candle], config: &IndicatorConfig) -> IndicatorSet {
    let prices = closes(candles);
    let price = prices.last().copied().filter(|p| p.is_finite()).unwrap_or(0.0);

    if candles.len() < 3 {
        return IndicatorSet {
            price,
            sma_fast: price,
            sma_slow: price,
            ema_fast: price,
            ema_slow: price,
            ..IndicatorSet::default()
        };
    }

    let ma_or_price = |value: Option<f64>| finite_or(value.unwrap_or(price), price);

    let sma_fast = ma_or_price(calculate_sma(&prices, config.fast_ma_period));
    let sma_slow = ma_or_price(calculate_sma(&prices, config.slow_ma_period));
    let ema_fast = ma_or_price(calculate_ema(&prices, config.ema_fast_period));
    let ema_slow = ma_or_price(calculate_ema(&prices, config.ema_slow_period));

    let rsi = finite_or(
        calculate_rsi(&prices, config.rsi_period).unwrap_or(50.0),
        50.0,
    )
    .clamp(0.0, 100.0);

    let macd = calculate_macd(&prices, config.macd_fast, config.macd_slow, config.macd_signal)
        .unwrap_or_default();

    let bollinger = calculate_bollinger(&prices, config.bollinger_period, config.bollinger_std_dev)
        .unwrap_or_else(|| BollingerBands::around(price));

    let atr = finite_or(calculate_atr_or_mean(candles, config.atr_period), 0.0).max(0.0);
    let atr_percent = if price > 0.0 { atr / price * 100.0 } else { 0.0 };

    let adx = calculate_adx(candles, config.adx_period).unwrap_or_default();

    let ma_cross = CrossState::from_pairs(
        sma_pair(&prices[..prices.len() - 1], config.fast_ma_period, config.slow_ma_period),
        sma_pair(&prices, config.fast_ma_period, config.slow_ma_period),
    );
    let ema_cross = CrossState::from_pairs(
        ema_pair(&prices[..prices.len() - 1], config.ema_fast_period, config.ema_slow_period),
        ema_pair(&prices, config.ema_fast_period, config.ema_slow_period),
    );

    let indicators = IndicatorSet {
        price,
        sma_fast,
        sma_slow,
        ema_fast,
        ema_slow,
        rsi,
        macd,
        bollinger,
        atr,
        atr_percent,
        adx,
        trend: classify_trend(price, sma_fast, sma_slow),
        ma_cross,
        ema_cross,
        volatility: VolatilityLevel::from_atr_percent(atr_percent),
    };

    tracing::debug!(
        "Indicators: price={:.4} rsi={:.1} atr={:.4} trend={:?} width={:.4}",
        indicators.price,
        indicators.rsi,
        indicators.atr,
        indicators.trend,
        indicators.bollinger.width
    );

    indicators
}

fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

fn sma_pair(prices: &[f64], fast: usize, slow: usize) -> Option<(f64, f64)> {
    Some((calculate_sma(prices, fast)?, calculate_sma(prices, slow)?))
}

fn ema_pair(prices: &[f64], fast: usize, slow: usize) -> Option<(f64, f64)> {
    Some((calculate_ema(prices, fast)?, calculate_ema(prices, slow)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: Utc::now() + chrono::Duration::hours(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_short_series_returns_defaults() {
        let candles = create_test_candles(&[100.0, 101.0]);
        let set = calculate_indicators(&candles, &IndicatorConfig::default());

        assert_eq!(set.price, 101.0);
        assert_eq!(set.rsi, 50.0);
        assert_eq!(set.atr, 0.0);
        assert_eq!(set.trend, Trend::Neutral);

        let empty = calculate_indicators(&[], &IndicatorConfig::default());
        assert_eq!(empty, IndicatorSet::default());
    }

    #[test]
    fn test_uptrend_classification() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let set = calculate_indicators(&create_test_candles(&closes), &IndicatorConfig::default());

        assert_eq!(set.trend, Trend::Bullish);
        assert!(set.price > set.sma_fast && set.sma_fast > set.sma_slow);
        assert!(set.rsi > 70.0);
        assert!(set.macd.macd > 0.0);
        assert!(set.ema_cross.is_bullish());
        assert!(set.ma_cross.is_bullish());
    }

    #[test]
    fn test_downtrend_classification() {
        let closes: Vec<f64> = (0..80).map(|i| 200.0 - i as f64).collect();
        let set = calculate_indicators(&create_test_candles(&closes), &IndicatorConfig::default());

        assert_eq!(set.trend, Trend::Bearish);
        assert!(set.rsi < 30.0);
        assert!(set.ma_cross.is_bearish());
    }

    #[test]
    fn test_insufficient_history_falls_back_to_price() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let set = calculate_indicators(&create_test_candles(&closes), &IndicatorConfig::default());

        // Not enough for SMA20/SMA50 or Bollinger(20)
        assert_eq!(set.sma_fast, 109.0);
        assert_eq!(set.sma_slow, 109.0);
        assert!((set.bollinger.upper - 109.0 * 1.02).abs() < 1e-9);
        assert!(set.atr > 0.0);
    }

    #[test]
    fn test_classify_trend() {
        assert_eq!(classify_trend(110.0, 105.0, 100.0), Trend::Bullish);
        assert_eq!(classify_trend(90.0, 95.0, 100.0), Trend::Bearish);
        assert_eq!(classify_trend(100.0, 105.0, 100.0), Trend::Neutral);
    }

    #[test]
    fn test_golden_cross_on_last_bar() {
        // Fast average dips below slow, then one strong bar crosses it back
        let mut closes = vec![100.0; 60];
        closes.extend([99.0, 98.5, 98.0]);
        closes.push(130.0);

        let set = calculate_indicators(&create_test_candles(&closes), &IndicatorConfig::default());
        assert_eq!(set.ma_cross, CrossState::GoldenCross);
    }

    #[test]
    fn test_volatility_levels() {
        assert_eq!(VolatilityLevel::from_atr_percent(0.5), VolatilityLevel::Low);
        assert_eq!(VolatilityLevel::from_atr_percent(1.5), VolatilityLevel::Moderate);
        assert_eq!(VolatilityLevel::from_atr_percent(2.5), VolatilityLevel::High);
        assert_eq!(VolatilityLevel::from_atr_percent(3.5), VolatilityLevel::Extreme);
    }
}
