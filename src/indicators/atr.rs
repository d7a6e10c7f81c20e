/// Average True Range (ATR) indicator
///
/// Measures market volatility by calculating the average of true ranges over a period.
/// True Range is the greatest of:
/// - Current High - Current Low
/// - Abs(Current High - Previous Close)
/// - Abs(Current Low - Previous Close)
///
/// Uses Wilder's smoothing (same as RSI and ADX) for the moving average.

use crate::models::Candle;

/// True range of every candle after the first
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| w[1].true_range(w[0].close))
        .collect()
}

/// Calculate ATR for the given candles
///
/// Returns the current ATR value, or None if insufficient data
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    calculate_atr_series(candles, period).last().copied()
}

/// Calculate ATR and return all intermediate values (for analysis)
///
/// Returns vector of ATR values aligned with candles (starting from index period)
pub fn calculate_atr_series(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period + 1 {
        return Vec::new();
    }

    let true_ranges = true_ranges(candles);
    let p = period as f64;

    let mut atr_series = Vec::with_capacity(true_ranges.len() - period + 1);

    // First ATR is simple average of first 'period' true ranges
    let mut atr: f64 = true_ranges[..period].iter().sum::<f64>() / p;
    atr_series.push(atr);

    // Apply Wilder's smoothing for subsequent values
    for tr in &true_ranges[period..] {
        atr = (atr * (p - 1.0) + tr) / p;
        atr_series.push(atr);
    }

    atr_series
}

/// ATR that degrades instead of failing: the Wilder ATR when there is enough
/// history, the mean of the available true ranges when there is not, and 0
/// for fewer than two candles.
pub fn calculate_atr_or_mean(candles: &[Candle], period: usize) -> f64 {
    if let Some(atr) = calculate_atr(candles, period) {
        return atr;
    }

    let true_ranges = true_ranges(candles);
    if true_ranges.is_empty() {
        return 0.0;
    }
    true_ranges.iter().sum::<f64>() / true_ranges.len() as f64
}
