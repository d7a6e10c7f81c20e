use serde::{Deserialize, Serialize};

use super::moving_average::calculate_ema_series;

/// MACD line, its signal line and the histogram between them
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Calculate MACD (fast EMA - slow EMA) with an EMA signal line
///
/// The signal line is the `signal` period EMA of the MACD series. When the
/// MACD series is still shorter than the signal period the signal equals the
/// MACD itself (histogram 0).
///
/// Returns None when there are fewer prices than the slow period
pub fn calculate_macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || slow <= fast || prices.len() < slow {
        return None;
    }

    let fast_series = calculate_ema_series(prices, fast);
    let slow_series = calculate_ema_series(prices, slow);

    // Align both series on the last price
    let offset = fast_series.len() - slow_series.len();
    let macd_series: Vec<f64> = slow_series
        .iter()
        .zip(&fast_series[offset..])
        .map(|(slow, fast)| fast - slow)
        .collect();

    let macd = *macd_series.last()?;
    let signal = calculate_ema_series(&macd_series, signal)
        .last()
        .copied()
        .unwrap_or(macd);

    let result = Macd {
        macd,
        signal,
        histogram: macd - signal,
    };

    if result.macd.is_finite() && result.signal.is_finite() {
        Some(result)
    } else {
        None
    }
}
