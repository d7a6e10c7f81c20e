use serde::{Deserialize, Serialize};

use crate::models::Candle;

/// Extreme high / low over a recent window of closed candles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SwingLevels {
    pub window: usize,
    pub recent_high: f64,
    pub recent_low: f64,
}

/// Highest high and lowest low of the last `window` closed candles
///
/// The in-progress last candle is excluded. Returns None when the series is
/// shorter than the window.
pub fn calculate_swing_levels(candles: &[Candle], window: usize) -> Option<SwingLevels> {
    if window == 0 || candles.len() < window {
        return None;
    }

    let end = candles.len() - 1;
    let closed = &candles[end.saturating_sub(window)..end];
    if closed.is_empty() {
        return None;
    }

    Some(SwingLevels {
        window,
        recent_high: closed.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
        recent_low: closed.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_candles(prices: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                timestamp: Utc::now() + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_swing_excludes_live_candle() {
        let mut prices = vec![(100.0, 105.0, 95.0, 100.0); 25];
        prices[10] = (100.0, 112.0, 93.0, 100.0);
        // Live candle spikes, must not count
        prices.push((100.0, 150.0, 50.0, 120.0));

        let swing = calculate_swing_levels(&create_test_candles(&prices), 20).unwrap();
        assert_eq!(swing.recent_high, 112.0);
        assert_eq!(swing.recent_low, 93.0);
        assert_eq!(swing.window, 20);
    }

    #[test]
    fn test_swing_window_only_looks_back_n() {
        let mut prices = vec![(100.0, 105.0, 95.0, 100.0); 30];
        // Outside the last 20 closed candles
        prices[2] = (100.0, 140.0, 60.0, 100.0);

        let swing = calculate_swing_levels(&create_test_candles(&prices), 20).unwrap();
        assert_eq!(swing.recent_high, 105.0);
        assert_eq!(swing.recent_low, 95.0);
    }

    #[test]
    fn test_short_series_has_no_swing() {
        let prices = vec![(100.0, 105.0, 95.0, 100.0); 10];
        assert!(calculate_swing_levels(&create_test_candles(&prices), 20).is_none());
    }
}
