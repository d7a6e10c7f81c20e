// Candlestick pattern recognition over the last three candles
// Body/shadow ratio heuristics:
// - Hammer: lower shadow > 2x body, upper shadow < 0.5x body
// - Inverted hammer / hanging man: the mirror, split by candle colour
// - Doji: body smaller than 0.3x the stdev of the last 10 closes with a
//   shadow longer than the body
// - Engulfing: last body engulfs the previous opposite-colour body
// - Morning / evening star: strong candle, small middle body, reversal
//   closing beyond the first candle's midpoint

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Candle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Hammer,
    InvertedHammer,
    HangingMan,
    Doji,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
}

impl CandlePattern {
    /// Direction the pattern hints at: +1 bullish, -1 bearish, 0 indecision
    pub fn bias(&self) -> i8 {
        match self {
            CandlePattern::Hammer
            | CandlePattern::InvertedHammer
            | CandlePattern::BullishEngulfing
            | CandlePattern::MorningStar => 1,
            CandlePattern::HangingMan
            | CandlePattern::BearishEngulfing
            | CandlePattern::EveningStar => -1,
            CandlePattern::Doji => 0,
        }
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CandlePattern::Hammer => "hammer (reversal signal)",
            CandlePattern::InvertedHammer => "inverted hammer (potential reversal)",
            CandlePattern::HangingMan => "hanging man (topping signal)",
            CandlePattern::Doji => "doji (indecision)",
            CandlePattern::BullishEngulfing => "bullish engulfing (strong reversal)",
            CandlePattern::BearishEngulfing => "bearish engulfing (strong reversal)",
            CandlePattern::MorningStar => "morning star (strong reversal)",
            CandlePattern::EveningStar => "evening star (topping signal)",
        };
        f.write_str(label)
    }
}

/// Detect patterns formed by the last three candles
///
/// Returns an empty list for fewer than three candles.
pub fn detect_candlestick_patterns(candles: &[Candle]) -> Vec<CandlePattern> {
    let mut patterns = Vec::new();
    if candles.len() < 3 {
        return patterns;
    }

    let n = candles.len();
    let (c1, c2, c3) = (&candles[n - 3], &candles[n - 2], &candles[n - 1]);

    let body_3 = c3.body();
    let upper_3 = c3.upper_shadow();
    let lower_3 = c3.lower_shadow();

    if lower_3 > body_3 * 2.0 && upper_3 < body_3 * 0.5 {
        patterns.push(CandlePattern::Hammer);
    }

    if upper_3 > body_3 * 2.0 && lower_3 < body_3 * 0.5 {
        if c3.is_bullish() {
            patterns.push(CandlePattern::InvertedHammer);
        } else {
            patterns.push(CandlePattern::HangingMan);
        }
    }

    let doji_threshold = if n >= 10 {
        close_std_dev(&candles[n - 10..]) * 0.3
    } else {
        body_3
    };
    if body_3 < doji_threshold && (upper_3 > body_3 || lower_3 > body_3) {
        patterns.push(CandlePattern::Doji);
    }

    if c2.is_bearish() && c3.is_bullish() && c3.open < c2.close && c3.close > c2.open {
        patterns.push(CandlePattern::BullishEngulfing);
    }

    if c2.is_bullish() && c3.is_bearish() && c3.open > c2.close && c3.close < c2.open {
        patterns.push(CandlePattern::BearishEngulfing);
    }

    let body_1 = c1.body();
    let mid_1 = (c1.open + c1.close) / 2.0;
    let small_middle = c2.body() < body_1 * 0.3;

    if c1.is_bearish() && small_middle && c3.is_bullish() && c3.close > mid_1 {
        patterns.push(CandlePattern::MorningStar);
    }

    if c1.is_bullish() && small_middle && c3.is_bearish() && c3.close < mid_1 {
        patterns.push(CandlePattern::EveningStar);
    }

    patterns
}

/// Sample standard deviation of closes
fn close_std_dev(candles: &[Candle]) -> f64 {
    if candles.len() < 2 {
        return 0.0;
    }
    let n = candles.len() as f64;
    let mean = candles.iter().map(|c| c.close).sum::<f64>() / n;
    let variance = candles.iter().map(|c| (c.close - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
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
    fn test_hammer() {
        let candles = create_test_candles(&[
            (105.0, 106.0, 101.0, 102.0),
            (102.0, 103.0, 99.0, 100.0),
            (100.0, 101.1, 95.0, 101.0),
        ]);
        let patterns = detect_candlestick_patterns(&candles);
        assert!(patterns.contains(&CandlePattern::Hammer));
    }

    #[test]
    fn test_hanging_man_vs_inverted_hammer() {
        let bearish_top = create_test_candles(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 102.0, 100.0, 101.5),
            (102.0, 106.0, 100.8, 101.0),
        ]);
        assert!(detect_candlestick_patterns(&bearish_top).contains(&CandlePattern::HangingMan));

        let bullish_bottom = create_test_candles(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 102.0, 100.0, 101.5),
            (101.0, 106.0, 100.9, 102.0),
        ]);
        assert!(detect_candlestick_patterns(&bullish_bottom).contains(&CandlePattern::InvertedHammer));
    }

    #[test]
    fn test_bullish_engulfing() {
        let candles = create_test_candles(&[
            (103.0, 104.0, 101.0, 102.0),
            (102.0, 102.5, 99.5, 100.0),
            (99.5, 103.5, 99.0, 103.0),
        ]);
        assert!(detect_candlestick_patterns(&candles).contains(&CandlePattern::BullishEngulfing));
    }

    #[test]
    fn test_bearish_engulfing() {
        let candles = create_test_candles(&[
            (98.0, 100.0, 97.0, 99.0),
            (100.0, 102.5, 99.5, 102.0),
            (102.5, 103.0, 98.5, 99.0),
        ]);
        assert!(detect_candlestick_patterns(&candles).contains(&CandlePattern::BearishEngulfing));
    }

    #[test]
    fn test_morning_and_evening_star() {
        let morning = create_test_candles(&[
            (110.0, 110.5, 99.5, 100.0),
            (99.5, 100.5, 98.5, 99.8),
            (100.0, 107.5, 99.5, 107.0),
        ]);
        assert!(detect_candlestick_patterns(&morning).contains(&CandlePattern::MorningStar));

        let evening = create_test_candles(&[
            (100.0, 110.5, 99.5, 110.0),
            (110.5, 111.5, 109.5, 110.7),
            (110.0, 110.5, 102.5, 103.0),
        ]);
        assert!(detect_candlestick_patterns(&evening).contains(&CandlePattern::EveningStar));
    }

    #[test]
    fn test_doji_after_volatile_closes() {
        let mut prices: Vec<(f64, f64, f64, f64)> = (0..9)
            .map(|i| {
                let c = if i % 2 == 0 { 100.0 } else { 110.0 };
                (c, c + 1.0, c - 1.0, c)
            })
            .collect();
        prices.push((105.0, 108.0, 102.0, 105.1));

        let candles = create_test_candles(&prices);
        assert!(detect_candlestick_patterns(&candles).contains(&CandlePattern::Doji));
    }

    #[test]
    fn test_too_few_candles() {
        let candles = create_test_candles(&[(100.0, 101.0, 99.0, 100.0); 2]);
        assert!(detect_candlestick_patterns(&candles).is_empty());
    }
}
