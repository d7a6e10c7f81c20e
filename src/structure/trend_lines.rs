use serde::{Deserialize, Serialize};

use crate::models::Candle;

/// Neighbours on each side a pivot must strictly dominate
const PIVOT_WINDOW: usize = 3;
/// Minimum history before lines are fitted
const MIN_CANDLES: usize = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    /// Line value projected to the last candle
    pub current_value: f64,
    /// Absolute distance of the price from the line, in percent
    pub distance_pct: f64,
    pub price_above: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Breakout {
    BullishBreakout,
    BearishBreakout,
    #[default]
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrendLines {
    pub resistance: Option<TrendLine>,
    pub support: Option<TrendLine>,
    pub breakout: Breakout,
}

/// Fit resistance and support lines through the two most recent pivots
///
/// A pivot high is strictly greater than the highs of its three neighbours
/// on each side; pivot lows mirror that. `price` breaking above the
/// resistance line is a bullish breakout, below the support line a bearish
/// one. A missing price (zero or non-finite) falls back to the last close.
pub fn detect_trend_lines(candles: &[Candle], price: f64) -> TrendLines {
    if candles.len() < MIN_CANDLES {
        return TrendLines::default();
    }

    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();

    let pivot_highs = pivots(&highs, |v, other| v > other);
    let pivot_lows = pivots(&lows, |v, other| v < other);

    let last = candles.len() - 1;
    let price = if price.is_finite() && price > 0.0 {
        price
    } else {
        candles[last].close
    };

    let resistance = fit_line(&highs, &pivot_highs, last, price);
    let support = fit_line(&lows, &pivot_lows, last, price);

    let breakout = match (resistance, support) {
        (Some(r), _) if price > r.current_value => Breakout::BullishBreakout,
        (_, Some(s)) if price < s.current_value => Breakout::BearishBreakout,
        _ => Breakout::None,
    };

    TrendLines {
        resistance,
        support,
        breakout,
    }
}

fn pivots(values: &[f64], dominates: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let n = values.len();
    if n < 2 * PIVOT_WINDOW + 1 {
        return Vec::new();
    }

    (PIVOT_WINDOW..n - PIVOT_WINDOW)
        .filter(|&i| {
            (1..=PIVOT_WINDOW)
                .all(|j| dominates(values[i], values[i - j]) && dominates(values[i], values[i + j]))
        })
        .collect()
}

fn fit_line(values: &[f64], pivots: &[usize], last: usize, price: f64) -> Option<TrendLine> {
    let [.., x1, x2] = pivots else {
        return None;
    };
    let (x1, x2) = (*x1, *x2);
    let (y1, y2) = (values[x1], values[x2]);

    let slope = (y2 - y1) / (x2 - x1) as f64;
    let current_value = y2 + slope * (last - x2) as f64;
    if !current_value.is_finite() || current_value == 0.0 {
        return None;
    }

    Some(TrendLine {
        slope,
        current_value,
        distance_pct: ((price - current_value) / current_value * 100.0).abs(),
        price_above: price > current_value,
    })
}
