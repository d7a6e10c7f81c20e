// Pivot points from the last fully closed candle
// The final candle of a live series is still forming, so the pivot is
// computed from the one before it: P = (H + L + C) / 3.
// Classic: R1 = 2P - L, S1 = 2P - H, R2 = P + (H - L), S2 = P - (H - L),
// R3 = H + 2(P - L), S3 = L - 2(H - P).
// Fibonacci: P ± 0.382, 0.618 and 1.0 times the range.

use serde::{Deserialize, Serialize};

use crate::models::Candle;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PivotSet {
    pub p: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PivotPoints {
    pub classic: PivotSet,
    pub fibonacci: PivotSet,
}

/// Returns None with fewer than two candles
pub fn calculate_pivot_points(candles: &[Candle]) -> Option<PivotPoints> {
    if candles.len() < 2 {
        return None;
    }

    let prev = &candles[candles.len() - 2];
    let (high, low, close) = (prev.high, prev.low, prev.close);
    let p = (high + low + close) / 3.0;
    let range = high - low;

    let classic = PivotSet {
        p,
        r1: 2.0 * p - low,
        s1: 2.0 * p - high,
        r2: p + range,
        s2: p - range,
        r3: high + 2.0 * (p - low),
        s3: low - 2.0 * (high - p),
    };

    let fibonacci = PivotSet {
        p,
        r1: p + 0.382 * range,
        s1: p - 0.382 * range,
        r2: p + 0.618 * range,
        s2: p - 0.618 * range,
        r3: p + range,
        s3: p - range,
    };

    Some(PivotPoints { classic, fibonacci })
}
