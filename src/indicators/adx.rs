/// Average Directional Index (ADX) - Measures trend strength
///
/// ADX ranges from 0 to 100:
/// - ADX > 25: Strong trend (bull or bear)
/// - ADX 20-25: Moderate trend
/// - ADX < 20: Weak trend / choppy / ranging market
///
/// Also returns +DI and -DI to determine trend direction:
/// - +DI > -DI: Uptrend
/// - -DI > +DI: Downtrend

use serde::{Deserialize, Serialize};

use crate::models::Candle;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Adx {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Calculate ADX, +DI, and -DI for trend strength and direction
///
/// TR, +DM and -DM are Wilder-smoothed; DX is computed at every bar and the
/// ADX is the Wilder average of the DX series. With fewer than `period` DX
/// values the latest DX stands in for the ADX.
///
/// Returns None if insufficient data
pub fn calculate_adx(candles: &[Candle], period: usize) -> Option<Adx> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    // Step 1: Calculate True Range (TR) and Directional Movement (+DM, -DM)
    let mut true_ranges = Vec::with_capacity(candles.len() - 1);
    let mut plus_dms = Vec::with_capacity(candles.len() - 1);
    let mut minus_dms = Vec::with_capacity(candles.len() - 1);

    for w in candles.windows(2) {
        let (prev, curr) = (&w[0], &w[1]);
        true_ranges.push(curr.true_range(prev.close));

        // Directional Movement
        let up_move = curr.high - prev.high;
        let down_move = prev.low - curr.low;

        plus_dms.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dms.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
    }

    // Step 2: Smooth True Range and Directional Movements (Wilder's smoothing)
    let smoothed_tr = wilder_series(&true_ranges, period);
    let smoothed_plus_dm = wilder_series(&plus_dms, period);
    let smoothed_minus_dm = wilder_series(&minus_dms, period);

    // Step 3: +DI, -DI and DX at every smoothed bar
    let mut latest = Adx::default();
    let mut dxs = Vec::with_capacity(smoothed_tr.len());
    for i in 0..smoothed_tr.len() {
        let (plus_di, minus_di) = if smoothed_tr[i] > 0.0 {
            (
                smoothed_plus_dm[i] / smoothed_tr[i] * 100.0,
                smoothed_minus_dm[i] / smoothed_tr[i] * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        let di_sum = plus_di + minus_di;
        let dx = if di_sum > 0.0 {
            (plus_di - minus_di).abs() / di_sum * 100.0
        } else {
            0.0
        };

        dxs.push(dx);
        latest = Adx { adx: dx, plus_di, minus_di };
    }

    // Step 4: ADX is the smoothed DX
    if let Some(adx) = wilder_series(&dxs, period).last() {
        latest.adx = *adx;
    }

    if latest.adx.is_finite() && latest.plus_di.is_finite() && latest.minus_di.is_finite() {
        Some(latest)
    } else {
        None
    }
}

/// Wilder's smoothing method (similar to EMA but using Wilder's formula)
///
/// Seeded with the simple average of the first `period` values.
fn wilder_series(values: &[f64], period: usize) -> Vec<f64> {
    if values.len() < period {
        return Vec::new();
    }

    let p = period as f64;
    let mut smoothed: f64 = values[..period].iter().sum::<f64>() / p;
    let mut series = vec![smoothed];

    for value in &values[period..] {
        smoothed = (smoothed * (p - 1.0) + value) / p;
        series.push(smoothed);
    }

    series
}
