use serde::{Deserialize, Serialize};

use super::microstructure::{LiquidityGap, WhaleActivity};

/// Thresholds and weights of the composite risk score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    pub squeeze_width: f64,          // Band width below this is a squeeze
    pub narrow_width: f64,           // Band width below this is narrowing
    pub squeeze_points: f64,
    pub narrow_points: f64,
    pub funding_extreme: f64,        // |funding| above this is crowded
    pub negative_funding_points: f64,
    pub funding_points: f64,
    pub whale_ratio: f64,            // Share of volume from large prints
    pub whale_ratio_points: f64,
    pub whale_net_flow_usd: f64,
    pub whale_net_flow_points: f64,
    pub liquidity_gap_points: f64,
    pub whale_threshold_usd: f64,    // Minimum notional of a large print
    pub liquidity_gap_ratio: f64,    // Nearby bid/ask imbalance that counts as a gap
    pub large_order_volume: f64,     // Minimum resting size of a large book order
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            squeeze_width: 0.05,
            narrow_width: 0.10,
            squeeze_points: 30.0,
            narrow_points: 15.0,
            funding_extreme: 0.0005,
            negative_funding_points: 20.0,
            funding_points: 10.0,
            whale_ratio: 0.4,
            whale_ratio_points: 25.0,
            whale_net_flow_usd: 1_000_000.0,
            whale_net_flow_points: 10.0,
            liquidity_gap_points: 25.0,
            whale_threshold_usd: 50_000.0,
            liquidity_gap_ratio: 5.0,
            large_order_volume: 5.0,
        }
    }
}

/// Composite risk score in [0, 100]
///
/// Band squeeze, crowded funding, large-trade activity and order-book
/// liquidity gaps each add points. Quiet markets with reasonably wide bands
/// get a small floor so they read differently from "no data".
pub fn calculate_risk_score(
    band_width: f64,
    funding_rate: Option<f64>,
    whales: Option<&WhaleActivity>,
    gaps: &[LiquidityGap],
    config: &RiskConfig,
) -> f64 {
    let mut score = 0.0;

    // Bands with no data (width 0) do not count as a squeeze
    if band_width > 0.0 {
        if band_width < config.squeeze_width {
            score += config.squeeze_points;
        } else if band_width < config.narrow_width {
            score += config.narrow_points;
        }
    }

    if let Some(funding) = funding_rate.filter(|f| f.is_finite()) {
        if funding < -config.funding_extreme {
            score += config.negative_funding_points; // Short squeeze risk
        } else if funding.abs() > config.funding_extreme {
            score += config.funding_points;
        }
    }

    if let Some(whales) = whales {
        if whales.whale_ratio > config.whale_ratio {
            score += config.whale_ratio_points;
        }
        if whales.net_whale_volume.abs() > config.whale_net_flow_usd {
            score += config.whale_net_flow_points;
        }
    }

    if !gaps.is_empty() {
        score += config.liquidity_gap_points;
    }

    if score < 50.0 {
        let floor = if band_width > config.narrow_width {
            5.0
        } else if band_width > config.squeeze_width {
            12.0
        } else if band_width > 0.02 {
            8.0
        } else {
            0.0
        };
        score = f64::max(score, floor);
    }

    let score = score.clamp(0.0, 100.0);
    tracing::debug!("Risk score {:.1} (band width {:.4}, {} gaps)", score, band_width, gaps.len());
    score
}
