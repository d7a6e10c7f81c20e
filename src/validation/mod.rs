// Prediction validation module
// Turns an untrusted draft recommendation into one that satisfies the
// trading-logic invariants for its final state

pub mod direction;
pub mod key_levels;
pub mod narrative;
pub mod validator;

pub use direction::{direction_from_prices, direction_from_text};
pub use key_levels::{anchor_key_levels, pivot_deviation};
pub use narrative::sanitize_narrative;
pub use validator::PredictionValidator;

use serde::{Deserialize, Serialize};

use crate::analysis::MarketAnalysis;
use crate::models::{KeyLevels, Trend};

/// Validator thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidatorConfig {
    pub anti_chase_tolerance: f64, // Entry may sit this far beyond price
    pub chase_zone_width: f64,     // Zone width rebuilt after an anti-chase clamp
    pub min_risk_reward: f64,
    pub stop_atr_multiplier: f64,
    pub stop_fallback_pct: f64, // Stop distance when ATR is unavailable
    pub target_ladder: Vec<f64>,
    pub max_target_atr: f64,
    pub target_clamp_atr: f64,
    pub max_entry_width_atr: f64,
    pub entry_width_atr: f64,
    /// Confidence caps for 1, 2, 3+ signal conflicts
    pub confidence_caps: Vec<u8>,
    pub strong_level_offset: f64,
    pub weak_level_offset: f64,
    pub pivot_deviation_warn: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            anti_chase_tolerance: 0.0005,
            chase_zone_width: 0.005,
            min_risk_reward: 1.2,
            stop_atr_multiplier: 1.5,
            stop_fallback_pct: 0.02,
            target_ladder: vec![0.02, 0.04, 0.06],
            max_target_atr: 5.0,
            target_clamp_atr: 3.0,
            max_entry_width_atr: 2.0,
            entry_width_atr: 0.5,
            confidence_caps: vec![80, 70, 60],
            strong_level_offset: 0.05,
            weak_level_offset: 0.02,
            pivot_deviation_warn: 0.05,
        }
    }
}

impl ValidatorConfig {
    /// Confidence ceiling for a conflict count, if any
    ///
    /// The last cap applies to every count beyond the list.
    pub fn confidence_cap(&self, conflicts: usize) -> Option<u8> {
        if conflicts == 0 {
            return None;
        }
        self.confidence_caps
            .get(conflicts - 1)
            .or(self.confidence_caps.last())
            .copied()
    }
}

/// Engine facts the validator checks a draft against
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationContext {
    pub price: f64,
    pub atr: f64,
    pub trend: Trend,
    pub conflicts: Vec<String>,
    pub engine_levels: KeyLevels,
    pub pivot_s1: Option<f64>,
    pub point_of_control: Option<f64>,
    pub value_area_low: Option<f64>,
    pub value_area_high: Option<f64>,
    pub risk_score: f64,
}

impl ValidationContext {
    pub fn new(price: f64, atr: f64) -> Self {
        Self {
            price,
            atr,
            ..Default::default()
        }
    }

    pub fn with_conflicts(mut self, conflicts: Vec<String>) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn from_analysis(analysis: &MarketAnalysis) -> Self {
        let profile = analysis.volume_profile.as_ref();
        Self {
            price: analysis.price,
            atr: analysis.indicators.atr,
            trend: analysis.indicators.trend,
            conflicts: analysis.conflict_lines(),
            engine_levels: analysis.key_levels,
            pivot_s1: analysis.levels.pivots.as_ref().map(|p| p.classic.s1),
            point_of_control: profile.map(|vp| vp.point_of_control),
            value_area_low: profile.map(|vp| vp.value_area_low),
            value_area_high: profile.map(|vp| vp.value_area_high),
            risk_score: analysis.risk_score,
        }
    }

    /// The engine's live price, or zero when it has none
    ///
    /// The draft's own quote and entry are never used in its place: levels
    /// checked against the draft's numbers would always pass.
    pub(crate) fn live_price(&self) -> f64 {
        if self.price.is_finite() && self.price > 0.0 {
            self.price
        } else {
            0.0
        }
    }

    pub(crate) fn usable_atr(&self) -> Option<f64> {
        (self.atr.is_finite() && self.atr > 0.0).then_some(self.atr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_cap_tiers() {
        let config = ValidatorConfig::default();
        assert_eq!(config.confidence_cap(0), None);
        assert_eq!(config.confidence_cap(1), Some(80));
        assert_eq!(config.confidence_cap(2), Some(70));
        assert_eq!(config.confidence_cap(3), Some(60));
        assert_eq!(config.confidence_cap(6), Some(60));
    }

    #[test]
    fn test_live_price_comes_from_the_engine_only() {
        assert_eq!(ValidationContext::new(105.0, 0.0).live_price(), 105.0);
        assert_eq!(ValidationContext::new(0.0, 0.0).live_price(), 0.0);
        assert_eq!(ValidationContext::new(f64::NAN, 0.0).live_price(), 0.0);
        assert_eq!(ValidationContext::new(-3.0, 0.0).live_price(), 0.0);
    }

    #[test]
    fn test_usable_atr() {
        assert_eq!(ValidationContext::new(100.0, 2.0).usable_atr(), Some(2.0));
        assert_eq!(ValidationContext::new(100.0, 0.0).usable_atr(), None);
        assert_eq!(ValidationContext::new(100.0, f64::NAN).usable_atr(), None);
    }
}
