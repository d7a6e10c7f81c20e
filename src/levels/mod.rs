// Classical levels module
// Pivot points (classic and Fibonacci) and recent swing extremes

pub mod pivots;
pub mod swing;

pub use pivots::{calculate_pivot_points, PivotPoints, PivotSet};
pub use swing::{calculate_swing_levels, SwingLevels};

use serde::{Deserialize, Serialize};

use crate::models::Candle;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LevelConfig {
    pub swing_window: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self { swing_window: 20 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassicalLevels {
    pub pivots: Option<PivotPoints>,
    pub swing: Option<SwingLevels>,
}

impl ClassicalLevels {
    pub fn calculate(candles: &[Candle], config: &LevelConfig) -> Self {
        Self {
            pivots: calculate_pivot_points(candles),
            swing: calculate_swing_levels(candles, config.swing_window),
        }
    }
}
