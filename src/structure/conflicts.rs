use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::{IndicatorConfig, IndicatorSet};
use crate::models::Trend;

/// One fired rule of the indicator conflict table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalConflict {
    OverboughtInUptrend,
    OversoldInDowntrend,
    BullishMomentumBearishEma,
    BearishMomentumBullishEma,
    AboveUpperBand,
    BelowLowerBand,
}

impl fmt::Display for SignalConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SignalConflict::OverboughtInUptrend => {
                "RSI overbought while trend is still bullish, watch for a pullback"
            }
            SignalConflict::OversoldInDowntrend => {
                "RSI oversold while trend is still bearish, bounce odds rising"
            }
            SignalConflict::BullishMomentumBearishEma => {
                "MACD bullish momentum vs bearish EMA alignment, direction unconfirmed"
            }
            SignalConflict::BearishMomentumBullishEma => {
                "MACD bearish momentum vs bullish EMA alignment, direction unconfirmed"
            }
            SignalConflict::AboveUpperBand => "price above the upper Bollinger band, may be overextended",
            SignalConflict::BelowLowerBand => "price below the lower Bollinger band, may be oversold",
        };
        f.write_str(text)
    }
}

/// Cross-check oscillator, trend and band position
///
/// Each rule pair is exclusive, so at most three conflicts fire.
pub fn detect_signal_conflicts(
    indicators: &IndicatorSet,
    config: &IndicatorConfig,
) -> Vec<SignalConflict> {
    let mut conflicts = Vec::new();

    if indicators.rsi > config.rsi_overbought && indicators.trend == Trend::Bullish {
        conflicts.push(SignalConflict::OverboughtInUptrend);
    } else if indicators.rsi < config.rsi_oversold && indicators.trend == Trend::Bearish {
        conflicts.push(SignalConflict::OversoldInDowntrend);
    }

    if indicators.macd.histogram > 0.0 && indicators.ema_cross.is_bearish() {
        conflicts.push(SignalConflict::BullishMomentumBearishEma);
    } else if indicators.macd.histogram < 0.0 && indicators.ema_cross.is_bullish() {
        conflicts.push(SignalConflict::BearishMomentumBullishEma);
    }

    if indicators.above_upper_band() && indicators.trend == Trend::Bullish {
        conflicts.push(SignalConflict::AboveUpperBand);
    } else if indicators.below_lower_band() && indicators.trend == Trend::Bearish {
        conflicts.push(SignalConflict::BelowLowerBand);
    }

    if !conflicts.is_empty() {
        tracing::debug!("Signal conflicts: {:?}", conflicts);
    }

    conflicts
}
