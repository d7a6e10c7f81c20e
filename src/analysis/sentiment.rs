use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSet;
use crate::models::Trend;

/// Overall mood from a simple vote of RSI, MACD, trend and funding
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarketMood {
    ExtremelyBullish,
    Bullish,
    #[default]
    Neutral,
    Bearish,
    ExtremelyBearish,
}

impl MarketMood {
    pub fn assess(indicators: &IndicatorSet, funding_rate: Option<f64>) -> Self {
        let mut score = 0i32;

        score += match indicators.rsi {
            r if r > 70.0 => -2, // Overbought
            r if r < 30.0 => 2,  // Oversold
            r if r > 50.0 => 1,
            _ => -1,
        };

        score += if indicators.macd.histogram > 0.0 { 1 } else { -1 };

        score += match indicators.trend {
            Trend::Bullish => 2,
            Trend::Bearish => -2,
            Trend::Neutral => 0,
        };

        match funding_rate {
            Some(f) if f > 0.001 => score -= 1, // Crowded longs
            Some(f) if f < -0.001 => score += 1,
            _ => {}
        }

        match score {
            s if s >= 3 => MarketMood::ExtremelyBullish,
            s if s >= 1 => MarketMood::Bullish,
            s if s <= -3 => MarketMood::ExtremelyBearish,
            s if s <= -1 => MarketMood::Bearish,
            _ => MarketMood::Neutral,
        }
    }
}

/// Human-readable positioning summary from funding, long/short ratio and RSI
pub fn market_sentiment(funding_rate: Option<f64>, long_short_ratio: Option<f64>, rsi: f64) -> String {
    let mut parts = Vec::new();

    if let Some(funding) = funding_rate.filter(|f| f.is_finite()) {
        let pct = funding * 100.0;
        parts.push(match pct {
            p if p > 0.05 => format!("funding very high ({:.3}%), longs crowded", p),
            p if p > 0.01 => format!("funding leaning long ({:.3}%)", p),
            p if p < -0.05 => format!("funding very low ({:.3}%), shorts crowded", p),
            p if p < 0.0 => format!("funding leaning short ({:.3}%)", p),
            _ => "funding neutral".to_string(),
        });
    }

    if let Some(ratio) = long_short_ratio.filter(|r| r.is_finite()) {
        match ratio {
            r if r > 2.0 => parts.push(format!("retail longs extreme (L/S {:.2})", r)),
            r if r > 1.2 => parts.push(format!("longs dominant (L/S {:.2})", r)),
            r if r < 0.5 => parts.push(format!("shorts extreme (L/S {:.2})", r)),
            r if r < 0.8 => parts.push(format!("shorts dominant (L/S {:.2})", r)),
            _ => {}
        }
    }

    if rsi > 70.0 {
        parts.push("RSI overbought".to_string());
    } else if rsi < 30.0 {
        parts.push("RSI oversold".to_string());
    }

    if parts.is_empty() {
        "insufficient sentiment data".to_string()
    } else {
        parts.join("; ")
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LeverageLevels {
    pub x20: f64,
    pub x50: f64,
    pub x100: f64,
}

/// Theoretical liquidation prices for common leverage tiers
///
/// Moves of 4.5%, 1.5% and 0.5% liquidate 20x, 50x and 100x positions once
/// maintenance margin is accounted for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LiquidationLevels {
    pub long: LeverageLevels,
    pub short: LeverageLevels,
}

impl LiquidationLevels {
    pub fn around(price: f64) -> Self {
        Self {
            long: LeverageLevels {
                x20: price * (1.0 - 0.045),
                x50: price * (1.0 - 0.015),
                x100: price * (1.0 - 0.005),
            },
            short: LeverageLevels {
                x20: price * (1.0 + 0.045),
                x50: price * (1.0 + 0.015),
                x100: price * (1.0 + 0.005),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Macd;

    #[test]
    fn test_sentiment_text() {
        let text = market_sentiment(Some(0.0008), Some(2.5), 75.0);
        assert!(text.contains("longs crowded"));
        assert!(text.contains("retail longs extreme"));
        assert!(text.contains("RSI overbought"));

        assert_eq!(market_sentiment(None, None, 50.0), "insufficient sentiment data");
        assert_eq!(market_sentiment(Some(0.0), Some(1.0), 50.0), "funding neutral");
    }

    #[test]
    fn test_mood_votes() {
        let bullish = IndicatorSet {
            rsi: 60.0,
            macd: Macd {
                macd: 1.0,
                signal: 0.5,
                histogram: 0.5,
            },
            trend: Trend::Bullish,
            ..IndicatorSet::default()
        };
        assert_eq!(MarketMood::assess(&bullish, None), MarketMood::ExtremelyBullish);
        // Crowded longs knock one point off
        assert_eq!(MarketMood::assess(&bullish, Some(0.002)), MarketMood::ExtremelyBullish);

        let bearish = IndicatorSet {
            rsi: 45.0,
            trend: Trend::Bearish,
            ..IndicatorSet::default()
        };
        assert_eq!(MarketMood::assess(&bearish, None), MarketMood::ExtremelyBearish);
    }

    #[test]
    fn test_liquidation_levels() {
        let levels = LiquidationLevels::around(100.0);
        assert!((levels.long.x20 - 95.5).abs() < 1e-9);
        assert!((levels.short.x100 - 100.5).abs() < 1e-9);
        assert!(levels.long.x100 > levels.long.x20);
    }
}
