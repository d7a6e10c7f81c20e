use serde::{Deserialize, Serialize};

use crate::models::Candle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Bullish,
    Bearish,
}

/// A price zone left behind by an imbalance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub top: f64,
    pub bottom: f64,
    /// Size relative to the local average candle body
    pub size_ratio: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlockConfig {
    pub body_lookback: usize,
    pub impulse_multiplier: f64, // Body multiple of the rolling average
    pub keep: usize,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            body_lookback: 10,
            impulse_multiplier: 1.5,
            keep: 3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StructureBlocks {
    pub fair_value_gaps: Vec<Block>,
    pub order_blocks: Vec<Block>,
}

impl StructureBlocks {
    pub fn detect(candles: &[Candle], config: &BlockConfig) -> Self {
        Self {
            fair_value_gaps: detect_fair_value_gaps(candles, config),
            order_blocks: detect_order_blocks(candles, config),
        }
    }
}

/// Three-candle gaps: low of the third above the high of the first is a
/// bullish gap, high of the third below the low of the first a bearish one
///
/// Most recent `keep` gaps, oldest first.
pub fn detect_fair_value_gaps(candles: &[Candle], config: &BlockConfig) -> Vec<Block> {
    let mut gaps = Vec::new();

    for (i, w) in candles.windows(3).enumerate() {
        let (first, third) = (&w[0], &w[2]);
        // Average body ending at the middle candle
        let avg_body = average_body(&candles[..i + 2], config.body_lookback);

        let gap = if third.low > first.high {
            Some((BlockKind::Bullish, third.low, first.high))
        } else if third.high < first.low {
            Some((BlockKind::Bearish, first.low, third.high))
        } else {
            None
        };

        if let Some((kind, top, bottom)) = gap {
            gaps.push(Block {
                kind,
                top,
                bottom,
                size_ratio: ratio(top - bottom, avg_body),
                timestamp: w[1].timestamp,
            });
        }
    }

    keep_recent(gaps, config.keep)
}

/// Order blocks: the candle before an impulsive reversal
///
/// An impulse is a candle whose body exceeds `impulse_multiplier` times the
/// average body of the previous `body_lookback` candles and whose colour is
/// opposite the preceding candle. The preceding candle's range becomes a
/// block of the opposite polarity to the impulse: a bearish footprint under
/// an upward impulse, a bullish one under a downward impulse.
pub fn detect_order_blocks(candles: &[Candle], config: &BlockConfig) -> Vec<Block> {
    let mut blocks = Vec::new();

    for i in 1..candles.len() {
        let (prev, curr) = (&candles[i - 1], &candles[i]);
        let start = i.saturating_sub(config.body_lookback);
        let avg_body = average_body(&candles[start..i], config.body_lookback);
        if avg_body <= 0.0 || curr.body() <= avg_body * config.impulse_multiplier {
            continue;
        }

        let kind = if curr.is_bullish() && prev.is_bearish() {
            BlockKind::Bearish
        } else if curr.is_bearish() && prev.is_bullish() {
            BlockKind::Bullish
        } else {
            continue;
        };

        blocks.push(Block {
            kind,
            top: prev.high,
            bottom: prev.low,
            size_ratio: ratio(curr.body(), avg_body),
            timestamp: prev.timestamp,
        });
    }

    keep_recent(blocks, config.keep)
}

fn average_body(candles: &[Candle], lookback: usize) -> f64 {
    let recent = &candles[candles.len().saturating_sub(lookback)..];
    if recent.is_empty() {
        return 0.0;
    }
    recent.iter().map(Candle::body).sum::<f64>() / recent.len() as f64
}

fn ratio(size: f64, avg_body: f64) -> f64 {
    if avg_body > 0.0 {
        size / avg_body
    } else {
        0.0
    }
}

fn keep_recent(mut blocks: Vec<Block>, keep: usize) -> Vec<Block> {
    let excess = blocks.len().saturating_sub(keep);
    blocks.drain(..excess);
    blocks
}
