// Market structure module
// Candlestick patterns, pivot trend lines, indicator conflicts and structure blocks

pub mod blocks;
pub mod conflicts;
pub mod patterns;
pub mod trend_lines;

pub use blocks::{detect_fair_value_gaps, detect_order_blocks, Block, BlockConfig, BlockKind, StructureBlocks};
pub use conflicts::{detect_signal_conflicts, SignalConflict};
pub use patterns::{detect_candlestick_patterns, CandlePattern};
pub use trend_lines::{detect_trend_lines, Breakout, TrendLine, TrendLines};
