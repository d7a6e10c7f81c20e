// Risk module
// Composite 0-100 risk score plus the trade-flow and order-book facts feeding it
pub mod microstructure;
pub mod scorer;

pub use microstructure::{detect_liquidity_gaps, LiquidityGap, WhaleActivity};
pub use scorer::{calculate_risk_score, RiskConfig};
