// Market analysis module
// Runs every engine component over one snapshot and collects the results

pub mod context;
pub mod sentiment;

pub use context::CandleSummary;
pub use sentiment::{market_sentiment, LeverageLevels, LiquidationLevels, MarketMood};

use serde::{Deserialize, Serialize};

use crate::indicators::{calculate_indicators, IndicatorConfig, IndicatorSet};
use crate::levels::{ClassicalLevels, LevelConfig};
use crate::models::{FearGreedIndex, KeyLevels, MarketSnapshot, OrderBookSummary};
use crate::risk::{calculate_risk_score, detect_liquidity_gaps, LiquidityGap, RiskConfig, WhaleActivity};
use crate::structure::{
    detect_candlestick_patterns, detect_signal_conflicts, detect_trend_lines, BlockConfig,
    CandlePattern, SignalConflict, StructureBlocks, TrendLines,
};
use crate::volume_profile::{calculate_volume_profile, VolumeProfile, VolumeProfileConfig};

/// Engine configuration: one section per component
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub volume_profile: VolumeProfileConfig,
    pub blocks: BlockConfig,
    pub levels: LevelConfig,
    pub risk: RiskConfig,
    /// Candles used for the engine-derived strong support / resistance
    pub key_level_lookback: usize,
}

impl EngineConfig {
    fn key_level_lookback(&self) -> usize {
        if self.key_level_lookback == 0 {
            20
        } else {
            self.key_level_lookback
        }
    }
}

/// Everything the engine derives from one snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketAnalysis {
    pub symbol: String,
    pub timeframe: String,
    pub price: f64,
    /// Change, range and streak over the last few candles
    pub candle_summary: Option<CandleSummary>,
    pub indicators: IndicatorSet,
    pub higher_timeframe: Option<IndicatorSet>,
    pub patterns: Vec<CandlePattern>,
    pub trend_lines: TrendLines,
    pub signal_conflicts: Vec<SignalConflict>,
    pub volume_profile: Option<VolumeProfile>,
    pub blocks: StructureBlocks,
    pub levels: ClassicalLevels,
    pub whale_activity: Option<WhaleActivity>,
    pub order_book: Option<OrderBookSummary>,
    pub liquidity_gaps: Vec<LiquidityGap>,
    pub risk_score: f64,
    pub funding_rate: Option<f64>,
    pub long_short_ratio: Option<f64>,
    pub open_interest: Option<f64>,
    pub fear_greed: Option<FearGreedIndex>,
    pub mood: MarketMood,
    pub sentiment: String,
    pub liquidation_levels: LiquidationLevels,
    /// Support / resistance ladder derived from recent extremes and the bands
    pub key_levels: KeyLevels,
}

impl MarketAnalysis {
    pub fn conflict_lines(&self) -> Vec<String> {
        self.signal_conflicts.iter().map(ToString::to_string).collect()
    }
}

/// Run the full engine over a snapshot
///
/// Pure and infallible: missing auxiliary data simply leaves the matching
/// fields empty.
pub fn analyze_market(snapshot: &MarketSnapshot, config: &EngineConfig) -> MarketAnalysis {
    let candles = &snapshot.candles;
    let price = snapshot.price();

    let mut indicators = calculate_indicators(candles, &config.indicators);
    if price > 0.0 && indicators.price != price {
        // An explicit quote overrides the last close for price-relative fields
        indicators.price = price;
        indicators.atr_percent = indicators.atr / price * 100.0;
        indicators.trend = crate::indicators::classify_trend(price, indicators.sma_fast, indicators.sma_slow);
    }

    let higher_timeframe = (!snapshot.higher_timeframe_candles.is_empty())
        .then(|| calculate_indicators(&snapshot.higher_timeframe_candles, &config.indicators));

    let signal_conflicts = detect_signal_conflicts(&indicators, &config.indicators);
    let volume_profile = calculate_volume_profile(candles, price, &config.volume_profile);

    let whale_activity = WhaleActivity::from_trades(&snapshot.trades, config.risk.whale_threshold_usd);
    let liquidity_gaps = snapshot
        .order_book
        .as_ref()
        .map(|book| detect_liquidity_gaps(book, config.risk.liquidity_gap_ratio))
        .unwrap_or_default();

    let risk_score = calculate_risk_score(
        indicators.bollinger.width,
        snapshot.funding_rate,
        whale_activity.as_ref(),
        &liquidity_gaps,
        &config.risk,
    );

    let key_levels = engine_key_levels(snapshot, &indicators, config.key_level_lookback());

    let analysis = MarketAnalysis {
        symbol: snapshot.symbol.clone(),
        timeframe: snapshot.timeframe.clone(),
        price,
        candle_summary: CandleSummary::from_candles(candles, context::SUMMARY_WINDOW),
        higher_timeframe,
        patterns: detect_candlestick_patterns(candles),
        trend_lines: detect_trend_lines(candles, price),
        signal_conflicts,
        volume_profile,
        blocks: StructureBlocks::detect(candles, &config.blocks),
        levels: ClassicalLevels::calculate(candles, &config.levels),
        whale_activity,
        order_book: snapshot.order_book.clone(),
        liquidity_gaps,
        risk_score,
        funding_rate: snapshot.funding_rate,
        long_short_ratio: snapshot.long_short_ratio,
        open_interest: snapshot.open_interest,
        fear_greed: snapshot.fear_greed.clone(),
        mood: MarketMood::assess(&indicators, snapshot.funding_rate),
        sentiment: market_sentiment(snapshot.funding_rate, snapshot.long_short_ratio, indicators.rsi),
        liquidation_levels: LiquidationLevels::around(price),
        key_levels,
        indicators,
    };

    tracing::info!(
        "📊 {} {} analyzed: price={:.4} trend={:?} conflicts={} risk={:.0}",
        analysis.symbol,
        analysis.timeframe,
        analysis.price,
        analysis.indicators.trend,
        analysis.signal_conflicts.len(),
        analysis.risk_score
    );

    analysis
}

fn engine_key_levels(snapshot: &MarketSnapshot, indicators: &IndicatorSet, lookback: usize) -> KeyLevels {
    let candles = &snapshot.candles;
    let recent = &candles[candles.len().saturating_sub(lookback)..];

    let (strong_resistance, strong_support) = if recent.is_empty() {
        (0.0, 0.0)
    } else {
        (
            recent.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
            recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
        )
    };

    KeyLevels {
        strong_resistance,
        weak_resistance: indicators.bollinger.upper,
        current_price: snapshot.price(),
        weak_support: indicators.bollinger.lower,
        strong_support,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candle, TradePrint};
    use chrono::Utc;

    fn create_test_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: Utc::now() + chrono::Duration::hours(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn test_analysis_of_uptrend() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64 * 0.5).collect();
        let snapshot = MarketSnapshot::new("btc/usdt", "4h", create_test_candles(&closes));

        let analysis = analyze_market(&snapshot, &EngineConfig::default());

        assert_eq!(analysis.symbol, "BTCUSDT");
        assert_eq!(analysis.price, 139.5);
        assert!(analysis.volume_profile.is_some());
        assert!(analysis.levels.pivots.is_some());
        assert!(analysis.levels.swing.is_some());
        assert!((0.0..=100.0).contains(&analysis.risk_score));
        assert!(analysis.key_levels.strong_resistance >= analysis.key_levels.weak_support);
        assert!(analysis.higher_timeframe.is_none());
    }

    #[test]
    fn test_empty_snapshot_is_not_an_error() {
        let snapshot = MarketSnapshot::new("ETHUSDT", "1h", Vec::new());
        let analysis = analyze_market(&snapshot, &EngineConfig::default());

        assert_eq!(analysis.price, 0.0);
        assert_eq!(analysis.indicators.rsi, 50.0);
        assert!(analysis.volume_profile.is_none());
        assert!(analysis.patterns.is_empty());
        assert_eq!(analysis.key_levels, KeyLevels::default());
    }

    #[test]
    fn test_explicit_quote_and_auxiliary_data() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 4) as f64).collect();
        let mut snapshot = MarketSnapshot::new("SOLUSDT", "4h", create_test_candles(&closes));
        snapshot.current_price = Some(101.5);
        snapshot.funding_rate = Some(-0.001);
        snapshot.trades = vec![TradePrint {
            price: 101.5,
            quantity: 1000.0,
            is_buyer_maker: false,
        }];
        snapshot.order_book = Some(OrderBookSummary {
            nearby_bid_1pct: 100.0,
            nearby_ask_1pct: 10.0,
            ..OrderBookSummary::default()
        });
        snapshot.higher_timeframe_candles = create_test_candles(&closes[..10]);

        let analysis = analyze_market(&snapshot, &EngineConfig::default());

        assert_eq!(analysis.price, 101.5);
        assert_eq!(analysis.indicators.price, 101.5);
        assert_eq!(analysis.key_levels.current_price, 101.5);
        assert_eq!(analysis.liquidity_gaps, vec![LiquidityGap::Upward]);
        assert_eq!(analysis.whale_activity.as_ref().unwrap().whale_trades, 1);
        assert!(analysis.higher_timeframe.is_some());
        // Negative funding + whale ratio + liquidity gap
        assert!(analysis.risk_score >= 70.0);
    }
}
