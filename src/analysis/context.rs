// Prompt context rendering
// Formats a MarketAnalysis as the plain-text briefing handed to the advisor model

use serde::{Deserialize, Serialize};

use crate::indicators::{CrossState, VolatilityLevel};
use crate::levels::PivotSet;
use crate::models::{BookPressure, Candle, Trend};
use crate::risk::LiquidityGap;
use crate::structure::{Block, BlockKind, Breakout, TrendLine};
use crate::validation::narrative::format_price;

use super::{MarketAnalysis, MarketMood};

/// Candles covered by the summary's change and range (one day of 4h bars)
pub const SUMMARY_WINDOW: usize = 6;

/// Recent price action in a handful of numbers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CandleSummary {
    pub last_close: f64,
    /// Candles the change and range cover
    pub window: usize,
    pub change_pct: f64,
    pub range_low: f64,
    pub range_high: f64,
    pub last_bullish: bool,
    pub last_change_pct: f64,
    /// Consecutive candles sharing the last candle's colour, the last included
    pub streak: usize,
}

impl CandleSummary {
    /// Summarize the last `window` candles; None for an empty series
    pub fn from_candles(candles: &[Candle], window: usize) -> Option<Self> {
        let last = candles.last()?;
        let recent = &candles[candles.len().saturating_sub(window.max(1))..];

        let last_bullish = last.is_bullish();
        let streak = candles
            .iter()
            .rev()
            .take_while(|c| c.is_bullish() == last_bullish)
            .count();

        Some(Self {
            last_close: last.close,
            window: recent.len(),
            change_pct: percent_change(recent[0].open, last.close),
            range_low: recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
            range_high: recent.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
            last_bullish,
            last_change_pct: percent_change(last.open, last.close),
            streak,
        })
    }

    pub fn lines(&self) -> Vec<String> {
        let colour = if self.last_bullish { "bullish" } else { "bearish" };
        vec![
            format!("- Last close: {}", format_price(self.last_close)),
            format!("- Change over {} candles: {:+.2}%", self.window, self.change_pct),
            format!(
                "- Range over {} candles: {} - {}",
                self.window,
                format_price(self.range_low),
                format_price(self.range_high)
            ),
            format!(
                "- Latest candle: {} ({:+.2}%), {} {} in a row",
                colour, self.last_change_pct, self.streak, colour
            ),
        ]
    }
}

fn percent_change(from: f64, to: f64) -> f64 {
    if from > 0.0 && from.is_finite() && to.is_finite() {
        (to - from) / from * 100.0
    } else {
        0.0
    }
}

impl MarketAnalysis {
    /// Render the analysis as the text context for the advisor prompt
    ///
    /// Sections with nothing to show (no volume profile, no pivots, no order
    /// book, ...) are left out instead of being rendered empty.
    pub fn to_context_text(&self) -> String {
        let header = format!("## {} ({})", self.symbol, self.timeframe);

        let sections = [
            self.price_section(),
            self.indicator_section(),
            self.trend_section(),
            section("Signal conflicts", self.conflict_lines().into_iter().map(|c| format!("- {}", c)).collect()),
            section("Candlestick patterns", self.patterns.iter().map(|p| format!("- {}", p)).collect()),
            self.trend_line_section(),
            self.volume_profile_section(),
            self.block_section(),
            self.classical_level_section(),
            self.key_level_section(),
            self.positioning_section(),
            self.order_flow_section(),
            Some(self.risk_section()),
        ];

        std::iter::once(header)
            .chain(sections.into_iter().flatten())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn price_section(&self) -> Option<String> {
        let mut lines = Vec::new();
        if self.price > 0.0 {
            lines.push(format!("- Current price: {}", format_price(self.price)));
        }
        if let Some(summary) = &self.candle_summary {
            lines.extend(summary.lines());
        }
        section("Price", lines)
    }

    fn indicator_section(&self) -> Option<String> {
        if self.price <= 0.0 {
            return None;
        }

        let ind = &self.indicators;
        let rsi_label = match ind.rsi {
            r if r > 70.0 => "overbought",
            r if r < 30.0 => "oversold",
            _ => "neutral",
        };

        section(
            "Indicators",
            vec![
                format!("- RSI: {:.2} ({})", ind.rsi, rsi_label),
                format!(
                    "- MACD: {:.4} / signal {:.4} / histogram {:+.4}",
                    ind.macd.macd, ind.macd.signal, ind.macd.histogram
                ),
                format!(
                    "- SMA fast / slow: {} / {}",
                    format_price(ind.sma_fast),
                    format_price(ind.sma_slow)
                ),
                format!(
                    "- EMA fast / slow: {} / {}",
                    format_price(ind.ema_fast),
                    format_price(ind.ema_slow)
                ),
                format!(
                    "- Bollinger: {} ~ {} (width {:.4})",
                    format_price(ind.bollinger.lower),
                    format_price(ind.bollinger.upper),
                    ind.bollinger.width
                ),
                format!("- ATR: {} ({:.2}% of price)", format_price(ind.atr), ind.atr_percent),
                format!(
                    "- ADX: {:.1} (+DI {:.1} / -DI {:.1})",
                    ind.adx.adx, ind.adx.plus_di, ind.adx.minus_di
                ),
            ],
        )
    }

    fn trend_section(&self) -> Option<String> {
        if self.price <= 0.0 {
            return None;
        }

        let ind = &self.indicators;
        let mut lines = vec![
            format!("- Trend: {}", trend_label(ind.trend)),
            format!("- MA cross: {}", cross_label(ind.ma_cross)),
            format!("- EMA cross: {}", cross_label(ind.ema_cross)),
            format!("- Volatility: {}", volatility_label(ind.volatility)),
            format!("- Mood: {}", mood_label(self.mood)),
        ];
        if let Some(htf) = &self.higher_timeframe {
            lines.push(format!(
                "- Higher timeframe: {} trend, RSI {:.1}, MACD histogram {:+.4}",
                trend_label(htf.trend),
                htf.rsi,
                htf.macd.histogram
            ));
        }
        section("Trend", lines)
    }

    fn trend_line_section(&self) -> Option<String> {
        let lines = &self.trend_lines;
        let mut out = Vec::new();
        if let Some(line) = &lines.resistance {
            out.push(trend_line("Resistance", line));
        }
        if let Some(line) = &lines.support {
            out.push(trend_line("Support", line));
        }
        match lines.breakout {
            Breakout::BullishBreakout => out.push("- Breakout: bullish, price above the resistance line".to_string()),
            Breakout::BearishBreakout => out.push("- Breakout: bearish, price below the support line".to_string()),
            Breakout::None => {}
        }
        section("Trend lines", out)
    }

    fn volume_profile_section(&self) -> Option<String> {
        let profile = self.volume_profile.as_ref()?;
        let mut lines = vec![
            format!("- Point of control: {}", format_price(profile.point_of_control)),
            format!(
                "- Value area: {} - {}{}",
                format_price(profile.value_area_low),
                format_price(profile.value_area_high),
                if profile.contains_value_area(self.price) {
                    " (price inside)"
                } else {
                    " (price outside)"
                }
            ),
        ];
        if let Some(node) = profile.high_volume_node {
            lines.push(format!("- High-volume node near price: {}", format_price(node)));
        }
        if let Some(node) = profile.low_volume_node {
            lines.push(format!("- Low-volume node near price: {}", format_price(node)));
        }
        section("Volume profile", lines)
    }

    fn block_section(&self) -> Option<String> {
        let blocks = &self.blocks;
        let lines = blocks
            .fair_value_gaps
            .iter()
            .map(|b| block_line("fair value gap", b))
            .chain(blocks.order_blocks.iter().map(|b| block_line("order block", b)))
            .collect();
        section("Structure blocks", lines)
    }

    fn classical_level_section(&self) -> Option<String> {
        let mut lines = Vec::new();
        if let Some(pivots) = &self.levels.pivots {
            lines.push(pivot_line("Classic pivot", &pivots.classic));
            lines.push(pivot_line("Fibonacci pivot", &pivots.fibonacci));
        }
        if let Some(swing) = &self.levels.swing {
            lines.push(format!(
                "- Swing high / low ({} candles): {} / {}",
                swing.window,
                format_price(swing.recent_high),
                format_price(swing.recent_low)
            ));
        }
        section("Classical levels", lines)
    }

    fn key_level_section(&self) -> Option<String> {
        let levels = &self.key_levels;
        let lines = [
            ("Strong resistance", levels.strong_resistance),
            ("Weak resistance", levels.weak_resistance),
            ("Weak support", levels.weak_support),
            ("Strong support", levels.strong_support),
        ]
        .into_iter()
        .filter(|(_, level)| *level > 0.0)
        .map(|(name, level)| format!("- {}: {}", name, format_price(level)))
        .collect();
        section("Key levels", lines)
    }

    fn positioning_section(&self) -> Option<String> {
        let mut lines = Vec::new();
        if let Some(funding) = self.funding_rate {
            lines.push(format!("- Funding rate: {:.4}%", funding * 100.0));
        }
        if let Some(ratio) = self.long_short_ratio {
            lines.push(format!("- Long/short ratio: {:.2}", ratio));
        }
        if let Some(oi) = self.open_interest {
            lines.push(format!("- Open interest: {:.0}", oi));
        }
        if let Some(fg) = &self.fear_greed {
            lines.push(format!("- Fear & greed: {:.0} ({})", fg.value, fg.classification));
        }
        lines.push(format!("- Sentiment: {}", self.sentiment));
        section("Positioning", lines)
    }

    fn order_flow_section(&self) -> Option<String> {
        let mut lines = Vec::new();
        if let Some(whales) = &self.whale_activity {
            lines.push(format!(
                "- Whale trades: {} ({:.1}% of notional, net {:+.0} USD, buy/sell {:.2})",
                whales.whale_trades,
                whales.whale_ratio * 100.0,
                whales.net_whale_volume,
                whales.buy_sell_ratio
            ));
        }
        if let Some(book) = &self.order_book {
            lines.push(format!(
                "- Order book: bid/ask {:.2}, {}",
                book.bid_ask_ratio,
                pressure_label(book.nearby_pressure)
            ));
            if book.major_support.price > 0.0 {
                lines.push(format!(
                    "- Largest bid wall: {} ({:.2})",
                    format_price(book.major_support.price),
                    book.major_support.volume
                ));
            }
            if book.major_resistance.price > 0.0 {
                lines.push(format!(
                    "- Largest ask wall: {} ({:.2})",
                    format_price(book.major_resistance.price),
                    book.major_resistance.volume
                ));
            }
        }
        for gap in &self.liquidity_gaps {
            lines.push(format!("- Liquidity gap: {}", gap_label(*gap)));
        }
        section("Order flow", lines)
    }

    fn risk_section(&self) -> String {
        let mut lines = vec![format!("- Risk score: {:.0}/100", self.risk_score)];
        if self.price > 0.0 {
            let liq = &self.liquidation_levels;
            lines.push(format!(
                "- Long liquidation 20x / 50x / 100x: {} / {} / {}",
                format_price(liq.long.x20),
                format_price(liq.long.x50),
                format_price(liq.long.x100)
            ));
            lines.push(format!(
                "- Short liquidation 20x / 50x / 100x: {} / {} / {}",
                format_price(liq.short.x20),
                format_price(liq.short.x50),
                format_price(liq.short.x100)
            ));
        }
        format!("### Risk\n{}", lines.join("\n"))
    }
}

fn section(title: &str, lines: Vec<String>) -> Option<String> {
    (!lines.is_empty()).then(|| format!("### {}\n{}", title, lines.join("\n")))
}

fn trend_line(name: &str, line: &TrendLine) -> String {
    format!(
        "- {} line: {} (slope {:+.4}), price {:.2}% {}",
        name,
        format_price(line.current_value),
        line.slope,
        line.distance_pct,
        if line.price_above { "above" } else { "below" }
    )
}

fn block_line(name: &str, block: &Block) -> String {
    let kind = match block.kind {
        BlockKind::Bullish => "bullish",
        BlockKind::Bearish => "bearish",
    };
    format!(
        "- {} {}: {} - {}",
        kind,
        name,
        format_price(block.bottom),
        format_price(block.top)
    )
}

fn pivot_line(name: &str, set: &PivotSet) -> String {
    format!(
        "- {}: P {} | R1 {} R2 {} R3 {} | S1 {} S2 {} S3 {}",
        name,
        format_price(set.p),
        format_price(set.r1),
        format_price(set.r2),
        format_price(set.r3),
        format_price(set.s1),
        format_price(set.s2),
        format_price(set.s3)
    )
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Bullish => "bullish",
        Trend::Bearish => "bearish",
        Trend::Neutral => "neutral",
    }
}

fn cross_label(state: CrossState) -> &'static str {
    match state {
        CrossState::GoldenCross => "golden cross",
        CrossState::DeathCross => "death cross",
        CrossState::BullishAlignment => "bullish alignment",
        CrossState::BearishAlignment => "bearish alignment",
        CrossState::Undetermined => "undetermined",
    }
}

fn volatility_label(level: VolatilityLevel) -> &'static str {
    match level {
        VolatilityLevel::Low => "low",
        VolatilityLevel::Moderate => "moderate",
        VolatilityLevel::High => "high",
        VolatilityLevel::Extreme => "extreme",
    }
}

fn mood_label(mood: MarketMood) -> &'static str {
    match mood {
        MarketMood::ExtremelyBullish => "extremely bullish",
        MarketMood::Bullish => "bullish",
        MarketMood::Neutral => "neutral",
        MarketMood::Bearish => "bearish",
        MarketMood::ExtremelyBearish => "extremely bearish",
    }
}

fn pressure_label(pressure: BookPressure) -> &'static str {
    match pressure {
        BookPressure::BuyPressure => "buy pressure",
        BookPressure::SellPressure => "sell pressure",
        BookPressure::Balanced => "balanced",
    }
}

fn gap_label(gap: LiquidityGap) -> &'static str {
    match gap {
        LiquidityGap::Upward => "thin asks above price",
        LiquidityGap::Downward => "thin bids below price",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze_market, EngineConfig};
    use crate::models::MarketSnapshot;
    use crate::structure::{CandlePattern, SignalConflict};
    use chrono::Utc;

    fn create_test_candles(prices: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                timestamp: Utc::now() + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0 + i as f64,
            })
            .collect()
    }

    fn uptrend_analysis() -> MarketAnalysis {
        let prices: Vec<(f64, f64, f64, f64)> = (0..80)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.5;
                (close - 0.5, close + 1.0, close - 1.0, close)
            })
            .collect();
        let snapshot = MarketSnapshot::new("BTCUSDT", "4h", create_test_candles(&prices));
        analyze_market(&snapshot, &EngineConfig::default())
    }

    #[test]
    fn test_candle_summary() {
        let candles = create_test_candles(&[
            (100.0, 102.0, 99.0, 101.0),
            (101.0, 103.0, 100.0, 100.5),
            (100.5, 104.0, 100.0, 103.0),
            (103.0, 106.0, 102.0, 105.0),
        ]);

        let summary = CandleSummary::from_candles(&candles, SUMMARY_WINDOW).unwrap();
        assert_eq!(summary.window, 4);
        assert!((summary.change_pct - 5.0).abs() < 1e-9);
        assert_eq!(summary.range_low, 99.0);
        assert_eq!(summary.range_high, 106.0);
        assert!(summary.last_bullish);
        assert_eq!(summary.streak, 2);
        assert!((summary.last_change_pct - 2.0 / 103.0 * 100.0).abs() < 1e-9);

        let short = CandleSummary::from_candles(&candles, 2).unwrap();
        assert_eq!(short.window, 2);
        assert_eq!(short.range_low, 100.0);
        assert!((short.change_pct - 4.5 / 100.5 * 100.0).abs() < 1e-9);

        assert!(CandleSummary::from_candles(&[], SUMMARY_WINDOW).is_none());
    }

    #[test]
    fn test_context_renders_every_section() {
        let mut analysis = uptrend_analysis();
        analysis.signal_conflicts = vec![SignalConflict::OverboughtInUptrend];
        analysis.patterns = vec![CandlePattern::Hammer];
        analysis.funding_rate = Some(0.0001);

        let text = analysis.to_context_text();
        println!("{}", text);

        assert!(text.starts_with("## BTCUSDT (4h)"));
        for heading in [
            "### Price",
            "### Indicators",
            "### Trend",
            "### Signal conflicts",
            "### Candlestick patterns",
            "### Volume profile",
            "### Classical levels",
            "### Key levels",
            "### Positioning",
            "### Risk",
        ] {
            assert!(text.contains(heading), "missing {}", heading);
        }
        assert!(text.contains("- Current price: 139.50"));
        assert!(text.contains("80 bullish in a row"));
        assert!(text.contains("- Trend: bullish"));
        assert!(text.contains("- RSI overbought while trend is still bullish"));
        assert!(text.contains("- hammer (reversal signal)"));
        assert!(text.contains("- Classic pivot: P "));
        assert!(text.contains("- Funding rate: 0.0100%"));
        assert!(text.contains("Long liquidation 20x / 50x / 100x"));
    }

    #[test]
    fn test_missing_sections_are_left_out() {
        let mut analysis = uptrend_analysis();
        analysis.volume_profile = None;
        analysis.levels.pivots = None;
        analysis.levels.swing = None;
        analysis.signal_conflicts.clear();
        analysis.patterns.clear();

        let text = analysis.to_context_text();
        assert!(!text.contains("### Volume profile"));
        assert!(!text.contains("Point of control"));
        assert!(!text.contains("### Classical levels"));
        assert!(!text.contains("pivot"));
        assert!(!text.contains("### Signal conflicts"));
        assert!(!text.contains("### Candlestick patterns"));
        assert!(!text.contains("### Order flow"));
        assert!(text.contains("### Indicators"));
    }

    #[test]
    fn test_empty_snapshot_context() {
        let snapshot = MarketSnapshot::new("ETHUSDT", "1h", Vec::new());
        let text = analyze_market(&snapshot, &EngineConfig::default()).to_context_text();

        assert!(text.starts_with("## ETHUSDT (1h)"));
        assert!(!text.contains("### Price"));
        assert!(!text.contains("### Indicators"));
        assert!(!text.contains("### Key levels"));
        assert!(text.contains("- Sentiment: insufficient sentiment data"));
        assert!(text.contains("- Risk score: "));
        assert!(!text.contains("liquidation"));
    }
}
