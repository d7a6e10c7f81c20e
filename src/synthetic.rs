// Seeded synthetic market data for demos and tests

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{BookLevel, Candle, MarketSnapshot, OrderBookSummary, TradePrint};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with noise (+2% daily average)
    Uptrend,
    /// Steady downtrend with noise (-2% daily average)
    Downtrend,
    /// Sideways/choppy market (±1% around mean)
    Sideways,
    /// High volatility (±5% large swings)
    Volatile,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 4] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketScenario::Uptrend => "uptrend",
            MarketScenario::Downtrend => "downtrend",
            MarketScenario::Sideways => "sideways",
            MarketScenario::Volatile => "volatile",
        }
    }
}

impl fmt::Display for MarketScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarketScenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown scenario '{}' (uptrend, downtrend, sideways, volatile)", s))
    }
}

/// Generates synthetic candles, trade prints and depth
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 150.0,
            base_volume: 1_000_000.0,
        }
    }

    /// Generate candles for a specific market scenario
    ///
    /// Timestamps end at `end` and are spaced `interval_minutes` apart.
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        interval_minutes: i64,
        end: DateTime<Utc>,
    ) -> Vec<Candle> {
        let start_time = end - Duration::minutes(num_candles as i64 * interval_minutes);
        let mut candles = Vec::with_capacity(num_candles);
        let mut current_price = self.base_price;

        // +/-2% per day spread across the candles of one day
        let drift_per_interval = 0.02 / (24.0 * 60.0 / interval_minutes.max(1) as f64);

        for i in 0..num_candles {
            let timestamp = start_time + Duration::minutes(i as i64 * interval_minutes);

            current_price += match scenario {
                MarketScenario::Uptrend => {
                    current_price * (drift_per_interval + self.rng.gen_range(-0.001..0.001))
                }
                MarketScenario::Downtrend => {
                    current_price * (-drift_per_interval + self.rng.gen_range(-0.001..0.001))
                }
                MarketScenario::Sideways => {
                    // 10% pull back to the mean plus noise
                    (self.base_price - current_price) * 0.1
                        + current_price * self.rng.gen_range(-0.01..0.01)
                }
                MarketScenario::Volatile => current_price * self.rng.gen_range(-0.05..0.05),
            };
            // Prevent price from going too low
            current_price = current_price.max(self.base_price * 0.5);

            let candle = self.create_candle(current_price, timestamp);
            candles.push(candle);
        }

        candles
    }

    /// Build a full snapshot: candles, a 4x higher timeframe, trade prints and depth
    pub fn snapshot(
        &mut self,
        symbol: &str,
        scenario: MarketScenario,
        num_candles: usize,
        interval_minutes: i64,
    ) -> MarketSnapshot {
        let end = Utc::now();
        let candles = self.generate(scenario, num_candles, interval_minutes, end);
        let higher = self.generate(scenario, num_candles / 4, interval_minutes * 4, end);
        let price = candles.last().map(|c| c.close).unwrap_or(self.base_price);

        let mut snapshot = MarketSnapshot::new(symbol, &format!("{}m", interval_minutes), candles);
        snapshot.higher_timeframe_candles = higher;
        snapshot.funding_rate = Some(self.rng.gen_range(-0.001..0.001));
        snapshot.long_short_ratio = Some(self.rng.gen_range(0.6..1.6));
        snapshot.trades = self.trades(price, 200);
        snapshot.order_book = self.order_book(price, 20);
        snapshot
    }

    /// Trade prints around `price`; roughly one in twenty is a large print
    pub fn trades(&mut self, price: f64, count: usize) -> Vec<TradePrint> {
        (0..count)
            .map(|_| {
                let notional = if self.rng.gen_bool(0.05) {
                    self.rng.gen_range(50_000.0..250_000.0)
                } else {
                    self.rng.gen_range(100.0..20_000.0)
                };
                let fill = price * (1.0 + self.rng.gen_range(-0.001..0.001));
                TradePrint {
                    price: fill,
                    quantity: notional / fill,
                    is_buyer_maker: self.rng.gen_bool(0.5),
                }
            })
            .collect()
    }

    /// Depth ladder with `levels` steps of 0.1% on each side
    pub fn order_book(&mut self, price: f64, levels: usize) -> Option<OrderBookSummary> {
        let mut side = |sign: f64| -> Vec<BookLevel> {
            (1..=levels)
                .map(|step| BookLevel {
                    price: price * (1.0 + sign * 0.001 * step as f64),
                    volume: self.rng.gen_range(0.5..8.0),
                })
                .collect()
        };
        let bids = side(-1.0);
        let asks = side(1.0);
        OrderBookSummary::from_depth(&bids, &asks, 5.0)
    }

    /// Helper to create a candle from price and timestamp
    fn create_candle(&mut self, price: f64, timestamp: DateTime<Utc>) -> Candle {
        // Create realistic OHLC from close price
        let noise_pct = 0.002; // ±0.2% intrabar movement

        let high = price * (1.0 + self.rng.gen_range(0.0..noise_pct));
        let low = price * (1.0 - self.rng.gen_range(0.0..noise_pct));

        // Generate open and clamp it between low and high
        let open_raw = price * (1.0 + self.rng.gen_range(-noise_pct..noise_pct));
        let open = open_raw.clamp(low, high);

        // Vary volume ±30%
        let volume = self.base_volume * self.rng.gen_range(0.7..1.3);

        Candle {
            timestamp,
            open,
            high,
            low,
            close: price,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandleValidator;

    #[test]
    fn test_generate_uptrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Uptrend, 500, 5, Utc::now());

        assert_eq!(candles.len(), 500);

        let first_price = candles.first().unwrap().close;
        let last_price = candles.last().unwrap().close;
        assert!(
            last_price > first_price,
            "Uptrend should end higher: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_downtrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Downtrend, 500, 5, Utc::now());

        let first_price = candles.first().unwrap().close;
        let last_price = candles.last().unwrap().close;
        assert!(
            last_price < first_price,
            "Downtrend should end lower: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_sideways() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Sideways, 500, 5, Utc::now());

        // Should stay roughly around base price (±10%)
        let base = gen.base_price;
        for candle in &candles {
            assert!(
                candle.close > base * 0.9 && candle.close < base * 1.1,
                "Sideways should stay near base: {} vs {}",
                candle.close,
                base
            );
        }
    }

    #[test]
    fn test_same_seed_same_series() {
        let end = Utc::now();
        let a = SyntheticDataGenerator::new(7).generate(MarketScenario::Volatile, 50, 60, end);
        let b = SyntheticDataGenerator::new(7).generate(MarketScenario::Volatile, 50, 60, end);
        assert_eq!(a, b);
    }

    #[test]
    fn test_candles_pass_validation() {
        let mut gen = SyntheticDataGenerator::new(42);
        for scenario in MarketScenario::ALL {
            let candles = gen.generate(scenario, 200, 240, Utc::now());
            assert!(CandleValidator::new().validate_series(&candles).is_ok(), "{}", scenario);
        }
    }

    #[test]
    fn test_snapshot_has_auxiliary_data() {
        let snapshot = SyntheticDataGenerator::new(1).snapshot("sol", MarketScenario::Uptrend, 120, 240);

        assert_eq!(snapshot.symbol, "SOLUSDT");
        assert_eq!(snapshot.timeframe, "240m");
        assert_eq!(snapshot.candles.len(), 120);
        assert_eq!(snapshot.higher_timeframe_candles.len(), 30);
        assert_eq!(snapshot.trades.len(), 200);
        assert!(snapshot.order_book.is_some());
    }

    #[test]
    fn test_scenario_parsing() {
        assert_eq!("Uptrend".parse::<MarketScenario>(), Ok(MarketScenario::Uptrend));
        assert_eq!(" volatile ".parse::<MarketScenario>(), Ok(MarketScenario::Volatile));
        assert!("crash".parse::<MarketScenario>().is_err());
    }
}
