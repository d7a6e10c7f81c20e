use crate::error::Error;
use crate::models::Candle;
use crate::Result;

/// Validates OHLC candle data at the snapshot boundary
///
/// The engine itself tolerates bad data; this check is for callers that want
/// to reject a malformed payload before analysis.
pub struct CandleValidator;

impl CandleValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a whole series: every candle plus strictly increasing timestamps
    pub fn validate_series(&self, candles: &[Candle]) -> Result<()> {
        for (index, candle) in candles.iter().enumerate() {
            self.validate(candle)
                .map_err(|reason| Error::InvalidCandle { index, reason })?;
        }

        for (i, window) in candles.windows(2).enumerate() {
            if window[1].timestamp <= window[0].timestamp {
                return Err(Error::InvalidCandle {
                    index: i + 1,
                    reason: format!(
                        "timestamp {} does not follow {}",
                        window[1].timestamp, window[0].timestamp
                    ),
                });
            }
        }

        Ok(())
    }

    /// Validate a candle for correctness
    pub fn validate(&self, candle: &Candle) -> std::result::Result<(), String> {
        self.validate_prices(candle)?;
        self.validate_ohlc_relationship(candle)?;
        Ok(())
    }

    /// Validate that all prices are positive and finite
    fn validate_prices(&self, candle: &Candle) -> std::result::Result<(), String> {
        for (name, value) in [
            ("open", candle.open),
            ("high", candle.high),
            ("low", candle.low),
            ("close", candle.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("Invalid {} price: {}", name, value));
            }
        }
        // Volume can be 0.0 (thin or backfilled bars)
        if !candle.volume.is_finite() || candle.volume < 0.0 {
            return Err(format!("Invalid volume: {}", candle.volume));
        }
        Ok(())
    }

    /// Validate OHLC relationships (high >= low, etc.)
    fn validate_ohlc_relationship(&self, candle: &Candle) -> std::result::Result<(), String> {
        if candle.high < candle.low {
            return Err(format!("High ({}) is less than low ({})", candle.high, candle.low));
        }
        if candle.high < candle.open.max(candle.close) {
            return Err(format!(
                "High ({}) is below the candle body ({} / {})",
                candle.high, candle.open, candle.close
            ));
        }
        if candle.low > candle.open.min(candle.close) {
            return Err(format!(
                "Low ({}) is above the candle body ({} / {})",
                candle.low, candle.open, candle.close
            ));
        }
        Ok(())
    }
}

impl Default for CandleValidator {
    fn default() -> Self {
        Self::new()
    }
}
