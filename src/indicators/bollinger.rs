use serde::{Deserialize, Serialize};

/// Bollinger bands: SMA ± k population standard deviations
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// (upper - lower) / middle
    pub width: f64,
}

impl BollingerBands {
    /// Bands ±2% around the price, used when there is not enough history
    pub fn around(price: f64) -> Self {
        let upper = price * 1.02;
        let lower = price * 0.98;
        Self {
            upper,
            middle: price,
            lower,
            width: if price > 0.0 { (upper - lower) / price } else { 0.0 },
        }
    }

    /// Position of `price` inside the bands: 0 at lower, 1 at upper
    pub fn percent_b(&self, price: f64) -> f64 {
        let span = self.upper - self.lower;
        if span > 0.0 {
            (price - self.lower) / span
        } else {
            0.5
        }
    }
}

/// Calculate Bollinger bands over the last `period` prices
///
/// Returns None if insufficient data
pub fn calculate_bollinger(prices: &[f64], period: usize, std_dev: f64) -> Option<BollingerBands> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let window = &prices[prices.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|p| (p - middle).powi(2)).sum::<f64>() / period as f64;
    let sd = variance.sqrt();

    let upper = middle + std_dev * sd;
    let lower = middle - std_dev * sd;
    let width = if middle > 0.0 { (upper - lower) / middle } else { 0.0 };

    let bands = BollingerBands { upper, middle, lower, width };
    if [upper, middle, lower, width].iter().all(|v| v.is_finite()) {
        Some(bands)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_ordering() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
        let bands = calculate_bollinger(&prices, 20, 2.0).unwrap();

        assert!(bands.upper >= bands.middle);
        assert!(bands.middle >= bands.lower);
        assert!(bands.width > 0.0);
    }

    #[test]
    fn test_flat_prices_collapse_bands() {
        let prices = vec![50.0; 20];
        let bands = calculate_bollinger(&prices, 20, 2.0).unwrap();

        assert_eq!(bands.upper, 50.0);
        assert_eq!(bands.lower, 50.0);
        assert_eq!(bands.width, 0.0);
    }

    #[test]
    fn test_known_population_std() {
        // Mean 5, population std 2
        let prices = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = calculate_bollinger(&prices, 8, 2.0).unwrap();

        assert_eq!(bands.middle, 5.0);
        assert_eq!(bands.upper, 9.0);
        assert_eq!(bands.lower, 1.0);
    }

    #[test]
    fn test_fallback_bands() {
        assert!(calculate_bollinger(&[100.0, 101.0], 20, 2.0).is_none());

        let bands = BollingerBands::around(100.0);
        assert!((bands.upper - 102.0).abs() < 1e-9);
        assert!((bands.lower - 98.0).abs() < 1e-9);
        assert!((bands.percent_b(100.0) - 0.5).abs() < 1e-9);
    }
}
