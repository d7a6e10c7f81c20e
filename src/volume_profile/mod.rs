// Volume profile module
// Traded volume histogrammed by price (VPVR): point of control, value area
// and high / low volume nodes

use serde::{Deserialize, Serialize};

use crate::models::Candle;

/// Configuration for the volume profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VolumeProfileConfig {
    pub bins: usize,
    pub value_area_share: f64,
    pub hvn_multiplier: f64, // Multiple of the mean bin volume
    pub lvn_multiplier: f64,
    pub node_search_pct: f64, // Window around price for the nearest node
}

impl Default for VolumeProfileConfig {
    fn default() -> Self {
        Self {
            bins: 50,
            value_area_share: 0.70,
            hvn_multiplier: 1.5,
            lvn_multiplier: 0.5,
            node_search_pct: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VolumeBin {
    pub price_low: f64,
    pub price_high: f64,
    pub volume: f64,
}

impl VolumeBin {
    pub fn center(&self) -> f64 {
        (self.price_low + self.price_high) / 2.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeProfile {
    pub point_of_control: f64,
    pub value_area_low: f64,
    pub value_area_high: f64,
    pub value_area_volume: f64,
    pub total_volume: f64,
    /// High-volume node centre nearest the price within the search window
    pub high_volume_node: Option<f64>,
    /// Low-volume node ("vacuum") centre nearest the price within the search window
    pub low_volume_node: Option<f64>,
    pub high_volume_nodes: Vec<f64>,
    pub low_volume_nodes: Vec<f64>,
    pub bins: Vec<VolumeBin>,
}

impl VolumeProfile {
    /// Index of the point-of-control bin (first maximum)
    pub fn poc_index(&self) -> usize {
        poc_index(&self.bins)
    }

    /// Value-area bounds for an arbitrary target share; None without bins
    pub fn value_area_for(&self, share: f64) -> Option<(f64, f64)> {
        if self.bins.is_empty() {
            return None;
        }
        let (lo, hi, _) = value_area(&self.bins, self.poc_index(), share);
        Some((self.bins[lo].price_low, self.bins[hi].price_high))
    }

    pub fn contains_value_area(&self, price: f64) -> bool {
        price >= self.value_area_low && price <= self.value_area_high
    }
}

/// Build the volume profile of a candle series around `price`
///
/// Returns None when there is nothing to profile: no candles, a zero price
/// range, no volume, or zero bins.
pub fn calculate_volume_profile(
    candles: &[Candle],
    price: f64,
    config: &VolumeProfileConfig,
) -> Option<VolumeProfile> {
    let bins = build_bins(candles, config.bins)?;

    let total_volume: f64 = bins.iter().map(|b| b.volume).sum();
    if total_volume <= 0.0 || !total_volume.is_finite() {
        return None;
    }

    let poc = poc_index(&bins);
    let (lo, hi, value_area_volume) = value_area(&bins, poc, config.value_area_share);

    let mean = total_volume / bins.len() as f64;
    let high_volume_nodes: Vec<f64> = bins
        .iter()
        .filter(|b| b.volume >= mean * config.hvn_multiplier)
        .map(VolumeBin::center)
        .collect();
    let low_volume_nodes: Vec<f64> = bins
        .iter()
        .filter(|b| b.volume <= mean * config.lvn_multiplier)
        .map(VolumeBin::center)
        .collect();

    let profile = VolumeProfile {
        point_of_control: bins[poc].center(),
        value_area_low: bins[lo].price_low,
        value_area_high: bins[hi].price_high,
        value_area_volume,
        total_volume,
        high_volume_node: nearest_within(&high_volume_nodes, price, config.node_search_pct),
        low_volume_node: nearest_within(&low_volume_nodes, price, config.node_search_pct),
        high_volume_nodes,
        low_volume_nodes,
        bins,
    };

    tracing::debug!(
        "Volume profile: POC={:.4} VA=[{:.4}, {:.4}] ({:.1}% of volume)",
        profile.point_of_control,
        profile.value_area_low,
        profile.value_area_high,
        profile.value_area_volume / profile.total_volume * 100.0
    );

    Some(profile)
}

fn build_bins(candles: &[Candle], count: usize) -> Option<Vec<VolumeBin>> {
    if candles.is_empty() || count == 0 {
        return None;
    }

    let min = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let max = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() || max <= min {
        return None;
    }

    let width = (max - min) / count as f64;
    let mut bins: Vec<VolumeBin> = (0..count)
        .map(|i| VolumeBin {
            price_low: min + width * i as f64,
            price_high: if i + 1 == count { max } else { min + width * (i + 1) as f64 },
            volume: 0.0,
        })
        .collect();

    let index_of = |price: f64| (((price - min) / width).floor().max(0.0) as usize).min(count - 1);

    for candle in candles {
        if candle.volume <= 0.0 || !candle.volume.is_finite() {
            continue;
        }

        let range = candle.high - candle.low;
        if range <= 0.0 || !range.is_finite() {
            bins[index_of(candle.close)].volume += candle.volume;
            continue;
        }

        for bin in &mut bins[index_of(candle.low)..=index_of(candle.high)] {
            let overlap = candle.high.min(bin.price_high) - candle.low.max(bin.price_low);
            if overlap > 0.0 {
                bin.volume += candle.volume * overlap / range;
            }
        }
    }

    Some(bins)
}

fn poc_index(bins: &[VolumeBin]) -> usize {
    bins.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, max), (i, b)| {
            if b.volume > max {
                (i, b.volume)
            } else {
                (best, max)
            }
        })
        .0
}

/// Grow the value area from `poc`; returns (low index, high index, volume)
fn value_area(bins: &[VolumeBin], poc: usize, share: f64) -> (usize, usize, f64) {
    let total: f64 = bins.iter().map(|b| b.volume).sum();
    let target = total * share.clamp(0.0, 1.0);

    let (mut lo, mut hi) = (poc, poc);
    let mut enclosed = bins[poc].volume;

    while enclosed < target {
        let up = bins.get(hi + 1).map(|b| b.volume);
        let down = lo.checked_sub(1).map(|i| bins[i].volume);

        match (down, up) {
            (None, None) => break,
            (Some(d), Some(u)) if u > d => {
                hi += 1;
                enclosed += u;
            }
            (Some(d), _) => {
                lo -= 1;
                enclosed += d;
            }
            (None, Some(u)) => {
                hi += 1;
                enclosed += u;
            }
        }
    }

    (lo, hi, enclosed)
}

fn nearest_within(nodes: &[f64], price: f64, pct: f64) -> Option<f64> {
    if price <= 0.0 || !price.is_finite() {
        return None;
    }
    nodes
        .iter()
        .copied()
        .filter(|node| (node - price).abs() <= price * pct)
        .min_by(|a, b| (a - price).abs().total_cmp(&(b - price).abs()))
}
