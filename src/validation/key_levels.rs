// Anchors the draft's support / resistance ladder to the live price

use crate::models::KeyLevels;

use super::ValidatorConfig;

/// Fill missing levels and push every level onto the correct side of `price`
///
/// Missing (zero) levels take the engine's level first, then a fixed offset
/// from price. A support at or above price, or a resistance at or below it,
/// is replaced by the configured offset.
pub fn anchor_key_levels(
    levels: &KeyLevels,
    engine: &KeyLevels,
    price: f64,
    config: &ValidatorConfig,
) -> KeyLevels {
    let strong = config.strong_level_offset;
    let weak = config.weak_level_offset;

    let support = |given: f64, engine: f64, offset: f64| {
        let level = if given > 0.0 { given } else { engine };
        if level > 0.0 && level < price {
            level
        } else {
            price * (1.0 - offset)
        }
    };
    let resistance = |given: f64, engine: f64, offset: f64| {
        let level = if given > 0.0 { given } else { engine };
        if level > price {
            level
        } else {
            price * (1.0 + offset)
        }
    };

    KeyLevels {
        strong_resistance: resistance(levels.strong_resistance, engine.strong_resistance, strong),
        weak_resistance: resistance(levels.weak_resistance, engine.weak_resistance, weak),
        current_price: price,
        weak_support: support(levels.weak_support, engine.weak_support, weak),
        strong_support: support(levels.strong_support, engine.strong_support, strong),
    }
}

/// Gap between a support level and the classic pivot S1 as a share of
/// `price`, when it exceeds the configured tolerance
///
/// Uses the strong support, or the weak one when the strong is missing.
pub fn pivot_deviation(
    levels: &KeyLevels,
    pivot_s1: Option<f64>,
    price: f64,
    config: &ValidatorConfig,
) -> Option<f64> {
    let s1 = pivot_s1.filter(|s| *s > 0.0)?;
    let support = if levels.strong_support > 0.0 {
        levels.strong_support
    } else {
        levels.weak_support
    };
    if support <= 0.0 || price <= 0.0 || !price.is_finite() {
        return None;
    }

    let deviation = (support - s1).abs() / price;
    (deviation > config.pivot_deviation_warn).then_some(deviation)
}
