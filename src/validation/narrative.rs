// Narrative correction
// A draft written a few minutes before publication may say "breaks support
// 105" when price already trades at 101; such phrases are restated in the
// already-broken form. Rewritten text never matches again.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::lenient::parse_number;

/// Relative margin a quoted support must sit above price before it is stale
const STALE_SUPPORT_MARGIN: f64 = 0.01;

static BROKE_SUPPORT_ZH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(已经?)?(?:向下)?跌破(?:支撑位|支撑)?\s*(\d+(?:,\d{3})*(?:\.\d+)?)")
        .expect("valid support-break pattern")
});
static BROKE_RESISTANCE_ZH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(已经?)?(?:向上)?突破(?:阻力位|阻力)?\s*(\d+(?:,\d{3})*(?:\.\d+)?)")
        .expect("valid resistance-break pattern")
});
static STALE_SUPPORT_ZH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(前|跌破)?支撑(?:位)?[：:]?\s*(\d+(?:,\d{3})*(?:\.\d+)?)")
        .expect("valid support pattern")
});
static BROKE_SUPPORT_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:broke|breaks|break|breaking)\s+(?:below\s+)?(?:the\s+)?support(?:\s+level)?(?:\s+(?:at|of|near))?\s*\$?(\d+(?:,\d{3})*(?:\.\d+)?)",
    )
    .expect("valid support-break pattern")
});
static BROKE_RESISTANCE_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:broke|breaks|break|breaking)\s+(?:above\s+|through\s+)?(?:the\s+)?resistance(?:\s+level)?(?:\s+(?:at|of|near))?\s*\$?(\d+(?:,\d{3})*(?:\.\d+)?)",
    )
    .expect("valid resistance-break pattern")
});
static STALE_SUPPORT_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(former\s+)?support(?:\s+level)?(?:\s+(?:at|of|near))?\s*:?\s*\$?(\d+(?:,\d{3})*(?:\.\d+)?)",
    )
    .expect("valid support pattern")
});

/// Restate stale break/support phrases relative to `price`
pub fn sanitize_narrative(text: &str, price: f64) -> String {
    if price <= 0.0 || !price.is_finite() || text.is_empty() {
        return text.to_string();
    }

    let shown = format_price(price);

    // "跌破 X" with X above price: the break already happened
    let text = BROKE_SUPPORT_ZH.replace_all(text, |caps: &Captures| {
        let level = parse_number(&caps[2]);
        if caps.get(1).is_none() && level > price {
            format!("已跌破前支撑{}(当前价{}已在其下方)", &caps[2], shown)
        } else {
            caps[0].to_string()
        }
    });
    let text = BROKE_RESISTANCE_ZH.replace_all(&text, |caps: &Captures| {
        let level = parse_number(&caps[2]);
        if caps.get(1).is_none() && level > 0.0 && level < price {
            format!("已突破前阻力{}(当前价{}已在其上方)", &caps[2], shown)
        } else {
            caps[0].to_string()
        }
    });
    let text = STALE_SUPPORT_ZH.replace_all(&text, |caps: &Captures| {
        let level = parse_number(&caps[2]);
        if caps.get(1).is_none() && level > price * (1.0 + STALE_SUPPORT_MARGIN) {
            format!("前支撑位{}(已失守，当前价在其下方)", &caps[2])
        } else {
            caps[0].to_string()
        }
    });

    let text = BROKE_SUPPORT_EN.replace_all(&text, |caps: &Captures| {
        let level = parse_number(&caps[1]);
        if level > price {
            format!("lost former support {} (price {} already below it)", &caps[1], shown)
        } else {
            caps[0].to_string()
        }
    });
    let text = BROKE_RESISTANCE_EN.replace_all(&text, |caps: &Captures| {
        let level = parse_number(&caps[1]);
        if level > 0.0 && level < price {
            format!("cleared former resistance {} (price {} already above it)", &caps[1], shown)
        } else {
            caps[0].to_string()
        }
    });
    let text = STALE_SUPPORT_EN.replace_all(&text, |caps: &Captures| {
        let level = parse_number(&caps[2]);
        if caps.get(1).is_none() && level > price * (1.0 + STALE_SUPPORT_MARGIN) {
            format!("former support {} (lost, price below it)", &caps[2])
        } else {
            caps[0].to_string()
        }
    });

    text.into_owned()
}

pub(crate) fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("{:.2}", price)
    } else {
        format!("{:.6}", price)
    }
}
