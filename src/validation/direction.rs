// Direction resolution from the draft's wording and its price levels

use crate::models::{Direction, EntryZone};

const LONG_KEYWORDS: &[&str] = &["bull", "long", "buy", "涨", "多"];
const SHORT_KEYWORDS: &[&str] = &["bear", "short", "sell", "跌", "空"];
const NEUTRAL_KEYWORDS: &[&str] = &[
    "neutral", "sideways", "range", "wait", "hold", "震荡", "观望", "中性", "盘整",
];

/// Phrases containing a direction keyword without expressing a direction
const NOISE: &[&str] = &[
    "short-term", "short term", "long-term", "long term", "多空", "空间",
];

/// Read a direction from free text such as "Bullish", "看涨" or "not bearish"
///
/// Negated keywords ("not bullish", "不看涨") are ignored. Text naming both
/// sides, or neither, is unresolved (`None`); explicit neutral wording with
/// no side named resolves to `Neutral`.
pub fn direction_from_text(text: &str) -> Option<Direction> {
    let mut text = text.trim().to_lowercase();
    for noise in NOISE {
        text = text.replace(noise, " ");
    }

    let long = mentions(&text, LONG_KEYWORDS);
    let short = mentions(&text, SHORT_KEYWORDS);

    match (long, short) {
        (true, false) => Some(Direction::Bullish),
        (false, true) => Some(Direction::Bearish),
        (true, true) => None,
        (false, false) if NEUTRAL_KEYWORDS.iter().any(|k| text.contains(k)) => {
            Some(Direction::Neutral)
        }
        (false, false) => None,
    }
}

/// Read a direction from the first target relative to the entry midpoint
pub fn direction_from_prices(entry: &EntryZone, targets: &[f64]) -> Option<Direction> {
    let first = *targets.first()?;
    let mid = entry.mid();
    if first > mid {
        Some(Direction::Bullish)
    } else if first < mid {
        Some(Direction::Bearish)
    } else {
        None
    }
}

fn mentions(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        text.match_indices(keyword)
            .any(|(at, _)| !is_negated(&text[..at]))
    })
}

fn is_negated(prefix: &str) -> bool {
    let prefix = prefix.trim_end();
    let prefix = prefix.strip_suffix('看').unwrap_or(prefix);
    if ["不", "非", "别"].iter().any(|neg| prefix.ends_with(neg)) {
        return true;
    }

    let last_word = prefix
        .rsplit(|c: char| !c.is_ascii_alphabetic() && c != '\'')
        .next()
        .unwrap_or("");
    matches!(last_word, "not" | "no" | "never") || last_word.ends_with("n't")
}
