// Forgiving deserializers for LLM- and exchange-produced payloads
// Numeric strings, nulls and single-string lists are accepted; anything
// unusable collapses to zero / empty instead of failing the whole payload

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
    Bool(bool),
    Null(()),
}

impl RawNumber {
    fn to_f64(&self) -> f64 {
        let value = match self {
            RawNumber::Number(n) => *n,
            RawNumber::Text(s) => s.trim().replace(',', "").parse::<f64>().unwrap_or(0.0),
            RawNumber::Bool(_) | RawNumber::Null(()) => 0.0,
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList<T> {
    Many(Vec<T>),
    One(T),
    Null(()),
}

/// Parse a free-form numeric string such as `"1,234.5"`
pub fn parse_number(text: &str) -> f64 {
    RawNumber::Text(text.to_string()).to_f64()
}

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawNumber::deserialize(deserializer)?.to_f64())
}

pub fn numbers<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match RawList::<RawNumber>::deserialize(deserializer)? {
        RawList::Many(values) => values.iter().map(RawNumber::to_f64).collect(),
        RawList::One(value) => vec![value.to_f64()],
        RawList::Null(()) => Vec::new(),
    };
    // Zero means "missing" for a price target
    Ok(values.into_iter().filter(|v| *v != 0.0).collect())
}

pub fn lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawList::<String>::deserialize(deserializer)? {
        RawList::Many(lines) => lines,
        RawList::One(line) if line.trim().is_empty() => Vec::new(),
        RawList::One(line) => vec![line],
        RawList::Null(()) => Vec::new(),
    })
}

/// Confidence as an integer percentage, rounded and clamped to 0..=100
pub fn confidence<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawNumber::deserialize(deserializer)?.to_f64();
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
