use serde::{Deserialize, Deserializer, Serialize};

use crate::models::lenient;
use crate::models::Trend;

/// Trade direction carried by a recommendation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        }
    }
}

/// Terminal state of the validation pipeline
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    AcceptedLong,
    AcceptedShort,
    #[default]
    DowngradedNeutral,
}

impl ValidationState {
    pub fn direction(&self) -> Direction {
        match self {
            ValidationState::AcceptedLong => Direction::Bullish,
            ValidationState::AcceptedShort => Direction::Bearish,
            ValidationState::DowngradedNeutral => Direction::Neutral,
        }
    }
}

/// Closed risk-level scale
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Extreme,
}

/// Risk level as it arrives on the wire: a label, a number, or nothing
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawRiskLevel {
    Score(f64),
    Label(String),
    Missing(()),
}

impl RiskLevel {
    /// Map any wire representation onto the closed scale
    ///
    /// Integers 1..=4 are read as ordinal tiers, other numbers as a 0-100
    /// score. Labels are matched in English and Chinese; unknown input is
    /// `Medium`.
    pub fn normalize(raw: &RawRiskLevel) -> Self {
        match raw {
            RawRiskLevel::Score(score) => {
                if score.fract() == 0.0 && (1.0..=4.0).contains(score) {
                    match *score as u8 {
                        1 => RiskLevel::Low,
                        2 => RiskLevel::Medium,
                        3 => RiskLevel::High,
                        _ => RiskLevel::Extreme,
                    }
                } else {
                    Self::from_score(*score)
                }
            }
            RawRiskLevel::Label(label) => Self::from_label(label),
            RawRiskLevel::Missing(()) => RiskLevel::default(),
        }
    }

    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            return RiskLevel::default();
        }
        match score {
            s if s >= 75.0 => RiskLevel::Extreme,
            s if s >= 50.0 => RiskLevel::High,
            s if s >= 25.0 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if ["extreme", "极高", "very high", "critical"]
            .iter()
            .any(|k| label.contains(k))
        {
            RiskLevel::Extreme
        } else if label.contains("high") || label.contains('高') {
            RiskLevel::High
        } else if label.contains("low") || label.contains('低') {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        }
    }
}

fn risk_level<'de, D>(deserializer: D) -> Result<RiskLevel, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RiskLevel::normalize(&RawRiskLevel::deserialize(deserializer)?))
}

/// Support / resistance ladder around the live price; zero means "not given"
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyLevels {
    #[serde(deserialize_with = "lenient::number")]
    pub strong_resistance: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub weak_resistance: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub current_price: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub weak_support: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub strong_support: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EntryZone {
    #[serde(deserialize_with = "lenient::number")]
    pub low: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub high: f64,
}

impl EntryZone {
    pub fn mid(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Raw recommendation produced by the LLM collaborator
///
/// Untrusted: any field may be missing, mistyped or inconsistent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DraftRecommendation {
    #[serde(deserialize_with = "lenient::text")]
    pub symbol: String,
    #[serde(deserialize_with = "lenient::text")]
    pub analysis_time: String,
    #[serde(deserialize_with = "lenient::text")]
    pub timeframe: String,
    /// Free-form direction text ("bullish", "看涨", "Strong Bearish", ...)
    #[serde(deserialize_with = "lenient::text")]
    pub prediction: String,
    #[serde(deserialize_with = "lenient::confidence")]
    pub confidence: u8,
    #[serde(deserialize_with = "lenient::lines")]
    pub reasoning: Vec<String>,
    pub key_levels: KeyLevels,
    #[serde(deserialize_with = "lenient::text")]
    pub suggested_action: String,
    pub entry_zone: EntryZone,
    #[serde(deserialize_with = "lenient::number")]
    pub stop_loss: f64,
    #[serde(deserialize_with = "lenient::numbers")]
    pub take_profit: Vec<f64>,
    #[serde(deserialize_with = "risk_level")]
    pub risk_level: RiskLevel,
    #[serde(deserialize_with = "lenient::lines")]
    pub risk_warning: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub summary: String,
}

impl DraftRecommendation {
    /// Decode a draft, stripping a surrounding markdown code fence if present
    pub fn from_json(payload: &str) -> crate::Result<Self> {
        let text = payload.trim();
        let text = text
            .strip_prefix("```json")
            .or_else(|| text.strip_prefix("```"))
            .unwrap_or(text);
        let text = text.strip_suffix("```").unwrap_or(text).trim();

        Ok(serde_json::from_str(text)?)
    }
}

/// Engine outputs attached to a validated recommendation for display and audit
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineAudit {
    pub trend: Trend,
    pub signal_conflicts: Vec<String>,
    pub point_of_control: Option<f64>,
    pub value_area_low: Option<f64>,
    pub value_area_high: Option<f64>,
    pub risk_score: f64,
}

/// Recommendation after the validation pipeline
///
/// Same record shape as the draft, guaranteed to satisfy the trading-logic
/// invariants for its `state`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidatedRecommendation {
    pub symbol: String,
    pub analysis_time: String,
    pub timeframe: String,
    pub prediction: Direction,
    pub state: ValidationState,
    /// Neutral outcomes keep their last computed levels for reference only
    pub advisory_only: bool,
    pub confidence: u8,
    pub reasoning: Vec<String>,
    pub key_levels: KeyLevels,
    pub suggested_action: String,
    pub entry_zone: EntryZone,
    pub stop_loss: f64,
    pub take_profit: Vec<f64>,
    pub risk_level: RiskLevel,
    pub risk_warning: Vec<String>,
    pub summary: String,
    pub risk_reward: Option<f64>,
    pub audit: EngineAudit,
}

impl From<&ValidatedRecommendation> for DraftRecommendation {
    fn from(validated: &ValidatedRecommendation) -> Self {
        Self {
            symbol: validated.symbol.clone(),
            analysis_time: validated.analysis_time.clone(),
            timeframe: validated.timeframe.clone(),
            prediction: validated.prediction.as_str().to_string(),
            confidence: validated.confidence,
            reasoning: validated.reasoning.clone(),
            key_levels: validated.key_levels,
            suggested_action: validated.suggested_action.clone(),
            entry_zone: validated.entry_zone,
            stop_loss: validated.stop_loss,
            take_profit: validated.take_profit.clone(),
            risk_level: validated.risk_level,
            risk_warning: validated.risk_warning.clone(),
            summary: validated.summary.clone(),
        }
    }
}
