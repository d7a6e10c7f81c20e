use marketlens::models::{EntryZone, KeyLevels};
use marketlens::validation::sanitize_narrative;
use marketlens::{
    Direction, DraftRecommendation, PredictionValidator, ValidatedRecommendation, ValidationContext,
    ValidationState,
};

fn create_draft(prediction: &str, entry: (f64, f64), stop: f64, targets: &[f64]) -> DraftRecommendation {
    DraftRecommendation {
        symbol: "BTCUSDT".to_string(),
        timeframe: "4h".to_string(),
        prediction: prediction.to_string(),
        confidence: 75,
        reasoning: vec!["Trend structure intact".to_string()],
        key_levels: KeyLevels {
            strong_resistance: 118.0,
            weak_resistance: 108.0,
            current_price: 101.0,
            weak_support: 98.0,
            strong_support: 96.0,
        },
        suggested_action: "enter".to_string(),
        entry_zone: EntryZone {
            low: entry.0,
            high: entry.1,
        },
        stop_loss: stop,
        take_profit: targets.to_vec(),
        risk_warning: vec!["Watch funding".to_string()],
        summary: "Draft summary".to_string(),
        ..Default::default()
    }
}

fn assert_idempotent(validator: &PredictionValidator, once: &ValidatedRecommendation, ctx: &ValidationContext) {
    let twice = validator.validate(&DraftRecommendation::from(once), ctx);
    assert_eq!(&twice, once, "second validation pass changed the record");
}

fn assert_long_invariants(result: &ValidatedRecommendation, price: f64, min_rrr: f64) {
    let entry = result.entry_zone;
    assert!(result.stop_loss < entry.low, "stop {} >= entry low {}", result.stop_loss, entry.low);
    assert!(entry.low <= entry.high);
    assert!(entry.high < result.take_profit[0]);
    assert!(result.take_profit.windows(2).all(|w| w[0] <= w[1]));
    assert!(entry.high <= price * 1.0005);
    assert!(result.risk_reward.unwrap() >= min_rrr);
}

fn assert_short_invariants(result: &ValidatedRecommendation, price: f64, min_rrr: f64) {
    let entry = result.entry_zone;
    assert!(result.stop_loss > entry.high);
    assert!(entry.high >= entry.low);
    assert!(entry.low > result.take_profit[0]);
    assert!(result.take_profit.windows(2).all(|w| w[0] >= w[1]));
    assert!(entry.low >= price * 0.9995);
    assert!(result.risk_reward.unwrap() >= min_rrr);
}

#[test]
fn test_scenario_a_accepted_long() {
    let validator = PredictionValidator::default();
    let ctx = ValidationContext::new(101.0, 2.0);
    let result = validator.validate(&create_draft("bullish", (100.0, 102.0), 95.0, &[110.0, 115.0]), &ctx);

    assert_eq!(result.state, ValidationState::AcceptedLong);
    assert_eq!(result.prediction, Direction::Bullish);
    assert!(!result.advisory_only);
    assert_long_invariants(&result, 101.0, 1.2);
    // Entry clamped to price before the ratio is taken: (110 - 100.5) / (100.5 - 95)
    assert!(result.risk_reward.unwrap() >= 1.5);
    assert_idempotent(&validator, &result, &ctx);
}

#[test]
fn test_scenario_b_poor_risk_reward() {
    let validator = PredictionValidator::default();
    let ctx = ValidationContext::new(101.0, 2.0);
    let result = validator.validate(&create_draft("bullish", (100.0, 102.0), 95.0, &[103.5]), &ctx);

    assert_eq!(result.state, ValidationState::DowngradedNeutral);
    assert_eq!(result.prediction, Direction::Neutral);
    assert!(result.advisory_only);
    assert!(result.reasoning[0].contains("Risk/reward"));
    assert!(result.risk_reward.unwrap() < 1.2);
    // Levels computed before the gate are kept for reference
    assert_eq!(result.take_profit, vec![103.5]);
    assert_eq!(result.stop_loss, 95.0);
    assert_idempotent(&validator, &result, &ctx);
}

#[test]
fn test_scenario_c_direction_conflict() {
    let validator = PredictionValidator::default();
    let ctx = ValidationContext::new(101.0, 2.0);
    let result = validator.validate(&create_draft("bearish", (100.0, 102.0), 95.0, &[120.0]), &ctx);

    assert_eq!(result.state, ValidationState::DowngradedNeutral);
    assert!(result.reasoning[0].contains("Direction conflict"));
    assert!(result.risk_warning[0].contains("Direction conflict"));
    assert_eq!(result.suggested_action, "wait");
    assert_idempotent(&validator, &result, &ctx);
}

#[test]
fn test_scenario_d_support_above_price() {
    let validator = PredictionValidator::default();
    let ctx = ValidationContext::new(101.0, 2.0);
    let mut draft = create_draft("bullish", (100.0, 101.0), 95.0, &[110.0]);
    draft.key_levels.strong_support = 120.0;
    draft.key_levels.current_price = 130.0;

    let result = validator.validate(&draft, &ctx);
    assert!((result.key_levels.strong_support - 95.95).abs() < 1e-9);
    assert_eq!(result.key_levels.current_price, 101.0);
    assert!(result.key_levels.strong_resistance > 101.0);
}

#[test]
fn test_scenario_e_confidence_cap() {
    let validator = PredictionValidator::default();
    let conflicts = vec![
        "RSI overbought while MACD bullish".to_string(),
        "Price above upper band with bullish trend".to_string(),
        "MA golden cross but EMA death cross".to_string(),
    ];
    let ctx = ValidationContext::new(101.0, 2.0).with_conflicts(conflicts.clone());
    let mut draft = create_draft("bullish", (100.0, 101.0), 95.0, &[110.0]);
    draft.confidence = 90;

    let result = validator.validate(&draft, &ctx);
    assert!(result.confidence <= 60);
    assert!(result.risk_warning.iter().any(|w| w.contains("Confidence capped")));
    assert_eq!(result.audit.signal_conflicts, conflicts);
    assert_idempotent(&validator, &result, &ctx);
}

#[test]
fn test_accepted_short_invariants() {
    let validator = PredictionValidator::default();
    let ctx = ValidationContext::new(101.0, 1.5);
    let result = validator.validate(&create_draft("bearish", (100.0, 102.0), 106.0, &[92.0, 95.0]), &ctx);

    assert_eq!(result.state, ValidationState::AcceptedShort);
    assert_short_invariants(&result, 101.0, 1.2);
    assert_idempotent(&validator, &result, &ctx);
}

#[test]
fn test_stale_narrative_is_rewritten() {
    let validator = PredictionValidator::default();
    let ctx = ValidationContext::new(101.0, 2.0);
    let mut draft = create_draft("bearish", (101.0, 102.0), 105.0, &[92.0]);
    draft.reasoning = vec!["价格跌破支撑105，下行空间打开".to_string()];
    draft.summary = "Sellers break below support at 104 next".to_string();

    let result = validator.validate(&draft, &ctx);
    assert!(result.reasoning.iter().any(|r| r.contains("已跌破前支撑105")));
    assert!(result.summary.contains("lost former support 104"));
    assert_eq!(sanitize_narrative(&result.summary, 101.0), result.summary);
    assert_idempotent(&validator, &result, &ctx);
}

#[test]
fn test_from_fenced_json_payload() {
    let payload = r#"```json
    {
        "symbol": "SOLUSDT",
        "prediction": "看涨",
        "confidence": "82",
        "key_levels": {"strong_support": "140", "current_price": null},
        "entry_zone": {"low": 149.0, "high": "151"},
        "stop_loss": "145",
        "take_profit": ["158", 165, null],
        "risk_level": "高",
        "risk_warning": "Funding is elevated"
    }
    ```"#;
    let draft = DraftRecommendation::from_json(payload).unwrap();
    let ctx = ValidationContext::new(150.0, 3.0);
    let validator = PredictionValidator::default();
    let result = validator.validate(&draft, &ctx);

    assert_eq!(result.state, ValidationState::AcceptedLong);
    assert_long_invariants(&result, 150.0, 1.2);
    assert_eq!(result.key_levels.current_price, 150.0);
    assert_idempotent(&validator, &result, &ctx);
}
