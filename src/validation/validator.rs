use crate::models::{
    Direction, DraftRecommendation, EngineAudit, EntryZone, KeyLevels, ValidatedRecommendation,
    ValidationState,
};

use super::direction::{direction_from_prices, direction_from_text};
use super::key_levels::{anchor_key_levels, pivot_deviation};
use super::narrative::{format_price, sanitize_narrative};
use super::{ValidationContext, ValidatorConfig};

/// Action written over a directional draft that ends neutral
const NEUTRAL_ACTION: &str = "wait";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Long,
    Short,
}

impl Side {
    fn from_direction(direction: Direction) -> Option<Self> {
        match direction {
            Direction::Bullish => Some(Side::Long),
            Direction::Bearish => Some(Side::Short),
            Direction::Neutral => None,
        }
    }

    fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    fn state(self) -> ValidationState {
        match self {
            Side::Long => ValidationState::AcceptedLong,
            Side::Short => ValidationState::AcceptedShort,
        }
    }
}

/// Mutable copy of the draft's tradeable fields
#[derive(Debug, Clone)]
struct TradePlan {
    entry: EntryZone,
    stop: f64,
    targets: Vec<f64>,
    reasoning: Vec<String>,
    warnings: Vec<String>,
}

impl TradePlan {
    fn from_draft(draft: &DraftRecommendation) -> Self {
        Self {
            entry: fill_entry(draft.entry_zone),
            stop: draft.stop_loss,
            targets: draft.take_profit.clone(),
            reasoning: draft.reasoning.clone(),
            warnings: draft.risk_warning.clone(),
        }
    }
}

/// Fill a missing bound from the other one and put the bounds in order
fn fill_entry(zone: EntryZone) -> EntryZone {
    let low = if zone.low > 0.0 { zone.low } else { zone.high.max(0.0) };
    let high = if zone.high > 0.0 { zone.high } else { low };
    EntryZone {
        low: low.min(high),
        high: low.max(high),
    }
}

/// |t1 - mid| / |mid - stop| for the first target
pub(crate) fn risk_reward(entry: &EntryZone, stop: f64, targets: &[f64]) -> Option<f64> {
    let first = *targets.first()?;
    if stop <= 0.0 {
        return None;
    }
    let mid = entry.mid();
    let risk = (mid - stop).abs();
    let ratio = (first - mid).abs() / risk;
    (risk > 0.0 && ratio.is_finite()).then_some(ratio)
}

fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
}

fn push_unique(lines: &mut Vec<String>, line: String) {
    if !lines.contains(&line) {
        lines.push(line);
    }
}

fn prepend_unique(lines: &mut Vec<String>, line: String) {
    if !lines.contains(&line) {
        lines.insert(0, line);
    }
}

/// Validates and corrects draft recommendations against engine facts
///
/// Pure: the same draft and context always produce the same record, and
/// feeding a validated record back in (through `DraftRecommendation::from`)
/// reproduces it unchanged.
#[derive(Debug, Clone, Default)]
pub struct PredictionValidator {
    config: ValidatorConfig,
}

impl PredictionValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn validate(
        &self,
        draft: &DraftRecommendation,
        ctx: &ValidationContext,
    ) -> ValidatedRecommendation {
        let mut plan = TradePlan::from_draft(draft);
        let price = ctx.live_price();
        if plan.entry.low <= 0.0 && price > 0.0 {
            plan.entry = EntryZone {
                low: price,
                high: price,
            };
        }

        let state = self.resolve(&mut plan, draft, ctx, price);
        let confidence = self.calibrate_confidence(draft.confidence, ctx.conflicts.len(), &mut plan.warnings);

        let key_levels = if price > 0.0 {
            let anchored = anchor_key_levels(&draft.key_levels, &ctx.engine_levels, price, &self.config);
            self.check_pivot(&draft.key_levels, &anchored, ctx, price, &mut plan.warnings);
            anchored
        } else {
            draft.key_levels
        };

        let reasoning = plan
            .reasoning
            .iter()
            .map(|line| sanitize_narrative(line, price))
            .collect();
        let risk_warning = plan
            .warnings
            .iter()
            .map(|line| sanitize_narrative(line, price))
            .collect();
        let summary = sanitize_narrative(&draft.summary, price);

        let downgraded = state == ValidationState::DowngradedNeutral
            && direction_from_text(&draft.prediction) != Some(Direction::Neutral);
        let suggested_action = if downgraded {
            NEUTRAL_ACTION.to_string()
        } else {
            draft.suggested_action.clone()
        };

        ValidatedRecommendation {
            symbol: draft.symbol.clone(),
            analysis_time: draft.analysis_time.clone(),
            timeframe: draft.timeframe.clone(),
            prediction: state.direction(),
            state,
            advisory_only: state == ValidationState::DowngradedNeutral,
            confidence,
            reasoning,
            key_levels,
            suggested_action,
            entry_zone: plan.entry,
            stop_loss: plan.stop,
            risk_reward: risk_reward(&plan.entry, plan.stop, &plan.targets),
            take_profit: plan.targets,
            risk_level: draft.risk_level,
            risk_warning,
            summary,
            audit: EngineAudit {
                trend: ctx.trend,
                signal_conflicts: ctx.conflicts.clone(),
                point_of_control: ctx.point_of_control,
                value_area_low: ctx.value_area_low,
                value_area_high: ctx.value_area_high,
                risk_score: ctx.risk_score,
            },
        }
    }

    /// Direction resolution followed by the price corrections; any failed
    /// check ends in the neutral state with the plan as it stood
    fn resolve(
        &self,
        plan: &mut TradePlan,
        draft: &DraftRecommendation,
        ctx: &ValidationContext,
        price: f64,
    ) -> ValidationState {
        let by_text = direction_from_text(&draft.prediction);
        if by_text == Some(Direction::Neutral) {
            return ValidationState::DowngradedNeutral;
        }

        let by_price = direction_from_prices(&plan.entry, &plan.targets);
        let direction = match (by_text, by_price) {
            (Some(text), Some(levels)) if text != levels => {
                tracing::warn!(
                    "⚠️ {} direction conflict: text says {} but targets imply {}",
                    draft.symbol,
                    text.as_str(),
                    levels.as_str()
                );
                prepend_unique(
                    &mut plan.reasoning,
                    format!(
                        "⚠️ Direction conflict: the call reads {} but the first target implies {}; downgraded to neutral",
                        text.as_str(),
                        levels.as_str()
                    ),
                );
                prepend_unique(
                    &mut plan.warnings,
                    "Direction conflict between narrative and targets; wait for confirmation".to_string(),
                );
                return ValidationState::DowngradedNeutral;
            }
            (Some(direction), _) | (None, Some(direction)) => direction,
            (None, None) => {
                tracing::warn!("{} draft has no resolvable direction", draft.symbol);
                push_unique(
                    &mut plan.warnings,
                    "Direction could not be determined; treated as neutral".to_string(),
                );
                return ValidationState::DowngradedNeutral;
            }
        };
        let Some(side) = Side::from_direction(direction) else {
            return ValidationState::DowngradedNeutral;
        };

        if price <= 0.0 {
            tracing::warn!("{} has no live price, levels left unchecked", draft.symbol);
            push_unique(
                &mut plan.warnings,
                "No live price available; levels could not be validated".to_string(),
            );
            return ValidationState::DowngradedNeutral;
        }

        let atr = ctx.usable_atr();
        self.clamp_entry_to_price(plan, side, price);
        self.place_stop(plan, side, atr);
        self.sanitize_targets(plan, side);
        if !self.passes_risk_reward(plan) {
            return ValidationState::DowngradedNeutral;
        }

        if let Some(atr) = atr {
            let clamped = self.clamp_target_distance(plan, side, atr);
            let narrowed = self.narrow_entry(plan, atr);
            if (clamped || narrowed) && !self.passes_risk_reward(plan) {
                return ValidationState::DowngradedNeutral;
            }
        }

        self.check_timeliness(plan, side, price);
        side.state()
    }

    /// Long entries may not sit above price (short: below) beyond the tolerance
    fn clamp_entry_to_price(&self, plan: &mut TradePlan, side: Side, price: f64) {
        let tolerance = self.config.anti_chase_tolerance;
        let entry = &mut plan.entry;
        match side {
            Side::Long if entry.high > price * (1.0 + tolerance) => {
                tracing::warn!(
                    "Anti-chase: long entry high {} above price {}, clamped",
                    entry.high,
                    price
                );
                entry.high = price;
                if entry.low > entry.high {
                    entry.low = entry.high * (1.0 - self.config.chase_zone_width);
                }
            }
            Side::Short if entry.low < price * (1.0 - tolerance) => {
                tracing::warn!(
                    "Anti-chase: short entry low {} below price {}, clamped",
                    entry.low,
                    price
                );
                entry.low = price;
                if entry.high < entry.low {
                    entry.high = entry.low * (1.0 + self.config.chase_zone_width);
                }
            }
            _ => {}
        }
    }

    fn place_stop(&self, plan: &mut TradePlan, side: Side, atr: Option<f64>) {
        let valid = match side {
            Side::Long => plan.stop > 0.0 && plan.stop < plan.entry.low,
            Side::Short => plan.stop > plan.entry.high,
        };
        if valid {
            return;
        }

        let edge = match side {
            Side::Long => plan.entry.low,
            Side::Short => plan.entry.high,
        };
        let fallback = edge * (1.0 - side.sign() * self.config.stop_fallback_pct);
        let stop = atr
            .map(|atr| edge - side.sign() * self.config.stop_atr_multiplier * atr)
            .filter(|stop| *stop > 0.0 && (*stop - edge) * side.sign() < 0.0)
            .unwrap_or(fallback);

        tracing::warn!("Stop {} on the wrong side of entry, moved to {}", plan.stop, stop);
        plan.stop = stop;
    }

    /// Drop targets on the wrong side of entry and order the rest; an empty
    /// list is rebuilt as a percentage ladder from the entry edge
    fn sanitize_targets(&self, plan: &mut TradePlan, side: Side) {
        let entry = plan.entry;
        let before = plan.targets.len();
        plan.targets.retain(|t| match side {
            Side::Long => *t > entry.high,
            Side::Short => *t > 0.0 && *t < entry.low,
        });
        match side {
            Side::Long => plan.targets.sort_by(|a, b| a.total_cmp(b)),
            Side::Short => plan.targets.sort_by(|a, b| b.total_cmp(a)),
        }

        if plan.targets.len() < before {
            tracing::warn!("Discarded {} wrong-side targets", before - plan.targets.len());
        }

        if plan.targets.is_empty() {
            let base = match side {
                Side::Long => entry.high,
                Side::Short => entry.low,
            };
            plan.targets = self
                .config
                .target_ladder
                .iter()
                .map(|pct| base * (1.0 + side.sign() * pct))
                .collect();
            tracing::warn!("No usable targets, rebuilt ladder from {}", base);
        }
    }

    fn passes_risk_reward(&self, plan: &mut TradePlan) -> bool {
        let ratio = risk_reward(&plan.entry, plan.stop, &plan.targets).unwrap_or(0.0);
        if ratio >= self.config.min_risk_reward {
            return true;
        }

        tracing::warn!(
            "Risk/reward {:.2} below minimum {:.2}, downgraded to neutral",
            ratio,
            self.config.min_risk_reward
        );
        prepend_unique(
            &mut plan.reasoning,
            format!(
                "⚠️ Risk/reward {:.2} is below the {:.2} minimum; no trade until a better entry",
                ratio, self.config.min_risk_reward
            ),
        );
        false
    }

    /// Pull targets further than the ATR limit back to a fixed ATR ladder
    fn clamp_target_distance(&self, plan: &mut TradePlan, side: Side, atr: f64) -> bool {
        let mid = plan.entry.mid();
        let limit = self.config.max_target_atr * atr;
        let mut changed = false;

        for (rank, target) in plan.targets.iter_mut().enumerate() {
            if (*target - mid).abs() <= limit {
                continue;
            }
            let clamped = mid + side.sign() * self.config.target_clamp_atr * atr * (rank + 1) as f64;
            if clamped > 0.0 && !nearly_equal(clamped, *target) {
                tracing::warn!("Target {} is {:.1} ATR from entry, clamped to {}", target, (*target - mid).abs() / atr, clamped);
                *target = clamped;
                changed = true;
            }
        }

        if changed {
            match side {
                Side::Long => plan.targets.sort_by(|a, b| a.total_cmp(b)),
                Side::Short => plan.targets.sort_by(|a, b| b.total_cmp(a)),
            }
        }
        changed
    }

    fn narrow_entry(&self, plan: &mut TradePlan, atr: f64) -> bool {
        if plan.entry.width() <= self.config.max_entry_width_atr * atr {
            return false;
        }

        let mid = plan.entry.mid();
        let half = self.config.entry_width_atr * atr / 2.0;
        tracing::warn!("Entry zone {:.4} wide, narrowed around {}", plan.entry.width(), mid);
        plan.entry = EntryZone {
            low: mid - half,
            high: mid + half,
        };
        true
    }

    /// Notice when price has already run through the first target
    fn check_timeliness(&self, plan: &mut TradePlan, side: Side, price: f64) {
        let Some(&first) = plan.targets.first() else {
            return;
        };
        let (reached, action) = match side {
            Side::Long => (price >= first, "pullback"),
            Side::Short => (price <= first, "bounce"),
        };
        if reached {
            prepend_unique(
                &mut plan.reasoning,
                format!(
                    "⚠️ Price {} has already reached TP1 {}; wait for a {} before entering",
                    format_price(price),
                    format_price(first),
                    action
                ),
            );
        }
    }

    /// Cross-check support against the classic pivot S1
    ///
    /// The draft's own support is checked before anchoring can replace it;
    /// the anchored one is checked too. The warning text depends on S1 only.
    fn check_pivot(
        &self,
        given: &KeyLevels,
        anchored: &KeyLevels,
        ctx: &ValidationContext,
        price: f64,
        warnings: &mut Vec<String>,
    ) {
        let Some(s1) = ctx.pivot_s1 else {
            return;
        };
        let deviation = pivot_deviation(given, ctx.pivot_s1, price, &self.config)
            .or_else(|| pivot_deviation(anchored, ctx.pivot_s1, price, &self.config));
        let Some(deviation) = deviation else {
            return;
        };

        tracing::warn!(
            "Key support off pivot S1 {} by {:.1}% (given {}, anchored {})",
            s1,
            deviation * 100.0,
            given.strong_support,
            anchored.strong_support
        );
        push_unique(
            warnings,
            format!(
                "Key support disagrees with pivot S1 {} by more than {:.0}% of price",
                format_price(s1),
                self.config.pivot_deviation_warn * 100.0
            ),
        );
    }

    fn calibrate_confidence(&self, confidence: u8, conflicts: usize, warnings: &mut Vec<String>) -> u8 {
        match self.config.confidence_cap(conflicts) {
            Some(cap) if confidence > cap => {
                tracing::warn!("Confidence {} capped at {} ({} signal conflicts)", confidence, cap, conflicts);
                push_unique(
                    warnings,
                    format!("Confidence capped at {}% because of {} conflicting signals", cap, conflicts),
                );
                cap
            }
            _ => confidence,
        }
    }
}
