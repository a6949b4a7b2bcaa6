//! Alert rules: each kind pairs a trigger predicate with a stricter clear
//! predicate so a value hovering near one boundary cannot flap the alert.

use crate::models::IndicatorSnapshot;

#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Fires when RSI crosses from at-or-above `trigger` to below it;
    /// clears once RSI is back at or above `clear` (`clear` > `trigger`).
    RsiOversold { trigger: f64, clear: f64 },

    /// Mirror of oversold: fires crossing above `trigger`, clears at or
    /// below `clear` (`clear` < `trigger`).
    RsiOverbought { trigger: f64, clear: f64 },

    /// Fires when the close crosses from at-or-below the long SMA to above
    /// it; clears when the close falls back below the long SMA.
    CloseAboveSmaLong,

    /// Fires when latest volume exceeds `ratio` times its trailing average;
    /// clears once the ratio drops below `clear_ratio` (< `ratio`).
    VolumeSpike { ratio: f64, clear_ratio: f64 },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(id: impl Into<String>, kind: RuleKind) -> Self {
        Self { id: id.into(), kind }
    }

    /// Crossover kinds compare two consecutive snapshots and cannot run on
    /// the first cycle for a symbol.
    fn needs_prev(&self) -> bool {
        !matches!(self.kind, RuleKind::VolumeSpike { .. })
    }

    /// Whether the trigger condition newly holds at `curr`.
    ///
    /// Crossover kinds need `prev` and answer false without it; a kind whose
    /// snapshot field is missing on either side also answers false.
    fn fires(&self, prev: Option<&IndicatorSnapshot>, curr: &IndicatorSnapshot) -> bool {
        match &self.kind {
            RuleKind::RsiOversold { trigger, .. } => match (prev.and_then(|p| p.rsi), curr.rsi) {
                (Some(p), Some(c)) => p >= *trigger && c < *trigger,
                _ => false,
            },
            RuleKind::RsiOverbought { trigger, .. } => match (prev.and_then(|p| p.rsi), curr.rsi) {
                (Some(p), Some(c)) => p <= *trigger && c > *trigger,
                _ => false,
            },
            RuleKind::CloseAboveSmaLong => match (prev, curr.sma_long) {
                (Some(p), Some(sma)) => match p.sma_long {
                    Some(p_sma) => p.close <= p_sma && curr.close > sma,
                    None => false,
                },
                _ => false,
            },
            RuleKind::VolumeSpike { ratio, .. } => match curr.volume_ratio() {
                Some(r) => r > *ratio,
                None => false,
            },
        }
    }

    /// Whether the clear condition holds at `curr`. Distinct from "no longer
    /// firing": the clear bound sits past the trigger bound.
    fn clears(&self, curr: &IndicatorSnapshot) -> bool {
        match &self.kind {
            RuleKind::RsiOversold { clear, .. } => curr.rsi.is_some_and(|c| c >= *clear),
            RuleKind::RsiOverbought { clear, .. } => curr.rsi.is_some_and(|c| c <= *clear),
            RuleKind::CloseAboveSmaLong => curr.sma_long.is_some_and(|sma| curr.close < sma),
            RuleKind::VolumeSpike { clear_ratio, .. } => {
                curr.volume_ratio().is_some_and(|r| r < *clear_ratio)
            }
        }
    }

    fn message(&self, curr: &IndicatorSnapshot) -> String {
        match &self.kind {
            RuleKind::RsiOversold { trigger, .. } => format!(
                "🟢 {} oversold: RSI {:.2} below {:.0} (price ${:.4})",
                curr.symbol,
                curr.rsi.unwrap_or_default(),
                trigger,
                curr.close
            ),
            RuleKind::RsiOverbought { trigger, .. } => format!(
                "🔴 {} overbought: RSI {:.2} above {:.0} (price ${:.4})",
                curr.symbol,
                curr.rsi.unwrap_or_default(),
                trigger,
                curr.close
            ),
            RuleKind::CloseAboveSmaLong => format!(
                "📈 {} crossed above its long SMA (price ${:.4}, SMA ${:.4})",
                curr.symbol,
                curr.close,
                curr.sma_long.unwrap_or_default()
            ),
            RuleKind::VolumeSpike { ratio, .. } => format!(
                "📊 {} volume spike: {:.1}x trailing average (threshold {:.1}x)",
                curr.symbol,
                curr.volume_ratio().unwrap_or_default(),
                ratio
            ),
        }
    }
}

/// A rule that fired this cycle, with the message to deliver if the alert
/// state store decides it is a new activation.
#[derive(Debug, Clone)]
pub struct FiredRule {
    pub rule_id: String,
    pub message: String,
}

/// Outcome of evaluating every rule against one snapshot pair.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub fired: Vec<FiredRule>,
    pub cleared: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate all rules. Every firing rule is reported independently; a
    /// rule never appears in both lists because the clear bound is strictly
    /// past the trigger bound.
    pub fn evaluate(
        &self,
        prev: Option<&IndicatorSnapshot>,
        curr: &IndicatorSnapshot,
    ) -> Evaluation {
        let mut eval = Evaluation::default();

        for rule in &self.rules {
            // No fire and no clear on the first cycle for crossover rules.
            if rule.needs_prev() && prev.is_none() {
                continue;
            }

            if rule.fires(prev, curr) {
                eval.fired.push(FiredRule {
                    rule_id: rule.id.clone(),
                    message: rule.message(curr),
                });
            } else if rule.clears(curr) {
                eval.cleared.push(rule.id.clone());
            }
        }

        eval
    }
}
