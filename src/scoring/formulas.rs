use serde::Serialize;

use crate::criteria::FormulaType;

/// Which branch of an evaluator produced a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Basis {
    /// Target missing, zero or negative
    NoTarget,
    Proportional { rate: f64 },
    MetTarget { rate: f64 },
    FullMarks { rate: f64 },
    /// Exceeded target, credited against the cluster leader
    Exceeded { rate: f64, excess_ratio: f64 },
    /// Formula 4 without a leader ahead of the target
    NoLeaderAdvantage,
    Qualitative { achieved: bool },
    FixedRate { capped: bool },
    BonusPenalty { raw: f64 },
    /// A required input was absent
    Missing { field: &'static str },
    UnknownFormula { code: u8 },
    Unscored,
}

impl Basis {
    pub fn describe(&self) -> String {
        match self {
            Basis::NoTarget => "no usable target".to_string(),
            Basis::Proportional { rate } => format!("{:.1}% of target, proportional", rate * 100.0),
            Basis::MetTarget { rate } => format!("{:.1}% of target, met", rate * 100.0),
            Basis::FullMarks { rate } => format!("{:.1}% of target, full marks", rate * 100.0),
            Basis::Exceeded { rate, excess_ratio } => format!(
                "{:.1}% of target, {:.1}% of gap to leader",
                rate * 100.0,
                excess_ratio * 100.0
            ),
            Basis::NoLeaderAdvantage => "no leader above target, met".to_string(),
            Basis::Qualitative { achieved: true } => "achieved".to_string(),
            Basis::Qualitative { achieved: false } => "not achieved".to_string(),
            Basis::FixedRate { capped: true } => "fixed rate, capped".to_string(),
            Basis::FixedRate { capped: false } => "fixed rate".to_string(),
            Basis::BonusPenalty { raw } => format!("bonus/penalty raw {:+.2}", raw),
            Basis::Missing { field } => format!("missing {}", field),
            Basis::UnknownFormula { code } => format!("unknown formula type {}", code),
            Basis::Unscored => "not scored".to_string(),
        }
    }
}

/// A score together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored {
    pub score: f64,
    pub basis: Basis,
}

impl Scored {
    pub fn new(score: f64, basis: Basis) -> Self {
        Self { score, basis }
    }

    pub fn zero(basis: Basis) -> Self {
        Self { score: 0.0, basis }
    }
}

/// Round to two decimals the way the value prints: the exact binary value is
/// rounded, so 2.675 (stored as 2.67499...) gives 2.67. Exact half-cents
/// such as 0.125 round away from zero.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    // Multiplying by 8 is exact; an odd result means a true half-cent tie
    let eighths = value * 8.0;
    let rounded = if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        (value * 100.0).round() / 100.0
    } else {
        format!("{:.2}", value).parse().unwrap_or(0.0)
    };
    // Normalise -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Score a quantitative criterion against its target.
pub fn evaluate_quantitative(
    actual: f64,
    target: f64,
    max_score: f64,
    formula_type: FormulaType,
    leader_actual: Option<f64>,
) -> f64 {
    evaluate_quantitative_traced(actual, target, max_score, formula_type, leader_actual).score
}

pub fn evaluate_quantitative_traced(
    actual: f64,
    target: f64,
    max_score: f64,
    formula_type: FormulaType,
    leader_actual: Option<f64>,
) -> Scored {
    if !target.is_finite() || target <= 0.0 {
        return Scored::zero(Basis::NoTarget);
    }
    let actual = non_negative(actual);
    let max_score = non_negative(max_score);
    let rate = actual / target;
    let half = 0.5 * max_score;

    let proportional = || Scored::new(round2(half * rate), Basis::Proportional { rate });

    match formula_type {
        FormulaType::UnderTarget => proportional(),
        FormulaType::MeetsTarget => {
            if rate >= 1.0 {
                Scored::new(round2(half), Basis::MetTarget { rate })
            } else {
                proportional()
            }
        }
        FormulaType::ClusterLeader => {
            if rate > 1.0 {
                Scored::new(max_score, Basis::FullMarks { rate })
            } else {
                Scored::new(round2(half), Basis::MetTarget { rate })
            }
        }
        FormulaType::ExceedsTarget => match leader_actual {
            Some(leader) if leader.is_finite() && leader > target => {
                if actual <= target {
                    return proportional();
                }
                let excess_ratio = (actual - target) / (leader - target);
                let score = (half + excess_ratio * half).min(max_score);
                Scored::new(round2(score), Basis::Exceeded { rate, excess_ratio })
            }
            _ => {
                tracing::trace!(?leader_actual, target, "no leader above target, crediting target met");
                Scored::new(round2(half), Basis::NoLeaderAdvantage)
            }
        },
        FormulaType::Unknown(code) => Scored::zero(Basis::UnknownFormula { code }),
    }
}

/// Pass/fail scoring: all or nothing.
pub fn evaluate_qualitative(is_achieved: bool, max_score: f64) -> f64 {
    evaluate_qualitative_traced(is_achieved, max_score).score
}

pub fn evaluate_qualitative_traced(is_achieved: bool, max_score: f64) -> Scored {
    let score = if is_achieved { non_negative(max_score) } else { 0.0 };
    Scored::new(score, Basis::Qualitative { achieved: is_achieved })
}

/// Points per counted item, optionally capped.
pub fn evaluate_fixed_rate(count: f64, point_per_unit: f64, max_score_limit: Option<f64>) -> f64 {
    evaluate_fixed_rate_traced(count, point_per_unit, max_score_limit).score
}

pub fn evaluate_fixed_rate_traced(
    count: f64,
    point_per_unit: f64,
    max_score_limit: Option<f64>,
) -> Scored {
    let raw = count * point_per_unit;
    if !raw.is_finite() {
        return Scored::zero(Basis::FixedRate { capped: false });
    }
    match max_score_limit {
        // The limit is taken as already rounded
        Some(limit) if raw > limit => Scored::new(limit, Basis::FixedRate { capped: true }),
        _ => Scored::new(round2(raw), Basis::FixedRate { capped: false }),
    }
}

/// Bonus points minus penalty points, clamped to whichever bounds are given.
pub fn evaluate_bonus_penalty(
    bonus_count: f64,
    penalty_count: f64,
    bonus_point: f64,
    penalty_point: f64,
    min_score: Option<f64>,
    max_score: Option<f64>,
) -> f64 {
    evaluate_bonus_penalty_traced(
        bonus_count,
        penalty_count,
        bonus_point,
        penalty_point,
        min_score,
        max_score,
    )
    .score
}

pub fn evaluate_bonus_penalty_traced(
    bonus_count: f64,
    penalty_count: f64,
    bonus_point: f64,
    penalty_point: f64,
    min_score: Option<f64>,
    max_score: Option<f64>,
) -> Scored {
    let raw = bonus_count * bonus_point - penalty_count * penalty_point;
    let mut score = raw;
    if let Some(min) = min_score {
        if score < min {
            score = min;
        }
    }
    if let Some(max) = max_score {
        if score > max {
            score = max;
        }
    }
    Scored::new(round2(score), Basis::BonusPenalty { raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(7.499), 7.5);
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.675_000_1), 2.68);
        assert_eq!(round2(-0.001), 0.0);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn test_round2_follows_printed_value() {
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(1.115), 1.11);
        assert_eq!(round2(1.005), 1.0);
        assert_eq!(evaluate_fixed_rate(1.0, 2.675, None), 2.67);
    }

    #[test]
    fn test_round2_exact_half_cent_goes_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(2.375), 2.38);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(-0.004), 0.0);
    }

    #[test]
    fn test_zero_target_scores_zero_for_every_formula() {
        for code in 1..=4 {
            let formula = FormulaType::from(code);
            assert_eq!(evaluate_quantitative(50.0, 0.0, 10.0, formula, Some(80.0)), 0.0);
        }
    }

    #[test]
    fn test_negative_target_scores_zero() {
        let scored = evaluate_quantitative_traced(5.0, -1.0, 10.0, FormulaType::UnderTarget, None);
        assert_eq!(scored.score, 0.0);
        assert_eq!(scored.basis, Basis::NoTarget);
    }

    #[test]
    fn test_under_target_is_proportional() {
        assert_eq!(evaluate_quantitative(8.0, 10.0, 10.0, FormulaType::UnderTarget, None), 4.0);
        assert_eq!(evaluate_quantitative(1.0, 3.0, 10.0, FormulaType::UnderTarget, None), 1.67);
    }

    #[test]
    fn test_under_target_is_not_capped() {
        assert_eq!(evaluate_quantitative(30.0, 10.0, 10.0, FormulaType::UnderTarget, None), 15.0);
    }

    #[test]
    fn test_negative_actual_floors_at_zero() {
        assert_eq!(evaluate_quantitative(-5.0, 10.0, 10.0, FormulaType::UnderTarget, None), 0.0);
    }

    #[test]
    fn test_meets_target_boundary() {
        let met = evaluate_quantitative(100.0, 100.0, 10.0, FormulaType::MeetsTarget, None);
        assert_eq!(met, 5.0);
        let above = evaluate_quantitative(150.0, 100.0, 10.0, FormulaType::MeetsTarget, None);
        assert_eq!(above, 5.0);
        let just_below = evaluate_quantitative(99.95, 100.0, 10.0, FormulaType::MeetsTarget, None);
        assert_eq!(just_below, 5.0);
        let below = evaluate_quantitative(50.0, 100.0, 10.0, FormulaType::MeetsTarget, None);
        assert_eq!(below, 2.5);
    }

    #[test]
    fn test_cluster_leader_requires_strictly_greater() {
        let above = evaluate_quantitative(101.0, 100.0, 10.0, FormulaType::ClusterLeader, None);
        assert_eq!(above, 10.0);
        let equal = evaluate_quantitative(100.0, 100.0, 10.0, FormulaType::ClusterLeader, None);
        assert_eq!(equal, 5.0);
        let below = evaluate_quantitative(10.0, 100.0, 10.0, FormulaType::ClusterLeader, None);
        assert_eq!(below, 5.0);
    }

    #[test]
    fn test_exceeds_target_without_leader_advantage() {
        let no_leader = evaluate_quantitative(150.0, 100.0, 10.0, FormulaType::ExceedsTarget, None);
        assert_eq!(no_leader, 5.0);
        let leader_at_target =
            evaluate_quantitative(20.0, 100.0, 10.0, FormulaType::ExceedsTarget, Some(100.0));
        assert_eq!(leader_at_target, 5.0);
    }

    #[test]
    fn test_exceeds_target_below_target_is_proportional() {
        let scored = evaluate_quantitative_traced(60.0, 100.0, 10.0, FormulaType::ExceedsTarget, Some(200.0));
        assert_eq!(scored.score, 3.0);
        assert!(matches!(scored.basis, Basis::Proportional { .. }));
    }

    #[test]
    fn test_exceeds_target_shares_gap_to_leader() {
        // Halfway from target to leader earns 5 + 2.5
        let score = evaluate_quantitative(150.0, 100.0, 10.0, FormulaType::ExceedsTarget, Some(200.0));
        assert_eq!(score, 7.5);
        let leader = evaluate_quantitative(200.0, 100.0, 10.0, FormulaType::ExceedsTarget, Some(200.0));
        assert_eq!(leader, 10.0);
    }

    #[test]
    fn test_exceeds_target_caps_at_max() {
        let score = evaluate_quantitative(300.0, 100.0, 10.0, FormulaType::ExceedsTarget, Some(200.0));
        assert_eq!(score, 10.0);
    }

    #[test]
    fn test_unknown_formula_scores_zero() {
        let scored = evaluate_quantitative_traced(5.0, 5.0, 10.0, FormulaType::Unknown(7), None);
        assert_eq!(scored.score, 0.0);
        assert_eq!(scored.basis, Basis::UnknownFormula { code: 7 });
    }

    #[test]
    fn test_qualitative() {
        assert_eq!(evaluate_qualitative(true, 4.0), 4.0);
        assert_eq!(evaluate_qualitative(false, 4.0), 0.0);
    }

    #[test]
    fn test_fixed_rate() {
        assert_eq!(evaluate_fixed_rate(5.0, 2.5, Some(10.0)), 10.0);
        assert_eq!(evaluate_fixed_rate(3.0, 2.5, None), 7.5);
        assert_eq!(evaluate_fixed_rate(4.0, 2.5, Some(10.0)), 10.0);
        assert_eq!(evaluate_fixed_rate(1.0, 0.333, None), 0.33);
    }

    #[test]
    fn test_fixed_rate_reports_cap() {
        let scored = evaluate_fixed_rate_traced(5.0, 2.5, Some(10.0));
        assert_eq!(scored.basis, Basis::FixedRate { capped: true });
    }

    #[test]
    fn test_bonus_penalty_within_bounds() {
        assert_eq!(evaluate_bonus_penalty(3.0, 1.0, 2.0, 1.0, Some(0.0), Some(10.0)), 5.0);
    }

    #[test]
    fn test_bonus_penalty_min_bound_raises_score() {
        assert_eq!(evaluate_bonus_penalty(3.0, 1.0, 2.0, 1.0, Some(10.0), None), 10.0);
    }

    #[test]
    fn test_bonus_penalty_unbounded_can_go_negative() {
        assert_eq!(evaluate_bonus_penalty(0.0, 3.0, 2.0, 1.5, None, None), -4.5);
        assert_eq!(evaluate_bonus_penalty(0.0, 3.0, 2.0, 1.5, Some(-2.0), None), -2.0);
    }

    #[test]
    fn test_bonus_penalty_rounds_after_clamp() {
        assert_eq!(evaluate_bonus_penalty(1.0, 0.0, 4.0, 0.0, None, Some(3.3333)), 3.33);
    }

    #[test]
    fn test_evaluators_are_idempotent() {
        let first = evaluate_quantitative(150.0, 100.0, 10.0, FormulaType::ExceedsTarget, Some(180.0));
        let second = evaluate_quantitative(150.0, 100.0, 10.0, FormulaType::ExceedsTarget, Some(180.0));
        assert_eq!(first, second);
        assert_eq!(
            evaluate_bonus_penalty(2.0, 1.0, 1.5, 0.5, None, None),
            evaluate_bonus_penalty(2.0, 1.0, 1.5, 0.5, None, None)
        );
    }

    #[test]
    fn test_basis_describe() {
        assert_eq!(Basis::Missing { field: "target" }.describe(), "missing target");
        assert_eq!(Basis::Proportional { rate: 0.5 }.describe(), "50.0% of target, proportional");
    }
}
