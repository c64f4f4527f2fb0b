use super::config::ScoringConfig;
use super::formulas::{
    evaluate_bonus_penalty_traced, evaluate_fixed_rate_traced, evaluate_qualitative_traced,
    evaluate_quantitative_traced, round2, Basis, Scored,
};
use crate::criteria::{ClusterLeader, CriteriaType, Criterion, CriterionResult, FormulaDetail, Target};

/// Score a leaf criterion from a unit's submitted result.
///
/// Never fails: missing inputs score zero. `detail` only counts when its shape
/// matches the criterion type.
pub fn calculate_score(
    criterion: &Criterion,
    result: &CriterionResult,
    detail: Option<&FormulaDetail>,
    target: Option<&Target>,
    leader_actual: Option<f64>,
) -> f64 {
    calculate_score_traced(criterion, result, detail, target, leader_actual).score
}

pub fn calculate_score_traced(
    criterion: &Criterion,
    result: &CriterionResult,
    detail: Option<&FormulaDetail>,
    target: Option<&Target>,
    leader_actual: Option<f64>,
) -> Scored {
    let detail = detail.filter(|d| d.fits(criterion.criteria_type));

    match criterion.criteria_type {
        CriteriaType::Quantitative => {
            let Some(actual) = result.actual_value else {
                return Scored::zero(Basis::Missing { field: "actual value" });
            };
            let Some(target) = target else {
                return Scored::zero(Basis::Missing { field: "target" });
            };
            let Some(formula_type) = criterion.formula_type else {
                return Scored::zero(Basis::Missing { field: "formula type" });
            };
            evaluate_quantitative_traced(
                actual,
                target.target_value,
                criterion.max_score,
                formula_type,
                leader_actual,
            )
        }
        CriteriaType::Qualitative => match (result.self_score, result.achieved) {
            (Some(score), _) => Scored::new(score, Basis::Qualitative { achieved: score > 0.0 }),
            (None, Some(achieved)) => evaluate_qualitative_traced(achieved, criterion.max_score),
            (None, None) => Scored::zero(Basis::Missing { field: "self score" }),
        },
        CriteriaType::FixedRate => {
            let Some(count) = result.actual_value else {
                return Scored::zero(Basis::Missing { field: "actual value" });
            };
            match detail {
                Some(FormulaDetail::FixedScore {
                    point_per_unit,
                    max_score_limit,
                }) => evaluate_fixed_rate_traced(count, *point_per_unit, *max_score_limit),
                _ => Scored::zero(Basis::Missing { field: "fixed score detail" }),
            }
        }
        CriteriaType::BonusPenalty => match detail {
            Some(FormulaDetail::BonusPenalty {
                bonus_point,
                penalty_point,
                min_score,
                max_score,
            }) => evaluate_bonus_penalty_traced(
                result.bonus_count.unwrap_or(0.0),
                result.penalty_count.unwrap_or(0.0),
                *bonus_point,
                *penalty_point,
                *min_score,
                *max_score,
            ),
            _ => Scored::zero(Basis::Missing { field: "bonus/penalty detail" }),
        },
        CriteriaType::Parent | CriteriaType::Unknown(_) => Scored::zero(Basis::Unscored),
    }
}

/// A parent's score is the rounded sum of its children. No ceiling applies.
pub fn calculate_parent_score(children: &[f64]) -> f64 {
    round2(children.iter().sum())
}

/// Find the unit with the greatest actual value.
///
/// The first unit holding the maximum wins; a missing actual value counts as
/// zero. Returns `None` when there are no results.
pub fn find_cluster_leader<'a, I>(results: I) -> Option<ClusterLeader>
where
    I: IntoIterator<Item = &'a CriterionResult>,
{
    let mut leader: Option<ClusterLeader> = None;
    for result in results {
        let actual = result.actual_value.unwrap_or(0.0);
        let ahead = match &leader {
            Some(current) => actual > current.actual_value,
            None => true,
        };
        if ahead {
            leader = Some(ClusterLeader {
                unit_id: result.unit_id.clone(),
                actual_value: actual,
            });
        }
    }
    leader
}

/// Scoring entry point carrying the configured input policy.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(
        &self,
        criterion: &Criterion,
        result: &CriterionResult,
        target: Option<&Target>,
        leader_actual: Option<f64>,
    ) -> Scored {
        if self.config.zero_actual_is_missing && result.actual_value == Some(0.0) {
            tracing::debug!(
                criterion = %criterion.id,
                unit = %result.unit_id,
                "treating zero actual value as missing"
            );
            let normalized = CriterionResult {
                actual_value: None,
                ..result.clone()
            };
            return calculate_score_traced(
                criterion,
                &normalized,
                criterion.detail.as_ref(),
                target,
                leader_actual,
            );
        }
        calculate_score_traced(criterion, result, criterion.detail.as_ref(), target, leader_actual)
    }
}
