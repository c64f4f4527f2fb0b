use std::collections::HashSet;

use super::file::EvaluationFile;
use crate::criteria::{CriteriaTree, CriteriaType, FormulaDetail, FormulaType};

/// Check an evaluation file before scoring.
/// Returns all validation errors at once (not just the first).
pub fn validate_evaluation(file: &EvaluationFile) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let mut unit_ids = HashSet::new();
    for (i, unit) in file.units.iter().enumerate() {
        if !unit_ids.insert(unit.id.as_str()) {
            errors.push(format!("units[{}].id: duplicate unit '{}'", i, unit.id));
        }
    }

    let tree = match CriteriaTree::build(&file.criteria) {
        Ok(tree) => Some(tree),
        Err(e) => {
            errors.push(format!("criteria: {}", e));
            None
        }
    };

    for (i, criterion) in file.criteria.iter().enumerate() {
        let at = format!("criteria[{}] '{}'", i, criterion.id);

        if criterion.max_score < 0.0 || !criterion.max_score.is_finite() {
            errors.push(format!("{}.max_score: must be non-negative", at));
        }

        if let CriteriaType::Unknown(code) = criterion.criteria_type {
            errors.push(format!("{}.criteria_type: unknown type {}", at, code));
        }

        match (criterion.criteria_type, criterion.formula_type) {
            (CriteriaType::Quantitative, None) => {
                errors.push(format!("{}.formula_type: required for quantitative criteria", at));
            }
            (_, Some(FormulaType::Unknown(code))) => {
                errors.push(format!("{}.formula_type: unknown formula {}", at, code));
            }
            _ => {}
        }

        match &criterion.detail {
            Some(detail) if !detail.fits(criterion.criteria_type) => {
                errors.push(format!(
                    "{}.detail: '{}' does not apply to {} criteria",
                    at,
                    detail.kind(),
                    criterion.criteria_type.label()
                ));
            }
            Some(FormulaDetail::FixedScore {
                max_score_limit: Some(limit),
                ..
            }) if *limit < 0.0 => {
                errors.push(format!("{}.detail.max_score_limit: must be non-negative", at));
            }
            Some(FormulaDetail::BonusPenalty {
                min_score: Some(min),
                max_score: Some(max),
                ..
            }) if min > max => {
                errors.push(format!(
                    "{}.detail: min_score {} is above max_score {}",
                    at, min, max
                ));
            }
            None if matches!(
                criterion.criteria_type,
                CriteriaType::FixedRate | CriteriaType::BonusPenalty
            ) =>
            {
                errors.push(format!(
                    "{}.detail: required for {} criteria",
                    at,
                    criterion.criteria_type.label()
                ));
            }
            _ => {}
        }

        if let Some(tree) = &tree {
            let is_parent = criterion.criteria_type == CriteriaType::Parent;
            let is_leaf = tree.is_leaf(&criterion.id);
            if is_parent && is_leaf {
                errors.push(format!("{}: parent criterion has no children", at));
            } else if !is_parent && !is_leaf {
                errors.push(format!(
                    "{}: {} criterion has children; only parent criteria may",
                    at,
                    criterion.criteria_type.label()
                ));
            }
        }
    }

    let criterion_ids: HashSet<&str> = file.criteria.iter().map(|c| c.id.as_str()).collect();

    let mut target_keys = HashSet::new();
    for (i, target) in file.targets.iter().enumerate() {
        if !target_keys.insert((target.unit_id.as_str(), target.criterion_id.as_str())) {
            errors.push(format!(
                "targets[{}]: duplicate target for unit '{}' on criterion '{}'",
                i, target.unit_id, target.criterion_id
            ));
        }
        if !unit_ids.contains(target.unit_id.as_str()) {
            errors.push(format!("targets[{}].unit_id: unknown unit '{}'", i, target.unit_id));
        }
        if !criterion_ids.contains(target.criterion_id.as_str()) {
            errors.push(format!(
                "targets[{}].criterion_id: unknown criterion '{}'",
                i, target.criterion_id
            ));
        }
    }

    for (i, result) in file.results.iter().enumerate() {
        if !unit_ids.contains(result.unit_id.as_str()) {
            errors.push(format!("results[{}].unit_id: unknown unit '{}'", i, result.unit_id));
        }
        if !criterion_ids.contains(result.criterion_id.as_str()) {
            errors.push(format!(
                "results[{}].criterion_id: unknown criterion '{}'",
                i, result.criterion_id
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
