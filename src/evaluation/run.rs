use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::file::EvaluationFile;
use crate::criteria::{
    CeilingViolation, ClusterLeader, CriteriaTree, CriteriaType, CriterionId, CriterionResult,
    ReviewStage, Target, TreeError, UnitId,
};
use crate::scoring::{find_cluster_leader, Basis, CeilingPolicy, Scored, ScoringEngine};

/// Score of one criterion for one unit, in tree order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionScore {
    pub criterion_id: CriterionId,
    pub code: String,
    pub name: String,
    pub depth: usize,
    pub score: f64,
    pub max_score: f64,
    /// Absent for parents, whose score is the sum of their children
    pub basis: Option<Basis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    pub unit_id: UnitId,
    pub unit_name: String,
    pub cluster: String,
    pub total: f64,
    pub rank: usize,
    pub cluster_rank: usize,
    pub criteria: Vec<CriterionScore>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ceiling_violations: Vec<CeilingViolation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderEntry {
    pub cluster: String,
    pub criterion_id: CriterionId,
    pub leader: ClusterLeader,
}

/// Ranked outcome of an evaluation at one review stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub name: String,
    pub period: Option<String>,
    pub stage: ReviewStage,
    pub generated_at: DateTime<Utc>,
    /// Sorted by rank, then unit id
    pub units: Vec<UnitReport>,
    pub leaders: Vec<LeaderEntry>,
}

impl EvaluationReport {
    pub fn unit(&self, unit_id: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.unit_id == unit_id)
    }

    pub fn leader(&self, cluster: &str, criterion_id: &str) -> Option<&ClusterLeader> {
        self.leaders
            .iter()
            .find(|l| l.cluster == cluster && l.criterion_id == criterion_id)
            .map(|l| &l.leader)
    }
}

/// Pick, per (unit, criterion), the record from the latest stage not after
/// `stage`. Later records in the same stage replace earlier ones.
pub fn effective_results(
    results: &[CriterionResult],
    stage: ReviewStage,
) -> HashMap<(UnitId, CriterionId), &CriterionResult> {
    let mut effective: HashMap<(UnitId, CriterionId), &CriterionResult> = HashMap::new();
    for result in results.iter().filter(|r| r.stage <= stage) {
        let key = (result.unit_id.clone(), result.criterion_id.clone());
        match effective.get(&key) {
            Some(existing) if existing.stage > result.stage => {}
            _ => {
                effective.insert(key, result);
            }
        }
    }
    effective
}

/// Score every unit in the file at the given review stage and rank them.
pub fn score_evaluation(
    file: &EvaluationFile,
    stage: ReviewStage,
    engine: &ScoringEngine,
) -> Result<EvaluationReport, TreeError> {
    let tree = CriteriaTree::build(&file.criteria)?;
    let results = effective_results(&file.results, stage);
    let targets: HashMap<(&str, &str), &Target> = file
        .targets
        .iter()
        .map(|t| ((t.unit_id.as_str(), t.criterion_id.as_str()), t))
        .collect();

    // Cluster membership, in file order within each cluster
    let mut clusters: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for unit in &file.units {
        clusters
            .entry(unit.cluster_name())
            .or_default()
            .push(unit.id.as_str());
    }

    let quantitative: Vec<&CriterionId> = tree
        .leaves()
        .filter(|c| c.criteria_type == CriteriaType::Quantitative)
        .map(|c| &c.id)
        .collect();

    let mut leaders = Vec::new();
    for (cluster, members) in &clusters {
        for &criterion_id in &quantitative {
            let cluster_results = members.iter().filter_map(|unit_id| {
                results.get(&(unit_id.to_string(), criterion_id.clone())).copied()
            });
            if let Some(leader) = find_cluster_leader(cluster_results) {
                tracing::debug!(
                    cluster,
                    criterion = %criterion_id,
                    unit = %leader.unit_id,
                    actual = leader.actual_value,
                    "cluster leader"
                );
                leaders.push(LeaderEntry {
                    cluster: cluster.to_string(),
                    criterion_id: criterion_id.clone(),
                    leader,
                });
            }
        }
    }

    let leader_actual = |cluster: &str, criterion_id: &str| {
        leaders
            .iter()
            .find(|l| l.cluster == cluster && l.criterion_id == criterion_id)
            .map(|l| l.leader.actual_value)
    };

    let mut units = Vec::with_capacity(file.units.len());
    for unit in &file.units {
        let mut leaf_scores: HashMap<CriterionId, f64> = HashMap::new();
        let mut bases: HashMap<&str, Basis> = HashMap::new();

        for criterion in tree.leaves() {
            let key = (unit.id.clone(), criterion.id.clone());
            let scored = match results.get(&key) {
                Some(result) => engine.score(
                    criterion,
                    result,
                    targets.get(&(unit.id.as_str(), criterion.id.as_str())).copied(),
                    leader_actual(unit.cluster_name(), &criterion.id),
                ),
                None if criterion.criteria_type == CriteriaType::Parent => {
                    Scored::zero(Basis::Unscored)
                }
                None => Scored::zero(Basis::Missing { field: "result" }),
            };
            leaf_scores.insert(criterion.id.clone(), scored.score);
            bases.insert(criterion.id.as_str(), scored.basis);
        }

        let scores = tree.aggregate(&leaf_scores);
        let total = tree.total(&scores);

        let ceiling_violations = match engine.config().parent_ceiling {
            CeilingPolicy::Warn => tree.ceiling_violations(&scores),
            CeilingPolicy::Ignore => Vec::new(),
        };
        for violation in &ceiling_violations {
            tracing::warn!(
                unit = %unit.id,
                criterion = %violation.criterion_id,
                score = violation.score,
                max_score = violation.max_score,
                "aggregated score exceeds parent max score"
            );
        }

        let criteria = tree
            .walk()
            .into_iter()
            .map(|(depth, c)| CriterionScore {
                criterion_id: c.id.clone(),
                code: c.display_code().to_string(),
                name: c.name.clone(),
                depth,
                score: scores.get(&c.id).copied().unwrap_or(0.0),
                max_score: c.max_score,
                basis: bases.remove(c.id.as_str()),
            })
            .collect();

        units.push(UnitReport {
            unit_id: unit.id.clone(),
            unit_name: unit.name.clone(),
            cluster: unit.cluster_name().to_string(),
            total,
            rank: 0,
            cluster_rank: 0,
            criteria,
            ceiling_violations,
        });
    }

    assign_ranks(&mut units);

    Ok(EvaluationReport {
        name: file.name.clone(),
        period: file.period.clone(),
        stage,
        generated_at: Utc::now(),
        units,
        leaders,
    })
}

/// Standard competition ranking ("1224"): tied totals share a rank and the
/// next rank skips. Sorts by total descending, unit id ascending.
fn assign_ranks(units: &mut [UnitReport]) {
    units.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.unit_id.cmp(&b.unit_id))
    });

    let totals: Vec<(String, f64)> = units.iter().map(|u| (u.cluster.clone(), u.total)).collect();
    for unit in units.iter_mut() {
        unit.rank = 1 + totals.iter().filter(|(_, t)| *t > unit.total).count();
        unit.cluster_rank = 1 + totals
            .iter()
            .filter(|(cluster, t)| *cluster == unit.cluster && *t > unit.total)
            .count();
    }
}
