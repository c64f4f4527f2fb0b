use serde::{Deserialize, Serialize};

pub type CriterionId = String;
pub type UnitId = String;

/// How a criterion earns its score.
///
/// Stored as a numeric code in evaluation files. Codes outside 0-4 are kept
/// as `Unknown` so a bad record scores zero instead of failing the whole load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum CriteriaType {
    /// Parent node, scored by summing its children
    Parent,
    Quantitative,
    Qualitative,
    FixedRate,
    BonusPenalty,
    Unknown(u8),
}

impl From<u8> for CriteriaType {
    fn from(code: u8) -> Self {
        match code {
            0 => CriteriaType::Parent,
            1 => CriteriaType::Quantitative,
            2 => CriteriaType::Qualitative,
            3 => CriteriaType::FixedRate,
            4 => CriteriaType::BonusPenalty,
            other => CriteriaType::Unknown(other),
        }
    }
}

impl From<CriteriaType> for u8 {
    fn from(value: CriteriaType) -> Self {
        match value {
            CriteriaType::Parent => 0,
            CriteriaType::Quantitative => 1,
            CriteriaType::Qualitative => 2,
            CriteriaType::FixedRate => 3,
            CriteriaType::BonusPenalty => 4,
            CriteriaType::Unknown(code) => code,
        }
    }
}

impl CriteriaType {
    pub fn label(&self) -> &'static str {
        match self {
            CriteriaType::Parent => "parent",
            CriteriaType::Quantitative => "quantitative",
            CriteriaType::Qualitative => "qualitative",
            CriteriaType::FixedRate => "fixed rate",
            CriteriaType::BonusPenalty => "bonus/penalty",
            CriteriaType::Unknown(_) => "unknown",
        }
    }
}

/// Scoring curve for quantitative criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum FormulaType {
    /// 1: proportional credit below target
    UnderTarget,
    /// 2: half marks once the target is met
    MeetsTarget,
    /// 3: full marks for strictly exceeding the target
    ClusterLeader,
    /// 4: half marks plus a share of the gap up to the cluster leader
    ExceedsTarget,
    Unknown(u8),
}

impl From<u8> for FormulaType {
    fn from(code: u8) -> Self {
        match code {
            1 => FormulaType::UnderTarget,
            2 => FormulaType::MeetsTarget,
            3 => FormulaType::ClusterLeader,
            4 => FormulaType::ExceedsTarget,
            other => FormulaType::Unknown(other),
        }
    }
}

impl From<FormulaType> for u8 {
    fn from(value: FormulaType) -> Self {
        match value {
            FormulaType::UnderTarget => 1,
            FormulaType::MeetsTarget => 2,
            FormulaType::ClusterLeader => 3,
            FormulaType::ExceedsTarget => 4,
            FormulaType::Unknown(code) => code,
        }
    }
}

/// Extra parameters attached to a criterion, shaped by its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum FormulaDetail {
    /// Bookkeeping only; quantitative scoring reads the per-unit target
    Formula {
        #[serde(default)]
        description: Option<String>,
    },
    FixedScore {
        point_per_unit: f64,
        #[serde(default)]
        max_score_limit: Option<f64>,
    },
    BonusPenalty {
        #[serde(default)]
        bonus_point: f64,
        #[serde(default)]
        penalty_point: f64,
        #[serde(default)]
        min_score: Option<f64>,
        #[serde(default)]
        max_score: Option<f64>,
    },
}

impl FormulaDetail {
    /// Whether this detail shape belongs to the given criterion type.
    pub fn fits(&self, criteria_type: CriteriaType) -> bool {
        matches!(
            (self, criteria_type),
            (FormulaDetail::Formula { .. }, CriteriaType::Quantitative)
                | (FormulaDetail::FixedScore { .. }, CriteriaType::FixedRate)
                | (FormulaDetail::BonusPenalty { .. }, CriteriaType::BonusPenalty)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FormulaDetail::Formula { .. } => "formula",
            FormulaDetail::FixedScore { .. } => "fixed_score",
            FormulaDetail::BonusPenalty { .. } => "bonus_penalty",
        }
    }
}

/// A line item of the evaluation rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Criterion {
    pub id: CriterionId,
    /// Display code such as "1.2"
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    pub criteria_type: CriteriaType,
    #[serde(default)]
    pub formula_type: Option<FormulaType>,
    #[serde(default)]
    pub max_score: f64,
    #[serde(default)]
    pub parent_id: Option<CriterionId>,
    #[serde(default)]
    pub detail: Option<FormulaDetail>,
}

impl Criterion {
    pub fn display_code(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.id)
    }
}

/// Per-unit goal for a quantitative criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    pub criterion_id: CriterionId,
    pub unit_id: UnitId,
    pub target_value: f64,
}

/// Review pass a result record was submitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStage {
    #[default]
    SelfAssessment,
    Review1,
    #[serde(alias = "final")]
    Review2,
}

impl ReviewStage {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self" | "self_assessment" | "self-assessment" => Some(ReviewStage::SelfAssessment),
            "review1" => Some(ReviewStage::Review1),
            "review2" | "final" => Some(ReviewStage::Review2),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReviewStage::SelfAssessment => "self assessment",
            ReviewStage::Review1 => "review 1",
            ReviewStage::Review2 => "review 2",
        }
    }
}

/// Raw inputs one unit submitted for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CriterionResult {
    pub unit_id: UnitId,
    pub criterion_id: CriterionId,
    #[serde(default)]
    pub stage: ReviewStage,
    #[serde(default)]
    pub actual_value: Option<f64>,
    /// Pre-resolved qualitative score (max score or zero)
    #[serde(default)]
    pub self_score: Option<f64>,
    #[serde(default)]
    pub achieved: Option<bool>,
    #[serde(default)]
    pub bonus_count: Option<f64>,
    #[serde(default)]
    pub penalty_count: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Unit holding the highest actual value for a criterion within its cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterLeader {
    pub unit_id: UnitId,
    pub actual_value: f64,
}

/// An evaluated organisational unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    #[serde(default)]
    pub cluster: Option<String>,
}

impl Unit {
    pub fn cluster_name(&self) -> &str {
        self.cluster.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_type_codes() {
        assert_eq!(CriteriaType::from(0), CriteriaType::Parent);
        assert_eq!(CriteriaType::from(4), CriteriaType::BonusPenalty);
        assert_eq!(CriteriaType::from(9), CriteriaType::Unknown(9));
        assert_eq!(u8::from(CriteriaType::Unknown(9)), 9);
        assert_eq!(u8::from(CriteriaType::FixedRate), 3);
    }

    #[test]
    fn test_formula_type_codes() {
        assert_eq!(FormulaType::from(1), FormulaType::UnderTarget);
        assert_eq!(FormulaType::from(4), FormulaType::ExceedsTarget);
        assert_eq!(FormulaType::from(0), FormulaType::Unknown(0));
    }

    #[test]
    fn test_detail_fits_type() {
        let fixed = FormulaDetail::FixedScore {
            point_per_unit: 1.0,
            max_score_limit: None,
        };
        assert!(fixed.fits(CriteriaType::FixedRate));
        assert!(!fixed.fits(CriteriaType::BonusPenalty));
    }

    #[test]
    fn test_parse_criterion_yaml() {
        let yaml = r#"
id: c1
code: "1.1"
name: Cases solved
criteria_type: 1
formula_type: 4
max_score: 10
parent_id: root
"#;
        let criterion: Criterion = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(criterion.criteria_type, CriteriaType::Quantitative);
        assert_eq!(criterion.formula_type, Some(FormulaType::ExceedsTarget));
        assert_eq!(criterion.max_score, 10.0);
        assert_eq!(criterion.display_code(), "1.1");
    }

    #[test]
    fn test_parse_bonus_penalty_detail_defaults() {
        let yaml = r#"
kind: bonus_penalty
bonus_point: 2
"#;
        let detail: FormulaDetail = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(
            detail,
            FormulaDetail::BonusPenalty {
                bonus_point: 2.0,
                penalty_point: 0.0,
                min_score: None,
                max_score: None,
            }
        );
    }

    #[test]
    fn test_review_stage_order_and_parse() {
        assert!(ReviewStage::SelfAssessment < ReviewStage::Review1);
        assert!(ReviewStage::Review1 < ReviewStage::Review2);
        assert_eq!(ReviewStage::parse("final"), Some(ReviewStage::Review2));
        assert_eq!(ReviewStage::parse("Self"), Some(ReviewStage::SelfAssessment));
        assert_eq!(ReviewStage::parse("review3"), None);
    }

    #[test]
    fn test_result_zero_actual_is_present() {
        let yaml = r#"
unit_id: u1
criterion_id: c1
actual_value: 0
"#;
        let result: CriterionResult = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(result.actual_value, Some(0.0));
        assert_eq!(result.stage, ReviewStage::SelfAssessment);
    }
}
