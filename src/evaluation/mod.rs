pub mod file;
pub mod run;
pub mod validation;

pub use file::{load_evaluation, EvaluationFile};
pub use run::{
    effective_results, score_evaluation, CriterionScore, EvaluationReport, LeaderEntry, UnitReport,
};
pub use validation::validate_evaluation;
