pub mod config;
pub mod engine;
pub mod formulas;

pub use config::*;
pub use engine::{
    calculate_parent_score, calculate_score, calculate_score_traced, find_cluster_leader,
    ScoringEngine,
};
pub use formulas::{
    evaluate_bonus_penalty, evaluate_fixed_rate, evaluate_qualitative, evaluate_quantitative,
    round2, Basis, Scored,
};
