use serde::{Deserialize, Serialize};

/// Scoring policy configuration.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   zero_actual_is_missing: false
///   parent_ceiling: warn
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Treat a submitted actual value of 0 as if nothing was submitted.
    /// Only for reproducing scores computed by older tooling.
    #[serde(default)]
    pub zero_actual_is_missing: bool,

    /// What to do when a parent's aggregated score exceeds its max score
    #[serde(default)]
    pub parent_ceiling: CeilingPolicy,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CeilingPolicy {
    Ignore,
    #[default]
    Warn,
}
