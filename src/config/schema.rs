use serde::{Deserialize, Serialize};

use crate::criteria::ReviewStage;
use crate::scoring::ScoringConfig;

/// CLI configuration, read from `~/.config/emulation-score/config.yaml`.
///
/// Example YAML:
/// ```yaml
/// stage: review2
/// format: table
/// scoring:
///   zero_actual_is_missing: false
///   parent_ceiling: warn
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Review stage to score when `--stage` is not given (default: review2)
    #[serde(default)]
    pub stage: Option<ReviewStage>,

    /// Output format when `--format` is not given (default: table)
    #[serde(default)]
    pub format: Option<OutputFormat>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

impl Config {
    pub fn effective_stage(&self) -> ReviewStage {
        self.stage.unwrap_or(ReviewStage::Review2)
    }

    pub fn effective_format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    pub fn effective_scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }
}
