use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::criteria::{Criterion, CriterionResult, Target, Unit};

/// Everything needed to score one evaluation period.
///
/// Example YAML:
/// ```yaml
/// name: Q3 emulation
/// period: 2024-Q3
/// criteria:
///   - { id: "1", name: Professional work, criteria_type: 0, max_score: 20 }
///   - { id: "1.1", name: Cases solved, criteria_type: 1, formula_type: 4, max_score: 10, parent_id: "1" }
/// units:
///   - { id: u1, name: District 1, cluster: north }
/// targets:
///   - { criterion_id: "1.1", unit_id: u1, target_value: 40 }
/// results:
///   - { unit_id: u1, criterion_id: "1.1", stage: review1, actual_value: 52 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EvaluationFile {
    pub name: String,

    #[serde(default)]
    pub period: Option<String>,

    pub criteria: Vec<Criterion>,

    pub units: Vec<Unit>,

    #[serde(default)]
    pub targets: Vec<Target>,

    #[serde(default)]
    pub results: Vec<CriterionResult>,
}

/// Load an evaluation file. `.json` files are parsed as JSON, anything else
/// as YAML.
pub fn load_evaluation(path: &Path) -> Result<EvaluationFile> {
    if !path.exists() {
        anyhow::bail!("Evaluation file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read evaluation file at {}", path.display()))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let file: EvaluationFile = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse evaluation: invalid JSON in {}", path.display()))?
    } else {
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse evaluation: invalid YAML in {}", path.display()))?
    };

    tracing::debug!(
        criteria = file.criteria.len(),
        units = file.units.len(),
        results = file.results.len(),
        "loaded evaluation '{}'",
        file.name
    );

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{CriteriaType, FormulaDetail, ReviewStage};
    use std::env;

    const SAMPLE: &str = r#"
name: Q3 emulation
period: 2024-Q3
criteria:
  - id: "1"
    name: Professional work
    criteria_type: 0
    max_score: 20
  - id: "1.1"
    name: Training sessions
    criteria_type: 3
    max_score: 10
    parent_id: "1"
    detail:
      kind: fixed_score
      point_per_unit: 2.5
      max_score_limit: 10
units:
  - id: u1
    name: District 1
    cluster: north
results:
  - unit_id: u1
    criterion_id: "1.1"
    stage: review1
    actual_value: 3
"#;

    #[test]
    fn test_load_yaml() {
        let path = env::temp_dir().join("emulation_score_test_load.yaml");
        fs::write(&path, SAMPLE).unwrap();

        let file = load_evaluation(&path).unwrap();
        assert_eq!(file.name, "Q3 emulation");
        assert_eq!(file.criteria.len(), 2);
        assert_eq!(file.criteria[1].criteria_type, CriteriaType::FixedRate);
        assert_eq!(
            file.criteria[1].detail,
            Some(FormulaDetail::FixedScore {
                point_per_unit: 2.5,
                max_score_limit: Some(10.0)
            })
        );
        assert!(file.targets.is_empty());
        assert_eq!(file.results[0].stage, ReviewStage::Review1);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_json() {
        let yaml_file: EvaluationFile = serde_saphyr::from_str(SAMPLE).unwrap();
        let path = env::temp_dir().join("emulation_score_test_load.json");
        fs::write(&path, serde_json::to_string(&yaml_file).unwrap()).unwrap();

        let file = load_evaluation(&path).unwrap();
        assert_eq!(file, yaml_file);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let path = env::temp_dir().join("emulation_score_test_missing.yaml");
        let _ = fs::remove_file(&path);
        let err = load_evaluation(&path).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let path = env::temp_dir().join("emulation_score_test_invalid.yaml");
        fs::write(&path, "name: [unclosed").unwrap();
        let err = load_evaluation(&path).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
        let _ = fs::remove_file(&path);
    }
}
