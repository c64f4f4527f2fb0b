mod schema;

pub use schema::{Config, OutputFormat};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/emulation-score/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("emulation-score"))
}

/// Get the default config file path (~/.config/emulation-score/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path,
///   and a missing default file yields the default configuration.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            path
        }
        None => {
            let default_path = get_config_path()?;
            if !default_path.exists() {
                tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            default_path
        }
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Write a config file atomically, creating its directory if needed.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory at {}", dir.display()))?;
        }
    }

    let yaml = serde_saphyr::to_string(config).context("Failed to serialize config")?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit().context("Failed to save config")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::ReviewStage;
    use crate::scoring::{CeilingPolicy, ScoringConfig};
    use std::env;

    #[test]
    fn test_empty_config_defaults() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config.effective_stage(), ReviewStage::Review2);
        assert_eq!(config.effective_format(), OutputFormat::Table);
        assert_eq!(config.effective_scoring(), ScoringConfig::default());
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
stage: review1
format: json
scoring:
  zero_actual_is_missing: true
  parent_ceiling: ignore
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.effective_stage(), ReviewStage::Review1);
        assert_eq!(config.effective_format(), OutputFormat::Json);
        let scoring = config.effective_scoring();
        assert!(scoring.zero_actual_is_missing);
        assert_eq!(scoring.parent_ceiling, CeilingPolicy::Ignore);
    }

    #[test]
    fn test_stage_final_alias() {
        let config: Config = serde_saphyr::from_str("stage: final\n").unwrap();
        assert_eq!(config.effective_stage(), ReviewStage::Review2);
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let path = env::temp_dir().join("emulation_score_missing_config.yaml");
        let _ = fs::remove_file(&path);
        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = env::temp_dir().join("emulation_score_config_test");
        let path = dir.join("config.yaml");
        let _ = fs::remove_file(&path);

        let config = Config {
            stage: Some(ReviewStage::Review1),
            format: Some(OutputFormat::Tsv),
            scoring: Some(ScoringConfig {
                zero_actual_is_missing: true,
                parent_ceiling: CeilingPolicy::Warn,
            }),
        };
        save_config(&path, &config).unwrap();
        let loaded = load_config(Some(path.clone())).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }
}
