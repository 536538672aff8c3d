//! Configuration management for the resume scorecard

use crate::error::{Result, ScorecardError};
use crate::scoring::{FieldAliases, ReferenceTable, SortOrder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub scoring: ScoringConfig,
    pub prompt: PromptConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API, without the `/chat/completions` suffix
    pub api_base: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Reference table file; the built-in finance table when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_table: Option<PathBuf>,
    pub default_minimum: f64,
    pub sort_order: SortOrder,
    pub high_level_threshold: f64,
    pub medium_level_threshold: f64,
    pub excellent_affinity_threshold: f64,
    pub good_affinity_threshold: f64,
    pub fields: FieldAliases,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Characters of resume text sent to the model
    pub max_resume_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
    pub pretty_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
    Csv,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_base: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                temperature: 0.3,
                max_tokens: 2500,
                timeout_secs: 120,
                max_retries: 3,
            },
            scoring: ScoringConfig {
                reference_table: None,
                default_minimum: crate::scoring::DEFAULT_MINIMUM,
                sort_order: SortOrder::Ascending,
                high_level_threshold: 80.0,
                medium_level_threshold: 60.0,
                excellent_affinity_threshold: 75.0,
                good_affinity_threshold: 60.0,
                fields: FieldAliases::default(),
            },
            prompt: PromptConfig {
                max_resume_chars: 4000,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
                pretty_json: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first use
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ScorecardError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            // Create default config file
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ScorecardError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-scorecard")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let scoring = &self.scoring;
        for (name, value) in [
            ("scoring.default_minimum", scoring.default_minimum),
            ("scoring.high_level_threshold", scoring.high_level_threshold),
            ("scoring.medium_level_threshold", scoring.medium_level_threshold),
            ("scoring.excellent_affinity_threshold", scoring.excellent_affinity_threshold),
            ("scoring.good_affinity_threshold", scoring.good_affinity_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ScorecardError::Configuration(format!(
                    "{} must be between 0 and 100, got {}",
                    name, value
                )));
            }
        }

        if scoring.medium_level_threshold > scoring.high_level_threshold {
            return Err(ScorecardError::Configuration(
                "scoring.medium_level_threshold must not exceed scoring.high_level_threshold".to_string(),
            ));
        }
        if scoring.good_affinity_threshold > scoring.excellent_affinity_threshold {
            return Err(ScorecardError::Configuration(
                "scoring.good_affinity_threshold must not exceed scoring.excellent_affinity_threshold".to_string(),
            ));
        }
        if scoring.fields.label.is_empty() || scoring.fields.score.is_empty() {
            return Err(ScorecardError::Configuration(
                "scoring.fields needs at least one label and one score key".to_string(),
            ));
        }
        if self.prompt.max_resume_chars == 0 {
            return Err(ScorecardError::Configuration(
                "prompt.max_resume_chars must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Reference table from `override_path`, then the configured file, then
    /// the built-in finance table
    pub fn reference_table(&self, override_path: Option<&Path>) -> Result<ReferenceTable> {
        let table = match override_path.or(self.scoring.reference_table.as_deref()) {
            Some(path) => ReferenceTable::load_with_default(path, self.scoring.default_minimum)?,
            None => ReferenceTable::finance_sector().with_default_minimum(self.scoring.default_minimum)?,
        };
        Ok(table)
    }

    /// API key from the explicit value or the configured environment variable
    pub fn api_key(&self, explicit: Option<String>) -> Result<String> {
        explicit
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(&self.llm.api_key_env).ok().filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| {
                ScorecardError::Configuration(format!(
                    "No API key: pass --api-key or set {}",
                    self.llm.api_key_env
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.default_minimum, 55.0);
        assert_eq!(config.prompt.max_resume_chars, 4000);
    }

    #[test]
    fn test_load_creates_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.llm.model, "gpt-4o-mini");

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.scoring.sort_order, SortOrder::Ascending);
        assert_eq!(reloaded.scoring.fields, FieldAliases::default());
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = Config::default();
        config.scoring.medium_level_threshold = 90.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.default_minimum = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reference_table_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.toml");
        std::fs::write(&path, "Python = 60\n").unwrap();

        let config = Config::default();
        let table = config.reference_table(Some(&path)).unwrap();
        assert_eq!(table.len(), 1);

        let builtin = config.reference_table(None).unwrap();
        assert_eq!(builtin.minimum_for("Excel"), 92.0);
    }

    #[test]
    fn test_reference_file_uses_configured_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.toml");
        std::fs::write(&path, "Python = 78\n").unwrap();

        let mut config = Config::default();
        config.scoring.default_minimum = 40.0;
        let table = config.reference_table(Some(&path)).unwrap();

        assert_eq!(table.default_minimum(), 40.0);
        assert_eq!(table.minimum_for("Empatia"), 40.0);
    }

    #[test]
    fn test_flat_reference_file_default_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.toml");
        std::fs::write(&path, "default_minimum = 40\nPython = 78\n").unwrap();

        let mut config = Config::default();
        config.scoring.default_minimum = 65.0;
        let table = config.reference_table(Some(&path)).unwrap();

        // The file's own default beats the configured one
        assert_eq!(table.default_minimum(), 40.0);
        assert_eq!(table.len(), 1);
        assert!(!table.contains("default_minimum"));
        assert_eq!(table.minimum_for("Python"), 78.0);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = Config::default();
        assert_eq!(config.api_key(Some("sk-test".to_string())).unwrap(), "sk-test");
    }

    #[test]
    fn test_missing_api_key() {
        let mut config = Config::default();
        config.llm.api_key_env = "RESUME_SCORECARD_TEST_UNSET_KEY".to_string();
        assert!(config.api_key(None).is_err());
        assert!(config.api_key(Some("  ".to_string())).is_err());
    }
}
