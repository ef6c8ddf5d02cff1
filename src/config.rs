use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::models::{LearnerConfig, ScriptMode};

const APP_DIR: &str = "graded-reader";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub anthropic_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    pub prompt_dir: Option<PathBuf>,

    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_search_budget")]
    pub search_budget: u32,

    #[serde(default)]
    pub learner_defaults: LearnerDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerDefaults {
    pub level: u8,
    pub target_length: u32,
    pub new_words_per_article: u32,
    pub review_words_per_article: u32,
    pub quiz_questions_count: u32,
    pub categories: Vec<String>,
    pub regions: Vec<String>,
    pub script_mode: ScriptMode,
}

impl Default for LearnerDefaults {
    fn default() -> Self {
        Self {
            level: 3,
            target_length: 300,
            new_words_per_article: 8,
            review_words_per_article: 5,
            quiz_questions_count: 5,
            categories: [
                "technology",
                "science",
                "culture",
                "economy",
                "sports",
                "environment",
                "food",
                "travel",
            ]
            .map(String::from)
            .to_vec(),
            regions: [
                "mainland china",
                "taiwan",
                "hong kong",
                "singapore",
                "east asia",
                "europe",
                "americas",
                "global",
            ]
            .map(String::from)
            .to_vec(),
            script_mode: ScriptMode::Simplified,
        }
    }
}

impl LearnerDefaults {
    pub fn to_learner_config(&self) -> LearnerConfig {
        LearnerConfig {
            level: self.level,
            target_length: self.target_length,
            new_words_per_article: self.new_words_per_article,
            review_words_per_article: self.review_words_per_article,
            quiz_questions_count: self.quiz_questions_count,
            categories: self.categories.clone(),
            regions: self.regions.clone(),
            script_mode: self.script_mode,
        }
    }
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("reader.db").to_string_lossy().to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_run_timeout() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    180
}

fn default_search_budget() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            anthropic_api_key: None,
            model: default_model(),
            prompt_dir: None,
            run_timeout_secs: default_run_timeout(),
            request_timeout_secs: default_request_timeout(),
            search_budget: default_search_budget(),
            learner_defaults: LearnerDefaults::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        }
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        let defaults = &self.learner_defaults;
        if !(1..=6).contains(&defaults.level) {
            return Err(AppError::Config(format!(
                "learner_defaults.level must be between 1 and 6, got {}",
                defaults.level
            )));
        }
        if defaults.categories.is_empty() || defaults.regions.is_empty() {
            return Err(AppError::Config(
                "learner_defaults needs at least one category and one region".to_string(),
            ));
        }
        if self.run_timeout_secs == 0 {
            return Err(AppError::Config("run_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            db_path = "/tmp/reader.db"
            model = "some-model"

            [learner_defaults]
            level = 5
            script_mode = "traditional"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, "/tmp/reader.db");
        assert_eq!(config.run_timeout_secs, 300);
        assert_eq!(config.learner_defaults.level, 5);
        assert_eq!(config.learner_defaults.script_mode, ScriptMode::Traditional);
        assert_eq!(config.learner_defaults.quiz_questions_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_level() {
        let mut config = Config::default();
        config.learner_defaults.level = 9;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }
}
