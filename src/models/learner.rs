use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(String);

impl LearnerId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidRequest("learner id is required".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScriptMode {
    #[default]
    Simplified,
    Traditional,
    Pinyin,
}

impl ScriptMode {
    pub fn describe(&self) -> &'static str {
        match self {
            ScriptMode::Simplified => "simplified Chinese characters",
            ScriptMode::Traditional => "traditional Chinese characters",
            ScriptMode::Pinyin => "pinyin with tone marks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    pub level: u8,
    pub target_length: u32,
    pub new_words_per_article: u32,
    pub review_words_per_article: u32,
    pub quiz_questions_count: u32,
    pub categories: Vec<String>,
    pub regions: Vec<String>,
    pub script_mode: ScriptMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    pub topic: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub level: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub learner: LearnerId,
    pub config: LearnerConfig,
    pub overrides: Overrides,
}

impl GenerationRequest {
    pub fn new(learner: LearnerId, config: LearnerConfig, overrides: Overrides) -> Result<Self> {
        if let Some(level) = overrides.level {
            if !(1..=6).contains(&level) {
                return Err(AppError::InvalidRequest(format!(
                    "level must be between 1 and 6, got {}",
                    level
                )));
            }
        }
        Ok(Self {
            learner,
            config,
            overrides,
        })
    }

    pub fn level(&self) -> u8 {
        self.overrides.level.unwrap_or(self.config.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learner_id_rejects_blank() {
        assert!(matches!(LearnerId::parse("   "), Err(AppError::InvalidRequest(_))));
        assert_eq!(LearnerId::parse(" L1 ").unwrap().as_str(), "L1");
    }
}
