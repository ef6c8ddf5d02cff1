use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::vocab::normalize::merge_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VocabStatus {
    New,
    Learning,
    Known,
    Mastered,
}

impl VocabStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VocabStatus::New => "new",
            VocabStatus::Learning => "learning",
            VocabStatus::Known => "known",
            VocabStatus::Mastered => "mastered",
        }
    }
}

impl fmt::Display for VocabStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VocabStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(VocabStatus::New),
            "learning" => Ok(VocabStatus::Learning),
            "known" => Ok(VocabStatus::Known),
            "mastered" => Ok(VocabStatus::Mastered),
            other => Err(AppError::InvalidRequest(format!(
                "unknown vocabulary status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyCandidate {
    pub simplified: String,
    pub traditional: Option<String>,
    pub pinyin: String,
    pub meaning: String,
    pub part_of_speech: Option<String>,
    pub level: Option<u8>,
    pub category: Option<String>,
    pub context_sentence: Option<String>,
    pub is_new: bool,
    pub is_review: bool,
}

impl VocabularyCandidate {
    pub fn key(&self) -> String {
        merge_key(&self.simplified, &self.pinyin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub id: i64,
    pub learner_id: String,
    pub key: String,
    pub simplified: String,
    pub traditional: Option<String>,
    pub pinyin: String,
    pub meaning: String,
    pub part_of_speech: Option<String>,
    pub level: Option<u8>,
    pub category: Option<String>,
    pub status: VocabStatus,
    pub seen_count: u32,
    pub tested_count: u32,
    pub tested_correct_count: u32,
    pub correct_in_context_count: u32,
    pub streak: u32,
    pub consecutive_failures: u32,
    pub first_seen_article_id: Option<i64>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
}

impl VocabularyItem {
    pub fn from_candidate(
        id: i64,
        learner_id: &str,
        candidate: &VocabularyCandidate,
        article_id: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            learner_id: learner_id.to_string(),
            key: candidate.key(),
            simplified: candidate.simplified.clone(),
            traditional: candidate.traditional.clone(),
            pinyin: candidate.pinyin.clone(),
            meaning: candidate.meaning.clone(),
            part_of_speech: candidate.part_of_speech.clone(),
            level: candidate.level,
            category: candidate.category.clone(),
            status: VocabStatus::Learning,
            seen_count: 1,
            tested_count: 0,
            tested_correct_count: 0,
            correct_in_context_count: 0,
            streak: 0,
            consecutive_failures: 0,
            first_seen_article_id: Some(article_id),
            first_seen_at: now,
            last_seen_at: now,
            last_tested_at: None,
            next_review_at: None,
        }
    }
}
