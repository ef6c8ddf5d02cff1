use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{QuizDraft, QuizItem, VocabularyCandidate, VocabularyItem};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFinding {
    pub headline: String,
    pub source_name: String,
    pub url: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub quotes: Vec<String>,
    #[serde(default)]
    pub numbers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSelection {
    pub category: String,
    pub region: String,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarPoint {
    pub pattern: String,
    pub explanation: String,
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PassageDraft {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub translation: String,
    pub grammar_points: Vec<GrammarPoint>,
    pub sources: Vec<SourceRef>,
    pub declared_word_count: Option<u32>,
    pub declared_new_word_count: Option<u32>,
    pub word_count: u32,
    pub new_word_count: u32,
    pub review_word_count: u32,
    pub candidates: Vec<VocabularyCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub learner_id: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub translation: String,
    pub grammar_points: Vec<GrammarPoint>,
    pub sources: Vec<SourceRef>,
    pub category: String,
    pub region: String,
    pub topic: String,
    pub level: u8,
    pub word_count: u32,
    pub new_word_count: u32,
    pub review_word_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleWord {
    pub vocabulary_id: i64,
    pub is_new: bool,
    pub is_review: bool,
    pub context_sentence: Option<String>,
    pub item: VocabularyItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleView {
    pub article: Article,
    pub vocabulary: Vec<ArticleWord>,
    pub quiz: Vec<QuizItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentArticle {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub region: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ArticleBundle {
    pub article_id: i64,
    pub vocabulary_ids: Vec<i64>,
    pub selection: TopicSelection,
    pub level: u8,
    pub draft: PassageDraft,
    pub quiz: Vec<QuizDraft>,
    pub findings: Vec<SourceFinding>,
}
