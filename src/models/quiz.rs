use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vocab::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FillBlank,
    ShortAnswer,
}

impl QuestionType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "multiple_choice" | "mc" | "choice" => Some(Self::MultipleChoice),
            "true_false" | "tf" | "boolean" => Some(Self::TrueFalse),
            "fill_blank" | "fill_in_the_blank" | "cloze" => Some(Self::FillBlank),
            "short_answer" | "open" | "free_response" => Some(Self::ShortAnswer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::FillBlank => "fill_blank",
            Self::ShortAnswer => "short_answer",
        }
    }

    pub fn is_free_response(&self) -> bool {
        matches!(self, Self::FillBlank | Self::ShortAnswer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizDraft {
    pub question: String,
    pub question_type: QuestionType,
    pub correct_answer: String,
    pub options: Vec<String>,
    pub hint: Option<String>,
    pub word: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizItem {
    pub id: i64,
    pub article_id: i64,
    pub question: String,
    pub question_type: QuestionType,
    pub correct_answer: String,
    pub options: Vec<String>,
    pub hint: Option<String>,
    pub vocabulary_id: Option<i64>,
    pub answered_correctly: Option<bool>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl QuizItem {
    pub fn is_correct(&self, answer: &str) -> bool {
        normalize_answer(answer) == normalize_answer(&self.correct_answer)
    }
}

fn normalize_answer(answer: &str) -> String {
    answer
        .trim()
        .trim_end_matches(['.', '。', '!', '！'])
        .to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub question_id: i64,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub question_id: i64,
    pub correct: bool,
    pub vocabulary_id: Option<i64>,
    pub transition: Option<Transition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
    pub score: f64,
    pub outcomes: Vec<QuizOutcome>,
}
