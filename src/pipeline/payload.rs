use serde_json::{Map, Value};
use url::Url;

use crate::error::GenerationError;
use crate::models::{
    GrammarPoint, PassageDraft, QuestionType, QuizDraft, SourceFinding, SourceRef,
    VocabularyCandidate,
};

const MAX_GRAMMAR_POINTS: usize = 2;

#[derive(Debug, Clone)]
pub struct Discovery {
    pub category: Option<String>,
    pub region: Option<String>,
    pub topic: Option<String>,
    pub findings: Vec<SourceFinding>,
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn text_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn flag(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    match obj.get(key) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn count(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    match obj.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn level(obj: &Map<String, Value>, key: &str) -> Option<u8> {
    match obj.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        Value::String(s) => s
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok(),
        _ => None,
    }
}

fn entity_list<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(obj) => obj.get(key).and_then(Value::as_array),
        _ => None,
    }
}

fn checked_url(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
        _ => {
            tracing::warn!("Dropping invalid source url {:?}", raw);
            None
        }
    }
}

pub fn parse_discovery(value: &Value) -> Result<Discovery, GenerationError> {
    let obj = value.as_object();
    let findings: Vec<SourceFinding> = entity_list(value, "findings")
        .map(|items| items.iter().filter_map(parse_finding).collect())
        .unwrap_or_default();

    if findings.is_empty() {
        return Err(GenerationError::NoFindings);
    }

    Ok(Discovery {
        category: obj.and_then(|o| text(o, &["category"])),
        region: obj.and_then(|o| text(o, &["region"])),
        topic: obj.and_then(|o| text(o, &["topic"])),
        findings,
    })
}

fn parse_finding(value: &Value) -> Option<SourceFinding> {
    let obj = value.as_object()?;
    let Some(headline) = text(obj, &["headline", "title"]) else {
        tracing::warn!("Rejecting finding without headline");
        return None;
    };
    let Some(source_name) = text(obj, &["source_name", "source", "publisher"]) else {
        tracing::warn!("Rejecting finding without source: {}", headline);
        return None;
    };

    Some(SourceFinding {
        headline,
        source_name,
        url: checked_url(text(obj, &["url", "link"])),
        date: text(obj, &["date", "published"]),
        facts: text_list(obj, "facts"),
        quotes: text_list(obj, "quotes"),
        numbers: text_list(obj, "numbers"),
    })
}

pub fn parse_passage(value: &Value) -> Result<PassageDraft, GenerationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| GenerationError::InvalidPayload("passage must be a JSON object".to_string()))?;

    let title = text(obj, &["title"])
        .ok_or_else(|| GenerationError::InvalidPayload("passage has no title".to_string()))?;
    let body = text(obj, &["body", "content", "text"]).ok_or(GenerationError::EmptyGeneration("passage"))?;

    let grammar_points = obj
        .get("grammar_points")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(parse_grammar_point)
                .take(MAX_GRAMMAR_POINTS)
                .collect()
        })
        .unwrap_or_default();

    let sources = obj
        .get("sources")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_source_ref).collect())
        .unwrap_or_default();

    let candidates = obj
        .get("vocabulary")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_candidate).collect())
        .unwrap_or_default();

    Ok(PassageDraft {
        title,
        summary: text(obj, &["summary"]).unwrap_or_default(),
        body,
        translation: text(obj, &["translation"]).unwrap_or_default(),
        grammar_points,
        sources,
        declared_word_count: count(obj, "word_count"),
        declared_new_word_count: count(obj, "new_word_count"),
        word_count: 0,
        new_word_count: 0,
        review_word_count: 0,
        candidates,
    })
}

fn parse_grammar_point(value: &Value) -> Option<GrammarPoint> {
    let obj = value.as_object()?;
    Some(GrammarPoint {
        pattern: text(obj, &["pattern", "point", "grammar"])?,
        explanation: text(obj, &["explanation"])?,
        example: text(obj, &["example"]),
    })
}

fn parse_source_ref(value: &Value) -> Option<SourceRef> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Some(SourceRef {
            name: name.trim().to_string(),
            url: None,
        }),
        Value::Object(obj) => Some(SourceRef {
            name: text(obj, &["name", "source_name", "source"])?,
            url: checked_url(text(obj, &["url"])),
        }),
        _ => None,
    }
}

fn parse_candidate(value: &Value) -> Option<VocabularyCandidate> {
    let obj = value.as_object()?;
    let traditional = text(obj, &["traditional"]);
    // Traditional-only entries keep their characters as the primary form.
    let simplified = text(obj, &["simplified", "word", "hanzi"]).or_else(|| traditional.clone());
    let pinyin = text(obj, &["pinyin"]);
    let meaning = text(obj, &["meaning", "definition", "english"]);

    let (Some(simplified), Some(pinyin), Some(meaning)) = (simplified, pinyin, meaning) else {
        tracing::warn!("Rejecting vocabulary entry missing word, pinyin or meaning: {}", value);
        return None;
    };

    let is_review = flag(obj, "is_review").unwrap_or(false);
    Some(VocabularyCandidate {
        simplified,
        traditional,
        pinyin,
        meaning,
        part_of_speech: text(obj, &["part_of_speech", "pos"]),
        level: level(obj, "level"),
        category: text(obj, &["category"]),
        context_sentence: text(obj, &["sentence", "context_sentence", "example"]),
        is_new: flag(obj, "is_new").unwrap_or(!is_review),
        is_review,
    })
}

pub fn parse_quiz(value: &Value) -> Result<Vec<QuizDraft>, GenerationError> {
    let items = entity_list(value, "questions")
        .ok_or_else(|| GenerationError::InvalidPayload("quiz has no questions list".to_string()))?;
    let questions: Vec<QuizDraft> = items.iter().filter_map(parse_question).collect();

    if questions.is_empty() {
        return Err(GenerationError::EmptyGeneration("quiz"));
    }
    Ok(questions)
}

fn parse_question(value: &Value) -> Option<QuizDraft> {
    let obj = value.as_object()?;
    let Some(question) = text(obj, &["question", "prompt"]) else {
        tracing::warn!("Rejecting quiz question without text");
        return None;
    };
    let Some(correct_answer) = text(obj, &["correct_answer", "answer"]) else {
        tracing::warn!("Rejecting quiz question without answer: {}", question);
        return None;
    };

    let mut options = text_list(obj, "options");
    let question_type = text(obj, &["type", "question_type"])
        .and_then(|t| QuestionType::parse(&t))
        .unwrap_or(if options.is_empty() {
            QuestionType::ShortAnswer
        } else {
            QuestionType::MultipleChoice
        });

    match question_type {
        kind if kind.is_free_response() => options.clear(),
        QuestionType::TrueFalse if options.is_empty() => {
            options = vec!["true".to_string(), "false".to_string()];
        }
        QuestionType::MultipleChoice if !options.iter().any(|o| o == &correct_answer) => {
            tracing::warn!("Rejecting multiple choice question whose answer is not an option: {}", question);
            return None;
        }
        _ => {}
    }

    Some(QuizDraft {
        question,
        question_type,
        correct_answer,
        options,
        hint: text(obj, &["hint"]),
        word: text(obj, &["word", "vocabulary"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_discovery_drops_incomplete_findings() {
        let value = json!({
            "category": "science",
            "findings": [
                {"headline": "新型电池问世", "source_name": "新华社", "url": "https://example.com/a", "facts": ["续航提升"]},
                {"headline": "no source"},
                {"source_name": "no headline"}
            ]
        });
        let discovery = parse_discovery(&value).unwrap();
        assert_eq!(discovery.findings.len(), 1);
        assert_eq!(discovery.category.as_deref(), Some("science"));
        assert_eq!(discovery.findings[0].facts, vec!["续航提升".to_string()]);
    }

    #[test]
    fn test_discovery_without_valid_findings_fails() {
        let value = json!({"findings": [{"headline": "x"}]});
        assert!(matches!(parse_discovery(&value), Err(GenerationError::NoFindings)));
        assert!(matches!(parse_discovery(&json!({})), Err(GenerationError::NoFindings)));
    }

    #[test]
    fn test_invalid_url_becomes_none() {
        let value = json!([{"headline": "h", "source": "s", "url": "not a url"}]);
        let discovery = parse_discovery(&value).unwrap();
        assert_eq!(discovery.findings[0].url, None);
    }

    #[test]
    fn test_passage_requires_body() {
        let value = json!({"title": "标题", "body": "  "});
        assert!(matches!(
            parse_passage(&value),
            Err(GenerationError::EmptyGeneration("passage"))
        ));
        let value = json!({"body": "正文"});
        assert!(matches!(parse_passage(&value), Err(GenerationError::InvalidPayload(_))));
    }

    #[test]
    fn test_passage_defaults_and_candidates() {
        let value = json!({
            "title": "标题",
            "body": "{{new:经济}}",
            "grammar_points": [
                {"pattern": "A", "explanation": "a"},
                {"pattern": "B", "explanation": "b"},
                {"pattern": "C", "explanation": "c"}
            ],
            "word_count": "120",
            "vocabulary": [
                {"simplified": "经济", "traditional": "經濟", "pinyin": "jīngjì", "meaning": "economy", "level": "HSK 4"},
                {"simplified": "发展", "pinyin": "fāzhǎn", "meaning": "develop", "is_review": true},
                {"simplified": "缺少", "meaning": "lack"}
            ]
        });
        let draft = parse_passage(&value).unwrap();
        assert_eq!(draft.grammar_points.len(), 2);
        assert_eq!(draft.summary, "");
        assert_eq!(draft.declared_word_count, Some(120));
        assert_eq!(draft.candidates.len(), 2);
        assert_eq!(draft.candidates[0].level, Some(4));
        assert!(draft.candidates[0].is_new);
        assert!(draft.candidates[1].is_review);
        assert!(!draft.candidates[1].is_new);
    }

    #[test]
    fn test_traditional_only_candidate_is_kept() {
        let value = json!({
            "title": "經濟新聞",
            "body": "{{new:經濟}}",
            "vocabulary": [
                {"traditional": "經濟", "pinyin": "jīngjì", "meaning": "economy"}
            ]
        });
        let draft = parse_passage(&value).unwrap();
        assert_eq!(draft.candidates.len(), 1);
        assert_eq!(draft.candidates[0].simplified, "經濟");
        assert_eq!(draft.candidates[0].traditional.as_deref(), Some("經濟"));
    }

    #[test]
    fn test_quiz_types_and_rejections() {
        let value = json!({"questions": [
            {"question": "Q1", "type": "multiple_choice", "correct_answer": "A", "options": ["A", "B"]},
            {"question": "Q2", "type": "multiple_choice", "correct_answer": "C", "options": ["A", "B"]},
            {"question": "Q3", "type": "short_answer", "answer": "x", "options": ["x", "y"]},
            {"question": "Q4", "type": "true_false", "correct_answer": "true"},
            {"question": "Q5"}
        ]});
        let quiz = parse_quiz(&value).unwrap();
        assert_eq!(quiz.len(), 3);
        assert_eq!(quiz[0].question_type, QuestionType::MultipleChoice);
        assert!(quiz[1].options.is_empty());
        assert_eq!(quiz[2].options.len(), 2);
    }

    #[test]
    fn test_empty_quiz_fails() {
        assert!(matches!(
            parse_quiz(&json!({"questions": []})),
            Err(GenerationError::EmptyGeneration("quiz"))
        ));
    }
}
