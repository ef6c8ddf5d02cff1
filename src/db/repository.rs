use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{
    Article, ArticleBundle, ArticleView, ArticleWord, LearnerConfig, LearnerId, QuestionType,
    QuizAnswer, QuizItem, QuizOutcome, QuizScore, RecentArticle, VocabStatus, VocabularyItem,
};
use crate::vocab::lifecycle::{self, ReviewOutcome};
use crate::vocab::normalize::{fold, fold_compact};

use super::schema::SCHEMA;
use super::{ARTICLES, QUIZ_QUESTIONS, SOURCE_CACHE, VOCABULARY};

const ARTICLE_COLUMNS: &str = "id, learner_id, title, summary, body, translation, grammar_points, \
     sources, category, region, topic, level, word_count, new_word_count, review_word_count, created_at";

const VOCABULARY_COLUMNS: &str = "id, learner_id, key, simplified, traditional, pinyin, meaning, \
     part_of_speech, level, category, status, seen_count, tested_count, tested_correct_count, \
     correct_in_context_count, streak, consecutive_failures, first_seen_article_id, first_seen_at, \
     last_seen_at, last_tested_at, next_review_at";

const QUIZ_COLUMNS: &str = "id, article_id, question, question_type, correct_answer, options, hint, \
     vocabulary_id, answered_correctly, answered_at";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Id allocation

    // Reserves `count` consecutive ids in `collection`. Ids are never reused,
    // so a run that fails after allocating leaves a gap.
    pub async fn allocate_ids(&self, collection: &'static str, count: u32) -> Result<Vec<i64>> {
        let ids = self
            .conn
            .call(move |conn| Ok(allocate_in(conn, collection, count)?))
            .await?;
        Ok(ids)
    }

    // Learner config

    pub async fn learner_config(&self, learner: &LearnerId) -> Result<Option<LearnerConfig>> {
        let learner_id = learner.as_str().to_string();
        let raw = self
            .conn
            .call(move |conn| {
                let raw = conn
                    .query_row(
                        "SELECT config FROM learner_config WHERE learner_id = ?1",
                        params![learner_id],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(raw)
            })
            .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn save_learner_config(&self, learner: &LearnerId, config: &LearnerConfig) -> Result<()> {
        let learner_id = learner.as_str().to_string();
        let raw = serde_json::to_string(config)?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO learner_config (learner_id, config, updated_at)
                       VALUES (?1, ?2, datetime('now'))
                       ON CONFLICT(learner_id) DO UPDATE SET
                           config = excluded.config,
                           updated_at = excluded.updated_at"#,
                    params![learner_id, raw],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // History

    pub async fn recent_articles(&self, learner: &LearnerId, limit: u32) -> Result<Vec<RecentArticle>> {
        let learner_id = learner.as_str().to_string();
        let articles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, category, region, created_at FROM articles
                     WHERE learner_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
                )?;
                let articles = stmt
                    .query_map(params![learner_id, limit], |row| {
                        Ok(RecentArticle {
                            id: row.get(0)?,
                            title: row.get(1)?,
                            category: row.get(2)?,
                            region: row.get(3)?,
                            created_at: time_column(row, 4)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    // URLs of findings already turned into passages for this learner.
    pub async fn recent_source_urls(&self, learner: &LearnerId, limit: u32) -> Result<Vec<String>> {
        let learner_id = learner.as_str().to_string();
        let urls = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT url FROM source_cache WHERE learner_id = ?1 AND url IS NOT NULL
                     ORDER BY cached_at DESC LIMIT ?2",
                )?;
                let urls = stmt
                    .query_map(params![learner_id, limit], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await?;
        Ok(urls)
    }

    // Most-seen words the learner already knows, for steering the passage.
    pub async fn top_known_words(&self, learner: &LearnerId, limit: u32) -> Result<Vec<VocabularyItem>> {
        let learner_id = learner.as_str().to_string();
        let items = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM vocabulary
                     WHERE learner_id = ?1 AND status IN ('known', 'mastered')
                     ORDER BY seen_count DESC, id LIMIT ?2",
                    VOCABULARY_COLUMNS
                ))?;
                let items = stmt
                    .query_map(params![learner_id, limit], |row| vocabulary_from_row(row, 0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    // Merge

    // Writes everything one run produced in a single transaction and returns
    // the stored view. Nothing is visible to readers if any write fails.
    pub async fn persist_run(
        &self,
        learner: &LearnerId,
        bundle: ArticleBundle,
        now: DateTime<Utc>,
    ) -> Result<ArticleView> {
        let learner_id = learner.as_str().to_string();
        let article_id = bundle.article_id;

        let view = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                insert_article(&tx, &learner_id, &bundle, now)?;

                let mut spare_ids = bundle.vocabulary_ids.iter().copied();
                let mut by_form: HashMap<String, i64> = HashMap::new();

                for candidate in &bundle.draft.candidates {
                    let key = candidate.key();
                    let vocabulary_id = match find_vocabulary_by_key(&tx, &learner_id, &key)? {
                        Some(mut item) => {
                            lifecycle::record_sighting(&mut item, now);
                            update_vocabulary_row(&tx, &item)?;
                            item.id
                        }
                        None => {
                            let id = match spare_ids.next() {
                                Some(id) => id,
                                None => allocate_in(&tx, VOCABULARY, 1)?[0],
                            };
                            let item = VocabularyItem::from_candidate(
                                id,
                                &learner_id,
                                candidate,
                                article_id,
                                now,
                            );
                            insert_vocabulary_row(&tx, &item)?;
                            id
                        }
                    };

                    tx.execute(
                        r#"INSERT INTO article_vocabulary
                               (article_id, vocabulary_id, learner_id, is_new, is_review, context_sentence)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                           ON CONFLICT(article_id, vocabulary_id) DO UPDATE SET
                               is_new = is_new OR excluded.is_new,
                               is_review = is_review OR excluded.is_review,
                               context_sentence = COALESCE(context_sentence, excluded.context_sentence)"#,
                        params![
                            article_id,
                            vocabulary_id,
                            learner_id,
                            candidate.is_new,
                            candidate.is_review,
                            candidate.context_sentence,
                        ],
                    )?;

                    let forms = [
                        Some(&candidate.simplified),
                        candidate.traditional.as_ref(),
                        Some(&candidate.pinyin),
                    ];
                    for form in forms.into_iter().flatten() {
                        by_form.entry(fold_compact(form)).or_insert(vocabulary_id);
                    }
                }

                let quiz_ids = allocate_in(&tx, QUIZ_QUESTIONS, bundle.quiz.len() as u32)?;
                for (position, (id, question)) in quiz_ids.iter().zip(&bundle.quiz).enumerate() {
                    let vocabulary_id = match question.word.as_deref() {
                        Some(word) => match by_form.get(&fold_compact(word)) {
                            Some(id) => Some(*id),
                            None => find_vocabulary_by_form(&tx, &learner_id, word)?,
                        },
                        None => None,
                    };
                    tx.execute(
                        r#"INSERT INTO quiz_questions
                               (id, article_id, learner_id, position, question, question_type,
                                correct_answer, options, hint, vocabulary_id)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
                        params![
                            id,
                            article_id,
                            learner_id,
                            position as i64,
                            question.question,
                            question.question_type.as_str(),
                            question.correct_answer,
                            to_json(&question.options)?,
                            question.hint,
                            vocabulary_id,
                        ],
                    )?;
                }

                let cache_ids = allocate_in(&tx, SOURCE_CACHE, bundle.findings.len() as u32)?;
                for (id, finding) in cache_ids.iter().zip(&bundle.findings) {
                    let cache_key = finding
                        .url
                        .clone()
                        .unwrap_or_else(|| fold(finding.headline.trim()));
                    tx.execute(
                        r#"INSERT INTO source_cache
                               (id, learner_id, cache_key, article_id, headline, source_name, url, finding, cached_at)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                           ON CONFLICT(learner_id, cache_key) DO UPDATE SET
                               article_id = excluded.article_id,
                               finding = excluded.finding,
                               cached_at = excluded.cached_at"#,
                        params![
                            id,
                            learner_id,
                            cache_key,
                            article_id,
                            finding.headline,
                            finding.source_name,
                            finding.url,
                            to_json(finding)?,
                            fmt_time(now),
                        ],
                    )?;
                }

                tx.commit()?;
                Ok(load_article_view(conn, &learner_id, article_id)?)
            })
            .await
            .map_err(map_write_error)?;

        view.ok_or_else(|| {
            AppError::PersistenceConflict(format!("article {} vanished after commit", article_id))
        })
    }

    // Reads

    pub async fn article_view(&self, learner: &LearnerId, article_id: i64) -> Result<ArticleView> {
        let learner_id = learner.as_str().to_string();
        let view = self
            .conn
            .call(move |conn| Ok(load_article_view(conn, &learner_id, article_id)?))
            .await?;
        view.ok_or_else(|| AppError::NotFound(format!("article {}", article_id)))
    }

    pub async fn vocabulary_item(&self, learner: &LearnerId, id: i64) -> Result<VocabularyItem> {
        let learner_id = learner.as_str().to_string();
        let item = self
            .conn
            .call(move |conn| Ok(find_vocabulary_by_id(conn, &learner_id, id)?))
            .await?;
        item.ok_or_else(|| AppError::NotFound(format!("vocabulary item {}", id)))
    }

    // Items whose next review is at or before `now`, most overdue first.
    pub async fn due_reviews(
        &self,
        learner: &LearnerId,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<VocabularyItem>> {
        let learner_id = learner.as_str().to_string();
        let items = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM vocabulary
                     WHERE learner_id = ?1 AND next_review_at IS NOT NULL AND next_review_at <= ?2
                     ORDER BY next_review_at, id LIMIT ?3",
                    VOCABULARY_COLUMNS
                ))?;
                let items = stmt
                    .query_map(params![learner_id, fmt_time(now), limit], |row| {
                        vocabulary_from_row(row, 0)
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    // Vocabulary updates

    // Read-modify-write of one item inside a transaction.
    pub async fn update_vocabulary<F, T>(
        &self,
        learner: &LearnerId,
        id: i64,
        apply: F,
    ) -> Result<(VocabularyItem, T)>
    where
        F: FnOnce(&mut VocabularyItem) -> T + Send + 'static,
        T: Send + 'static,
    {
        let learner_id = learner.as_str().to_string();
        let updated = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(mut item) = find_vocabulary_by_id(&tx, &learner_id, id)? else {
                    return Ok(None);
                };
                let out = apply(&mut item);
                update_vocabulary_row(&tx, &item)?;
                tx.commit()?;
                Ok(Some((item, out)))
            })
            .await
            .map_err(map_write_error)?;
        updated.ok_or_else(|| AppError::NotFound(format!("vocabulary item {}", id)))
    }

    // Grades answers against an article's quiz and applies each result to the
    // linked word. Answers naming no question of the article are ignored, and
    // only the last answer per question counts.
    pub async fn record_quiz_answers(
        &self,
        learner: &LearnerId,
        article_id: i64,
        answers: Vec<QuizAnswer>,
        now: DateTime<Utc>,
    ) -> Result<QuizScore> {
        let learner_id = learner.as_str().to_string();
        let answers = last_answer_per_question(answers);
        let score = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                if !article_exists(&tx, &learner_id, article_id)? {
                    return Ok(None);
                }
                let questions: HashMap<i64, QuizItem> = load_quiz(&tx, &learner_id, article_id)?
                    .into_iter()
                    .map(|q| (q.id, q))
                    .collect();

                let mut outcomes = Vec::new();
                for answer in &answers {
                    let Some(question) = questions.get(&answer.question_id) else {
                        tracing::debug!("Ignoring answer for unknown question {}", answer.question_id);
                        continue;
                    };
                    let correct = question.is_correct(&answer.answer);
                    tx.execute(
                        "UPDATE quiz_questions SET answered_correctly = ?1, answered_at = ?2
                         WHERE id = ?3 AND learner_id = ?4",
                        params![correct, fmt_time(now), question.id, learner_id],
                    )?;

                    let mut transition = None;
                    if let Some(vocabulary_id) = question.vocabulary_id {
                        if let Some(mut item) = find_vocabulary_by_id(&tx, &learner_id, vocabulary_id)? {
                            let outcome = ReviewOutcome {
                                correct,
                                in_context: true,
                            };
                            transition = lifecycle::record_test(&mut item, outcome, now);
                            update_vocabulary_row(&tx, &item)?;
                        }
                    }

                    outcomes.push(QuizOutcome {
                        question_id: question.id,
                        correct,
                        vocabulary_id: question.vocabulary_id,
                        transition,
                    });
                }
                tx.commit()?;

                let total = outcomes.len() as u32;
                let correct = outcomes.iter().filter(|o| o.correct).count() as u32;
                let score = if total == 0 {
                    0.0
                } else {
                    f64::from(correct) / f64::from(total)
                };
                Ok(Some(QuizScore {
                    correct,
                    total,
                    score,
                    outcomes,
                }))
            })
            .await
            .map_err(map_write_error)?;
        score.ok_or_else(|| AppError::NotFound(format!("article {}", article_id)))
    }
}

fn last_answer_per_question(answers: Vec<QuizAnswer>) -> Vec<QuizAnswer> {
    let latest: HashMap<i64, usize> = answers
        .iter()
        .enumerate()
        .map(|(i, answer)| (answer.question_id, i))
        .collect();
    if latest.len() < answers.len() {
        tracing::debug!("Dropping {} repeated quiz answers", answers.len() - latest.len());
    }
    answers
        .into_iter()
        .enumerate()
        .filter(|(i, answer)| latest.get(&answer.question_id) == Some(i))
        .map(|(_, answer)| answer)
        .collect()
}

fn allocate_in(conn: &rusqlite::Connection, collection: &str, count: u32) -> rusqlite::Result<Vec<i64>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let end: i64 = conn.query_row(
        r#"INSERT INTO id_counters (collection, value) VALUES (?1, ?2)
           ON CONFLICT(collection) DO UPDATE SET value = value + excluded.value
           RETURNING value"#,
        params![collection, count],
        |row| row.get(0),
    )?;
    let start = end - i64::from(count) + 1;
    Ok((start..=end).collect())
}

fn insert_article(
    conn: &rusqlite::Connection,
    learner_id: &str,
    bundle: &ArticleBundle,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    let draft = &bundle.draft;
    conn.execute(
        &format!(
            "INSERT INTO articles ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            ARTICLE_COLUMNS
        ),
        params![
            bundle.article_id,
            learner_id,
            draft.title,
            draft.summary,
            draft.body,
            draft.translation,
            to_json(&draft.grammar_points)?,
            to_json(&draft.sources)?,
            bundle.selection.category,
            bundle.selection.region,
            bundle.selection.topic,
            bundle.level,
            draft.word_count,
            draft.new_word_count,
            draft.review_word_count,
            fmt_time(now),
        ],
    )?;
    Ok(())
}

fn article_exists(conn: &rusqlite::Connection, learner_id: &str, article_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM articles WHERE id = ?1 AND learner_id = ?2)",
        params![article_id, learner_id],
        |row| row.get(0),
    )
}

fn load_article_view(
    conn: &rusqlite::Connection,
    learner_id: &str,
    article_id: i64,
) -> rusqlite::Result<Option<ArticleView>> {
    let article = conn
        .query_row(
            &format!(
                "SELECT {} FROM articles WHERE id = ?1 AND learner_id = ?2",
                ARTICLE_COLUMNS
            ),
            params![article_id, learner_id],
            article_from_row,
        )
        .optional()?;
    let Some(article) = article else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT av.is_new, av.is_review, av.context_sentence, {}
         FROM article_vocabulary av JOIN vocabulary v ON v.id = av.vocabulary_id
         WHERE av.article_id = ?1 AND av.learner_id = ?2
         ORDER BY av.rowid",
        prefixed(VOCABULARY_COLUMNS, "v")
    ))?;
    let vocabulary = stmt
        .query_map(params![article_id, learner_id], |row| {
            let item = vocabulary_from_row(row, 3)?;
            Ok(ArticleWord {
                vocabulary_id: item.id,
                is_new: row.get(0)?,
                is_review: row.get(1)?,
                context_sentence: row.get(2)?,
                item,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let quiz = load_quiz(conn, learner_id, article_id)?;

    Ok(Some(ArticleView {
        article,
        vocabulary,
        quiz,
    }))
}

fn load_quiz(conn: &rusqlite::Connection, learner_id: &str, article_id: i64) -> rusqlite::Result<Vec<QuizItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM quiz_questions WHERE article_id = ?1 AND learner_id = ?2 ORDER BY position",
        QUIZ_COLUMNS
    ))?;
    let quiz = stmt
        .query_map(params![article_id, learner_id], quiz_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(quiz)
}

fn find_vocabulary_by_id(
    conn: &rusqlite::Connection,
    learner_id: &str,
    id: i64,
) -> rusqlite::Result<Option<VocabularyItem>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM vocabulary WHERE id = ?1 AND learner_id = ?2",
            VOCABULARY_COLUMNS
        ),
        params![id, learner_id],
        |row| vocabulary_from_row(row, 0),
    )
    .optional()
}

fn find_vocabulary_by_key(
    conn: &rusqlite::Connection,
    learner_id: &str,
    key: &str,
) -> rusqlite::Result<Option<VocabularyItem>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM vocabulary WHERE learner_id = ?1 AND key = ?2",
            VOCABULARY_COLUMNS
        ),
        params![learner_id, key],
        |row| vocabulary_from_row(row, 0),
    )
    .optional()
}

// Quiz words that are not among the passage's candidates, matched against
// any written form the learner already tracks.
fn find_vocabulary_by_form(
    conn: &rusqlite::Connection,
    learner_id: &str,
    word: &str,
) -> rusqlite::Result<Option<i64>> {
    let word = word.trim();
    conn.query_row(
        "SELECT id FROM vocabulary
         WHERE learner_id = ?1 AND (simplified = ?2 OR traditional = ?2 OR pinyin = ?2)
         ORDER BY id LIMIT 1",
        params![learner_id, word],
        |row| row.get(0),
    )
    .optional()
}

fn insert_vocabulary_row(conn: &rusqlite::Connection, item: &VocabularyItem) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO vocabulary ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, \
             ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
            VOCABULARY_COLUMNS
        ),
        params![
            item.id,
            item.learner_id,
            item.key,
            item.simplified,
            item.traditional,
            item.pinyin,
            item.meaning,
            item.part_of_speech,
            item.level,
            item.category,
            item.status.as_str(),
            item.seen_count,
            item.tested_count,
            item.tested_correct_count,
            item.correct_in_context_count,
            item.streak,
            item.consecutive_failures,
            item.first_seen_article_id,
            fmt_time(item.first_seen_at),
            fmt_time(item.last_seen_at),
            item.last_tested_at.map(fmt_time),
            item.next_review_at.map(fmt_time),
        ],
    )?;
    Ok(())
}

fn update_vocabulary_row(conn: &rusqlite::Connection, item: &VocabularyItem) -> rusqlite::Result<()> {
    conn.execute(
        r#"UPDATE vocabulary SET
               status = ?1,
               seen_count = ?2,
               tested_count = ?3,
               tested_correct_count = ?4,
               correct_in_context_count = ?5,
               streak = ?6,
               consecutive_failures = ?7,
               last_seen_at = ?8,
               last_tested_at = ?9,
               next_review_at = ?10
           WHERE id = ?11 AND learner_id = ?12"#,
        params![
            item.status.as_str(),
            item.seen_count,
            item.tested_count,
            item.tested_correct_count,
            item.correct_in_context_count,
            item.streak,
            item.consecutive_failures,
            fmt_time(item.last_seen_at),
            item.last_tested_at.map(fmt_time),
            item.next_review_at.map(fmt_time),
            item.id,
            item.learner_id,
        ],
    )?;
    Ok(())
}

// Unique-key and primary-key collisions surface as conflicts rather than
// generic database errors.
fn map_write_error(err: tokio_rusqlite::Error) -> AppError {
    match err {
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, message))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            AppError::PersistenceConflict(message.unwrap_or_else(|| e.to_string()))
        }
        other => AppError::Database(other),
    }
}

fn prefixed(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_time(dt: DateTime<Utc>) -> String {
    // fixed width so that text ordering in SQL matches time ordering
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56.000000000Z")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_datetime(&raw).ok_or_else(|| conversion_error(idx, format!("bad timestamp: {}", raw)))
}

fn optional_time_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| conversion_error(idx, format!("bad timestamp: {}", raw))),
        None => Ok(None),
    }
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        learner_id: row.get(1)?,
        title: row.get(2)?,
        summary: row.get(3)?,
        body: row.get(4)?,
        translation: row.get(5)?,
        grammar_points: json_column(row, 6)?,
        sources: json_column(row, 7)?,
        category: row.get(8)?,
        region: row.get(9)?,
        topic: row.get(10)?,
        level: row.get(11)?,
        word_count: row.get(12)?,
        new_word_count: row.get(13)?,
        review_word_count: row.get(14)?,
        created_at: time_column(row, 15)?,
    })
}

// Reads the `VOCABULARY_COLUMNS` block starting at column `offset`.
fn vocabulary_from_row(row: &Row, offset: usize) -> rusqlite::Result<VocabularyItem> {
    let status: String = row.get(offset + 10)?;
    Ok(VocabularyItem {
        id: row.get(offset)?,
        learner_id: row.get(offset + 1)?,
        key: row.get(offset + 2)?,
        simplified: row.get(offset + 3)?,
        traditional: row.get(offset + 4)?,
        pinyin: row.get(offset + 5)?,
        meaning: row.get(offset + 6)?,
        part_of_speech: row.get(offset + 7)?,
        level: row.get(offset + 8)?,
        category: row.get(offset + 9)?,
        status: status
            .parse::<VocabStatus>()
            .map_err(|e| conversion_error(offset + 10, e.to_string()))?,
        seen_count: row.get(offset + 11)?,
        tested_count: row.get(offset + 12)?,
        tested_correct_count: row.get(offset + 13)?,
        correct_in_context_count: row.get(offset + 14)?,
        streak: row.get(offset + 15)?,
        consecutive_failures: row.get(offset + 16)?,
        first_seen_article_id: row.get(offset + 17)?,
        first_seen_at: time_column(row, offset + 18)?,
        last_seen_at: time_column(row, offset + 19)?,
        last_tested_at: optional_time_column(row, offset + 20)?,
        next_review_at: optional_time_column(row, offset + 21)?,
    })
}

fn quiz_from_row(row: &Row) -> rusqlite::Result<QuizItem> {
    let question_type: String = row.get(3)?;
    Ok(QuizItem {
        id: row.get(0)?,
        article_id: row.get(1)?,
        question: row.get(2)?,
        question_type: QuestionType::parse(&question_type)
            .ok_or_else(|| conversion_error(3, format!("unknown question type: {}", question_type)))?,
        correct_answer: row.get(4)?,
        options: json_column(row, 5)?,
        hint: row.get(6)?,
        vocabulary_id: row.get(7)?,
        answered_correctly: row.get(8)?,
        answered_at: optional_time_column(row, 9)?,
    })
}
