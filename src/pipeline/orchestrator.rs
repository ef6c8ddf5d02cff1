use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::TryFutureExt;
use serde_json::{json, Value};
use tokio::sync::watch;

use super::markers::{demote_trivial, strip_markers, visible_length};
use super::payload::{parse_discovery, parse_passage, parse_quiz};
use super::topics::{plan_topic, SIMILARITY_WINDOW};
use super::{RunState, Stage};
use crate::ai::{
    extract_json, Conversation, Generator, GeneratorRequest, RetryPolicy, Template, Templates,
    Transcript,
};
use crate::db::{Repository, ARTICLES, VOCABULARY};
use crate::error::{AppError, GenerationError, Result};
use crate::models::{
    ArticleBundle, ArticleView, GenerationRequest, PassageDraft, QuizDraft, SourceFinding,
    TopicSelection,
};
use crate::vocab::CommonTermFilter;

const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_SEARCH_BUDGET: u32 = 5;

const MAX_FINDINGS: usize = 3;
const RECENT_SOURCES: u32 = 20;
const KNOWN_WORDS_FETCHED: u32 = 100;
const KNOWN_WORDS_IN_PROMPT: usize = 30;

const TOPIC_MAX_TOKENS: u32 = 4096;
const PASSAGE_MAX_TOKENS: u32 = 8192;
const QUIZ_MAX_TOKENS: u32 = 4096;

// Nothing is written until every stage has succeeded; the merge is one transaction.
pub struct Orchestrator {
    generator: Arc<dyn Generator>,
    repository: Arc<Repository>,
    templates: Arc<Templates>,
    filter: CommonTermFilter,
    retry: RetryPolicy,
    run_timeout: Duration,
    search_budget: u32,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn Generator>,
        repository: Arc<Repository>,
        templates: Arc<Templates>,
    ) -> Self {
        Self {
            generator,
            repository,
            templates,
            filter: CommonTermFilter::new(),
            retry: RetryPolicy::default(),
            run_timeout: DEFAULT_RUN_TIMEOUT,
            search_budget: DEFAULT_SEARCH_BUDGET,
        }
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn with_search_budget(mut self, budget: u32) -> Self {
        self.search_budget = budget;
        self
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<ArticleView> {
        let (progress, _) = watch::channel(RunState::SelectingTopic);
        self.generate_with_progress(request, &progress).await
    }

    // Like `generate`, publishing every state change on `progress`.
    pub async fn generate_with_progress(
        &self,
        request: GenerationRequest,
        progress: &watch::Sender<RunState>,
    ) -> Result<ArticleView> {
        tracing::info!(
            "Generating passage for learner {} at level {}",
            request.learner,
            request.level()
        );

        let outcome = tokio::time::timeout(self.run_timeout, self.generate_content(&request, progress)).await;
        let bundle = match outcome {
            Ok(Ok(bundle)) => bundle,
            Ok(Err(e)) => return Err(fail(progress, e)),
            Err(_) => {
                let stage = progress.borrow().stage().unwrap_or(Stage::Topic);
                tracing::error!("Run for learner {} timed out during {}", request.learner, stage);
                return Err(fail(progress, AppError::at_stage(stage, AppError::Timeout)));
            }
        };

        progress.send_replace(RunState::Merging);
        let view = self
            .repository
            .persist_run(&request.learner, bundle, Utc::now())
            .await
            .map_err(|e| fail(progress, AppError::at_stage(Stage::Merge, e)))?;

        tracing::info!(
            "Stored article {} with {} words and {} questions",
            view.article.id,
            view.vocabulary.len(),
            view.quiz.len()
        );
        progress.send_replace(RunState::Persisted {
            article_id: view.article.id,
        });
        Ok(view)
    }

    async fn generate_content(
        &self,
        request: &GenerationRequest,
        progress: &watch::Sender<RunState>,
    ) -> Result<ArticleBundle> {
        progress.send_replace(RunState::SelectingTopic);
        let (selection, findings) = self
            .discover(request)
            .await
            .map_err(|e| AppError::at_stage(Stage::Topic, e))?;

        progress.send_replace(RunState::Drafting);
        let draft = self
            .draft(request, &selection, &findings)
            .await
            .map_err(|e| AppError::at_stage(Stage::Draft, e))?;

        progress.send_replace(RunState::QuizGenerating);
        let (quiz, (article_id, vocabulary_ids)) = tokio::try_join!(
            self.write_quiz(request, &draft)
                .map_err(|e| AppError::at_stage(Stage::Quiz, e)),
            self.allocate(draft.candidates.len())
                .map_err(|e| AppError::at_stage(Stage::Allocation, e)),
        )?;

        Ok(ArticleBundle {
            article_id,
            vocabulary_ids,
            selection,
            level: request.level(),
            draft,
            quiz,
            findings,
        })
    }

    async fn discover(&self, request: &GenerationRequest) -> Result<(TopicSelection, Vec<SourceFinding>)> {
        let recent = self
            .repository
            .recent_articles(&request.learner, SIMILARITY_WINDOW as u32)
            .await?;
        let recent_sources = self
            .repository
            .recent_source_urls(&request.learner, RECENT_SOURCES)
            .await?;
        let plan = plan_topic(&request.config, &request.overrides, &recent);
        tracing::debug!("Topic plan: {} / {}", plan.category, plan.region);

        let system = self
            .templates
            .render(
                Template::TopicDiscovery,
                &[
                    ("finding_count", "2-3".to_string()),
                    ("category", plan.category.clone()),
                    ("region", plan.region.clone()),
                    (
                        "topic",
                        plan.topic_hint.clone().unwrap_or_else(|| "your choice".to_string()),
                    ),
                    ("recent_titles", bullet_list(&plan.avoid_titles)),
                    ("recent_sources", bullet_list(&recent_sources)),
                ],
            )
            .await?;
        let user = format!(
            "Find material for a level {} passage about {} in {}.",
            request.level(),
            plan.category,
            plan.region
        );
        let call = GeneratorRequest::new(system, user, TOPIC_MAX_TOKENS).with_search(self.search_budget);

        let transcript = self.converse("topic discovery", call).await?;
        let mut discovery = parse_discovery(&extract_payload(&transcript)?)?;
        discovery.findings.truncate(MAX_FINDINGS);

        let topic = plan
            .topic_hint
            .or(discovery.topic)
            .or_else(|| discovery.findings.first().map(|f| f.headline.clone()))
            .unwrap_or_else(|| plan.category.clone());
        tracing::debug!("Found {} findings for {:?}", discovery.findings.len(), topic);

        Ok((
            TopicSelection {
                category: plan.category,
                region: plan.region,
                topic,
            },
            discovery.findings,
        ))
    }

    async fn draft(
        &self,
        request: &GenerationRequest,
        selection: &TopicSelection,
        findings: &[SourceFinding],
    ) -> Result<PassageDraft> {
        let known = self
            .repository
            .top_known_words(&request.learner, KNOWN_WORDS_FETCHED)
            .await?;
        let known_words: Vec<String> = known
            .iter()
            .take(KNOWN_WORDS_IN_PROMPT)
            .map(|w| format!("{} ({}): {}", w.simplified, w.pinyin, w.meaning))
            .collect();

        let config = &request.config;
        let system = self
            .templates
            .render(
                Template::Passage,
                &[
                    ("level", request.level().to_string()),
                    ("script", config.script_mode.describe().to_string()),
                    ("target_length", config.target_length.to_string()),
                    ("new_words", config.new_words_per_article.to_string()),
                    ("review_words", config.review_words_per_article.to_string()),
                    ("known_words", bullet_list(&known_words)),
                ],
            )
            .await?;
        let user = serde_json::to_string_pretty(&json!({
            "topic": selection,
            "findings": findings,
        }))?;
        let call = GeneratorRequest::new(system, user, PASSAGE_MAX_TOKENS);

        let transcript = self.converse("passage draft", call).await?;
        let draft = parse_passage(&extract_payload(&transcript)?)?;
        Ok(clean_draft(draft, &self.filter, config.new_words_per_article))
    }

    async fn write_quiz(&self, request: &GenerationRequest, draft: &PassageDraft) -> Result<Vec<QuizDraft>> {
        let wanted = request.config.quiz_questions_count;
        let system = self
            .templates
            .render(
                Template::Quiz,
                &[
                    ("level", request.level().to_string()),
                    ("question_count", wanted.to_string()),
                ],
            )
            .await?;
        let vocabulary: Vec<String> = draft
            .candidates
            .iter()
            .map(|c| format!("{} ({}): {}", c.simplified, c.pinyin, c.meaning))
            .collect();
        let user = format!(
            "Title: {}\n\nPassage:\n{}\n\nVocabulary:\n{}",
            draft.title,
            strip_markers(&draft.body),
            bullet_list(&vocabulary)
        );
        let call = GeneratorRequest::new(system, user, QUIZ_MAX_TOKENS);

        let transcript = self.converse("quiz", call).await?;
        let mut quiz = parse_quiz(&extract_payload(&transcript)?)?;
        if quiz.len() < wanted as usize {
            tracing::warn!("Quiz has {} usable questions, {} requested", quiz.len(), wanted);
        }
        quiz.truncate(wanted as usize);
        Ok(quiz)
    }

    // Article id plus one vocabulary id per candidate. Candidates that turn
    // out to be known words leave their id unused.
    async fn allocate(&self, candidates: usize) -> Result<(i64, Vec<i64>)> {
        let article_id = self
            .repository
            .allocate_ids(ARTICLES, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("id counter returned no article id"))?;
        let vocabulary_ids = self
            .repository
            .allocate_ids(VOCABULARY, candidates as u32)
            .await?;
        tracing::debug!("Allocated article {} and {} vocabulary ids", article_id, vocabulary_ids.len());
        Ok((article_id, vocabulary_ids))
    }

    async fn converse(&self, label: &str, call: GeneratorRequest) -> std::result::Result<Transcript, GenerationError> {
        let mut conversation = Conversation::new(self.generator.as_ref(), self.retry);
        let transcript = conversation.run(label, call).await.inspect_err(|e| {
            tracing::warn!("{} ended {:?}: {}", label, conversation.state(), e);
        })?;
        if transcript.rounds > 0 {
            tracing::debug!("{} needed {} continuation rounds", label, transcript.rounds);
        }
        Ok(transcript)
    }
}

fn fail(progress: &watch::Sender<RunState>, error: AppError) -> AppError {
    let stage = error.stage().unwrap_or(Stage::Merge);
    tracing::error!("Generation run failed: {}", error);
    progress.send_replace(RunState::Failed {
        stage,
        cause: error.to_string(),
    });
    error
}

// The final reply usually holds the payload on its own. When a paused turn
// split it across replies, the whole transcript is tried instead.
fn extract_payload(transcript: &Transcript) -> std::result::Result<Value, GenerationError> {
    match extract_json(&transcript.final_text) {
        Ok(value) => Ok(value),
        Err(e) if transcript.accumulated != transcript.final_text => {
            tracing::debug!("Final reply held no payload, trying full transcript");
            extract_json(&transcript.accumulated).map_err(|_| e)
        }
        Err(e) => Err(e),
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

// Removes markers where they do not belong, unmarks trivial words and
// recounts what is left.
fn clean_draft(mut draft: PassageDraft, filter: &CommonTermFilter, expected_new: u32) -> PassageDraft {
    draft.title = strip_markers(&draft.title);
    draft.summary = strip_markers(&draft.summary);
    draft.translation = strip_markers(&draft.translation);

    let scrubbed = demote_trivial(&draft.body, filter);
    if !scrubbed.demoted.is_empty() {
        tracing::debug!("Unmarked trivial words: {}", scrubbed.demoted.join(", "));
    }
    draft.body = scrubbed.body;
    draft.new_word_count = scrubbed.new_count;
    draft.review_word_count = scrubbed.review_count;
    draft.word_count = visible_length(&draft.body);

    draft.candidates.retain(|candidate| {
        let trivial = filter.is_trivial_candidate(candidate);
        if trivial {
            tracing::debug!("Dropping trivial vocabulary entry {}", candidate.simplified);
        }
        !trivial
    });

    if draft.new_word_count != expected_new {
        tracing::warn!(
            "Passage marks {} new words, {} requested",
            draft.new_word_count,
            expected_new
        );
    }
    if let Some(declared) = draft.declared_new_word_count {
        if declared != draft.new_word_count {
            tracing::debug!("Generator declared {} new words, body marks {}", declared, draft.new_word_count);
        }
    }
    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedGenerator;
    use crate::ai::GeneratorReply;
    use crate::config::LearnerDefaults;
    use crate::models::{LearnerId, Overrides, VocabStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const TOPIC_REPLY: &str = r#"Here is what I found:
```json
{
  "category": "economy",
  "region": "taiwan",
  "topic": "chip exports",
  "findings": [
    {"headline": "Exports hit record", "source_name": "Focus Taiwan",
     "url": "https://focustaiwan.tw/business/1", "date": "2026-03-01",
     "facts": ["Exports rose 20%"], "numbers": ["20%"]},
    {"headline": "New fab opens", "source_name": "CNA", "facts": ["Opened in March"]}
  ]
}
```"#;

    const PASSAGE_REPLY: &str = r#"{
  "title": "台湾{{new:出口}}创新高",
  "summary": "台湾的{{new:出口}}增加了。",
  "body": "今年台湾的{{new:经济}}很好，{{new:出口}}增加了百分之二十。{{new:我们}}都很高兴。",
  "translation": "Taiwan's economy is good this year.",
  "grammar_points": [{"pattern": "增加了", "explanation": "completed change"}],
  "sources": [{"name": "Focus Taiwan", "url": "https://focustaiwan.tw/business/1"}],
  "new_word_count": 3,
  "vocabulary": [
    {"simplified": "经济", "traditional": "經濟", "pinyin": "jīngjì", "meaning": "economy",
     "sentence": "今年台湾的经济很好。", "is_new": true},
    {"simplified": "出口", "pinyin": "chūkǒu", "meaning": "export", "is_new": true},
    {"simplified": "我们", "pinyin": "wǒmen", "meaning": "we", "is_new": true},
  ]
}"#;

    const QUIZ_REPLY: &str = r#"{"questions": [
  {"question": "“经济”是什么意思？", "type": "short_answer", "correct_answer": "economy", "word": "经济"},
  {"question": "出口增加了多少？", "type": "multiple_choice", "correct_answer": "20%",
   "options": ["10%", "20%", "30%"], "word": "出口"},
  {"question": "台湾的经济很好。", "type": "true_false", "correct_answer": "true"}
]}"#;

    struct Fixture {
        _dir: TempDir,
        repository: Arc<Repository>,
        generator: Arc<ScriptedGenerator>,
        orchestrator: Orchestrator,
    }

    async fn fixture(generator: ScriptedGenerator) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.db");
        let repository = Arc::new(Repository::new(path.to_str().unwrap()).await.unwrap());
        let generator = Arc::new(generator);
        let orchestrator = Orchestrator::new(
            generator.clone(),
            repository.clone(),
            Arc::new(Templates::new(None)),
        );
        Fixture {
            _dir: dir,
            repository,
            generator,
            orchestrator,
        }
    }

    fn request(quiz_questions: u32) -> GenerationRequest {
        let mut config = LearnerDefaults::default().to_learner_config();
        config.level = 3;
        config.new_words_per_article = 2;
        config.quiz_questions_count = quiz_questions;
        GenerationRequest::new(LearnerId::parse("L1").unwrap(), config, Overrides::default()).unwrap()
    }

    #[tokio::test]
    async fn test_full_run_persists_article_words_and_quiz() {
        let fx = fixture(ScriptedGenerator::replying(&[TOPIC_REPLY, PASSAGE_REPLY, QUIZ_REPLY])).await;
        let (progress, states) = watch::channel(RunState::SelectingTopic);

        let view = fx
            .orchestrator
            .generate_with_progress(request(2), &progress)
            .await
            .unwrap();

        assert_eq!(
            *states.borrow(),
            RunState::Persisted {
                article_id: view.article.id
            }
        );

        let article = &view.article;
        assert_eq!(article.title, "台湾出口创新高");
        assert_eq!(article.summary, "台湾的出口增加了。");
        assert!(article.body.contains("{{new:经济}}"));
        assert!(!article.body.contains("{{new:我们}}"));
        assert!(article.body.contains("我们都很高兴"));
        assert_eq!(article.new_word_count, 2);
        assert_eq!(article.level, 3);
        assert_eq!(article.topic, "chip exports");

        let words: Vec<&str> = view.vocabulary.iter().map(|w| w.item.simplified.as_str()).collect();
        assert_eq!(words, vec!["经济", "出口"]);
        assert!(view
            .vocabulary
            .iter()
            .all(|w| w.item.status == VocabStatus::Learning && w.item.seen_count == 1));

        assert_eq!(view.quiz.len(), 2);
        assert_eq!(view.quiz[0].vocabulary_id, Some(view.vocabulary[0].vocabulary_id));
        assert_eq!(view.quiz[1].vocabulary_id, Some(view.vocabulary[1].vocabulary_id));

        let requests = fx.generator.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].search_budget, Some(DEFAULT_SEARCH_BUDGET));
        assert!(requests[1].system.contains("HSK 3"));
        assert!(requests[1].search_budget.is_none());

        let recent = fx
            .repository
            .recent_articles(&LearnerId::parse("L1").unwrap(), 10)
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[tokio::test]
    async fn test_no_findings_fails_topic_stage_without_writing() {
        let fx = fixture(ScriptedGenerator::replying(&[r#"{"findings": []}"#])).await;
        let (progress, states) = watch::channel(RunState::SelectingTopic);

        let err = fx
            .orchestrator
            .generate_with_progress(request(2), &progress)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Topic));
        assert!(matches!(
            &err,
            AppError::StageFailed { source, .. }
                if matches!(**source, AppError::Generation(GenerationError::NoFindings))
        ));
        assert!(matches!(
            *states.borrow(),
            RunState::Failed {
                stage: Stage::Topic,
                ..
            }
        ));
        let recent = fx
            .repository
            .recent_articles(&LearnerId::parse("L1").unwrap(), 10)
            .await
            .unwrap();
        assert!(recent.is_empty());
    }

    #[tokio::test]
    async fn test_empty_quiz_fails_quiz_stage_without_writing() {
        let fx = fixture(ScriptedGenerator::replying(&[
            TOPIC_REPLY,
            PASSAGE_REPLY,
            r#"{"questions": []}"#,
        ]))
        .await;

        let err = fx.orchestrator.generate(request(2)).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Quiz));

        let learner = LearnerId::parse("L1").unwrap();
        assert!(fx.repository.recent_articles(&learner, 10).await.unwrap().is_empty());
        assert!(fx.repository.top_known_words(&learner, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paused_passage_is_resumed() {
        let paused = Ok(GeneratorReply::Paused {
            text: "Searching...".to_string(),
            content: json!([{"type": "text", "text": "Searching..."}]),
        });
        let script = vec![
            Ok(GeneratorReply::Complete {
                text: TOPIC_REPLY.to_string(),
            }),
            paused,
            Ok(GeneratorReply::Complete {
                text: PASSAGE_REPLY.to_string(),
            }),
            Ok(GeneratorReply::Complete {
                text: QUIZ_REPLY.to_string(),
            }),
        ];
        let fx = fixture(ScriptedGenerator::new(script)).await;

        let view = fx.orchestrator.generate(request(3)).await.unwrap();
        assert_eq!(view.quiz.len(), 3);
        // the resumed call carries the paused content and a continue turn
        assert_eq!(fx.generator.requests()[2].messages.len(), 3);
    }

    struct StalledGenerator;

    #[async_trait]
    impl Generator for StalledGenerator {
        async fn generate(
            &self,
            _request: &GeneratorRequest,
        ) -> std::result::Result<GeneratorReply, GenerationError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_timeout_names_stage_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.db");
        let repository = Arc::new(Repository::new(path.to_str().unwrap()).await.unwrap());
        let orchestrator = Orchestrator::new(
            Arc::new(StalledGenerator),
            repository.clone(),
            Arc::new(Templates::new(None)),
        );

        let err = orchestrator.generate(request(2)).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Topic));
        assert!(matches!(
            err,
            AppError::StageFailed { source, .. } if matches!(*source, AppError::Timeout)
        ));
        let recent = repository
            .recent_articles(&LearnerId::parse("L1").unwrap(), 10)
            .await
            .unwrap();
        assert!(recent.is_empty());
    }

    // Holds back the quiz reply until an article id has been allocated.
    struct WaitsForAllocation {
        inner: ScriptedGenerator,
        db_path: std::path::PathBuf,
        calls: AtomicUsize,
    }

    impl WaitsForAllocation {
        fn articles_allocated(&self) -> i64 {
            rusqlite::Connection::open(&self.db_path)
                .and_then(|conn| {
                    conn.query_row(
                        "SELECT value FROM id_counters WHERE collection = ?1",
                        [ARTICLES],
                        |row| row.get(0),
                    )
                })
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl Generator for WaitsForAllocation {
        async fn generate(
            &self,
            request: &GeneratorRequest,
        ) -> std::result::Result<GeneratorReply, GenerationError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 2 {
                let mut waited = 0;
                while self.articles_allocated() == 0 {
                    if waited == 200 {
                        return Err(GenerationError::Api("article id never allocated".to_string()));
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    waited += 1;
                }
            }
            self.inner.generate(request).await
        }
    }

    #[tokio::test]
    async fn test_quiz_runs_alongside_id_allocation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.db");
        let repository = Arc::new(Repository::new(path.to_str().unwrap()).await.unwrap());
        let generator = WaitsForAllocation {
            inner: ScriptedGenerator::replying(&[TOPIC_REPLY, PASSAGE_REPLY, QUIZ_REPLY]),
            db_path: path,
            calls: AtomicUsize::new(0),
        };
        let orchestrator = Orchestrator::new(
            Arc::new(generator),
            repository.clone(),
            Arc::new(Templates::new(None)),
        );

        let view = orchestrator.generate(request(2)).await.unwrap();
        assert_eq!(view.article.id, 1);
        assert_eq!(view.quiz.len(), 2);
    }

    #[test]
    fn test_clean_draft_counts_surviving_markers() {
        let draft = parse_passage(&extract_json(PASSAGE_REPLY).unwrap()).unwrap();
        let cleaned = clean_draft(draft, &CommonTermFilter::new(), 2);

        assert_eq!(cleaned.new_word_count, 2);
        assert_eq!(cleaned.review_word_count, 0);
        assert_eq!(cleaned.candidates.len(), 2);
        assert_eq!(cleaned.word_count, visible_length(&cleaned.body));
        assert!(!cleaned.title.contains("{{"));
    }

    #[test]
    fn test_extract_payload_falls_back_to_transcript() {
        let transcript = Transcript {
            final_text: "] }".to_string(),
            accumulated: r#"{"questions": [{"question": "q", "correct_answer": "a"}"#.to_string() + "\n] }",
            rounds: 1,
        };
        let value = extract_payload(&transcript).unwrap();
        assert!(value.get("questions").is_some());
    }
}
