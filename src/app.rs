use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::ai::{ClaudeClient, Generator, Templates};
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{
    ArticleView, GenerationRequest, LearnerConfig, LearnerId, Overrides, QuizAnswer, QuizScore,
    RecentArticle, VocabStatus, VocabularyItem,
};
use crate::pipeline::{Orchestrator, RunState};
use crate::vocab::lifecycle::{self, ReviewOutcome, Transition};

pub struct App {
    config: Config,
    repository: Arc<Repository>,
    // None when no API key is configured; only generation needs it.
    orchestrator: Option<Orchestrator>,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let generator = match &config.anthropic_api_key {
            Some(key) => {
                let client = ClaudeClient::new(
                    key.clone(),
                    config.model.clone(),
                    Duration::from_secs(config.request_timeout_secs),
                )?;
                tracing::debug!("Using generator model {}", client.model_version());
                Some(Arc::new(client) as Arc<dyn Generator>)
            }
            None => None,
        };
        Self::with_generator(config, generator).await
    }

    pub async fn with_generator(config: &Config, generator: Option<Arc<dyn Generator>>) -> Result<Self> {
        let repository = Arc::new(Repository::new(&config.db_path).await?);
        let templates = Arc::new(Templates::new(config.prompt_dir.clone()));

        let orchestrator = generator.map(|generator| {
            Orchestrator::new(generator, repository.clone(), templates)
                .with_run_timeout(Duration::from_secs(config.run_timeout_secs))
                .with_search_budget(config.search_budget)
        });

        Ok(Self {
            config: config.clone(),
            repository,
            orchestrator,
        })
    }

    pub async fn learner_config(&self, learner: &LearnerId) -> Result<LearnerConfig> {
        match self.repository.learner_config(learner).await? {
            Some(config) => Ok(config),
            None => Ok(self.config.learner_defaults.to_learner_config()),
        }
    }

    pub async fn update_learner_config<F>(&self, learner: &LearnerId, edit: F) -> Result<LearnerConfig>
    where
        F: FnOnce(&mut LearnerConfig),
    {
        let mut config = self.learner_config(learner).await?;
        edit(&mut config);
        if !(1..=6).contains(&config.level) {
            return Err(AppError::InvalidRequest(format!(
                "level must be between 1 and 6, got {}",
                config.level
            )));
        }
        self.repository.save_learner_config(learner, &config).await?;
        tracing::info!("Saved settings for learner {}", learner);
        Ok(config)
    }

    pub async fn generate(&self, learner: &LearnerId, overrides: Overrides) -> Result<ArticleView> {
        let orchestrator = self.orchestrator.as_ref().ok_or_else(|| {
            AppError::Config("anthropic_api_key is not set; it is required to generate passages".to_string())
        })?;

        let config = self.learner_config(learner).await?;
        let request = GenerationRequest::new(learner.clone(), config, overrides)?;

        let (progress, mut states) = watch::channel(RunState::SelectingTopic);
        let watcher = tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let state = states.borrow_and_update().clone();
                tracing::info!("Run state: {:?}", state);
                if state.is_terminal() {
                    break;
                }
            }
        });

        let result = orchestrator.generate_with_progress(request, &progress).await;
        drop(progress);
        watcher.await.ok();
        result
    }

    pub async fn article(&self, learner: &LearnerId, article_id: i64) -> Result<ArticleView> {
        self.repository.article_view(learner, article_id).await
    }

    pub async fn articles(&self, learner: &LearnerId, limit: u32) -> Result<Vec<RecentArticle>> {
        self.repository.recent_articles(learner, limit).await
    }

    pub async fn vocabulary(&self, learner: &LearnerId, id: i64) -> Result<VocabularyItem> {
        self.repository.vocabulary_item(learner, id).await
    }

    pub async fn set_vocabulary_status(
        &self,
        learner: &LearnerId,
        id: i64,
        status: VocabStatus,
    ) -> Result<VocabularyItem> {
        let now = Utc::now();
        let (item, transition) = self
            .repository
            .update_vocabulary(learner, id, move |item| lifecycle::set_status(item, status, now))
            .await?;
        log_transition(&item, transition);
        Ok(item)
    }

    pub async fn record_test(
        &self,
        learner: &LearnerId,
        id: i64,
        outcome: ReviewOutcome,
    ) -> Result<VocabularyItem> {
        let now = Utc::now();
        let (item, transition) = self
            .repository
            .update_vocabulary(learner, id, move |item| lifecycle::record_test(item, outcome, now))
            .await?;
        log_transition(&item, transition);
        Ok(item)
    }

    pub async fn submit_quiz(
        &self,
        learner: &LearnerId,
        article_id: i64,
        answers: Vec<QuizAnswer>,
    ) -> Result<QuizScore> {
        let score = self
            .repository
            .record_quiz_answers(learner, article_id, answers, Utc::now())
            .await?;
        for outcome in &score.outcomes {
            if let (Some(id), Some(t)) = (outcome.vocabulary_id, outcome.transition) {
                tracing::info!("Vocabulary {} moved from {} to {}", id, t.from, t.to);
            }
        }
        Ok(score)
    }

    pub async fn due_reviews(&self, learner: &LearnerId, limit: u32) -> Result<Vec<VocabularyItem>> {
        self.repository.due_reviews(learner, Utc::now(), limit).await
    }
}

fn log_transition(item: &VocabularyItem, transition: Option<Transition>) {
    if let Some(t) = transition {
        tracing::info!("Vocabulary {} ({}) moved from {} to {}", item.id, item.simplified, t.from, t.to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    async fn app() -> (TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir.path().join("reader.db").to_string_lossy().to_string(),
            ..Config::default()
        };
        let app = App::with_generator(&config, None).await.unwrap();
        (dir, app)
    }

    #[tokio::test]
    async fn test_generate_requires_api_key() {
        let (_dir, app) = app().await;
        let learner = LearnerId::parse("L1").unwrap();
        let err = app.generate(&learner, Overrides::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_learner_config_falls_back_to_defaults_then_persists() {
        let (_dir, app) = app().await;
        let learner = LearnerId::parse("L1").unwrap();
        assert_eq!(app.learner_config(&learner).await.unwrap().level, 3);

        let saved = assert_ok!(app.update_learner_config(&learner, |c| c.level = 5).await);
        assert_eq!(saved.level, 5);
        assert_eq!(app.learner_config(&learner).await.unwrap().level, 5);

        let other = LearnerId::parse("L2").unwrap();
        assert_eq!(app.learner_config(&other).await.unwrap().level, 3);

        let err = assert_err!(app.update_learner_config(&learner, |c| c.level = 9).await);
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_unknown_vocabulary_is_not_found() {
        let (_dir, app) = app().await;
        let learner = LearnerId::parse("L1").unwrap();
        let err = app
            .set_vocabulary_status(&learner, 7, VocabStatus::Known)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = assert_err!(app.vocabulary(&learner, 7).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
