mod ai;
mod app;
mod config;
mod db;
mod error;
mod models;
mod pipeline;
mod vocab;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use app::App;
use config::Config;
use error::{AppError, Result};
use models::{LearnerConfig, LearnerId, Overrides, QuizAnswer, ScriptMode, VocabStatus};
use vocab::ReviewOutcome;

const DEFAULT_LIST_LIMIT: u32 = 20;

#[derive(Parser, Debug)]
#[command(
    name = "graded-reader",
    about = "Graded Chinese reading passages with vocabulary review",
    version,
    arg_required_else_help = true
)]
struct Cli {
    /// Learner the command acts for (required)
    #[arg(long, global = true, value_parser = parse_learner)]
    learner: Option<LearnerId>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn learner(&self) -> Result<LearnerId> {
        self.learner
            .clone()
            .ok_or_else(|| AppError::InvalidRequest("--learner is required".to_string()))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and store a new passage with its quiz
    Generate {
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        level: Option<u8>,
    },

    /// Show a stored article with its words and quiz
    Article { id: i64 },

    /// List recent articles, newest first
    Articles {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
    },

    /// Show one tracked word
    Vocab { id: i64 },

    /// Set a word's status by hand
    VocabStatus { id: i64, status: VocabStatus },

    /// Record a test result for a word
    VocabTest {
        id: i64,
        result: TestResult,
        /// Answered while reading the passage
        #[arg(long)]
        in_context: bool,
    },

    /// Submit quiz answers as <question-id>=<answer>
    Quiz {
        article_id: i64,
        #[arg(required = true, value_parser = parse_answer)]
        answers: Vec<QuizAnswer>,
    },

    /// Words due for review
    Reviews {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
    },

    /// Show the learner's settings, or update them
    Config(Settings),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TestResult {
    Correct,
    Wrong,
}

#[derive(Args, Debug, Default)]
struct Settings {
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
    level: Option<u8>,
    #[arg(long)]
    script: Option<ScriptMode>,
    /// Target passage length in characters
    #[arg(long)]
    length: Option<u32>,
    #[arg(long)]
    new_words: Option<u32>,
    #[arg(long)]
    review_words: Option<u32>,
    #[arg(long)]
    questions: Option<u32>,
}

impl Settings {
    fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.script.is_none()
            && self.length.is_none()
            && self.new_words.is_none()
            && self.review_words.is_none()
            && self.questions.is_none()
    }

    fn apply(&self, config: &mut LearnerConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(script) = self.script {
            config.script_mode = script;
        }
        if let Some(length) = self.length {
            config.target_length = length;
        }
        if let Some(count) = self.new_words {
            config.new_words_per_article = count;
        }
        if let Some(count) = self.review_words {
            config.review_words_per_article = count;
        }
        if let Some(count) = self.questions {
            config.quiz_questions_count = count;
        }
    }
}

fn parse_learner(raw: &str) -> std::result::Result<LearnerId, String> {
    LearnerId::parse(raw).map_err(|e| e.to_string())
}

fn parse_answer(raw: &str) -> std::result::Result<QuizAnswer, String> {
    let (id, answer) = raw
        .split_once('=')
        .ok_or_else(|| format!("{:?} is not <question-id>=<answer>", raw))?;
    let question_id = id
        .trim()
        .parse()
        .map_err(|_| format!("question id must be a number, got {:?}", id))?;
    Ok(QuizAnswer {
        question_id,
        answer: answer.to_string(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let learner = cli.learner()?;

    let config = Config::load()?;
    let app = App::new(&config).await?;

    match cli.command {
        Command::Generate {
            topic,
            category,
            region,
            level,
        } => {
            let overrides = Overrides {
                topic,
                category,
                region,
                level,
            };
            print_json(&app.generate(&learner, overrides).await?)
        }
        Command::Article { id } => print_json(&app.article(&learner, id).await?),
        Command::Articles { limit } => print_json(&app.articles(&learner, limit).await?),
        Command::Vocab { id } => print_json(&app.vocabulary(&learner, id).await?),
        Command::VocabStatus { id, status } => {
            print_json(&app.set_vocabulary_status(&learner, id, status).await?)
        }
        Command::VocabTest {
            id,
            result,
            in_context,
        } => {
            let outcome = ReviewOutcome {
                correct: result == TestResult::Correct,
                in_context,
            };
            print_json(&app.record_test(&learner, id, outcome).await?)
        }
        Command::Quiz { article_id, answers } => {
            print_json(&app.submit_quiz(&learner, article_id, answers).await?)
        }
        Command::Reviews { limit } => print_json(&app.due_reviews(&learner, limit).await?),
        Command::Config(settings) => {
            if settings.is_empty() {
                print_json(&app.learner_config(&learner).await?)
            } else {
                let config = app
                    .update_learner_config(&learner, |c| settings.apply(c))
                    .await?;
                print_json(&config)
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
