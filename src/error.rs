use std::time::Duration;

use thiserror::Error;

use crate::pipeline::Stage;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("rate limited by generator (suggested delay: {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("generator output could not be parsed as JSON: {excerpt}")]
    MalformedOutput { excerpt: String },

    #[error("generator payload is missing required data: {0}")]
    InvalidPayload(String),

    #[error("generator returned no usable source findings")]
    NoFindings,

    #[error("generator returned an empty {0}")]
    EmptyGeneration(&'static str),

    #[error("generator still paused after {rounds} continuation rounds")]
    ExceededContinuationBudget { rounds: u32 },

    #[error("gave up after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<GenerationError>,
    },

    #[error("generator API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<AppError>,
    },

    #[error("run timed out")]
    Timeout,

    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn at_stage(stage: Stage, source: impl Into<AppError>) -> Self {
        AppError::StageFailed {
            stage,
            source: Box::new(source.into()),
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            AppError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
