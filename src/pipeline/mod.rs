pub mod markers;
mod orchestrator;
pub mod payload;
pub mod topics;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use orchestrator::Orchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Topic,
    Draft,
    Quiz,
    Allocation,
    Merge,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Topic => "topic",
            Stage::Draft => "draft",
            Stage::Quiz => "quiz",
            Stage::Allocation => "allocation",
            Stage::Merge => "merge",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    SelectingTopic,
    Drafting,
    QuizGenerating,
    Merging,
    Persisted { article_id: i64 },
    Failed { stage: Stage, cause: String },
}

impl RunState {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RunState::SelectingTopic => Some(Stage::Topic),
            RunState::Drafting => Some(Stage::Draft),
            RunState::QuizGenerating => Some(Stage::Quiz),
            RunState::Merging => Some(Stage::Merge),
            RunState::Persisted { .. } => None,
            RunState::Failed { stage, .. } => Some(*stage),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Persisted { .. } | RunState::Failed { .. })
    }
}
