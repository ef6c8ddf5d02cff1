use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::{Generator, GeneratorReply, GeneratorRequest};
use crate::error::GenerationError;

pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<GeneratorReply, GenerationError>>>,
    requests: Mutex<Vec<GeneratorRequest>>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<GeneratorReply, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|text| {
                    Ok(GeneratorReply::Complete {
                        text: text.to_string(),
                    })
                })
                .collect(),
        )
    }

    pub fn requests(&self) -> Vec<GeneratorRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GeneratorRequest) -> Result<GeneratorReply, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Api("script exhausted".to_string())))
    }
}
