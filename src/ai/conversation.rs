use super::client::{Generator, GeneratorReply, GeneratorRequest, Turn};
use super::retry::RetryPolicy;
use crate::error::GenerationError;

pub const MAX_CONTINUATION_ROUNDS: u32 = 10;

const CONTINUE_INSTRUCTION: &str =
    "Continue where you left off. When you are done, reply with the final JSON only.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Awaiting,
    Continuing { round: u32 },
    Done,
    Aborted,
}

// Everything the generator said over one (possibly resumed) turn.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    // Text of the reply that completed the turn.
    pub final_text: String,
    // Text of every reply, paused ones included, in order.
    pub accumulated: String,
    pub rounds: u32,
}

// Drives one generator turn to completion, resuming it while the
// generator reports that it paused. Each call goes through `retry`.
pub struct Conversation<'a> {
    generator: &'a dyn Generator,
    retry: RetryPolicy,
    max_rounds: u32,
    state: ConversationState,
}

impl<'a> Conversation<'a> {
    pub fn new(generator: &'a dyn Generator, retry: RetryPolicy) -> Self {
        Self {
            generator,
            retry,
            max_rounds: MAX_CONTINUATION_ROUNDS,
            state: ConversationState::Awaiting,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub async fn run(
        &mut self,
        label: &str,
        mut request: GeneratorRequest,
    ) -> Result<Transcript, GenerationError> {
        let mut transcript = Transcript::default();
        self.state = ConversationState::Awaiting;

        loop {
            let generator = self.generator;
            let outgoing = &request;
            let reply = match self.retry.run(label, || generator.generate(outgoing)).await {
                Ok(reply) => reply,
                Err(e) => {
                    self.state = ConversationState::Aborted;
                    return Err(e);
                }
            };

            match reply {
                GeneratorReply::Complete { text } => {
                    transcript.accumulated.push_str(&text);
                    transcript.final_text = text;
                    self.state = ConversationState::Done;
                    return Ok(transcript);
                }
                GeneratorReply::Paused { text, content } => {
                    if transcript.rounds >= self.max_rounds {
                        self.state = ConversationState::Aborted;
                        tracing::error!("{} paused more than {} times", label, self.max_rounds);
                        return Err(GenerationError::ExceededContinuationBudget {
                            rounds: transcript.rounds,
                        });
                    }
                    transcript.rounds += 1;
                    if !text.is_empty() {
                        transcript.accumulated.push_str(&text);
                        transcript.accumulated.push('\n');
                    }
                    tracing::debug!("{} paused, continuing (round {})", label, transcript.rounds);

                    request.messages.push(Turn::assistant(content));
                    request.messages.push(Turn::user(CONTINUE_INSTRUCTION));
                    self.state = ConversationState::Continuing {
                        round: transcript.rounds,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedGenerator;
    use serde_json::json;

    fn paused(text: &str) -> Result<GeneratorReply, GenerationError> {
        Ok(GeneratorReply::Paused {
            text: text.to_string(),
            content: json!([{"type": "text", "text": text}]),
        })
    }

    fn complete(text: &str) -> Result<GeneratorReply, GenerationError> {
        Ok(GeneratorReply::Complete {
            text: text.to_string(),
        })
    }

    #[tokio::test]
    async fn test_resumes_until_complete() {
        let generator = ScriptedGenerator::new(vec![
            paused("searching"),
            paused("still searching"),
            complete("{\"done\": true}"),
        ]);
        let mut conversation = Conversation::new(&generator, RetryPolicy::default());

        let transcript = conversation
            .run("test", GeneratorRequest::new("sys", "go", 100))
            .await
            .unwrap();

        assert_eq!(transcript.rounds, 2);
        assert_eq!(transcript.final_text, "{\"done\": true}");
        assert!(transcript.accumulated.starts_with("searching\nstill searching\n"));
        assert_eq!(conversation.state(), ConversationState::Done);

        // the last request carries both paused turns plus a continue instruction each
        let requests = generator.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].messages.len(), 5);
    }

    #[tokio::test]
    async fn test_continuation_budget() {
        let script = (0..=MAX_CONTINUATION_ROUNDS).map(|_| paused("...")).collect();
        let generator = ScriptedGenerator::new(script);
        let mut conversation = Conversation::new(&generator, RetryPolicy::default());

        let result = conversation
            .run("test", GeneratorRequest::new("sys", "go", 100))
            .await;

        assert!(matches!(
            result,
            Err(GenerationError::ExceededContinuationBudget { rounds: MAX_CONTINUATION_ROUNDS })
        ));
        assert_eq!(conversation.state(), ConversationState::Aborted);
        assert_eq!(generator.requests().len(), MAX_CONTINUATION_ROUNDS as usize + 1);
    }
}
