mod client;
mod conversation;
pub mod extract;
mod retry;
mod templates;

#[cfg(test)]
pub mod testing;

pub use client::{ClaudeClient, Generator, GeneratorReply, GeneratorRequest, Turn};
pub use conversation::{Conversation, ConversationState, Transcript, MAX_CONTINUATION_ROUNDS};
pub use extract::extract_json;
pub use retry::RetryPolicy;
pub use templates::{Template, Templates};
