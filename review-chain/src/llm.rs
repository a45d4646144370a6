//! Chat completion adapter.

use std::{future::Future, pin::Pin};

use ai_llm_service::{ChatMessage, OpenAiService};

use crate::error::ReviewChainError;

pub type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ReviewChainError>> + Send + 'a>>;

/// Sends ordered messages to a chat model and returns the generated text.
pub trait ChatModel: Send + Sync {
    fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatFuture<'a>;
}

/// Hosted OpenAI-compatible model; model id and temperature come from its config.
impl ChatModel for OpenAiService {
    fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatFuture<'a> {
        Box::pin(async move { self.chat(messages).await.map_err(ReviewChainError::from) })
    }
}
