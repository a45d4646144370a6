//! Question answering over hospital patient reviews.
//!
//! Public API: [`ask`] and [`ask_with_context`]. The question is embedded,
//! the top-K review passages are retrieved from Qdrant, a fixed system prompt
//! is filled with them, and an OpenAI-compatible chat model answers.
//! [`ingest_reviews`] seeds the collection from a JSONL dump.

pub mod chain;
pub mod cfg;
pub mod llm;
pub mod prompt;
pub mod retriever;

mod api_types;
mod error;

pub use api_types::{Passage, QaAnswer};
pub use cfg::ReviewChainConfig;
pub use chain::ReviewChain;
pub use error::{PromptError, ReviewChainError};

use std::path::Path;
use std::sync::Arc;

use ai_llm_service::{OpenAiService, config_openai_chat, config_openai_embedding};
use rag_store::{OpenAiEmbedder, RagStore};
use retriever::ReviewsRetriever;
use tracing::info;

/// The chain wired to Qdrant and the OpenAI-compatible API.
pub type HostedReviewChain = ReviewChain<ReviewsRetriever<OpenAiEmbedder>, OpenAiService>;

/// Builds the hosted chain from a config; credentials come from the environment.
///
/// # Errors
/// Missing `OPENAI_API_KEY`, invalid endpoints or an invalid store config.
pub fn build_chain(cfg: &ReviewChainConfig) -> Result<HostedReviewChain, ReviewChainError> {
    let store = RagStore::new(cfg.make_rag_config())?;
    let embedder = embedder(cfg)?;
    let chat = OpenAiService::new(config_openai_chat()?)?;

    let retriever = ReviewsRetriever::new(store, embedder, cfg.top_k).with_filter(cfg.filter.clone());
    ReviewChain::new(retriever, chat)
}

/// Answer a review question as plain text, using env-driven config.
///
/// # Example
/// ```no_run
/// # #[tokio::main] async fn main() {
/// let answer = review_chain::ask("Did any patients complain about staff rudeness?")
///     .await
///     .unwrap();
/// println!("{answer}");
/// # }
/// ```
pub async fn ask(question: &str) -> Result<String, ReviewChainError> {
    Ok(ask_with_context(question).await?.answer)
}

/// Answer a review question and return the passages fed to the model.
///
/// # Errors
/// Propagates configuration, retrieval, prompt and chat failures unchanged.
pub async fn ask_with_context(question: &str) -> Result<QaAnswer, ReviewChainError> {
    let chain = build_chain(&ReviewChainConfig::from_env())?;
    chain.invoke_with_context(question).await
}

/// Seed the review collection from a JSONL dump.
///
/// Uses `path` when given, otherwise `REVIEWS_DATA_PATH`. Precomputed
/// `embedding` fields are kept; other rows are embedded. Returns the
/// number of points written.
///
/// # Errors
/// I/O, parse, embedding or Qdrant failures.
pub async fn ingest_reviews(path: Option<&Path>) -> Result<u64, ReviewChainError> {
    let cfg = ReviewChainConfig::from_env();
    let path = path.unwrap_or(cfg.data_path.as_path());

    let store = RagStore::new(cfg.make_rag_config())?;
    let embedder = embedder(&cfg)?;

    let n = store.ingest_file(path, &embedder).await?;
    info!(points = n, path = %path.display(), "review index seeded");
    Ok(n)
}

fn embedder(cfg: &ReviewChainConfig) -> Result<OpenAiEmbedder, ReviewChainError> {
    let svc = OpenAiService::new(config_openai_embedding()?)?;
    Ok(OpenAiEmbedder::new(Arc::new(svc), cfg.embedding_dim))
}
