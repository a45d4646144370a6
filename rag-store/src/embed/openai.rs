//! OpenAI embedding provider.
//!
//! Delegates to [`OpenAiService::embeddings`] and optionally enforces the
//! vector dimension expected by the collection.

use std::sync::Arc;

use ai_llm_service::OpenAiService;
use tracing::warn;

use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::errors::RagError;

/// Embedding provider backed by an OpenAI-compatible `/v1/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    svc: Arc<OpenAiService>,
    dim: Option<usize>,
}

impl OpenAiEmbedder {
    /// `dim`: expected vector length; `None` accepts whatever the model returns.
    pub fn new(svc: Arc<OpenAiService>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for OpenAiEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async move {
            let v = self.svc.embeddings(text).await?;

            if let Some(want) = self.dim {
                if v.len() != want {
                    warn!(got = v.len(), want, "embedding dimension mismatch");
                    return Err(RagError::VectorSizeMismatch { got: v.len(), want });
                }
            }

            Ok(v)
        })
    }
}
