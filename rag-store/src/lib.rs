//! Review passage index over Qdrant: ingestion + retrieval.
//!
//! This crate provides a clean API to:
//! - Ingest review JSONL dumps with precomputed or on-the-fly embeddings
//! - Retrieve the top‑K passages for a textual query
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod config;
mod embed;
mod embed_pool;
mod errors;
mod filters;
mod ingest;
mod io_jsonl;
mod mappers;
mod normalize;
mod qdrant_facade;
mod record;
mod retrieve;

pub use config::{DistanceKind, RagConfig, VectorSpace};
pub use embed::openai::OpenAiEmbedder;
pub use embed::{EmbedFuture, EmbeddingsProvider};
pub use errors::RagError;
pub use mappers::{REVIEW_COLUMNS, map_review_row};
pub use record::{RagFilter, RagHit, RagQuery, RagRecord};

use std::path::Path;
use tracing::{debug, trace};

/// High-level facade that wires configuration and Qdrant client.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    cfg: RagConfig,
    client: qdrant_facade::QdrantFacade,
}

impl RagStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config` on invalid settings, `RagError::Qdrant` if the client cannot be built.
    pub fn new(cfg: RagConfig) -> Result<Self, RagError> {
        trace!("RagStore::new collection={}", cfg.collection);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, client })
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    /// Ingests passages from an explicit JSONL path.
    ///
    /// # Errors
    /// Returns errors on I/O, parse, vector size mismatch, or Qdrant failures.
    pub async fn ingest_file(
        &self,
        jsonl_path: impl AsRef<Path>,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<u64, RagError> {
        debug!("RagStore::ingest_file path={:?}", jsonl_path.as_ref());
        ingest::ingest_file(&self.cfg, jsonl_path, provider, &self.client).await
    }

    /// Builds RAG context for a textual query using the provided embedding provider.
    ///
    /// # Errors
    /// Returns embedding errors or Qdrant failures.
    pub async fn rag_context(
        &self,
        query: RagQuery<'_>,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<RagHit>, RagError> {
        trace!("RagStore::rag_context top_k={}", query.top_k);
        retrieve::rag_context(&self.client, query, provider, self.cfg.exact_search).await
    }
}
