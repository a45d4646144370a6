//! Retriever adapter: question → top-k review passages from the vector index.

use std::{future::Future, pin::Pin};

use rag_store::{EmbeddingsProvider, RagFilter, RagQuery, RagStore};
use tracing::{Instrument, debug, debug_span};

use crate::api_types::Passage;
use crate::error::ReviewChainError;

pub type PassagesFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Passage>, ReviewChainError>> + Send + 'a>>;

/// Returns passages for a question, best match first.
pub trait Retriever: Send + Sync {
    fn retrieve<'a>(&'a self, question: &'a str) -> PassagesFuture<'a>;
}

/// Retriever over the Qdrant review collection.
///
/// No retries, caching or re-ranking: the order and count are whatever the
/// index returns for `top_k`.
pub struct ReviewsRetriever<E> {
    store: RagStore,
    embedder: E,
    top_k: u64,
    filter: Option<RagFilter>,
}

impl<E: EmbeddingsProvider> ReviewsRetriever<E> {
    pub fn new(store: RagStore, embedder: E, top_k: u64) -> Self {
        Self {
            store,
            embedder,
            top_k,
            filter: None,
        }
    }

    /// Restrict retrieval to passages whose payload matches `filter`.
    pub fn with_filter(mut self, filter: Option<RagFilter>) -> Self {
        self.filter = filter;
        self
    }
}

impl<E: EmbeddingsProvider> Retriever for ReviewsRetriever<E> {
    fn retrieve<'a>(&'a self, question: &'a str) -> PassagesFuture<'a> {
        let span = debug_span!(
            "retrieve",
            collection = %self.store.config().collection,
            top_k = self.top_k,
            filtered = self.filter.is_some()
        );

        Box::pin(
            async move {
                let query = RagQuery {
                    text: question,
                    top_k: self.top_k,
                    filter: self.filter.clone(),
                };
                let hits = self.store.rag_context(query, &self.embedder).await?;
                debug!(hits = hits.len(), "retrieved review passages");

                let passages: Vec<Passage> = hits
                    .into_iter()
                    .map(|h| Passage {
                        text: h.text,
                        source: h.source,
                        score: h.score,
                    })
                    .collect();
                Ok::<_, ReviewChainError>(passages)
            }
            .instrument(span),
        )
    }
}
