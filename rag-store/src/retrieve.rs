//! Retrieval helpers: low-level vector search and high-level RAG context.

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::filters::to_qdrant_filter;
use crate::qdrant_facade::QdrantFacade;
use crate::record::{RagHit, RagQuery};

use qdrant_client::qdrant::Filter;
use serde_json::Value;
use tracing::trace;

/// Performs a low-level similarity search given a ready query vector.
///
/// # Errors
/// Returns `RagError::Qdrant` on client failures.
async fn search_by_vector(
    client: &QdrantFacade,
    query_vector: Vec<f32>,
    top_k: u64,
    filter: Option<Filter>,
    with_payload: bool,
    exact: bool,
) -> Result<Vec<(f32, Value)>, RagError> {
    trace!("retrieve::search_by_vector top_k={top_k} with_payload={with_payload} exact={exact}");
    client
        .search(query_vector, top_k, filter, with_payload, exact)
        .await
}

/// Embeds the query text and returns at most `top_k` hits, best first.
///
/// # Errors
/// Returns embedding/provider errors or Qdrant failures.
pub async fn rag_context(
    client: &QdrantFacade,
    query: RagQuery<'_>,
    provider: &dyn EmbeddingsProvider,
    exact: bool,
) -> Result<Vec<RagHit>, RagError> {
    trace!(
        "retrieve::rag_context top_k={} filter={}",
        query.top_k,
        query.filter.is_some()
    );

    let qv = provider.embed(query.text).await?;
    let filter = query.filter.as_ref().map(to_qdrant_filter);

    let hits = search_by_vector(client, qv, query.top_k, filter, true, exact).await?;

    let out: Vec<RagHit> = hits
        .into_iter()
        .map(|(score, payload)| hit_from_payload(score, payload))
        .collect();

    trace!("retrieve::rag_context hits={}", out.len());
    Ok(out)
}

fn hit_from_payload(score: f32, payload: Value) -> RagHit {
    let text = payload
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let source = payload
        .get("source")
        .and_then(Value::as_str)
        .map(str::to_string);
    RagHit {
        score,
        text,
        source,
        payload,
    }
}
