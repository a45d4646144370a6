//! Embedding executor with concurrency and dimension checks.

use crate::{embed::EmbeddingsProvider, errors::RagError, record::RagRecord};
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

/// Embeds texts for records that have no precomputed vectors.
///
/// # Arguments
/// - `records`: mutable slice of `RagRecord`s.
/// - `provider`: embedding backend.
/// - `expected_dim`: if `Some`, enforces this vector size (error on mismatch).
/// - `concurrency`: maximum number of in-flight embedding requests.
///
/// # Errors
/// Returns [`RagError::VectorSizeMismatch`] if dimensions mismatch,
/// or the provider error on the first failed request.
pub async fn embed_missing(
    records: &mut [RagRecord],
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
) -> Result<(), RagError> {
    let idxs: Vec<usize> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.embedding.is_none().then_some(i))
        .collect();

    if idxs.is_empty() {
        debug!("embed_pool::embed_missing: nothing to embed");
        return Ok(());
    }

    info!(
        "embed_pool::embed_missing: missing={} of {} concurrency={}",
        idxs.len(),
        records.len(),
        concurrency
    );

    let texts: &[RagRecord] = records;
    let results: Vec<(usize, Vec<f32>)> = stream::iter(idxs)
        .map(|i| {
            let text = texts[i].text.as_str();
            async move {
                let v = provider.embed(text).await?;
                Ok::<(usize, Vec<f32>), RagError>((i, v))
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, RagError>>()?;

    for (i, v) in results {
        if let Some(want) = expected_dim {
            if v.len() != want {
                return Err(RagError::VectorSizeMismatch { got: v.len(), want });
            }
        }
        records[i].embedding = Some(v);
    }

    debug!("embed_pool::embed_missing: embeddings filled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::EmbedFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Vector of `[len(text), 1.0]`; counts calls.
    struct LenEmbedder {
        calls: AtomicUsize,
    }

    impl EmbeddingsProvider for LenEmbedder {
        fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(vec![text.len() as f32, 1.0]) })
        }
    }

    fn rec(id: &str, text: &str, embedding: Option<Vec<f32>>) -> RagRecord {
        RagRecord {
            id: id.into(),
            text: text.into(),
            source: None,
            embedding,
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn fills_only_missing_vectors() {
        let p = LenEmbedder {
            calls: AtomicUsize::new(0),
        };
        let mut recs = vec![
            rec("a", "abc", None),
            rec("b", "zz", Some(vec![9.0, 9.0])),
            rec("c", "hello", None),
        ];

        embed_missing(&mut recs, &p, Some(2), 2).await.unwrap();

        assert_eq!(p.calls.load(Ordering::SeqCst), 2);
        assert_eq!(recs[0].embedding, Some(vec![3.0, 1.0]));
        assert_eq!(recs[1].embedding, Some(vec![9.0, 9.0]));
        assert_eq!(recs[2].embedding, Some(vec![5.0, 1.0]));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_reported() {
        let p = LenEmbedder {
            calls: AtomicUsize::new(0),
        };
        let mut recs = vec![rec("a", "abc", None)];

        let err = embed_missing(&mut recs, &p, Some(3), 1).await.unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 2, want: 3 }));
        assert!(recs[0].embedding.is_none());
    }
}
