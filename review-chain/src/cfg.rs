//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

use rag_store::{DistanceKind, RagConfig, RagFilter};
use serde_json::Value;

/// Config bag for the review chain. All fields have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct ReviewChainConfig {
    // Retrieval
    pub top_k: u64,
    pub filter: Option<RagFilter>,
    pub exact_search: bool,

    // Qdrant
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection: String,
    pub distance: DistanceKind,

    // Ingestion
    pub data_path: PathBuf,
    pub upsert_batch: usize,
    pub embedding_dim: Option<usize>,
    pub embedding_concurrency: usize,
}

impl Default for ReviewChainConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            filter: None,
            exact_search: false,
            qdrant_url: "http://127.0.0.1:6334".into(),
            qdrant_api_key: None,
            collection: "hospital_reviews".into(),
            distance: DistanceKind::Cosine,
            data_path: PathBuf::from("data/reviews.jsonl"),
            upsert_batch: 256,
            embedding_dim: None,
            embedding_concurrency: 4,
        }
    }
}

impl ReviewChainConfig {
    /// Build from environment variables, falling back to [`Default`] values.
    ///
    /// The payload filter is only set when both `REVIEWS_FILTER_KEY` and
    /// `REVIEWS_FILTER_VALUE` are present; the value is parsed as JSON when
    /// possible (`42`, `true`) and kept as a string otherwise.
    pub fn from_env() -> Self {
        let d = Self::default();

        let filter = std::env::var("REVIEWS_FILTER_KEY")
            .ok()
            .and_then(|k| {
                std::env::var("REVIEWS_FILTER_VALUE")
                    .ok()
                    .map(|v| (k, as_json(v)))
            })
            .map(|(k, v)| RagFilter::eq(k, v));

        Self {
            top_k: parse("REVIEWS_TOP_K", d.top_k).max(1),
            filter,
            exact_search: env("RAG_EXACT_SEARCH", "false") == "true",

            qdrant_url: env("QDRANT_URL", &d.qdrant_url),
            qdrant_api_key: std::env::var("QDRANT_API_KEY").ok(),
            collection: env("REVIEWS_COLLECTION", &d.collection),
            distance: parse("REVIEWS_DISTANCE", d.distance),

            data_path: std::env::var("REVIEWS_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.data_path),
            upsert_batch: parse("QDRANT_BATCH_SIZE", d.upsert_batch),
            embedding_dim: std::env::var("EMBEDDING_DIM")
                .ok()
                .and_then(|s| s.parse::<usize>().ok()),
            embedding_concurrency: parse("EMBEDDING_CONCURRENCY", d.embedding_concurrency),
        }
    }

    /// Convert to a `rag_store::RagConfig` used by `RagStore`.
    ///
    /// # Example
    /// ```
    /// # use review_chain::ReviewChainConfig;
    /// let cfg = ReviewChainConfig::default();
    /// let rag_cfg = cfg.make_rag_config();
    /// assert_eq!(rag_cfg.collection, "hospital_reviews");
    /// ```
    pub fn make_rag_config(&self) -> RagConfig {
        RagConfig {
            qdrant_url: self.qdrant_url.clone(),
            qdrant_api_key: self.qdrant_api_key.clone(),
            collection: self.collection.clone(),
            distance: self.distance,
            upsert_batch: self.upsert_batch,
            exact_search: self.exact_search,
            embedding_dim: self.embedding_dim,
            embedding_concurrency: self.embedding_concurrency,
            ..RagConfig::new_default(&self.qdrant_url, &self.collection)
        }
    }
}

fn env(k: &str, dflt: &str) -> String {
    std::env::var(k).unwrap_or_else(|_| dflt.to_string())
}

fn as_json(s: String) -> Value {
    serde_json::from_str::<Value>(&s).unwrap_or(Value::String(s))
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(dflt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_retrieve_ten_reviews() {
        let cfg = ReviewChainConfig::default();
        assert_eq!(cfg.top_k, 10);
        assert!(cfg.filter.is_none());
        assert_eq!(cfg.data_path, PathBuf::from("data/reviews.jsonl"));
    }

    #[test]
    fn rag_config_mirrors_fields() {
        let cfg = ReviewChainConfig {
            collection: "reviews_test".into(),
            upsert_batch: 64,
            embedding_dim: Some(1536),
            exact_search: true,
            ..Default::default()
        };
        let rc = cfg.make_rag_config();
        assert_eq!(rc.collection, "reviews_test");
        assert_eq!(rc.upsert_batch, 64);
        assert_eq!(rc.embedding_dim, Some(1536));
        assert!(rc.exact_search);
        assert!(rc.validate().is_ok());
    }

    #[test]
    fn filter_values_parse_as_json_when_possible() {
        assert_eq!(as_json("42".into()), serde_json::json!(42));
        assert_eq!(as_json("true".into()), serde_json::json!(true));
        assert_eq!(
            as_json("Wallace-Hamilton".into()),
            Value::String("Wallace-Hamilton".into())
        );
    }
}
