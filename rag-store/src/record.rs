//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Canonical passage record stored in Qdrant and used in ingestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RagRecord {
    pub id: String,
    pub text: String,
    pub source: Option<String>,
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

/// Query parameters for retrieval.
pub struct RagQuery<'a> {
    pub text: &'a str,
    pub top_k: u64,
    pub filter: Option<RagFilter>,
}

/// A single retrieval hit with score, text and source.
#[derive(Clone, Debug)]
pub struct RagHit {
    pub score: f32,
    pub text: String,
    pub source: Option<String>,
    pub payload: Value,
}

/// Exact-match payload filter; every pair must match.
#[derive(Clone, Debug, Default)]
pub struct RagFilter {
    /// Exact match on a field, e.g. `{"hospital_name": "Wallace-Hamilton"}`
    pub equals: Vec<(String, Value)>,
}

impl RagFilter {
    /// Filter with a single `field == value` condition.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            equals: vec![(field.into(), value.into())],
        }
    }
}
