//! Mappers turning raw review rows into canonical `RagRecord`s.
//!
//! A raw row is a flat JSON object exported from the reviews table, e.g.
//! `{"review_id": 9, "visit_id": 6304, "review": "...", "physician_name": "...",
//! "hospital_name": "...", "patient_name": "..."}`. The passage text lists the
//! columns as `column: value` lines so the model sees who/where alongside the review.

use crate::record::RagRecord;
use serde_json::Value;
use std::collections::BTreeMap;

/// Column order used when rendering a review row as passage text.
pub const REVIEW_COLUMNS: &[&str] = &[
    "review_id",
    "visit_id",
    "review",
    "physician_name",
    "hospital_name",
    "patient_name",
];

/// Map a raw review row into a passage record.
///
/// Returns `None` when the row is not an object or has no non-empty `review`.
/// Known columns come first in [`REVIEW_COLUMNS`] order; any other scalar
/// columns follow alphabetically. Precomputed vectors under `embedding`
/// are kept.
pub fn map_review_row(v: Value) -> Option<RagRecord> {
    let obj = v.as_object()?;

    let review = obj.get("review").and_then(Value::as_str)?.trim();
    if review.is_empty() {
        return None;
    }

    let id = obj
        .get("review_id")
        .and_then(scalar_to_string)
        .map(|s| format!("review:{s}"))
        .unwrap_or_else(|| stable_hash(&v));

    let mut lines: Vec<String> = Vec::with_capacity(obj.len());
    for col in REVIEW_COLUMNS {
        if let Some(s) = obj.get(*col).and_then(scalar_to_string) {
            lines.push(format!("{col}: {s}"));
        }
    }
    for (k, val) in obj {
        if REVIEW_COLUMNS.contains(&k.as_str()) || k == "embedding" {
            continue;
        }
        if let Some(s) = scalar_to_string(val) {
            lines.push(format!("{k}: {s}"));
        }
    }

    let embedding = obj.get("embedding").and_then(pick_vec_f32);
    let source = obj
        .get("hospital_name")
        .and_then(Value::as_str)
        .map(str::to_string);

    let extra: BTreeMap<String, Value> = obj
        .iter()
        .filter(|(k, _)| k.as_str() != "embedding")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Some(RagRecord {
        id,
        text: lines.join("\n"),
        source,
        embedding,
        extra,
    })
}

// ----- small helpers -----

/// Renders strings, numbers and booleans; other types are skipped.
fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn pick_vec_f32(v: &Value) -> Option<Vec<f32>> {
    let arr = v.as_array()?;
    arr.iter().map(|x| x.as_f64().map(|f| f as f32)).collect()
}

/// Stable id for rows without `review_id`, derived from the row content.
fn stable_hash(v: &Value) -> String {
    let s = serde_json::to_string(v).unwrap_or_default();
    format!("rec_{}", uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, s.as_bytes()).simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_columns_in_fixed_order() {
        let row = json!({
            "patient_name": "Tom Bates",
            "hospital_name": "Wallace-Hamilton",
            "review": "The staff was rude at check-in.",
            "review_id": 9,
            "visit_id": 6304,
            "physician_name": "Dr. Laura Brown",
        });

        let rec = map_review_row(row).unwrap();
        assert_eq!(rec.id, "review:9");
        assert_eq!(
            rec.text,
            "review_id: 9\nvisit_id: 6304\nreview: The staff was rude at check-in.\n\
             physician_name: Dr. Laura Brown\nhospital_name: Wallace-Hamilton\npatient_name: Tom Bates"
        );
        assert_eq!(rec.source.as_deref(), Some("Wallace-Hamilton"));
        assert!(rec.embedding.is_none());
        assert_eq!(rec.extra["visit_id"], 6304);
    }

    #[test]
    fn keeps_unknown_columns_and_precomputed_vectors() {
        let row = json!({
            "review": "Parking was easy.",
            "ward": "B2",
            "embedding": [0.5, 1, -0.25],
        });

        let rec = map_review_row(row).unwrap();
        assert!(rec.id.starts_with("rec_"));
        assert_eq!(rec.text, "review: Parking was easy.\nward: B2");
        assert_eq!(rec.embedding, Some(vec![0.5, 1.0, -0.25]));
        assert!(!rec.extra.contains_key("embedding"));
    }

    #[test]
    fn rows_without_review_are_skipped() {
        assert!(map_review_row(json!({"review_id": 1, "review": "  "})).is_none());
        assert!(map_review_row(json!({"review_id": 1})).is_none());
        assert!(map_review_row(json!("review")).is_none());
    }

    #[test]
    fn fallback_id_is_stable() {
        let a = map_review_row(json!({"review": "ok"})).unwrap();
        let b = map_review_row(json!({"review": "ok"})).unwrap();
        assert_eq!(a.id, b.id);
    }
}
