//! End-to-end ingestion pipeline: read JSONL → normalize → resolve vectors → upsert into Qdrant.
//!
//! Accepts either strict `RagRecord` rows or raw review rows (see [`crate::mappers`]).
//! The stored point is a vector plus a flat payload: `text`, `source`, `eid`
//! and every review column, so equality filters can target any of them.

use crate::config::{RagConfig, VectorSpace};
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_missing;
use crate::errors::RagError;
use crate::io_jsonl::{read_all_jsonl, read_all_records};
use crate::mappers::map_review_row;
use crate::normalize::normalize_passage;
use crate::qdrant_facade::QdrantFacade;
use crate::record::RagRecord;

use indicatif::{ProgressBar, ProgressStyle};
use qdrant_client::Payload;
use qdrant_client::qdrant::PointStruct;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Ingests passages from a JSONL file.
///
/// 1. Read strict `RagRecord` rows or raw review rows, chosen by the first row.
/// 2. Normalize text, drop empties and duplicates.
/// 3. Keep precomputed vectors, embed the rest with `provider`.
/// 4. Ensure the collection exists and upsert in batches.
///
/// Returns the number of points written.
pub async fn ingest_file(
    cfg: &RagConfig,
    jsonl_path: impl AsRef<Path>,
    provider: &dyn EmbeddingsProvider,
    client: &QdrantFacade,
) -> Result<u64, RagError> {
    info!("Ingesting file {:?}", jsonl_path.as_ref());

    let mut records = read_rows(&jsonl_path)?;

    for r in &mut records {
        r.text = normalize_passage(&r.text, cfg.max_passage_chars);
    }
    records.retain(|r| !r.text.is_empty());
    dedup_in_place(&mut records);

    if records.is_empty() {
        warn!("No passages found in {:?}", jsonl_path.as_ref());
        return Ok(0);
    }

    embed_missing(
        &mut records,
        provider,
        cfg.embedding_dim,
        cfg.embedding_concurrency,
    )
    .await?;

    let vector_size = determine_vector_size(&records, cfg.embedding_dim)?;
    debug!("Vector size determined: {}", vector_size);

    client
        .ensure_collection(&VectorSpace {
            size: vector_size,
            distance: cfg.distance,
        })
        .await?;

    let batch_size = cfg.upsert_batch.max(1);
    let pb = ProgressBar::new(records.len().div_ceil(batch_size) as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    let mut total: u64 = 0;
    for chunk in records.chunks(batch_size) {
        let points = build_points(chunk)?;
        total += client.upsert_points(points).await?;
        pb.inc(1);
    }

    pb.finish_with_message("Ingestion complete");
    info!(
        "Ingested {} passages into '{}'",
        total,
        client.collection()
    );
    Ok(total)
}

// ---------- helpers ----------

/// Picks the row format from the first row and sticks to it.
///
/// A first row with string `id` and `text` makes the whole file strict
/// `RagRecord` JSONL, and any strict error is returned as is. Otherwise rows
/// go through the review row mapper, which must recognise at least one.
fn read_rows(jsonl_path: impl AsRef<Path>) -> Result<Vec<RagRecord>, RagError> {
    let raw = read_all_jsonl(&jsonl_path)?;
    let Some(first) = raw.first() else {
        return Ok(Vec::new());
    };

    if is_record_row(first) {
        debug!("First row has id+text, reading strict RagRecords");
        return read_all_records(&jsonl_path);
    }

    let rows = raw.len();
    let out: Vec<RagRecord> = raw.into_iter().filter_map(map_review_row).collect();
    if out.is_empty() {
        return Err(RagError::Parse(format!(
            "none of {rows} rows is a RagRecord or a review row"
        )));
    }
    debug!("Mapped {} of {} review rows", out.len(), rows);
    Ok(out)
}

fn is_record_row(v: &Value) -> bool {
    v.get("id").is_some_and(Value::is_string) && v.get("text").is_some_and(Value::is_string)
}

/// Every record carries a vector at this point; they must all agree.
fn determine_vector_size(
    records: &[RagRecord],
    expected_dim: Option<usize>,
) -> Result<usize, RagError> {
    let mut size = expected_dim;
    for r in records {
        let v = r.embedding.as_ref().ok_or(RagError::MissingEmbedding)?;
        match size {
            None => size = Some(v.len()),
            Some(want) if v.len() != want => {
                return Err(RagError::VectorSizeMismatch { got: v.len(), want });
            }
            Some(_) => {}
        }
    }
    size.ok_or(RagError::MissingEmbedding)
}

/// Builds Qdrant points for a batch of embedded records.
fn build_points(chunk: &[RagRecord]) -> Result<Vec<PointStruct>, RagError> {
    let mut pts = Vec::with_capacity(chunk.len());

    for r in chunk {
        let vector = r.embedding.clone().ok_or(RagError::MissingEmbedding)?;
        let payload = Payload::try_from(Value::Object(payload_of(r)))?;
        pts.push(PointStruct::new(stable_uuid(&r.id).to_string(), vector, payload));
    }

    Ok(pts)
}

/// Flat payload: review columns first, canonical keys on top.
fn payload_of(r: &RagRecord) -> Map<String, Value> {
    let mut payload: Map<String, Value> = r
        .extra
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    payload.insert("text".into(), Value::String(r.text.clone()));
    if let Some(src) = &r.source {
        payload.insert("source".into(), Value::String(src.clone()));
    }
    payload.insert("eid".into(), Value::String(r.id.clone()));
    payload
}

/// Deterministic point id for a record id.
fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

/// Deduplicate records by `(source,text)` to avoid duplicates in Qdrant.
fn dedup_in_place(recs: &mut Vec<RagRecord>) {
    fn key_of(r: &RagRecord) -> u64 {
        let mut h = DefaultHasher::new();
        r.source.hash(&mut h);
        r.text.hash(&mut h);
        h.finish()
    }
    let mut seen: HashSet<u64> = HashSet::with_capacity(recs.len());
    recs.retain(|r| seen.insert(key_of(r)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn rec(id: &str, text: &str, source: Option<&str>) -> RagRecord {
        RagRecord {
            id: id.into(),
            text: text.into(),
            source: source.map(str::to_string),
            embedding: None,
            extra: Default::default(),
        }
    }

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for l in lines {
            writeln!(f, "{l}").unwrap();
        }
        f
    }

    #[test]
    fn review_rows_are_mapped() {
        let f = write_lines(&[
            r#"{"review_id":1,"visit_id":10,"review":"Nurses were rude.","hospital_name":"Cunningham and Sons"}"#,
            r#"{"review_id":2,"review":""}"#,
        ]);

        let recs = read_rows(f.path()).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, "review:1");
        assert!(recs[0].text.contains("review: Nurses were rude."));
    }

    #[test]
    fn strict_rows_are_read_as_records() {
        let f = write_lines(&[
            "",
            r#"{"id":"r1","text":"review: clean rooms"}"#,
            r#"{"id":"r2","text":"review: rude staff","source":"Wallace-Hamilton"}"#,
        ]);

        let recs = read_rows(f.path()).unwrap();
        let ids: Vec<_> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["r1", "r2"]);
        assert_eq!(recs[1].source.as_deref(), Some("Wallace-Hamilton"));
    }

    #[test]
    fn bad_strict_row_is_reported_not_dropped() {
        let f = write_lines(&[
            r#"{"id":"r1","text":"review: clean rooms"}"#,
            r#"{"id":"r2","text":"review: rude staff"}"#,
            r#"{"id":"r3","text":"review: ok","note":"x"}"#,
        ]);

        let err = read_rows(f.path()).unwrap_err();
        assert!(matches!(err, RagError::Parse(ref m) if m.starts_with("line 3")));
    }

    #[test]
    fn unrecognised_rows_are_a_parse_error() {
        let f = write_lines(&[r#"{"title":"a"}"#, r#"{"title":"b"}"#]);
        let err = read_rows(f.path()).unwrap_err();
        assert!(matches!(err, RagError::Parse(ref m) if m.contains("none of 2 rows")));
    }

    #[test]
    fn empty_file_yields_no_rows() {
        let f = write_lines(&["", "   "]);
        assert!(read_rows(f.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_rows("/no/such/reviews.jsonl").unwrap_err();
        assert!(matches!(err, RagError::Io(_)));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut recs = vec![
            rec("1", "same", Some("A")),
            rec("2", "same", Some("A")),
            rec("3", "same", Some("B")),
        ];
        dedup_in_place(&mut recs);
        let ids: Vec<_> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn vector_size_must_agree() {
        let mut a = rec("1", "a", None);
        let mut b = rec("2", "b", None);
        a.embedding = Some(vec![0.0; 3]);
        b.embedding = Some(vec![0.0; 4]);

        assert_eq!(determine_vector_size(&[a.clone()], None).unwrap(), 3);
        assert!(matches!(
            determine_vector_size(&[a.clone(), b], None),
            Err(RagError::VectorSizeMismatch { got: 4, want: 3 })
        ));
        assert!(matches!(
            determine_vector_size(&[a], Some(8)),
            Err(RagError::VectorSizeMismatch { got: 3, want: 8 })
        ));
    }

    #[test]
    fn payload_keeps_columns_and_canonical_keys() {
        let mut r = rec("review:9", "review: fine", Some("Wallace-Hamilton"));
        r.extra.insert("hospital_name".into(), json!("Wallace-Hamilton"));
        r.extra.insert("visit_id".into(), json!(6304));
        r.extra.insert("text".into(), json!("raw column"));
        r.extra.insert("nothing".into(), Value::Null);

        let p = payload_of(&r);
        assert_eq!(p["text"], "review: fine");
        assert_eq!(p["source"], "Wallace-Hamilton");
        assert_eq!(p["eid"], "review:9");
        assert_eq!(p["visit_id"], 6304);
        assert!(!p.contains_key("nothing"));
    }

    #[test]
    fn point_ids_are_stable() {
        assert_eq!(stable_uuid("review:9"), stable_uuid("review:9"));
        assert_ne!(stable_uuid("review:9"), stable_uuid("review:10"));
    }

    #[test]
    fn points_require_vectors() {
        let mut r = rec("1", "x", None);
        assert!(matches!(build_points(&[r.clone()]), Err(RagError::MissingEmbedding)));

        r.embedding = Some(vec![0.1, 0.2]);
        assert_eq!(build_points(&[r]).unwrap().len(), 1);
    }
}
