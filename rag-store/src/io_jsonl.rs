//! JSONL helpers: strict RagRecord reader and generic Value reader.
//!
//! Provides two utilities:
//! - [`read_all_records`] → strict parsing into [`RagRecord`] (requires `id` + `text`).
//! - [`read_all_jsonl`] → tolerant parsing into raw [`serde_json::Value`].

use crate::errors::RagError;
use crate::record::RagRecord;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader};
use std::{fs::File, path::Path};
use tracing::{debug, info, warn};

/// Expected row shape for strict ingestion.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StrictRow {
    id: String,
    text: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    extra: Option<Map<String, Value>>,
}

/// Reads RagRecord JSONL strictly.
///
/// - Expects `id` and `text`, plus optional `source`, `embedding`, `extra`.
/// - Fails on the first malformed row with [`RagError::Parse`].
/// - Ignores empty lines.
///
/// # Errors
/// - [`RagError::Io`] if the file cannot be read.
/// - [`RagError::Parse`] if any line fails strict deserialization.
pub fn read_all_records(jsonl_path: impl AsRef<Path>) -> Result<Vec<RagRecord>, RagError> {
    info!("Reading strict RagRecord JSONL: {:?}", jsonl_path.as_ref());

    let file = File::open(jsonl_path.as_ref())?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let r: StrictRow = serde_json::from_str(&line)
            .map_err(|e| RagError::Parse(format!("line {} parse error: {}", i + 1, e)))?;

        out.push(RagRecord {
            id: r.id,
            text: r.text,
            source: r.source,
            embedding: r.embedding,
            extra: r.extra.unwrap_or_default().into_iter().collect(),
        });
    }

    debug!("Loaded {} strict RagRecords", out.len());
    Ok(out)
}

/// Reads arbitrary JSONL into a vector of [`serde_json::Value`].
///
/// This reader is **tolerant**:
/// - Empty lines are skipped.
/// - Malformed lines are logged (`warn!`) but not fatal.
///
/// # Errors
/// - [`RagError::Io`] if the file cannot be opened.
pub fn read_all_jsonl(jsonl_path: impl AsRef<Path>) -> Result<Vec<Value>, RagError> {
    info!("Reading generic JSONL: {:?}", jsonl_path.as_ref());

    let file = File::open(jsonl_path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(&line) {
            Ok(v) => out.push(v),
            Err(e) => {
                warn!("Skipping malformed JSON on line {}: {}", i + 1, e);
            }
        }
    }

    debug!("Loaded {} generic JSON values", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for l in lines {
            writeln!(f, "{l}").unwrap();
        }
        f
    }

    #[test]
    fn strict_reader_accepts_records() {
        let f = write_lines(&[
            r#"{"id":"r1","text":"review: clean","source":"Wallace-Hamilton"}"#,
            "",
            r#"{"id":"r2","text":"review: loud","embedding":[0.1,0.2],"extra":{"visit_id":3}}"#,
        ]);

        let recs = read_all_records(f.path()).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].source.as_deref(), Some("Wallace-Hamilton"));
        assert_eq!(recs[1].embedding.as_deref(), Some(&[0.1f32, 0.2][..]));
        assert_eq!(recs[1].extra["visit_id"], 3);
    }

    #[test]
    fn strict_reader_rejects_raw_review_rows() {
        let f = write_lines(&[r#"{"review_id":1,"review":"fine"}"#]);
        let err = read_all_records(f.path()).unwrap_err();
        assert!(matches!(err, RagError::Parse(ref m) if m.starts_with("line 1")));
    }

    #[test]
    fn tolerant_reader_skips_garbage() {
        let f = write_lines(&[r#"{"review":"a"}"#, "{not json", r#"{"review":"b"}"#]);
        let vals = read_all_jsonl(f.path()).unwrap();
        assert_eq!(vals.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_all_jsonl("/definitely/not/here.jsonl").unwrap_err();
        assert!(matches!(err, RagError::Io(_)));
    }
}
