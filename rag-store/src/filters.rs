//! Filter conversion to Qdrant `Filter`.
//!
//! Currently supports exact equality on scalar fields (`String`, integer `Number`, `Bool`).

use crate::record::RagFilter;
use qdrant_client::qdrant::{Condition, Filter};
use tracing::{debug, warn};

/// Converts [`RagFilter`] to a Qdrant [`Filter`] where all conditions must hold.
///
/// Supported equality values:
/// - `String` → keyword match
/// - integer `Number` → integer match
/// - `Bool` → boolean match
///
/// Other value types are skipped with a warning.
pub fn to_qdrant_filter(f: &RagFilter) -> Filter {
    debug!("filters::to_qdrant_filter equals={}", f.equals.len());

    let mut must: Vec<Condition> = Vec::with_capacity(f.equals.len());

    for (field, val) in &f.equals {
        let cond = match val {
            serde_json::Value::String(s) => Condition::matches(field.clone(), s.clone()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Condition::matches(field.clone(), i),
                None => {
                    warn!(%field, "non-integer number filters are not supported; skipped");
                    continue;
                }
            },
            serde_json::Value::Bool(b) => Condition::matches(field.clone(), *b),
            _ => {
                warn!(%field, "unsupported filter value type; skipped");
                continue;
            }
        };
        must.push(cond);
    }

    Filter::must(must)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_values_become_must_conditions() {
        let f = RagFilter {
            equals: vec![
                ("hospital_name".into(), json!("Wallace-Hamilton")),
                ("visit_id".into(), json!(42)),
                ("verified".into(), json!(true)),
            ],
        };
        let q = to_qdrant_filter(&f);
        assert_eq!(q.must.len(), 3);
        assert!(q.should.is_empty());
    }

    #[test]
    fn unsupported_values_are_skipped() {
        let f = RagFilter {
            equals: vec![
                ("score".into(), json!(0.5)),
                ("tags".into(), json!(["a"])),
                ("hospital_name".into(), json!("Jones, Taylor and Garcia")),
            ],
        };
        assert_eq!(to_qdrant_filter(&f).must.len(), 1);
    }
}
