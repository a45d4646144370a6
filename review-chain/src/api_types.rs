//! Public API types re-used by callers (e.g., the CLI).

use serde::Serialize;

/// One retrieved review passage.
///
/// # Example
/// ```
/// use review_chain::Passage;
/// let p = Passage::from("review: the staff was kind");
/// assert!(p.source.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Passage {
    pub text: String,
    pub source: Option<String>,
    /// Similarity score reported by the index; `0.0` when unknown.
    pub score: f32,
}

impl From<&str> for Passage {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
            source: None,
            score: 0.0,
        }
    }
}

/// Final answer together with the exact passages passed to the model.
#[derive(Clone, Debug, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    pub context: Vec<Passage>,
}
