//! Typed errors for the review-chain crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewChainError {
    /// Errors from the underlying rag-store crate (index, embeddings, Qdrant).
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Chat/embedding client errors (credentials, HTTP status, transport, timeout).
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Template construction or rendering failures.
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),
}

/// Prompt template failures. Rendering errors depend only on the template and
/// the supplied variables, so the same call always fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    /// The template has a `{name}` placeholder that was not declared.
    #[error("template uses undeclared variable `{0}`")]
    UnknownVariable(String),

    /// A declared variable was not supplied at render time.
    #[error("missing value for template variable `{0}`")]
    MissingVariable(String),

    /// A variable was declared but never used, or supplied but not declared.
    #[error("unexpected template variable `{0}`")]
    UnexpectedVariable(String),

    /// A `{` without a matching `}` (or a lone `}`) at the given byte offset.
    #[error("unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),
}
