//! Default model configs loaded from environment variables.
//!
//! Two roles are provided for an OpenAI-compatible backend:
//!
//! - **Chat**      → answer generation, deterministic sampling (`temperature = 0`)
//! - **Embedding** → vectors for indexing and query lookup
//!
//! # Environment variables
//!
//! Common:
//! - `OPENAI_API_KEY`   = bearer token (mandatory)
//! - `OPENAI_BASE_URL`  = server base URL (default `https://api.openai.com`)
//! - `LLM_TIMEOUT_SECS` = request timeout in seconds (default 60)
//!
//! Chat:
//! - `CHAT_MODEL`     = chat model id (default `gpt-3.5-turbo-0125`)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//!
//! Embedding:
//! - `EMBEDDING_MODEL` = embedding model id (default `text-embedding-ada-002`)

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{AiLlmError, env_opt_u32, env_opt_u64, env_or, must_env},
};

/// Chat model used when `CHAT_MODEL` is not set.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo-0125";

/// Embedding model used when `EMBEDDING_MODEL` is not set.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Server used when `OPENAI_BASE_URL` is not set.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Shared connection settings: `(endpoint, api_key, timeout_secs)`.
fn openai_connection() -> Result<(String, String, u64), AiLlmError> {
    let api_key = must_env("OPENAI_API_KEY")?;
    let endpoint = env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL);
    let timeout = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
    Ok((endpoint, api_key, timeout))
}

/// Constructs the **chat** profile.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `CHAT_MODEL`, `OPENAI_BASE_URL`, `LLM_MAX_TOKENS`, `LLM_TIMEOUT_SECS` (optional)
///
/// # Defaults
/// - `temperature = Some(0.0)`
///
/// # Errors
/// Missing key, malformed numbers, or a config that fails [`LlmModelConfig::validate`].
pub fn config_openai_chat() -> Result<LlmModelConfig, AiLlmError> {
    let (endpoint, api_key, timeout) = openai_connection()?;
    let cfg = LlmModelConfig {
        model: env_or("CHAT_MODEL", DEFAULT_CHAT_MODEL),
        endpoint,
        api_key: Some(api_key),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(timeout),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Constructs the **embedding** profile.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `EMBEDDING_MODEL`, `OPENAI_BASE_URL`, `LLM_TIMEOUT_SECS` (optional)
///
/// # Errors
/// Missing key, malformed numbers, or a config that fails [`LlmModelConfig::validate`].
pub fn config_openai_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let (endpoint, api_key, timeout) = openai_connection()?;
    let cfg = LlmModelConfig {
        model: env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
        endpoint,
        api_key: Some(api_key),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(timeout),
    };
    cfg.validate()?;
    Ok(cfg)
}
