//! Shared LLM client layer: OpenAI-compatible chat completion and embeddings,
//! env-driven model profiles, unified errors and a tracing layer for binaries.

pub mod chat_message;
pub mod config;
pub mod error_handler;
pub mod services;
pub mod telemetry;

pub use chat_message::{ChatMessage, ChatRole};
pub use config::default_config::{config_openai_chat, config_openai_embedding};
pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind};
pub use services::open_ai_service::OpenAiService;
