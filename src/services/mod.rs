//! Third-party integrations consumed by the API.

/// Chat reply cache (Redis or in-process)
pub mod cache;
/// Generative-language API client
pub mod llm;

pub use cache::{CacheHandle, MemoryReplyCache, RedisReplyCache, ReplyCache};
pub use llm::{DisabledModel, GeminiClient, LanguageModel, LlmHandle};
