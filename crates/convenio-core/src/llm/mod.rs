//! LLM integration: trait seams, HTTP client, TTL cache

mod cache;
mod client;
mod traits;

pub use cache::TtlCache;
pub use client::HttpLlmClient;
pub use traits::{extract_json_object, ChatMessage, Embedder, GenerativeClient};
