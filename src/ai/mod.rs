//! AI Integration Layer
//!
//! Prompt construction, the LLM client adapter, response extraction and the
//! JSON recovery ladder.

pub mod extract;
pub mod prompt;
pub mod provider;
pub mod recovery;

pub use extract::{clean_raw, extract_raw};
pub use provider::{
    ChatEnvelope, ChatRequest, LlmClient, OpenAiClient, OutputMode, ProviderConfig, SharedClient,
    create_client,
};
pub use recovery::{ensure_complete, placeholder_record, recover};
