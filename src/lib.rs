//! LicitaGen - AI Data Synthesis for Brazilian Procurement Documents
//!
//! Generates the structured content behind public-procurement documents
//! (dados institucionais, ETP, TR, DFD, matriz de risco) by prompting an LLM
//! with a declared schema, recovering its unreliable JSON output and caching
//! the result per request fingerprint.
//!
//! ## Guarantees
//!
//! - **Completeness**: a returned record always carries every field the
//!   catalog lists for its document type, even when the LLM call fails.
//! - **Degraded, never broken**: transport and parsing failures collapse to
//!   placeholder-marked records; only an invalid document type is a
//!   caller-visible error.
//! - **Deduplication**: identical requests (ignoring address/date) within the
//!   cache TTL produce byte-identical records without a second LLM call.
//!
//! ## Quick Start
//!
//! ```ignore
//! use licitagen::{DocumentDataGenerator, RequestContext};
//! use licitagen::ai::provider::{ProviderConfig, create_client};
//! use licitagen::cache::MemoryCache;
//! use std::sync::Arc;
//!
//! let client = create_client(&ProviderConfig::default())?;
//! let generator = DocumentDataGenerator::new(client, Arc::new(MemoryCache::new()));
//! let record = generator.generate("etp".parse()?, &ctx).await?;
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: per-type field registries and schema derivation
//! - [`ai`]: prompts, LLM client adapter, extraction, JSON recovery
//! - [`cache`]: request fingerprinting and record stores
//! - [`generator`]: the orchestrator tying the pipeline together
//! - [`document`]: seams to the template-filling and mail collaborators

pub mod ai;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod document;
pub mod generator;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{CacheBackend, Config, ConfigLoader};

// Error types
pub use types::{LicitaError, Result};

// Domain types
pub use types::{
    DocumentType, FieldValue, GeneratedRecord, RequestContext, RiskItem, RiskLevel,
};

// Pipeline
pub use ai::provider::{LlmClient, OutputMode, ProviderConfig, create_client};
pub use cache::{RecordCache, create_cache, request_key};
pub use catalog::{FieldKind, FieldSpec};
pub use generator::DocumentDataGenerator;
