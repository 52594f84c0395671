//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/licitagen/) and project (licitagen.toml) level
//! configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ai::provider::ProviderConfig;
use crate::constants::cache as cache_constants;
use crate::types::{LicitaError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider settings
    pub llm: ProviderConfig,

    /// Generated-record cache settings
    pub cache: CacheConfig,

    /// Document-assembly collaborator settings
    pub documents: DocumentsConfig,

    /// Notification mail settings
    pub mail: MailConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `LicitaError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(LicitaError::Config(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(LicitaError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_attempts == 0 {
            return Err(LicitaError::Config(
                "llm.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.cache.ttl_secs == 0 {
            return Err(LicitaError::Config(
                "cache.ttl_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Cache Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store backend
    pub backend: CacheBackend,

    /// Database file for the sqlite backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Time-to-live for cached records (seconds)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            path: None,
            ttl_secs: cache_constants::DEFAULT_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sqlite,
}

// =============================================================================
// Documents Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory holding the DOCX templates
    pub templates_dir: PathBuf,

    /// Directory receiving generated documents
    pub output_dir: PathBuf,

    /// Directory holding municipal coat-of-arms images
    pub coat_of_arms_dir: PathBuf,

    /// Base URL under which generated documents are served
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            templates_dir: "templates".into(),
            output_dir: "documents".into(),
            coat_of_arms_dir: "brasoes".into(),
            public_base_url: None,
        }
    }
}

// =============================================================================
// Mail Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Whether generated-document notifications are sent at all
    pub enabled: bool,

    /// Sender address for notifications
    pub sender: String,

    /// Optional reply-to address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sender: "nao-responda@licitagen.gov.br".to_string(),
            reply_to: None,
        }
    }
}
