//! Unified Error Type System
//!
//! Centralized error types for the whole pipeline.
//!
//! ## Propagation policy
//!
//! Only [`LicitaError::InvalidDocumentType`] is allowed to reach the caller of
//! the data generator. LLM transport and parsing failures are recovered
//! locally (degraded placeholder records), so the `Generation` variant stays
//! inside the orchestrator and the provider retry loop. The `transient` flag
//! drives the transport-layer retry decision.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LicitaError {
    // -------------------------------------------------------------------------
    // System errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Request boundary
    // -------------------------------------------------------------------------
    /// Requested document type is not in the catalog. Never defaulted.
    #[error("tipo de documento inválido: {0}")]
    InvalidDocumentType(String),

    // -------------------------------------------------------------------------
    // LLM transport
    // -------------------------------------------------------------------------
    /// LLM transport, timeout or envelope failure. Recovered by the
    /// orchestrator with a placeholder record; retried by the adapter while
    /// `transient` is set.
    #[error("falha na geração de conteúdo: {message}")]
    Generation { message: String, transient: bool },

    // -------------------------------------------------------------------------
    // Ambient
    // -------------------------------------------------------------------------
    #[error("config error: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("mail error: {0}")]
    Mail(String),
}

pub type Result<T> = std::result::Result<T, LicitaError>;

impl LicitaError {
    /// Non-retryable generation failure (bad request, malformed envelope).
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            transient: false,
        }
    }

    /// Retryable generation failure (network, timeout, 429, 5xx).
    pub fn generation_transient(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            transient: true,
        }
    }

    /// Whether the transport layer may retry this failure.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Generation {
                transient: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_flag_drives_retry() {
        assert!(LicitaError::generation_transient("timeout").is_transient());
        assert!(!LicitaError::generation("envelope vazio").is_transient());
        assert!(!LicitaError::InvalidDocumentType("edital".into()).is_transient());
        assert!(!LicitaError::Config("bad".into()).is_transient());
    }

    #[test]
    fn display_keeps_context() {
        let err = LicitaError::InvalidDocumentType("edital".into());
        assert_eq!(err.to_string(), "tipo de documento inválido: edital");

        let err = LicitaError::generation("status 400");
        assert!(err.to_string().contains("status 400"));
    }
}
