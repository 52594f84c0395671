//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Record cache constants
pub mod cache {
    /// Default time-to-live for cached generated records (1 hour)
    pub const DEFAULT_TTL_SECS: u64 = 3600;

    /// Default filename for the sqlite cache backend
    pub const DEFAULT_SQLITE_FILE: &str = "licitagen-cache.db";
}

/// LLM transport constants
pub mod network {
    /// Per-request timeout for the chat-completions call (seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Total attempts per LLM call (1 initial + 2 retries)
    pub const MAX_ATTEMPTS: usize = 3;

    /// Fixed delay between attempts (milliseconds)
    pub const RETRY_DELAY_MS: u64 = 1000;
}

/// Generated-content policy constants
pub mod content {
    /// Sentinel substituted for any field the model output cannot populate
    pub const PLACEHOLDER: &str = "–";

    /// Minimum characters demanded of narrative fields by the prompts
    pub const LONG_FIELD_MIN_CHARS: usize = 300;

    /// Minimum characters for short identity fields (names, codes, dates)
    pub const SHORT_FIELD_MIN_CHARS: usize = 2;

    /// Minimum rows a generated risk matrix must carry
    pub const MIN_RISK_ITEMS: usize = 5;

    /// Legacy fallback for an absent contract value
    pub const DEFAULT_VALUE: &str = "00";
}

/// Document-assembly collaborator constants
pub mod document {
    /// Template placeholder name for the municipal coat of arms
    pub const COAT_OF_ARMS_PLACEHOLDER: &str = "brasao";

    /// Rendered width of the coat of arms (pixels, ratio preserved)
    pub const COAT_OF_ARMS_WIDTH_PX: u32 = 80;

    /// Fallback image when no municipality-specific file exists
    pub const COAT_OF_ARMS_DEFAULT: &str = "default.png";
}
