use thiserror::Error;

/// Primary error type for matguard operations.
///
/// Storage backends and configuration loading return these. The durability
/// layer itself absorbs write and read failures (logging them) instead of
/// handing them to the host, so only the CLI and config paths ever see one.
#[derive(Error, Debug)]
pub enum MatGuardError {
    // === Write Errors ===
    /// The backing store refused a write because it would exceed its quota.
    #[error("storage quota exceeded writing '{key}': needed {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// An envelope or heartbeat could not be encoded.
    #[error("serialization failed: {detail}")]
    Serialize { detail: String },

    /// Key contains characters the backend cannot store.
    #[error("invalid storage key: '{key}'")]
    InvalidKey { key: String },

    // === Read Errors ===
    /// A tier held bytes that do not decode as an envelope.
    #[error("corrupt envelope in tier {tier}: {detail}")]
    CorruptEnvelope { tier: String, detail: String },

    /// A tier's envelope was written by a different schema version.
    #[error("schema mismatch in tier {tier}: found {found}, expected {expected}")]
    SchemaMismatch {
        tier: String,
        found: String,
        expected: String,
    },

    /// A tier's envelope metadata disagrees with its own payload.
    #[error("count mismatch in tier {tier}: metadata says {declared}, payload has {actual}")]
    CountMismatch {
        tier: String,
        declared: usize,
        actual: usize,
    },

    // === I/O Errors ===
    /// File I/O error from a durable backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Configuration Errors ===
    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {detail}")]
    Config { detail: String },

    // === Internal Errors ===
    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`MatGuardError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A tier could not be written; the write is treated as a no-op.
    WriteFailure,
    /// A tier could not be read or decoded; the tier is treated as absent.
    ReadFailure,
    /// Bad configuration supplied by the host or operator.
    Config,
    /// Broken internal invariant.
    Internal,
}

impl MatGuardError {
    /// Classify this error.
    #[allow(clippy::match_same_arms)]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::QuotaExceeded { .. } | Self::Serialize { .. } | Self::InvalidKey { .. } => {
                ErrorKind::WriteFailure
            }
            Self::CorruptEnvelope { .. }
            | Self::SchemaMismatch { .. }
            | Self::CountMismatch { .. } => ErrorKind::ReadFailure,
            Self::Io(_) => ErrorKind::WriteFailure,
            Self::Config { .. } => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether a retry after freeing space or waiting could succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. } | Self::Io(_))
    }

    /// Human-friendly suggestion for fixing this error.
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::QuotaExceeded { .. } => {
                Some("Free browser storage or clear stale backup tiers, then retry")
            }
            Self::CorruptEnvelope { .. } | Self::CountMismatch { .. } => {
                Some("Recover from another tier; this tier will be overwritten on the next save")
            }
            Self::SchemaMismatch { .. } => {
                Some("The snapshot was written by another version; export it before clearing")
            }
            Self::Config { .. } => Some("Check the configuration file against the documented keys"),
            _ => None,
        }
    }

    /// Create a serialization error.
    pub fn serialize(detail: impl Into<String>) -> Self {
        Self::Serialize {
            detail: detail.into(),
        }
    }

    /// Create a corrupt-envelope error.
    pub fn corrupt(tier: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::CorruptEnvelope {
            tier: tier.into(),
            detail: detail.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `MatGuardError`.
pub type Result<T> = std::result::Result<T, MatGuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_quota() {
        let err = MatGuardError::QuotaExceeded {
            key: "warehouse-materials".to_owned(),
            needed: 4096,
            available: 100,
        };
        assert_eq!(
            err.to_string(),
            "storage quota exceeded writing 'warehouse-materials': needed 4096 bytes, 100 available"
        );
    }

    #[test]
    fn error_display_count_mismatch() {
        let err = MatGuardError::CountMismatch {
            tier: "backup-1".to_owned(),
            declared: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "count mismatch in tier backup-1: metadata says 3, payload has 2"
        );
    }

    #[test]
    fn kind_mapping() {
        assert_eq!(
            MatGuardError::serialize("bad float").kind(),
            ErrorKind::WriteFailure
        );
        assert_eq!(
            MatGuardError::corrupt("primary", "eof").kind(),
            ErrorKind::ReadFailure
        );
        assert_eq!(
            MatGuardError::SchemaMismatch {
                tier: "emergency".to_owned(),
                found: "0.9".to_owned(),
                expected: "1.0".to_owned(),
            }
            .kind(),
            ErrorKind::ReadFailure
        );
        assert_eq!(MatGuardError::config("x").kind(), ErrorKind::Config);
        assert_eq!(MatGuardError::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn is_transient() {
        let quota = MatGuardError::QuotaExceeded {
            key: "k".to_owned(),
            needed: 2,
            available: 1,
        };
        assert!(quota.is_transient());
        assert!(!MatGuardError::corrupt("primary", "x").is_transient());
        assert!(!MatGuardError::internal("bug").is_transient());
    }

    #[test]
    fn suggestions() {
        assert!(MatGuardError::corrupt("primary", "x").suggestion().is_some());
        assert!(MatGuardError::config("x").suggestion().is_some());
        assert!(MatGuardError::internal("x").suggestion().is_none());
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: MatGuardError = io_err.into();
        assert!(matches!(err, MatGuardError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::WriteFailure);
    }
}
