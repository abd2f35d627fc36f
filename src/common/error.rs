//! Common Error Types
//!
//! Unified error taxonomy for the privacy pool and vault engine.
//!
//! Proof verification failures are NOT errors: a failing range proof or
//! withdrawal proof is an expected outcome for adversarial input and is
//! reported as an ordinary boolean/Result value by the engines themselves.

use thiserror::Error;

/// Root error type for the privacy engine
#[derive(Debug, Error)]
pub enum PrivacyError {
    /// Bad client input; no state change performed
    #[error("validation error: {0}")]
    Validation(String),

    /// The exact 32-byte commitment already exists in the pool
    #[error("duplicate commitment: {0}")]
    DuplicateCommitment(String),

    /// The nullifier was already consumed (double-spend or replay)
    #[error("nullifier already spent: {0}")]
    NullifierAlreadySpent(String),

    /// Amount outside the provable range for the requested bit length
    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),

    /// Requested milestone threshold is not in the configured set
    #[error("threshold not configured: {0}")]
    ThresholdNotConfigured(u64),

    /// Vault state corruption; the vault is halted, never silently repaired
    #[error("vault invariant violated: {0}")]
    InvariantViolation(String),

    /// Withdrawal attempted inside the vault lock period
    #[error("vault locked: {0}")]
    VaultLocked(String),

    /// Cryptographic backend or infrastructure failure
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// Storage errors
    #[error("storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// Ledger/program boundary errors
    #[error("ledger error: {0}")]
    Ledger(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrivacyError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PrivacyError::Validation(_) => "VALIDATION_ERROR",
            PrivacyError::DuplicateCommitment(_) => "DUPLICATE_COMMITMENT",
            PrivacyError::NullifierAlreadySpent(_) => "NULLIFIER_ALREADY_SPENT",
            PrivacyError::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            PrivacyError::ThresholdNotConfigured(_) => "THRESHOLD_NOT_CONFIGURED",
            PrivacyError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            PrivacyError::VaultLocked(_) => "VAULT_LOCKED",
            PrivacyError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            PrivacyError::Config(_) => "CONFIG_ERROR",
            PrivacyError::Logging(_) => "LOGGING_ERROR",
            PrivacyError::Storage(_) => "STORAGE_ERROR",
            PrivacyError::Ledger(_) => "LEDGER_ERROR",
            PrivacyError::Io(_) => "IO_ERROR",
        }
    }

    /// Infrastructure failures may be retried; protocol-integrity and
    /// validation failures must not be.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PrivacyError::BackendUnavailable(_)
                | PrivacyError::Storage(_)
                | PrivacyError::Ledger(_)
                | PrivacyError::Io(_)
        )
    }

    /// Fatal errors halt further mutation on the affected vault
    pub fn is_fatal(&self) -> bool {
        matches!(self, PrivacyError::InvariantViolation(_))
    }
}

/// Result type alias using PrivacyError
pub type Result<T> = std::result::Result<T, PrivacyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = PrivacyError::NullifierAlreadySpent("ab12".to_string());
        assert_eq!(err.error_code(), "NULLIFIER_ALREADY_SPENT");
        assert!(err.to_string().contains("ab12"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(PrivacyError::backend("prover offline").is_retryable());
        assert!(PrivacyError::ledger("rpc timeout").is_retryable());
        assert!(!PrivacyError::validation("bad wallet").is_retryable());
        assert!(!PrivacyError::DuplicateCommitment("x".into()).is_retryable());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(PrivacyError::InvariantViolation("assets=0 shares>0".into()).is_fatal());
        assert!(!PrivacyError::VaultLocked("3 days remain".into()).is_fatal());
    }
}
