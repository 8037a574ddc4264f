//! Business layer errors
//!
//! Operation-level error variants. Every variant is classified into one
//! [`ErrorKind`] so outer layers can map errors without matching on variants.

use ccbank_core::CoreError;
use ccbank_persistence::PersistenceError;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    InsufficientFunds,
    InvalidCredential,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::InvalidCredential => "INVALID_CREDENTIAL",
            ErrorKind::Unexpected => "UNEXPECTED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business operation errors
#[derive(Debug, Error)]
pub enum BusinessError {
    // === Validation errors ===
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid transaction ID: {0}")]
    InvalidTransactionId(String),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    // === Not found errors ===
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Withdrawal not found: {0}")]
    WithdrawalNotFound(String),

    #[error("Loan not found: {0}")]
    LoanNotFound(String),

    #[error("No repayments found for loan: {0}")]
    RepaymentsNotFound(String),

    // === Conflict errors ===
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("{entity} {id} was modified concurrently, retry the request")]
    ConcurrentModification { entity: String, id: String },

    // === Credential errors ===
    #[error("Invalid account PIN")]
    InvalidPin,

    #[error("Invalid account number or password")]
    InvalidLogin,

    #[error("Invalid email or OTP")]
    InvalidOtp,

    // === Collaborator failures ===
    #[error("Credential hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Token(String),

    #[error("Mail delivery failed: {0}")]
    Mail(String),

    // === Wrapped errors ===
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("{0}")]
    Core(#[from] CoreError),
}

/// Result type alias for business operations
pub type BusinessResult<T> = Result<T, BusinessError>;

impl From<sqlx::Error> for BusinessError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.into())
    }
}

impl BusinessError {
    /// Create insufficient balance error
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Create validation error naming the offending field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Map a persistence NotFound to a domain-specific variant, and a stale
    /// version to `ConcurrentModification`.
    pub(crate) fn from_lookup(err: PersistenceError, not_found: impl FnOnce() -> Self) -> Self {
        match err {
            PersistenceError::NotFound { .. } => not_found(),
            PersistenceError::StaleVersion { entity, id } => {
                Self::ConcurrentModification { entity, id }
            }
            other => Self::Persistence(other),
        }
    }

    /// Classify into the caller-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::InvalidAmount(_) | Self::InvalidTransactionId(_) => {
                ErrorKind::Validation
            }
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientFunds,
            Self::UserNotFound(_)
            | Self::AccountNotFound(_)
            | Self::WithdrawalNotFound(_)
            | Self::LoanNotFound(_)
            | Self::RepaymentsNotFound(_) => ErrorKind::NotFound,
            Self::UserExists(_) | Self::ConcurrentModification { .. } => ErrorKind::Conflict,
            Self::InvalidPin | Self::InvalidLogin | Self::InvalidOtp => {
                ErrorKind::InvalidCredential
            }
            Self::Hashing(_) | Self::Token(_) | Self::Mail(_) => ErrorKind::Unexpected,
            Self::Persistence(err) => match err {
                PersistenceError::NotFound { .. } => ErrorKind::NotFound,
                PersistenceError::UniqueViolation(_) | PersistenceError::StaleVersion { .. } => {
                    ErrorKind::Conflict
                }
                _ => ErrorKind::Unexpected,
            },
            Self::Core(err) => match err {
                CoreError::InsufficientBalance { .. } => ErrorKind::InsufficientFunds,
                CoreError::StageAlreadyCompleted(_)
                | CoreError::StageMissing(_)
                | CoreError::WithdrawalClosed(_) => ErrorKind::Conflict,
                CoreError::OtpNotIssued
                | CoreError::InvalidOtp
                | CoreError::OtpExpired
                | CoreError::InvalidResetToken => ErrorKind::InvalidCredential,
                CoreError::InvalidAmount(_)
                | CoreError::UnknownStage(_)
                | CoreError::InvalidStageCount { .. }
                | CoreError::InvalidEnumValue { .. }
                | CoreError::InvalidPeriod { .. } => ErrorKind::Validation,
            },
        }
    }
}
