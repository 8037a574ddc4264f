//! # Error Module
//!
//! Định nghĩa các domain errors cho CCBank sử dụng thiserror.

use crate::withdrawal::StageName;
use rust_decimal::Decimal;
use thiserror::Error;

/// Core domain errors.
///
/// Các lỗi nghiệp vụ cốt lõi, không liên quan đến infrastructure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    // === Money errors ===
    #[error("Insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // === Withdrawal stage errors ===
    #[error("Current stage is already completed: {0}")]
    StageAlreadyCompleted(StageName),

    #[error("Stage {0} is not part of this withdrawal")]
    StageMissing(StageName),

    #[error("Withdrawal is no longer pending (status: {0})")]
    WithdrawalClosed(String),

    #[error("Unknown stage name: {0}")]
    UnknownStage(String),

    #[error("Stage count must be between 1 and {max}, got {requested}")]
    InvalidStageCount { requested: usize, max: usize },

    // === Credential errors ===
    #[error("No OTP has been issued")]
    OtpNotIssued,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("Password reset token is invalid or has expired")]
    InvalidResetToken,

    // === Validation errors ===
    #[error("Invalid enum value: {field} = {value}")]
    InvalidEnumValue { field: String, value: String },

    #[error("Invalid period: start {start} is after end {end}")]
    InvalidPeriod { start: String, end: String },
}

/// Result type alias với CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Kiểm tra có phải lỗi insufficient balance không
    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, CoreError::InsufficientBalance { .. })
    }

    /// Kiểm tra có phải lỗi xác thực (OTP, reset token) không
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            CoreError::OtpNotIssued
                | CoreError::InvalidOtp
                | CoreError::OtpExpired
                | CoreError::InvalidResetToken
        )
    }

    pub(crate) fn invalid_enum(field: &str, value: &str) -> Self {
        CoreError::InvalidEnumValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}
