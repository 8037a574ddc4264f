//! # User Module
//!
//! User Record: thông tin hồ sơ, thông tin xác thực (hash mật khẩu, hash
//! PIN, OTP, token đặt lại mật khẩu) và aggregate gồm mọi bản ghi user sở hữu.

use crate::account::Account;
use crate::error::{CoreError, CoreResult};
use crate::id::new_id;
use crate::loan::{Loan, LoanRepayment};
use crate::notification::Notification;
use crate::withdrawal::Withdrawal;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sinh OTP 6 chữ số (100000..=999999)
pub fn generate_otp<R: Rng>(rng: &mut R) -> String {
    rng.gen_range(100_000u32..=999_999).to_string()
}

/// Trạng thái KYC mặc định khi tạo user
pub const KYC_PENDING: &str = "pending";

/// Thông tin hồ sơ do user khai báo khi đăng ký
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub account_type: String,
    pub address: String,
    pub postal_code: String,
    pub state: String,
    pub country: String,
    pub currency: String,
    pub agree: bool,
}

/// User Record.
///
/// Không implement `Serialize`: dùng [`User::profile`] để trả ra ngoài.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub details: UserDetails,
    pub kyc_status: String,
    /// Tổng số dư các account, chỉ được làm mới khi điều chỉnh số dư
    pub balance: Decimal,
    pub password_hash: String,
    pub pin_hash: String,
    pub otp: Option<String>,
    pub otp_expires: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

/// Hồ sơ user không kèm thông tin bí mật
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(flatten)]
    pub details: UserDetails,
    pub kyc_status: String,
    pub balance: Decimal,
    #[serde(rename = "dateOfAccountCreation")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(details: UserDetails, password_hash: String, pin_hash: String) -> Self {
        Self {
            id: new_id(),
            details,
            kyc_status: KYC_PENDING.to_string(),
            balance: Decimal::ZERO,
            password_hash,
            pin_hash,
            otp: None,
            otp_expires: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: Utc::now(),
            version: 0,
        }
    }

    pub fn email(&self) -> &str {
        &self.details.email
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            details: self.details.clone(),
            kyc_status: self.kyc_status.clone(),
            balance: self.balance,
            created_at: self.created_at,
        }
    }

    // === OTP ===

    /// Gán OTP mới, hết hạn sau `ttl` tính từ `now`
    pub fn issue_otp(&mut self, otp: String, now: DateTime<Utc>, ttl: Duration) {
        self.otp = Some(otp);
        self.otp_expires = Some(now + ttl);
    }

    /// Kiểm tra OTP tại thời điểm `now`. Không thay đổi state.
    pub fn check_otp(&self, candidate: &str, now: DateTime<Utc>) -> CoreResult<()> {
        let (Some(otp), Some(expires)) = (&self.otp, self.otp_expires) else {
            return Err(CoreError::OtpNotIssued);
        };

        if otp != candidate {
            return Err(CoreError::InvalidOtp);
        }
        if now > expires {
            return Err(CoreError::OtpExpired);
        }
        Ok(())
    }

    pub fn clear_otp(&mut self) {
        self.otp = None;
        self.otp_expires = None;
    }

    // === Password reset ===

    pub fn issue_reset_token(&mut self, token: String, now: DateTime<Utc>, ttl: Duration) {
        self.password_reset_token = Some(token);
        self.password_reset_expires = Some(now + ttl);
    }

    /// Token phải khớp và còn hạn (hạn tính nghiêm ngặt: `expires > now`)
    pub fn check_reset_token(&self, candidate: &str, now: DateTime<Utc>) -> CoreResult<()> {
        match (&self.password_reset_token, self.password_reset_expires) {
            (Some(token), Some(expires)) if token == candidate && expires > now => Ok(()),
            _ => Err(CoreError::InvalidResetToken),
        }
    }

    pub fn clear_reset_token(&mut self) {
        self.password_reset_token = None;
        self.password_reset_expires = None;
    }
}

/// User cùng toàn bộ bản ghi user sở hữu
#[derive(Debug, Clone, PartialEq)]
pub struct UserAggregate {
    pub user: User,
    pub accounts: Vec<Account>,
    pub withdrawals: Vec<Withdrawal>,
    pub loans: Vec<Loan>,
    pub repayments: Vec<LoanRepayment>,
    pub notifications: Vec<Notification>,
}

impl UserAggregate {
    /// Tổng số dư thực tế của các account
    pub fn total_balance(&self) -> Decimal {
        self.accounts.iter().map(|a| a.balance).sum()
    }

    pub fn account_by_number(&self, account_number: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.account_number == account_number)
    }
}
