//! Database schema definitions
//!
//! Row types cho sqlx mapping từ SQLite tables.
//! Schema được định nghĩa trong migrations/20260301000000_init.sql

use crate::error::{PersistenceError, PersistenceResult};
use ccbank_core::{
    Account, Loan, LoanRepayment, LoanStatus, Notification, RepaymentStatus, Stage, StageName,
    Transaction, TransactionKind, User, UserDetails, Withdrawal, WithdrawalStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse Decimal lưu dạng TEXT
pub(crate) fn parse_decimal(raw: &str) -> PersistenceResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| PersistenceError::InvalidDecimal(format!("{raw}: {e}")))
}

/// Row type cho bảng `users`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub first_name: String,
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
    pub kyc_status: String,
    pub balance: String, // Decimal stored as TEXT
    pub password_hash: String,
    pub pin_hash: String,
    pub otp: Option<String>,
    pub otp_expires: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

/// Row type cho bảng `accounts`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: String,
    pub user_id: String,
    pub account_number: String,
    pub account_type: String,
    pub currency: String,
    pub balance: String, // Decimal stored as TEXT
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

/// Row type cho bảng `transactions`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub amount: String, // Decimal stored as TEXT
    pub currency: String,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// Row type cho bảng `withdrawals`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WithdrawalRow {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub account_number: String,
    pub amount: String, // Decimal stored as TEXT
    pub currency: String,
    pub status: String,
    pub stages_json: String, // Vec<Stage> stored as JSON
    pub current_stage: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

/// Row type cho bảng `loans`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoanRow {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub principal: String,     // Decimal stored as TEXT
    pub interest_rate: String, // Decimal stored as TEXT
    pub currency: String,
    pub term_months: i64,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Row type cho bảng `loan_repayments`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RepaymentRow {
    pub id: String,
    pub loan_id: String,
    pub user_id: String,
    pub account_id: String,
    pub amount: String, // Decimal stored as TEXT
    pub currency: String,
    pub status: String,
    pub paid_at: DateTime<Utc>,
}

/// Row type cho bảng `notifications`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// === Conversion implementations ===

impl TryFrom<UserRow> for User {
    type Error = PersistenceError;

    fn try_from(row: UserRow) -> PersistenceResult<Self> {
        Ok(User {
            balance: parse_decimal(&row.balance)?,
            id: row.id,
            details: UserDetails {
                first_name: row.first_name,
                middle_name: row.middle_name,
                last_name: row.last_name,
                email: row.email,
                phone_number: row.phone_number,
                gender: row.gender,
                date_of_birth: row.date_of_birth,
                account_type: row.account_type,
                address: row.address,
                postal_code: row.postal_code,
                state: row.state,
                country: row.country,
                currency: row.currency,
                agree: row.agree,
            },
            kyc_status: row.kyc_status,
            password_hash: row.password_hash,
            pin_hash: row.pin_hash,
            otp: row.otp,
            otp_expires: row.otp_expires,
            password_reset_token: row.password_reset_token,
            password_reset_expires: row.password_reset_expires,
            created_at: row.created_at,
            version: row.version,
        })
    }
}

impl AccountRow {
    /// Ghép row với danh sách giao dịch đã load
    pub fn into_account(self, transactions: Vec<Transaction>) -> PersistenceResult<Account> {
        Ok(Account {
            balance: parse_decimal(&self.balance)?,
            id: self.id,
            user_id: self.user_id,
            account_number: self.account_number,
            account_type: self.account_type,
            currency: self.currency,
            transactions,
            created_at: self.created_at,
            version: self.version,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = PersistenceError;

    fn try_from(row: TransactionRow) -> PersistenceResult<Self> {
        let kind = TransactionKind::from_str(&row.kind)
            .ok_or_else(|| PersistenceError::invalid_enum("transaction.kind", &row.kind))?;

        Ok(Transaction {
            amount: parse_decimal(&row.amount)?,
            id: row.id,
            account_id: row.account_id,
            occurred_at: row.occurred_at,
            kind,
            currency: row.currency,
            description: row.description,
        })
    }
}

impl TryFrom<WithdrawalRow> for Withdrawal {
    type Error = PersistenceError;

    fn try_from(row: WithdrawalRow) -> PersistenceResult<Self> {
        let status = WithdrawalStatus::from_str(&row.status)
            .ok_or_else(|| PersistenceError::invalid_enum("withdrawal.status", &row.status))?;
        let stages: Vec<Stage> = serde_json::from_str(&row.stages_json)?;
        let current_stage = StageName::from_str(&row.current_stage)
            .map_err(|e| PersistenceError::InvalidValue(e.to_string()))?;

        Ok(Withdrawal {
            amount: parse_decimal(&row.amount)?,
            id: row.id,
            user_id: row.user_id,
            account_id: row.account_id,
            account_number: row.account_number,
            currency: row.currency,
            status,
            stages,
            current_stage,
            description: row.description,
            created_at: row.created_at,
            version: row.version,
        })
    }
}

impl LoanRow {
    /// Ghép row với danh sách ID repayment đã load
    pub fn into_loan(self, repayments: Vec<String>) -> PersistenceResult<Loan> {
        let status = LoanStatus::from_str(&self.status)
            .ok_or_else(|| PersistenceError::invalid_enum("loan.status", &self.status))?;
        let term_months = u32::try_from(self.term_months).map_err(|_| {
            PersistenceError::InvalidValue(format!("loan.term_months = {}", self.term_months))
        })?;

        Ok(Loan {
            principal: parse_decimal(&self.principal)?,
            interest_rate: parse_decimal(&self.interest_rate)?,
            id: self.id,
            user_id: self.user_id,
            account_id: self.account_id,
            currency: self.currency,
            term_months,
            status,
            start_date: self.start_date,
            end_date: self.end_date,
            repayments,
        })
    }
}

impl TryFrom<RepaymentRow> for LoanRepayment {
    type Error = PersistenceError;

    fn try_from(row: RepaymentRow) -> PersistenceResult<Self> {
        let status = RepaymentStatus::from_str(&row.status)
            .ok_or_else(|| PersistenceError::invalid_enum("repayment.status", &row.status))?;

        Ok(LoanRepayment {
            amount: parse_decimal(&row.amount)?,
            id: row.id,
            loan_id: row.loan_id,
            user_id: row.user_id,
            account_id: row.account_id,
            currency: row.currency,
            status,
            paid_at: row.paid_at,
        })
    }
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            user_id: row.user_id,
            message: row.message,
            created_at: row.created_at,
            read: row.read,
        }
    }
}
