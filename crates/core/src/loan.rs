//! # Loan Module
//!
//! Khoản vay của user và các lần trả nợ gắn với khoản vay đó.

use crate::error::{CoreError, CoreResult};
use crate::id::new_id;
use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trạng thái khoản vay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Active,
    Repaid,
    Defaulted,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Active => "active",
            LoanStatus::Repaid => "repaid",
            LoanStatus::Defaulted => "defaulted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(LoanStatus::Pending),
            "active" => Some(LoanStatus::Active),
            "repaid" => Some(LoanStatus::Repaid),
            "defaulted" => Some(LoanStatus::Defaulted),
            _ => None,
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trạng thái một lần trả nợ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl RepaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepaymentStatus::Pending => "pending",
            RepaymentStatus::Completed => "completed",
            RepaymentStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(RepaymentStatus::Pending),
            "completed" => Some(RepaymentStatus::Completed),
            "failed" => Some(RepaymentStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RepaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Điều khoản của một khoản vay mới
#[derive(Debug, Clone, PartialEq)]
pub struct LoanTerms {
    pub principal: Decimal,
    pub currency: String,
    /// Lãi suất theo phần trăm
    pub interest_rate: Decimal,
    /// Kỳ hạn tính theo tháng
    pub term_months: u32,
}

/// Khoản vay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    #[serde(rename = "loanAmount")]
    pub principal: Decimal,
    pub currency: String,
    pub interest_rate: Decimal,
    #[serde(rename = "termLength")]
    pub term_months: u32,
    pub status: LoanStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    /// ID của các LoanRepayment thuộc khoản vay này
    pub repayments: Vec<String>,
}

impl Loan {
    /// Tạo khoản vay mới ở trạng thái `pending`.
    ///
    /// `end_date` = `start_date` + kỳ hạn.
    pub fn open(user_id: &str, account_id: &str, terms: LoanTerms) -> CoreResult<Self> {
        if terms.principal <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "loan amount must be positive: {}",
                terms.principal
            )));
        }

        let start_date = Utc::now();
        let end_date = start_date.checked_add_months(Months::new(terms.term_months));

        Ok(Self {
            id: new_id(),
            user_id: user_id.to_string(),
            account_id: account_id.to_string(),
            principal: terms.principal,
            currency: terms.currency,
            interest_rate: terms.interest_rate,
            term_months: terms.term_months,
            status: LoanStatus::Pending,
            start_date,
            end_date,
            repayments: Vec::new(),
        })
    }

    /// Ghi nhận một lần trả nợ.
    ///
    /// Status của khoản vay bị đặt thành `active` bất kể số tiền trả so với
    /// dư nợ; không có phép tính tổng nào ở đây.
    pub fn repay(&mut self, amount: Decimal, currency: &str) -> CoreResult<LoanRepayment> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "repayment amount must be positive: {}",
                amount
            )));
        }

        let repayment = LoanRepayment {
            id: new_id(),
            loan_id: self.id.clone(),
            user_id: self.user_id.clone(),
            account_id: self.account_id.clone(),
            amount,
            currency: currency.to_string(),
            status: RepaymentStatus::Pending,
            paid_at: Utc::now(),
        };

        self.repayments.push(repayment.id.clone());
        self.status = LoanStatus::Active;
        Ok(repayment)
    }
}

/// Một lần trả nợ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRepayment {
    pub id: String,
    pub loan_id: String,
    pub user_id: String,
    pub account_id: String,
    #[serde(rename = "repaymentAmount")]
    pub amount: Decimal,
    pub currency: String,
    pub status: RepaymentStatus,
    #[serde(rename = "date")]
    pub paid_at: DateTime<Utc>,
}
