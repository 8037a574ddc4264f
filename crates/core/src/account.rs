//! # Account Module
//!
//! Định nghĩa Account (tài khoản thanh toán của user) và Transaction
//! (bản ghi append-only trong sổ giao dịch của Account).
//!
//! Số tài khoản là chuỗi 10 chữ số, chữ số đầu khác 0.

use crate::error::{CoreError, CoreResult};
use crate::id::new_id;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Số nhỏ nhất / lớn nhất có 10 chữ số
const ACCOUNT_NUMBER_MIN: u64 = 1_000_000_000;
const ACCOUNT_NUMBER_MAX: u64 = 9_999_999_999;

/// Rút ngẫu nhiên một số tài khoản 10 chữ số.
///
/// Hàm này không kiểm tra trùng lặp; việc retry khi trùng do tầng
/// business thực hiện với dữ liệu của toàn bộ store.
pub fn draw_account_number<R: Rng>(rng: &mut R) -> String {
    rng.gen_range(ACCOUNT_NUMBER_MIN..=ACCOUNT_NUMBER_MAX).to_string()
}

/// Kiểm tra định dạng số tài khoản
pub fn is_valid_account_number(raw: &str) -> bool {
    raw.len() == 10 && raw.bytes().all(|b| b.is_ascii_digit()) && !raw.starts_with('0')
}

/// Loại giao dịch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
    Deposit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
            TransactionKind::Deposit => "deposit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit" => Some(TransactionKind::Credit),
            "debit" => Some(TransactionKind::Debit),
            "deposit" => Some(TransactionKind::Deposit),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Một giao dịch đã ghi sổ. Bất biến sau khi append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    #[serde(rename = "date")]
    pub occurred_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
}

impl Transaction {
    /// Tạo transaction mới với ID sinh tự động, thời điểm hiện tại
    pub fn new(
        account_id: &str,
        kind: TransactionKind,
        amount: Decimal,
        currency: &str,
        description: &str,
    ) -> Self {
        Self {
            id: new_id(),
            account_id: account_id.to_string(),
            occurred_at: Utc::now(),
            kind,
            amount,
            currency: currency.to_string(),
            description: description.to_string(),
        }
    }
}

/// Tài khoản của user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub account_number: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub currency: String,
    pub balance: Decimal,
    pub transactions: Vec<Transaction>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: i64,
}

/// Thông tin rút gọn của Account (không kèm giao dịch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_number: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub balance: Decimal,
    pub currency: String,
}

impl Account {
    /// Mở tài khoản mới với số dư 0
    pub fn open(user_id: &str, account_number: &str, account_type: &str, currency: &str) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            account_number: account_number.to_string(),
            account_type: account_type.to_string(),
            currency: currency.to_string(),
            balance: Decimal::ZERO,
            transactions: Vec::new(),
            created_at: Utc::now(),
            version: 0,
        }
    }

    fn ensure_positive(amount: Decimal) -> CoreResult<()> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "amount must be positive: {}",
                amount
            )));
        }
        Ok(())
    }

    /// Nạp tiền: cộng số dư và ghi giao dịch `deposit` theo currency của account
    pub fn deposit(&mut self, amount: Decimal) -> CoreResult<Transaction> {
        Self::ensure_positive(amount)?;
        self.balance += amount;

        let tx = Transaction::new(
            &self.id,
            TransactionKind::Deposit,
            amount,
            &self.currency,
            "Deposit",
        );
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Trừ tiền, từ chối nếu số dư không đủ. Không ghi giao dịch.
    pub fn debit(&mut self, amount: Decimal) -> CoreResult<Decimal> {
        Self::ensure_positive(amount)?;
        if self.balance < amount {
            return Err(CoreError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }

    /// Điều chỉnh số dư theo một số có dấu. Không có sàn: số dư có thể âm.
    pub fn adjust(&mut self, delta: Decimal) -> Decimal {
        self.balance += delta;
        self.balance
    }

    /// Append một giao dịch có sẵn (ví dụ từ hệ thống bên ngoài)
    pub fn record(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            account_number: self.account_number.clone(),
            account_type: self.account_type.clone(),
            balance: self.balance,
            currency: self.currency.clone(),
        }
    }

    /// Sao kê các giao dịch trong khoảng `[start, end]` (bao gồm hai đầu)
    pub fn statement(&self, period: Period) -> Statement {
        let transactions = self
            .transactions
            .iter()
            .filter(|tx| period.contains(tx.occurred_at))
            .cloned()
            .collect();

        Statement {
            account_number: self.account_number.clone(),
            account_type: self.account_type.clone(),
            balance: self.balance,
            currency: self.currency.clone(),
            transactions,
            period,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account {} ({}, {} {})",
            self.account_number, self.account_type, self.balance, self.currency
        )
    }
}

/// Lấy `limit` giao dịch mới nhất, sắp xếp giảm dần theo thời gian
pub fn most_recent(mut transactions: Vec<Transaction>, limit: usize) -> Vec<Transaction> {
    transactions.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    transactions.truncate(limit);
    transactions
}

/// Đầu mút của một khoảng thời gian
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Khoảng thời gian đóng `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Period {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> CoreResult<Self> {
        if start_date > end_date {
            return Err(CoreError::InvalidPeriod {
                start: start_date.to_rfc3339(),
                end: end_date.to_rfc3339(),
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_date && at <= self.end_date
    }

    /// Parse một đầu mút: RFC 3339 hoặc `YYYY-MM-DD`.
    ///
    /// Ngày trơn được hiểu là đầu ngày (Start) hoặc cuối ngày (End) theo UTC.
    pub fn parse_bound(raw: &str, bound: Bound) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Utc));
        }

        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
        let time = match bound {
            Bound::Start => NaiveTime::from_hms_opt(0, 0, 0)?,
            Bound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)?,
        };
        Some(Utc.from_utc_datetime(&date.and_time(time)))
    }
}

/// Sao kê của một Account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub account_number: String,
    pub account_type: String,
    pub balance: Decimal,
    pub currency: String,
    pub transactions: Vec<Transaction>,
    pub period: Period,
}
