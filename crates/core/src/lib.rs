//! # CCBank Core
//!
//! Domain types cho CCBank: User Record, Account + Transaction, Withdrawal
//! (state machine theo stage), Loan + LoanRepayment, Notification.
//!
//! Crate này không biết gì về storage hay HTTP; mọi rule ở đây là hàm thuần
//! trên dữ liệu trong bộ nhớ.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ccbank_core::{Account, Withdrawal, DEFAULT_STAGE_COUNT};
//!
//! let mut account = Account::open(&user_id, "1234567890", "savings", "USD");
//! account.deposit(dec!(100))?;
//! account.debit(dec!(100))?;
//!
//! let withdrawal = Withdrawal::initiate(&account, dec!(100), "USD", "rent", DEFAULT_STAGE_COUNT)?;
//! ```

pub mod account;
pub mod error;
pub mod id;
pub mod loan;
pub mod notification;
pub mod user;
pub mod withdrawal;

pub use account::{
    draw_account_number, is_valid_account_number, most_recent, Account, AccountSummary, Bound,
    Period, Statement, Transaction, TransactionKind,
};
pub use error::{CoreError, CoreResult};
pub use id::{is_well_formed_id, new_id};
pub use loan::{Loan, LoanRepayment, LoanStatus, LoanTerms, RepaymentStatus};
pub use notification::Notification;
pub use user::{generate_otp, User, UserAggregate, UserDetails, UserProfile, KYC_PENDING};
pub use withdrawal::{
    stage_plan, Advance, Stage, StageName, Withdrawal, WithdrawalStatus, DEFAULT_STAGE_COUNT,
    STAGE_CATALOG_LEN,
};
