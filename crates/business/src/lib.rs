//! # CCBank Business
//!
//! Business logic layer - identity, account ledger, staged withdrawals,
//! loans and notifications.
//!
//! Each service borrows a [`ServiceContext`] holding the pool and the
//! collaborators (credential hasher, token issuer, mail transport).

pub mod credentials;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod loans;
pub mod mailer;
pub mod notifications;
pub mod services;
pub mod token;
pub mod validation;
pub mod withdrawals;

#[cfg(test)]
mod testing;

pub use credentials::{Argon2Hasher, CredentialHasher};
pub use error::{BusinessError, BusinessResult, ErrorKind};
pub use identity::{IdentityService, Registered, Registration, Session, Verified};
pub use ledger::{
    BalanceAdjustment, DepositReceipt, ExternalTransaction, LedgerService, WithdrawalReceipt,
};
pub use loans::{LoanApplication, LoanService};
pub use mailer::{LogMailer, MailError, MailMessage, Mailer, MemoryMailer};
pub use notifications::NotificationService;
pub use services::{ServiceContext, Settings};
pub use token::{Claims, JwtIssuer, TokenIssuer, SESSION_TTL_SECS};
pub use withdrawals::WithdrawalService;
