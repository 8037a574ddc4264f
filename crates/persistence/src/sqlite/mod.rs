//! SQLite persistence module
//!
//! Repository pattern cho SQLite database access.

pub mod repos;
pub mod schema;

pub use repos::{
    create_memory_pool, create_pool, init_database, load_aggregate, run_migrations, AccountRepo,
    LoanRepo, NotificationRepo, RepaymentRepo, TransactionRepo, UserRepo, WithdrawalRepo,
};
pub use schema::{
    AccountRow, LoanRow, NotificationRow, RepaymentRow, TransactionRow, UserRow, WithdrawalRow,
};
