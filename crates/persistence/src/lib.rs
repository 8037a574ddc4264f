//! # CCBank Persistence
//!
//! Persistence layer cho CCBank - SQLite qua sqlx, mỗi entity một bảng.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Database                          │
//! │  ┌──────────────┐    ┌─────────────┐    ┌─────────────┐  │
//! │  │  migrations  │    │   SQLite    │    │    Repos    │  │
//! │  │   (schema)   │    │   (state)   │    │  (queries)  │  │
//! │  └──────────────┘    └─────────────┘    └─────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ccbank_persistence::{Database, AccountRepo};
//!
//! // Initialize database (create file + migrations)
//! let db = Database::init("sqlite:data/ccbank.db?mode=rwc").await?;
//!
//! // Query via repos
//! let account = AccountRepo::get_by_number(db.pool(), "1234567890").await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::{
    create_memory_pool, init_database, load_aggregate, AccountRepo, LoanRepo, NotificationRepo,
    RepaymentRepo, TransactionRepo, UserRepo, WithdrawalRepo,
};

use sqlx::SqlitePool;

/// Database facade
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Kết nối database có sẵn
    ///
    /// # Arguments
    /// * `db_url` - SQLite database URL (e.g., "sqlite:ccbank.db?mode=rwc")
    pub async fn connect(db_url: &str) -> PersistenceResult<Self> {
        let pool = sqlite::create_pool(db_url).await?;
        Ok(Self { pool })
    }

    /// Tạo file nếu cần và chạy migrations
    pub async fn init(db_url: &str) -> PersistenceResult<Self> {
        let pool = init_database(db_url).await?;
        Ok(Self { pool })
    }

    /// Database in-memory đã migrate
    pub async fn in_memory() -> PersistenceResult<Self> {
        let pool = create_memory_pool().await?;
        Ok(Self { pool })
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
