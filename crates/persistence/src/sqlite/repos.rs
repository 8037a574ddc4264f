//! Repository implementations cho SQLite
//!
//! CRUD operations cho tất cả các tables.
//!
//! Các hàm ghi nhận một `Executor` bất kỳ để business layer có thể gọi
//! chúng trên pool hoặc bên trong một `sqlx::Transaction` (`&mut *tx`).
//! Các hàm đọc nhiều bảng nhận `&SqlitePool`.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use ccbank_core::{
    Account, Loan, LoanRepayment, LoanStatus, Notification, Transaction, User, UserAggregate,
    Withdrawal,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::str::FromStr;

// ============================================================================
// User Repository
// ============================================================================

/// Repository cho users table
pub struct UserRepo;

impl UserRepo {
    /// Thêm user mới. Email trùng trả về `UniqueViolation`.
    pub async fn insert<'e, E>(executor: E, user: &User) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let d = &user.details;
        sqlx::query(
            r#"
            INSERT INTO users (
                id, first_name, middle_name, last_name, email, phone_number, gender,
                date_of_birth, account_type, address, postal_code, state, country, currency,
                agree, kyc_status, balance, password_hash, pin_hash, otp, otp_expires,
                password_reset_token, password_reset_expires, created_at, version
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&d.first_name)
        .bind(&d.middle_name)
        .bind(&d.last_name)
        .bind(&d.email)
        .bind(&d.phone_number)
        .bind(&d.gender)
        .bind(d.date_of_birth)
        .bind(&d.account_type)
        .bind(&d.address)
        .bind(&d.postal_code)
        .bind(&d.state)
        .bind(&d.country)
        .bind(&d.currency)
        .bind(d.agree)
        .bind(&user.kyc_status)
        .bind(user.balance.to_string())
        .bind(&user.password_hash)
        .bind(&user.pin_hash)
        .bind(&user.otp)
        .bind(user.otp_expires)
        .bind(&user.password_reset_token)
        .bind(user.password_reset_expires)
        .bind(user.created_at)
        .bind(user.version)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Lấy user theo ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<User> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("User", id))?
            .try_into()
    }

    /// Tìm user theo email
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> PersistenceResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Tìm user theo password-reset token
    pub async fn find_by_reset_token(
        pool: &SqlitePool,
        token: &str,
    ) -> PersistenceResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE password_reset_token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Lấy tất cả users theo thứ tự tạo
    pub async fn get_all(pool: &SqlitePool) -> PersistenceResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY rowid")
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// Ghi OTP (hoặc xóa OTP khi truyền None)
    pub async fn set_otp<'e, E>(
        executor: E,
        id: &str,
        otp: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE users SET otp = ?, otp_expires = ? WHERE id = ?")
            .bind(otp)
            .bind(expires)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("User", id));
        }
        Ok(())
    }

    /// Ghi (hoặc xóa, khi `None`) password-reset token
    pub async fn set_reset_token<'e, E>(
        executor: E,
        id: &str,
        token: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE users SET password_reset_token = ?, password_reset_expires = ? WHERE id = ?",
        )
        .bind(token)
        .bind(expires)
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("User", id));
        }
        Ok(())
    }

    /// Đổi password hash
    pub async fn set_password<'e, E>(
        executor: E,
        id: &str,
        password_hash: &str,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("User", id));
        }
        Ok(())
    }

    /// Cập nhật tổng số dư của user
    pub async fn set_balance<'e, E>(
        executor: E,
        id: &str,
        balance: Decimal,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE users SET balance = ?, version = version + 1 WHERE id = ?")
            .bind(balance.to_string())
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("User", id));
        }
        Ok(())
    }

    /// Xóa user; các bản ghi con bị xóa theo ON DELETE CASCADE
    pub async fn delete<'e, E>(executor: E, id: &str) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("User", id));
        }
        Ok(())
    }

    /// Đếm users
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Account Repository
// ============================================================================

/// Repository cho accounts table
pub struct AccountRepo;

impl AccountRepo {
    /// Thêm account mới (không kèm giao dịch). Số tài khoản trùng trả về
    /// `UniqueViolation`.
    pub async fn insert<'e, E>(executor: E, account: &Account) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, user_id, account_number, account_type, currency, balance, created_at, version)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.user_id)
        .bind(&account.account_number)
        .bind(&account.account_type)
        .bind(&account.currency)
        .bind(account.balance.to_string())
        .bind(account.created_at)
        .bind(account.version)
        .execute(executor)
        .await?;
        Ok(())
    }

    async fn hydrate(pool: &SqlitePool, row: AccountRow) -> PersistenceResult<Account> {
        let transactions = TransactionRepo::get_by_account(pool, &row.id).await?;
        row.into_account(transactions)
    }

    /// Lấy account theo ID, kèm giao dịch
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Account", id))?;
        Self::hydrate(pool, row).await
    }

    /// Lấy account theo số tài khoản, kèm giao dịch
    pub async fn get_by_number(pool: &SqlitePool, number: &str) -> PersistenceResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE account_number = ?")
            .bind(number)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Account", number))?;
        Self::hydrate(pool, row).await
    }

    /// Kiểm tra số tài khoản đã tồn tại trong toàn bộ store chưa
    pub async fn number_exists(pool: &SqlitePool, number: &str) -> PersistenceResult<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE account_number = ?")
            .bind(number)
            .fetch_one(pool)
            .await?;
        Ok(row.0 > 0)
    }

    /// Lấy các account của user theo thứ tự mở, kèm giao dịch
    pub async fn get_by_user(pool: &SqlitePool, user_id: &str) -> PersistenceResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            accounts.push(Self::hydrate(pool, row).await?);
        }
        Ok(accounts)
    }

    /// Ghi số dư mới nếu version vẫn là `expected_version`.
    ///
    /// Trả về version mới; `StaleVersion` nếu account đã bị sửa ở nơi khác.
    pub async fn update_balance<'e, E>(
        executor: E,
        id: &str,
        balance: Decimal,
        expected_version: i64,
    ) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE accounts SET balance = ?, version = version + 1 WHERE id = ? AND version = ?",
        )
        .bind(balance.to_string())
        .bind(id)
        .bind(expected_version)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::stale("Account", id));
        }
        Ok(expected_version + 1)
    }

    /// Đếm accounts
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Transaction Repository
// ============================================================================

/// Repository cho transactions table
pub struct TransactionRepo;

impl TransactionRepo {
    /// Append transaction. ID trùng trả về `UniqueViolation`.
    pub async fn insert<'e, E>(executor: E, tx: &Transaction) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id, kind, amount, currency, description, occurred_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.account_id)
        .bind(tx.kind.as_str())
        .bind(tx.amount.to_string())
        .bind(&tx.currency)
        .bind(&tx.description)
        .bind(tx.occurred_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Lấy transactions theo account, theo thứ tự append
    pub async fn get_by_account(
        pool: &SqlitePool,
        account_id: &str,
    ) -> PersistenceResult<Vec<Transaction>> {
        sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE account_id = ? ORDER BY rowid",
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
    }

    /// Kiểm tra ID giao dịch đã được dùng chưa
    pub async fn exists(pool: &SqlitePool, id: &str) -> PersistenceResult<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0 > 0)
    }

    /// Đếm transactions
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Withdrawal Repository
// ============================================================================

/// Repository cho withdrawals table
pub struct WithdrawalRepo;

impl WithdrawalRepo {
    /// Thêm withdrawal mới
    pub async fn insert<'e, E>(executor: E, withdrawal: &Withdrawal) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let stages_json = serde_json::to_string(&withdrawal.stages)?;

        sqlx::query(
            r#"
            INSERT INTO withdrawals (
                id, user_id, account_id, account_number, amount, currency, status,
                stages_json, current_stage, description, created_at, version
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&withdrawal.id)
        .bind(&withdrawal.user_id)
        .bind(&withdrawal.account_id)
        .bind(&withdrawal.account_number)
        .bind(withdrawal.amount.to_string())
        .bind(&withdrawal.currency)
        .bind(withdrawal.status.as_str())
        .bind(stages_json)
        .bind(withdrawal.current_stage.to_string())
        .bind(&withdrawal.description)
        .bind(withdrawal.created_at)
        .bind(withdrawal.version)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Lấy withdrawal theo ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<Withdrawal> {
        sqlx::query_as::<_, WithdrawalRow>("SELECT * FROM withdrawals WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Withdrawal", id))?
            .try_into()
    }

    /// Lấy withdrawals của user theo thứ tự tạo
    pub async fn get_by_user(
        pool: &SqlitePool,
        user_id: &str,
    ) -> PersistenceResult<Vec<Withdrawal>> {
        sqlx::query_as::<_, WithdrawalRow>(
            "SELECT * FROM withdrawals WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Withdrawal::try_from)
        .collect()
    }

    /// Ghi lại stages, current stage và status.
    ///
    /// `withdrawal.version` phải là version lúc đọc; trả về version mới hoặc
    /// `StaleVersion` nếu bản ghi đã bị sửa ở nơi khác.
    pub async fn update_progress<'e, E>(
        executor: E,
        withdrawal: &Withdrawal,
    ) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let stages_json = serde_json::to_string(&withdrawal.stages)?;

        let result = sqlx::query(
            r#"
            UPDATE withdrawals
            SET stages_json = ?, current_stage = ?, status = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(stages_json)
        .bind(withdrawal.current_stage.to_string())
        .bind(withdrawal.status.as_str())
        .bind(&withdrawal.id)
        .bind(withdrawal.version)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::stale("Withdrawal", &withdrawal.id));
        }
        Ok(withdrawal.version + 1)
    }

    /// Đếm withdrawals
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM withdrawals")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Loan Repository
// ============================================================================

/// Repository cho loans table
pub struct LoanRepo;

impl LoanRepo {
    /// Thêm loan mới
    pub async fn insert<'e, E>(executor: E, loan: &Loan) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO loans (
                id, user_id, account_id, principal, currency, interest_rate,
                term_months, status, start_date, end_date
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&loan.id)
        .bind(&loan.user_id)
        .bind(&loan.account_id)
        .bind(loan.principal.to_string())
        .bind(&loan.currency)
        .bind(loan.interest_rate.to_string())
        .bind(i64::from(loan.term_months))
        .bind(loan.status.as_str())
        .bind(loan.start_date)
        .bind(loan.end_date)
        .execute(executor)
        .await?;
        Ok(())
    }

    async fn hydrate(pool: &SqlitePool, row: LoanRow) -> PersistenceResult<Loan> {
        let repayments = RepaymentRepo::ids_by_loan(pool, &row.id).await?;
        row.into_loan(repayments)
    }

    /// Lấy loan theo ID, kèm danh sách ID repayment
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<Loan> {
        let row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Loan", id))?;
        Self::hydrate(pool, row).await
    }

    /// Lấy loans của user theo thứ tự tạo
    pub async fn get_by_user(pool: &SqlitePool, user_id: &str) -> PersistenceResult<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE user_id = ? ORDER BY rowid")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        let mut loans = Vec::with_capacity(rows.len());
        for row in rows {
            loans.push(Self::hydrate(pool, row).await?);
        }
        Ok(loans)
    }

    /// Cập nhật status
    pub async fn update_status<'e, E>(
        executor: E,
        id: &str,
        status: LoanStatus,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE loans SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Loan", id));
        }
        Ok(())
    }
}

// ============================================================================
// Repayment Repository
// ============================================================================

/// Repository cho loan_repayments table
pub struct RepaymentRepo;

impl RepaymentRepo {
    /// Append repayment
    pub async fn insert<'e, E>(executor: E, repayment: &LoanRepayment) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO loan_repayments (id, loan_id, user_id, account_id, amount, currency, status, paid_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&repayment.id)
        .bind(&repayment.loan_id)
        .bind(&repayment.user_id)
        .bind(&repayment.account_id)
        .bind(repayment.amount.to_string())
        .bind(&repayment.currency)
        .bind(repayment.status.as_str())
        .bind(repayment.paid_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Lấy repayments của một loan theo thứ tự append
    pub async fn get_by_loan(
        pool: &SqlitePool,
        loan_id: &str,
    ) -> PersistenceResult<Vec<LoanRepayment>> {
        sqlx::query_as::<_, RepaymentRow>(
            "SELECT * FROM loan_repayments WHERE loan_id = ? ORDER BY rowid",
        )
        .bind(loan_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(LoanRepayment::try_from)
        .collect()
    }

    /// Lấy repayments của user theo thứ tự append
    pub async fn get_by_user(
        pool: &SqlitePool,
        user_id: &str,
    ) -> PersistenceResult<Vec<LoanRepayment>> {
        sqlx::query_as::<_, RepaymentRow>(
            "SELECT * FROM loan_repayments WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(LoanRepayment::try_from)
        .collect()
    }

    async fn ids_by_loan(pool: &SqlitePool, loan_id: &str) -> PersistenceResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT id FROM loan_repayments WHERE loan_id = ? ORDER BY rowid",
        )
        .bind(loan_id)
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }
}

// ============================================================================
// Notification Repository
// ============================================================================

/// Repository cho notifications table
pub struct NotificationRepo;

impl NotificationRepo {
    /// Append notification
    pub async fn insert<'e, E>(executor: E, notification: &Notification) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, message, read, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(&notification.message)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Lấy notifications của user theo thứ tự append
    pub async fn get_by_user(
        pool: &SqlitePool,
        user_id: &str,
    ) -> PersistenceResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }
}

// ============================================================================
// Aggregate loader
// ============================================================================

/// Load User Record cùng mọi bản ghi con
pub async fn load_aggregate(pool: &SqlitePool, user_id: &str) -> PersistenceResult<UserAggregate> {
    let user = UserRepo::get_by_id(pool, user_id).await?;

    Ok(UserAggregate {
        accounts: AccountRepo::get_by_user(pool, user_id).await?,
        withdrawals: WithdrawalRepo::get_by_user(pool, user_id).await?,
        loans: LoanRepo::get_by_user(pool, user_id).await?,
        repayments: RepaymentRepo::get_by_user(pool, user_id).await?,
        notifications: NotificationRepo::get_by_user(pool, user_id).await?,
        user,
    })
}

// ============================================================================
// Database initialization
// ============================================================================

/// Tạo connection pool
pub async fn create_pool(database_url: &str) -> PersistenceResult<SqlitePool> {
    let pool = SqlitePool::connect(database_url).await?;
    Ok(pool)
}

/// Chạy migrations
pub async fn run_migrations(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Tạo database mới với schema
pub async fn init_database(database_url: &str) -> PersistenceResult<SqlitePool> {
    // Tạo file nếu chưa có
    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::from_str(database_url)?.create_if_missing(true),
    )
    .await?;

    // Run migrations
    run_migrations(&pool).await?;
    tracing::debug!(database_url, "database ready");

    Ok(pool)
}

/// Database in-memory đã migrate, dùng cho tests.
///
/// Giữ đúng một connection: mỗi connection `sqlite::memory:` là một database riêng.
pub async fn create_memory_pool() -> PersistenceResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}
