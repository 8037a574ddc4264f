//! Database initialization and status

use anyhow::{Context, Result};
use ccbank_persistence::{
    AccountRepo, Database, TransactionRepo, UserRepo, WithdrawalRepo,
};
use std::path::PathBuf;

/// File path behind a `sqlite:` URL; None for in-memory databases
pub fn database_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Make sure the parent directory of the database file exists
pub fn ensure_parent_dir(database_url: &str) -> Result<()> {
    if let Some(parent) = database_path(database_url)
        .as_deref()
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    Ok(())
}

/// Initialize the database with schema
pub async fn init_database(database_url: &str, force: bool) -> Result<()> {
    if let Some(path) = database_path(database_url) {
        if force && path.exists() {
            std::fs::remove_file(&path).context("Failed to remove existing database")?;
            println!("🗑️  Removed existing database");
        }
    }
    ensure_parent_dir(database_url)?;

    println!("📦 Running migrations...");
    let db = Database::init(database_url)
        .await
        .context("Failed to initialize database")?;
    db.close().await;

    println!("✅ Database initialized at {}", database_url);
    Ok(())
}

/// Show database status
pub async fn show_status(database_url: &str) -> Result<()> {
    if let Some(path) = database_path(database_url) {
        if !path.exists() {
            println!("❌ Database not found at {:?}", path);
            println!("   Run 'ccbank init' to create the database");
            return Ok(());
        }
    }

    let db = Database::connect(database_url)
        .await
        .context("Failed to connect to database. Run 'ccbank init' first.")?;

    println!("📊 Database Status");
    println!("   URL: {}", database_url);
    println!();

    let pool = db.pool();
    println!("   Users:        {}", UserRepo::count(pool).await?);
    println!("   Accounts:     {}", AccountRepo::count(pool).await?);
    println!("   Transactions: {}", TransactionRepo::count(pool).await?);
    println!("   Withdrawals:  {}", WithdrawalRepo::count(pool).await?);

    db.close().await;
    Ok(())
}
