//! Service context shared by every business service
//!
//! Holds the database pool, the collaborators (credential hasher, token
//! issuer, mail transport) and the tunable settings.

use crate::credentials::CredentialHasher;
use crate::error::{BusinessError, BusinessResult};
use crate::mailer::{MailMessage, Mailer};
use crate::token::TokenIssuer;
use ccbank_core::{stage_plan, Account, User, DEFAULT_STAGE_COUNT};
use ccbank_persistence::{AccountRepo, Database, UserRepo};
use chrono::Duration;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Tunable business settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Stage count of newly created withdrawals (1..=10)
    pub withdrawal_stages: usize,
    pub otp_ttl: Duration,
    pub reset_token_ttl: Duration,
    /// Base URL of the web client, used in password-reset links
    pub frontend_url: String,
    /// Number of entries returned by recent-transactions
    pub recent_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            withdrawal_stages: DEFAULT_STAGE_COUNT,
            otp_ttl: Duration::minutes(5),
            reset_token_ttl: Duration::hours(1),
            frontend_url: "http://localhost:3000".to_string(),
            recent_limit: 10,
        }
    }
}

impl Settings {
    /// Reject a stage count outside the catalogue
    pub fn validate(&self) -> BusinessResult<()> {
        stage_plan(self.withdrawal_stages)?;
        Ok(())
    }
}

/// Context for business operations - contains database access and collaborators
#[derive(Clone)]
pub struct ServiceContext {
    pool: SqlitePool,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenIssuer>,
    mailer: Arc<dyn Mailer>,
    settings: Settings,
}

impl ServiceContext {
    /// Create new service context from database
    pub fn new(
        db: &Database,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
        mailer: Arc<dyn Mailer>,
        settings: Settings,
    ) -> Self {
        Self {
            pool: db.pool().clone(),
            hasher,
            tokens,
            mailer,
            settings,
        }
    }

    /// Get database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn hasher(&self) -> &dyn CredentialHasher {
        self.hasher.as_ref()
    }

    pub fn tokens(&self) -> &dyn TokenIssuer {
        self.tokens.as_ref()
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load a user, mapping absence to `UserNotFound`
    pub(crate) async fn user(&self, user_id: &str) -> BusinessResult<User> {
        UserRepo::get_by_id(&self.pool, user_id)
            .await
            .map_err(|e| {
                BusinessError::from_lookup(e, || BusinessError::UserNotFound(user_id.to_string()))
            })
    }

    /// Load an account with its transactions, mapping absence to `AccountNotFound`
    pub(crate) async fn account_by_number(&self, account_number: &str) -> BusinessResult<Account> {
        AccountRepo::get_by_number(&self.pool, account_number)
            .await
            .map_err(|e| {
                BusinessError::from_lookup(e, || {
                    BusinessError::AccountNotFound(account_number.to_string())
                })
            })
    }

    /// Send mail; a failed delivery is logged and otherwise ignored
    pub(crate) async fn send_mail_logged(&self, message: MailMessage) {
        if let Err(err) = self.mailer.send(&message).await {
            tracing::warn!(to = %message.to, subject = %message.subject, error = %err, "mail delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.withdrawal_stages, 5);
        assert_eq!(settings.otp_ttl, Duration::minutes(5));
        assert_eq!(settings.recent_limit, 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_stage_count_is_validated() {
        let settings = Settings {
            withdrawal_stages: 11,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
