//! Application state

use crate::config::{ConfigError, ServerConfig};
use ccbank_business::{Argon2Hasher, JwtIssuer, LogMailer, ServiceContext};
use ccbank_persistence::Database;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ctx: ServiceContext,
}

impl AppState {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Production wiring: Argon2id hashes, HS256 tokens, log-only mail
    pub fn from_config(config: &ServerConfig, db: &Database) -> Result<Self, ConfigError> {
        let secret = config.jwt_secret()?;

        let ctx = ServiceContext::new(
            db,
            Arc::new(Argon2Hasher::new()),
            Arc::new(JwtIssuer::new(secret)),
            Arc::new(LogMailer),
            config.settings(),
        );
        Ok(Self::new(ctx))
    }
}
