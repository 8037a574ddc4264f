//! Server configuration
//!
//! Đọc từ biến môi trường (sau khi `dotenvy` nạp file `.env` nếu có).

use ccbank_business::Settings;
use ccbank_core::{stage_plan, DEFAULT_STAGE_COUNT};
use std::net::SocketAddr;
use thiserror::Error;

/// Độ dài tối thiểu của secret ký JWT
pub const MIN_JWT_SECRET_LEN: usize = 32;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4000";
const DEFAULT_DATABASE_URL: &str = "sqlite:data/ccbank.db?mode=rwc";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("CCBANK_JWT_SECRET is not set")]
    MissingSecret,

    #[error("CCBANK_JWT_SECRET must be at least {min} bytes, got {len}")]
    WeakSecret { len: usize, min: usize },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub database_url: String,
    pub jwt_secret: Option<String>,
    pub frontend_url: String,
    pub withdrawal_stages: usize,
    /// `*` cho phép mọi origin
    pub cors_allow_origins: Vec<String>,
}

impl ServerConfig {
    /// Load config từ environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config từ một nguồn key/value bất kỳ
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let raw_addr = var("CCBANK_LISTEN_ADDR", DEFAULT_LISTEN_ADDR);
        let listen_addr = raw_addr.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: "CCBANK_LISTEN_ADDR",
                value: raw_addr.clone(),
                reason: e.to_string(),
            }
        })?;

        let raw_stages = var("CCBANK_WITHDRAWAL_STAGES", &DEFAULT_STAGE_COUNT.to_string());
        let withdrawal_stages = raw_stages
            .trim()
            .parse::<usize>()
            .map_err(|e| e.to_string())
            .and_then(|n| stage_plan(n).map(|_| n).map_err(|e| e.to_string()))
            .map_err(|reason| ConfigError::Invalid {
                var: "CCBANK_WITHDRAWAL_STAGES",
                value: raw_stages.clone(),
                reason,
            })?;

        let cors_allow_origins = var("CCBANK_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            listen_addr,
            database_url: var("CCBANK_DATABASE_URL", DEFAULT_DATABASE_URL),
            jwt_secret: lookup("CCBANK_JWT_SECRET").filter(|s| !s.is_empty()),
            frontend_url: var("CCBANK_FRONTEND_URL", DEFAULT_FRONTEND_URL),
            withdrawal_stages,
            cors_allow_origins,
        })
    }

    /// Secret ký JWT; bắt buộc khi chạy server
    pub fn jwt_secret(&self) -> Result<&[u8], ConfigError> {
        let secret = self
            .jwt_secret
            .as_deref()
            .ok_or(ConfigError::MissingSecret)?;

        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakSecret {
                len: secret.len(),
                min: MIN_JWT_SECRET_LEN,
            });
        }
        Ok(secret.as_bytes())
    }

    /// Business settings tương ứng
    pub fn settings(&self) -> Settings {
        Settings {
            withdrawal_stages: self.withdrawal_stages,
            frontend_url: self.frontend_url.clone(),
            ..Settings::default()
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_allow_origins.is_empty() || self.cors_allow_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.listen_addr.to_string(), "0.0.0.0:4000");
        assert_eq!(config.database_url, "sqlite:data/ccbank.db?mode=rwc");
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.withdrawal_stages, 5);
        assert!(config.allows_any_origin());
        assert!(matches!(config.jwt_secret(), Err(ConfigError::MissingSecret)));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CCBANK_LISTEN_ADDR", "127.0.0.1:9000"),
            ("CCBANK_WITHDRAWAL_STAGES", "10"),
            ("CCBANK_CORS_ALLOW_ORIGINS", "http://a.test, http://b.test"),
            ("CCBANK_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.settings().withdrawal_stages, 10);
        assert_eq!(config.cors_allow_origins, vec!["http://a.test", "http://b.test"]);
        assert!(!config.allows_any_origin());
        assert_eq!(config.jwt_secret().unwrap().len(), 32);
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("CCBANK_WITHDRAWAL_STAGES", "11")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CCBANK_WITHDRAWAL_STAGES", .. }));

        let err = load(&[("CCBANK_WITHDRAWAL_STAGES", "five")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = load(&[("CCBANK_LISTEN_ADDR", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "CCBANK_LISTEN_ADDR", .. }));

        let config = load(&[("CCBANK_JWT_SECRET", "short")]).unwrap();
        assert!(matches!(config.jwt_secret(), Err(ConfigError::WeakSecret { len: 5, .. })));
    }
}
