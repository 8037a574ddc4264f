//! Session token issuance (HS256 JWT)

use crate::error::{BusinessError, BusinessResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// Token lifetime after login
pub const SESSION_TTL_SECS: i64 = 60 * 60;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub account_number: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues signed session tokens
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: &str, account_number: &str) -> BusinessResult<String>;
}

pub struct JwtIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::seconds(SESSION_TTL_SECS))
    }

    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            ttl,
        }
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user_id: &str, account_number: &str) -> BusinessResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            account_number: account_number.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| BusinessError::Token(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    const SECRET: &[u8] = b"test-secret-that-is-long-enough-for-hs256";

    fn claims(token: &str, secret: &[u8]) -> jsonwebtoken::errors::Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
    }

    #[test]
    fn test_issue_and_decode() {
        let issuer = JwtIssuer::new(SECRET);
        let token = issuer.issue("user-1", "1234567890").unwrap();

        let claims = claims(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.account_number, "1234567890");
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_SECS);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = JwtIssuer::new(SECRET).issue("user-1", "1234567890").unwrap();
        assert!(claims(&token, b"another-secret-that-is-long-enough!!").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = JwtIssuer::with_ttl(SECRET, Duration::hours(-2));
        let token = issuer.issue("user-1", "1234567890").unwrap();
        assert!(claims(&token, SECRET).is_err());
    }
}
