//! Fixtures shared by the service tests

use crate::credentials::Argon2Hasher;
use crate::identity::{IdentityService, Registered, Registration};
use crate::mailer::{MailError, MailMessage, Mailer, MemoryMailer};
use crate::services::{ServiceContext, Settings};
use crate::token::JwtIssuer;
use async_trait::async_trait;
use ccbank_persistence::Database;
use std::sync::Arc;

pub(crate) const PASSWORD: &str = "secret-pass";
pub(crate) const PIN: &str = "4321";
const JWT_SECRET: &[u8] = b"test-secret-that-is-at-least-32-bytes";

pub(crate) struct Fixture {
    pub ctx: ServiceContext,
    pub mailer: Arc<MemoryMailer>,
}

/// Transport that always fails
struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: &MailMessage) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".to_string()))
    }
}

fn hasher() -> Arc<Argon2Hasher> {
    Arc::new(Argon2Hasher::with_params(8, 1, 1).unwrap())
}

pub(crate) async fn fixture() -> Fixture {
    fixture_with(Settings::default()).await
}

pub(crate) async fn fixture_with(settings: Settings) -> Fixture {
    let db = Database::in_memory().await.unwrap();
    let mailer = Arc::new(MemoryMailer::new());
    let ctx = ServiceContext::new(
        &db,
        hasher(),
        Arc::new(JwtIssuer::new(JWT_SECRET)),
        mailer.clone(),
        settings,
    );
    Fixture { ctx, mailer }
}

/// Context whose mail transport always fails
pub(crate) async fn failing_fixture() -> ServiceContext {
    let db = Database::in_memory().await.unwrap();
    ServiceContext::new(
        &db,
        hasher(),
        Arc::new(JwtIssuer::new(JWT_SECRET)),
        Arc::new(FailingMailer),
        Settings::default(),
    )
}

pub(crate) fn registration(email: &str) -> Registration {
    Registration {
        first_name: "Ada".to_string(),
        middle_name: None,
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        phone_number: "+15550100".to_string(),
        gender: "female".to_string(),
        date_of_birth: "1990-12-10".to_string(),
        account_type: "savings".to_string(),
        address: "12 Analytical Way".to_string(),
        postal_code: "10001".to_string(),
        state: "NY".to_string(),
        country: "USA".to_string(),
        currency: "USD".to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
        account_pin: PIN.to_string(),
        agree: true,
    }
}

pub(crate) async fn register(fx: &Fixture, email: &str) -> Registered {
    IdentityService::new(&fx.ctx)
        .register(registration(email))
        .await
        .unwrap()
}
