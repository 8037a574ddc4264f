//! Identity flows - registration, OTP verification, login, password reset
//! and user administration

use crate::error::{BusinessError, BusinessResult};
use crate::mailer::MailMessage;
use crate::services::ServiceContext;
use crate::validation;
use ccbank_core::{
    draw_account_number, generate_otp, Account, AccountSummary, CoreError, User, UserDetails,
    UserProfile,
};
use ccbank_persistence::{AccountRepo, UserRepo};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;

/// Account opened by OTP verification
const DEFAULT_ACCOUNT_TYPE: &str = "default";
const DEFAULT_ACCOUNT_CURRENCY: &str = "USD";

/// Registration form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub gender: String,
    /// `YYYY-MM-DD` or RFC 3339
    pub date_of_birth: String,
    pub account_type: String,
    pub address: String,
    pub postal_code: String,
    pub state: String,
    pub country: String,
    pub currency: String,
    pub password: String,
    pub confirm_password: String,
    pub account_pin: String,
    pub agree: bool,
}

impl Registration {
    fn validate(&self) -> BusinessResult<UserDetails> {
        validation::require("firstName", &self.first_name)?;
        validation::require("lastName", &self.last_name)?;
        validation::require("phoneNumber", &self.phone_number)?;
        validation::require_email(&self.email)?;
        validation::require_password(&self.password, &self.confirm_password)?;
        let date_of_birth = validation::parse_date_of_birth(&self.date_of_birth)?;
        validation::require("accountPin", &self.account_pin)?;
        validation::require("accountType", &self.account_type)?;
        validation::require("currency", &self.currency)?;

        Ok(UserDetails {
            first_name: self.first_name.trim().to_string(),
            middle_name: self
                .middle_name
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            gender: self.gender.clone(),
            date_of_birth,
            account_type: self.account_type.clone(),
            address: self.address.clone(),
            postal_code: self.postal_code.clone(),
            state: self.state.clone(),
            country: self.country.clone(),
            currency: self.currency.clone(),
            agree: self.agree,
        })
    }
}

/// New user and the account opened with it. The OTP is only mailed.
#[derive(Debug, Clone)]
pub struct Registered {
    pub user: UserProfile,
    pub account: Account,
}

/// Result of a successful OTP verification
#[derive(Debug, Clone)]
pub struct Verified {
    pub user: UserProfile,
    /// The `default`/`USD` account opened by this verification
    pub account: Account,
    pub accounts: Vec<Account>,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
    pub account: AccountSummary,
    pub accounts: Vec<AccountSummary>,
}

/// Identity Service
pub struct IdentityService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> IdentityService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Draw random 10-digit numbers until one is not used by any account
    pub async fn generate_account_number(&self) -> BusinessResult<String> {
        loop {
            let candidate = draw_account_number(&mut rand::thread_rng());
            if !AccountRepo::number_exists(self.ctx.pool(), &candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(candidate, "account number taken, drawing again");
        }
    }

    /// Create a user with one account and mail a one-time code
    pub async fn register(&self, form: Registration) -> BusinessResult<Registered> {
        let details = form.validate()?;

        if UserRepo::find_by_email(self.ctx.pool(), &details.email)
            .await?
            .is_some()
        {
            return Err(BusinessError::UserExists(details.email));
        }

        let password_hash = self.ctx.hasher().hash(&form.password)?;
        let pin_hash = self.ctx.hasher().hash(&form.account_pin)?;
        let account_number = self.generate_account_number().await?;
        let otp = generate_otp(&mut rand::thread_rng());

        let mut user = User::new(details, password_hash, pin_hash);
        user.issue_otp(otp.clone(), Utc::now(), self.ctx.settings().otp_ttl);
        let account = Account::open(
            &user.id,
            &account_number,
            &user.details.account_type,
            &user.details.currency,
        );

        let mut tx = self.ctx.pool().begin().await?;
        UserRepo::insert(&mut *tx, &user).await?;
        AccountRepo::insert(&mut *tx, &account).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, account_number, "user registered");

        let minutes = self.ctx.settings().otp_ttl.num_minutes();
        let text = format!(
            "Dear {},\n\nYour one-time password for completing your registration is {}. \
             It is valid for {} minutes.\n\nThe Central City Bank Team",
            user.details.first_name, otp, minutes
        );
        let html = format!(
            "<p>Dear {},</p><p>Your one-time password for completing your registration is \
             <strong>{}</strong>.</p><p>It is valid for {} minutes.</p>\
             <p>The Central City Bank Team</p>",
            user.details.first_name, otp, minutes
        );
        self.ctx
            .send_mail_logged(
                MailMessage::new(user.email(), "OTP for Account Registration", text).with_html(html),
            )
            .await;

        Ok(Registered {
            user: user.profile(),
            account,
        })
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> BusinessResult<Verified> {
        self.verify_otp_at(email, otp, Utc::now()).await
    }

    /// Check the code at `now`; on success open a `default`/`USD` account
    /// and clear the code.
    pub async fn verify_otp_at(
        &self,
        email: &str,
        otp: &str,
        now: DateTime<Utc>,
    ) -> BusinessResult<Verified> {
        validation::require("email", email)?;
        validation::require("otp", otp)?;

        let mut user = UserRepo::find_by_email(self.ctx.pool(), email.trim())
            .await?
            .ok_or(BusinessError::InvalidOtp)?;
        user.check_otp(otp.trim(), now)
            .inspect_err(|e| tracing::debug!(user_id = %user.id, error = %e, "OTP rejected"))?;

        let account_number = self.generate_account_number().await?;
        let account = Account::open(
            &user.id,
            &account_number,
            DEFAULT_ACCOUNT_TYPE,
            DEFAULT_ACCOUNT_CURRENCY,
        );
        user.clear_otp();

        let mut tx = self.ctx.pool().begin().await?;
        AccountRepo::insert(&mut *tx, &account).await?;
        UserRepo::set_otp(&mut *tx, &user.id, user.otp.as_deref(), user.otp_expires).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, account_number, "OTP verified, account opened");

        let html = format!(
            "<p>Dear {},</p><p>Your email has been verified. Your new account number is \
             <strong>{}</strong>.</p><p>The Central City Bank Team</p>",
            user.details.first_name, account_number
        );
        self.ctx
            .send_mail_logged(
                MailMessage::new(user.email(), "Your New Account Information", "").with_html(html),
            )
            .await;

        let accounts = AccountRepo::get_by_user(self.ctx.pool(), &user.id).await?;
        Ok(Verified {
            user: user.profile(),
            account,
            accounts,
        })
    }

    /// Authenticate by account number and password and issue a session token
    pub async fn login(&self, account_number: &str, password: &str) -> BusinessResult<Session> {
        validation::require("accountNumber", account_number)?;
        validation::require("password", password)?;

        let account = match AccountRepo::get_by_number(self.ctx.pool(), account_number).await {
            Ok(account) => account,
            Err(e) if e.is_not_found() => return Err(BusinessError::InvalidLogin),
            Err(e) => return Err(e.into()),
        };
        let user = self.ctx.user(&account.user_id).await?;

        if !self.ctx.hasher().verify(password, &user.password_hash)? {
            tracing::warn!(account_number, "login rejected: wrong password");
            return Err(BusinessError::InvalidLogin);
        }

        let token = self.ctx.tokens().issue(&user.id, account_number)?;
        let accounts = AccountRepo::get_by_user(self.ctx.pool(), &user.id)
            .await?
            .iter()
            .map(Account::summary)
            .collect();

        tracing::info!(user_id = %user.id, account_number, "login succeeded");

        Ok(Session {
            token,
            user: user.profile(),
            account: account.summary(),
            accounts,
        })
    }

    /// Sessions are stateless tokens; there is nothing to revoke
    pub fn logout(&self) {
        tracing::debug!("logout acknowledged");
    }

    /// Issue a reset token and mail the reset link
    pub async fn request_password_reset(&self, email: &str) -> BusinessResult<()> {
        validation::require("email", email)?;

        let mut user = UserRepo::find_by_email(self.ctx.pool(), email.trim())
            .await?
            .ok_or_else(|| BusinessError::UserNotFound(email.to_string()))?;

        let token = hex::encode(rand::thread_rng().gen::<[u8; 32]>());
        user.issue_reset_token(token.clone(), Utc::now(), self.ctx.settings().reset_token_ttl);
        UserRepo::set_reset_token(
            self.ctx.pool(),
            &user.id,
            user.password_reset_token.as_deref(),
            user.password_reset_expires,
        )
        .await?;

        let reset_url = format!(
            "{}/password-reset/{}",
            self.ctx.settings().frontend_url.trim_end_matches('/'),
            token
        );
        let text = format!(
            "You requested a password reset. Click the link below to reset your password:\n\n{reset_url}"
        );
        let html = format!(
            "<p>You requested a password reset. Click the link below to reset your password:</p>\
             <p><a href=\"{reset_url}\">Reset Password</a></p>"
        );
        self.ctx
            .send_mail_logged(
                MailMessage::new(user.email(), "Password Reset Request", text).with_html(html),
            )
            .await;

        tracing::info!(user_id = %user.id, "password reset requested");
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> BusinessResult<()> {
        self.reset_password_at(token, new_password, Utc::now()).await
    }

    /// Replace the password when `token` matches and is unexpired at `now`
    pub async fn reset_password_at(
        &self,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> BusinessResult<()> {
        validation::require("newPassword", new_password)?;

        let mut user = UserRepo::find_by_reset_token(self.ctx.pool(), token)
            .await?
            .ok_or(CoreError::InvalidResetToken)?;
        user.check_reset_token(token, now)?;

        let password_hash = self.ctx.hasher().hash(new_password)?;
        user.clear_reset_token();

        let mut tx = self.ctx.pool().begin().await?;
        UserRepo::set_password(&mut *tx, &user.id, &password_hash).await?;
        UserRepo::set_reset_token(
            &mut *tx,
            &user.id,
            user.password_reset_token.as_deref(),
            user.password_reset_expires,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }

    /// Every user, without credentials
    pub async fn list_users(&self) -> BusinessResult<Vec<UserProfile>> {
        Ok(UserRepo::get_all(self.ctx.pool())
            .await?
            .iter()
            .map(User::profile)
            .collect())
    }

    /// Delete a user and everything the user owns
    pub async fn delete_user(&self, user_id: &str) -> BusinessResult<()> {
        UserRepo::delete(self.ctx.pool(), user_id)
            .await
            .map_err(|e| {
                BusinessError::from_lookup(e, || BusinessError::UserNotFound(user_id.to_string()))
            })?;

        tracing::info!(user_id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{failing_fixture, fixture, register, registration, Fixture, PASSWORD};
    use ccbank_persistence::load_aggregate;
    use chrono::Duration;
    use std::collections::HashSet;

    fn otp_from_mail(fx: &Fixture, email: &str) -> String {
        let mail = fx.mailer.last_to(email).unwrap();
        mail.text
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| part.len() == 6)
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_register_opens_account_and_mails_otp() {
        let fx = fixture().await;
        let reg = register(&fx, "ada@example.com").await;

        assert_eq!(reg.user.details.email, "ada@example.com");
        assert_eq!(reg.account.account_type, "savings");
        assert_eq!(reg.account.balance, rust_decimal::Decimal::ZERO);
        assert_eq!(reg.account.account_number.len(), 10);

        let mail = fx.mailer.last_to("ada@example.com").unwrap();
        assert_eq!(mail.subject, "OTP for Account Registration");

        let stored = UserRepo::get_by_id(fx.ctx.pool(), &reg.user.id).await.unwrap();
        assert_eq!(stored.otp.as_deref(), Some(otp_from_mail(&fx, "ada@example.com").as_str()));
        assert_ne!(stored.password_hash, PASSWORD);
    }

    #[tokio::test]
    async fn test_register_validation_and_duplicates() {
        let fx = fixture().await;
        let identity = IdentityService::new(&fx.ctx);

        let mut form = registration("bad");
        let err = identity.register(form.clone()).await.unwrap_err();
        assert!(matches!(err, BusinessError::Validation { ref field, .. } if field == "email"));

        form = registration("short@example.com");
        form.password = "abc".to_string();
        form.confirm_password = "abc".to_string();
        let err = identity.register(form).await.unwrap_err();
        assert!(matches!(err, BusinessError::Validation { ref field, .. } if field == "password"));

        form = registration("dob@example.com");
        form.date_of_birth = "31/12/1990".to_string();
        let err = identity.register(form).await.unwrap_err();
        assert!(matches!(err, BusinessError::Validation { ref field, .. } if field == "dateOfBirth"));

        register(&fx, "dup@example.com").await;
        let err = identity
            .register(registration("dup@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_register_survives_mail_failure() {
        let ctx = failing_fixture().await;
        let reg = IdentityService::new(&ctx)
            .register(registration("nomail@example.com"))
            .await
            .unwrap();
        assert_eq!(UserRepo::count(ctx.pool()).await.unwrap(), 1);
        assert_eq!(reg.account.user_id, reg.user.id);
    }

    #[tokio::test]
    async fn test_verify_otp_opens_default_account() {
        let fx = fixture().await;
        let reg = register(&fx, "otp@example.com").await;
        let otp = otp_from_mail(&fx, "otp@example.com");
        let identity = IdentityService::new(&fx.ctx);

        let verified = identity.verify_otp("otp@example.com", &otp).await.unwrap();
        assert_eq!(verified.account.account_type, "default");
        assert_eq!(verified.account.currency, "USD");
        assert_eq!(verified.accounts.len(), 2);
        assert_ne!(verified.account.account_number, reg.account.account_number);

        let mail = fx.mailer.last_to("otp@example.com").unwrap();
        assert_eq!(mail.subject, "Your New Account Information");

        // Code is single use
        let err = identity.verify_otp("otp@example.com", &otp).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);
    }

    #[tokio::test]
    async fn test_expired_otp_appends_nothing() {
        let fx = fixture().await;
        let reg = register(&fx, "late@example.com").await;
        let otp = otp_from_mail(&fx, "late@example.com");
        let identity = IdentityService::new(&fx.ctx);

        let issued = UserRepo::get_by_id(fx.ctx.pool(), &reg.user.id)
            .await
            .unwrap()
            .otp_expires
            .unwrap()
            - fx.ctx.settings().otp_ttl;

        let err = identity
            .verify_otp_at("late@example.com", &otp, issued + Duration::minutes(6))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);

        let aggregate = load_aggregate(fx.ctx.pool(), &reg.user.id).await.unwrap();
        assert_eq!(aggregate.accounts.len(), 1);
    }

    #[tokio::test]
    async fn test_verify_otp_rejections() {
        let fx = fixture().await;
        register(&fx, "wrong@example.com").await;
        let identity = IdentityService::new(&fx.ctx);

        let err = identity.verify_otp("wrong@example.com", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = identity
            .verify_otp("nobody@example.com", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::InvalidOtp));

        let otp = otp_from_mail(&fx, "wrong@example.com");
        let wrong = if otp == "999999" { "100000" } else { "999999" };
        let err = identity.verify_otp("wrong@example.com", wrong).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        let fx = fixture().await;
        let reg = register(&fx, "login@example.com").await;
        let identity = IdentityService::new(&fx.ctx);

        let session = identity
            .login(&reg.account.account_number, PASSWORD)
            .await
            .unwrap();
        assert!(!session.token.is_empty());
        assert_eq!(session.user.id, reg.user.id);
        assert_eq!(session.account.account_number, reg.account.account_number);
        assert_eq!(session.accounts.len(), 1);

        let err = identity
            .login(&reg.account.account_number, "not-the-password")
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::InvalidLogin));

        let err = identity.login("0000000000", PASSWORD).await.unwrap_err();
        assert!(matches!(err, BusinessError::InvalidLogin));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let fx = fixture().await;
        let reg = register(&fx, "reset@example.com").await;
        let identity = IdentityService::new(&fx.ctx);

        identity.request_password_reset("reset@example.com").await.unwrap();
        let mail = fx.mailer.last_to("reset@example.com").unwrap();
        assert_eq!(mail.subject, "Password Reset Request");

        let token = UserRepo::get_by_id(fx.ctx.pool(), &reg.user.id)
            .await
            .unwrap()
            .password_reset_token
            .unwrap();
        assert_eq!(token.len(), 64);
        assert!(mail
            .text
            .contains(&format!("http://localhost:3000/password-reset/{token}")));

        let err = identity
            .reset_password_at(&token, "brand-new", Utc::now() + Duration::hours(2))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);

        identity.reset_password(&token, "brand-new").await.unwrap();
        identity
            .login(&reg.account.account_number, "brand-new")
            .await
            .unwrap();

        // Token is consumed
        let stored = UserRepo::get_by_id(fx.ctx.pool(), &reg.user.id).await.unwrap();
        assert_eq!(stored.password_reset_token, None);
        assert_eq!(stored.password_reset_expires, None);
        let err = identity.reset_password(&token, "again-new").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);
    }

    #[tokio::test]
    async fn test_password_reset_unknown_email() {
        let fx = fixture().await;
        let err = IdentityService::new(&fx.ctx)
            .request_password_reset("ghost@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_and_delete_users() {
        let fx = fixture().await;
        let a = register(&fx, "a@example.com").await;
        register(&fx, "b@example.com").await;
        let identity = IdentityService::new(&fx.ctx);

        assert_eq!(identity.list_users().await.unwrap().len(), 2);

        identity.delete_user(&a.user.id).await.unwrap();
        assert_eq!(identity.list_users().await.unwrap().len(), 1);
        assert!(!AccountRepo::number_exists(fx.ctx.pool(), &a.account.account_number)
            .await
            .unwrap());

        let err = identity.delete_user(&a.user.id).await.unwrap_err();
        assert!(matches!(err, BusinessError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_generated_account_numbers_are_unique() {
        let fx = fixture().await;
        let reg = register(&fx, "numbers@example.com").await;
        let identity = IdentityService::new(&fx.ctx);

        let mut seen = HashSet::new();
        seen.insert(reg.account.account_number.clone());
        for _ in 0..25 {
            let number = identity.generate_account_number().await.unwrap();
            assert!(!AccountRepo::number_exists(fx.ctx.pool(), &number).await.unwrap());
            AccountRepo::insert(fx.ctx.pool(), &Account::open(&reg.user.id, &number, "savings", "USD"))
                .await
                .unwrap();
            assert!(seen.insert(number));
        }
    }
}
