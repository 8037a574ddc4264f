//! Notification log and direct mail relay

use crate::error::{BusinessError, BusinessResult};
use crate::mailer::MailMessage;
use crate::services::ServiceContext;
use crate::validation;
use ccbank_core::Notification;
use ccbank_persistence::NotificationRepo;

/// Notification Service
pub struct NotificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> NotificationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Append an unread notification to the user's log
    pub async fn append(&self, user_id: &str, message: &str) -> BusinessResult<Notification> {
        validation::require("userId", user_id)?;
        validation::require("message", message)?;
        self.ctx.user(user_id).await?;

        let notification = Notification::new(user_id, message);
        NotificationRepo::insert(self.ctx.pool(), &notification).await?;

        tracing::debug!(user_id, notification_id = %notification.id, "notification appended");
        Ok(notification)
    }

    /// Full log, oldest first
    pub async fn list(&self, user_id: &str) -> BusinessResult<Vec<Notification>> {
        self.ctx.user(user_id).await?;
        Ok(NotificationRepo::get_by_user(self.ctx.pool(), user_id).await?)
    }

    /// Relay a message straight to the mail transport.
    ///
    /// Unlike the mails sent by other flows, a delivery failure here is
    /// returned to the caller.
    pub async fn send_email(&self, email: &str, subject: &str, message: &str) -> BusinessResult<()> {
        validation::require_email(email)?;
        validation::require("subject", subject)?;
        validation::require("message", message)?;

        self.ctx
            .mailer()
            .send(&MailMessage::new(email, subject, message))
            .await
            .map_err(|e| BusinessError::Mail(e.to_string()))?;

        tracing::info!(to = email, subject, "notification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{failing_fixture, fixture, register};

    #[tokio::test]
    async fn test_append_and_list_in_order() {
        let fx = fixture().await;
        let reg = register(&fx, "notes@example.com").await;
        let service = NotificationService::new(&fx.ctx);

        let first = service.append(&reg.user.id, "Welcome").await.unwrap();
        let second = service.append(&reg.user.id, "Statement ready").await.unwrap();
        assert!(!first.read);

        let log = service.list(&reg.user.id).await.unwrap();
        assert_eq!(log, vec![first, second]);
    }

    #[tokio::test]
    async fn test_append_unknown_user() {
        let fx = fixture().await;
        let err = NotificationService::new(&fx.ctx)
            .append("missing", "hello")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_send_email_goes_through_mailer() {
        let fx = fixture().await;
        NotificationService::new(&fx.ctx)
            .send_email("ada@example.com", "Reminder", "Your payment is due")
            .await
            .unwrap();

        let sent = fx.mailer.last_to("ada@example.com").unwrap();
        assert_eq!(sent.subject, "Reminder");
        assert_eq!(sent.text, "Your payment is due");
    }

    #[tokio::test]
    async fn test_send_email_reports_transport_failure() {
        let ctx = failing_fixture().await;
        let err = NotificationService::new(&ctx)
            .send_email("ada@example.com", "Reminder", "body")
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::Mail(_)));
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }
}
