//! 邮件发送。
//!
//! 提供两种通道：
//! - `console`：只写日志（开发环境）
//! - `relay`：把邮件以 JSON POST 给 `EMAIL_RELAY_URL`
//!
//! 请求触发的邮件一律通过 [`EmailService::spawn_send`] 后台发送，失败只记日志，
//! 不影响触发它的请求。

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::*;
use serde::Serialize;
use thiserror::Error;

use crate::{core::config::Config, core::enums::UserRole, entity::users};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn deliver(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

pub struct ConsoleTransport;

#[async_trait]
impl EmailTransport for ConsoleTransport {
    async fn deliver(&self, message: &EmailMessage) -> Result<(), EmailError> {
        tracing::info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            "📧 Email (console provider)"
        );
        tracing::debug!(body = %message.body, "📧 Email body");
        Ok(())
    }
}

pub struct RelayTransport {
    client: reqwest::Client,
    url: String,
}

impl RelayTransport {
    pub fn new(url: String) -> Self {
        Self { client: reqwest::Client::new(), url }
    }
}

#[async_trait]
impl EmailTransport for RelayTransport {
    async fn deliver(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmailError::SendFailed(format!("relay responded {}", response.status())));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct EmailService {
    enabled: bool,
    from: String,
    frontend_url: String,
    transport: Arc<dyn EmailTransport>,
}

impl EmailService {
    pub fn new(
        enabled: bool,
        from: String,
        frontend_url: String,
        transport: Arc<dyn EmailTransport>,
    ) -> Self {
        Self { enabled, from, frontend_url, transport }
    }

    pub fn from_config(config: &Config) -> Result<Self, EmailError> {
        let transport: Arc<dyn EmailTransport> = match config.email_provider.as_str() {
            "console" => Arc::new(ConsoleTransport),
            "relay" => {
                let url = config
                    .email_relay_url
                    .clone()
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| EmailError::NotConfigured("EMAIL_RELAY_URL is required for relay provider".into()))?;
                Arc::new(RelayTransport::new(url))
            }
            other => return Err(EmailError::NotConfigured(format!("unknown provider '{}'", other))),
        };

        Ok(Self::new(
            config.email_enabled,
            config.default_from_email.clone(),
            config.frontend_url.trim_end_matches('/').to_string(),
            transport,
        ))
    }

    pub fn message(&self, to: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> EmailMessage {
        EmailMessage {
            from: self.from.clone(),
            to,
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.enabled {
            tracing::debug!(subject = %message.subject, "Email service disabled, skipping send");
            return Ok(());
        }
        if message.to.is_empty() {
            return Ok(());
        }
        self.transport.deliver(&message).await
    }

    /// 后台发送，失败只记 WARN。
    pub fn spawn_send(&self, message: EmailMessage) {
        let service = self.clone();
        tokio::spawn(async move {
            let subject = message.subject.clone();
            if let Err(e) = service.send(message).await {
                tracing::warn!("⚠️ Email '{}' not sent: {}", subject, e);
            }
        });
    }

    pub fn verification_email(&self, to: &str, token: &str) -> EmailMessage {
        let link = format!("{}/verify-email?token={}", self.frontend_url, token);
        self.message(
            vec![to.to_string()],
            "Verify your email address",
            format!(
                "Welcome!\n\nPlease verify your email address by opening the link below:\n\n{}\n\nIf you did not create an account you can ignore this email.",
                link
            ),
        )
    }

    pub fn password_reset_email(&self, to: &str, uid: &str, token: &str) -> EmailMessage {
        let link = format!("{}/password-reset/{}/{}", self.frontend_url, uid, token);
        self.message(
            vec![to.to_string()],
            "Password reset request",
            format!(
                "We received a request to reset your password.\n\nOpen the link below to choose a new password:\n\n{}\n\nIf you did not request this, you can ignore this email.",
                link
            ),
        )
    }

    pub fn contact_notification(
        &self,
        recipients: Vec<String>,
        name: &str,
        email: &str,
        subject: &str,
        body: &str,
    ) -> EmailMessage {
        self.message(
            recipients,
            format!("New contact message: {}", subject),
            format!(
                "A new message was submitted through the contact form.\n\nFrom: {} <{}>\nSubject: {}\n\n{}",
                name, email, subject, body
            ),
        )
    }
}

/// 联系表单通知的收件人：所有已验证邮箱的 Admin / Staff。
pub async fn notification_recipients(db: &DatabaseConnection) -> Result<Vec<String>, DbErr> {
    users::Entity::find()
        .select_only()
        .column(users::Column::Email)
        .filter(users::Column::IsVerified.eq(true))
        .filter(users::Column::Role.is_in([UserRole::Admin, UserRole::Staff]))
        .order_by_asc(users::Column::Email)
        .into_tuple::<String>()
        .all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{recording_email as service, RecordingTransport};

    #[tokio::test]
    async fn disabled_service_skips_delivery() {
        let transport = Arc::new(RecordingTransport::default());
        let svc = service(false, transport.clone());
        svc.send(svc.verification_email("a@example.org", "tok")).await.unwrap();
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn verification_link_points_at_frontend() {
        let transport = Arc::new(RecordingTransport::default());
        let svc = service(true, transport.clone());
        svc.send(svc.verification_email("a@example.org", "tok123")).await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["a@example.org".to_string()]);
        assert!(sent[0].body.contains("http://localhost:5173/verify-email?token=tok123"));
    }

    #[tokio::test]
    async fn failures_surface_from_send_but_not_from_spawn() {
        let transport = Arc::new(RecordingTransport { fail: true, ..Default::default() });
        let svc = service(true, transport.clone());
        assert!(svc.send(svc.verification_email("a@example.org", "t")).await.is_err());

        // 后台发送不会 panic，也不会向调用方传播错误
        svc.spawn_send(svc.verification_email("b@example.org", "t"));
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn contact_notification_goes_to_every_recipient() {
        let transport = Arc::new(RecordingTransport::default());
        let svc = service(true, transport.clone());
        let recipients = vec!["admin@example.org".to_string(), "staff@example.org".to_string()];
        svc.send(svc.contact_notification(recipients.clone(), "Rahim", "rahim@example.org", "Books", "Can I donate?"))
            .await
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].to, recipients);
        assert_eq!(sent[0].subject, "New contact message: Books");
        assert!(sent[0].body.contains("Rahim <rahim@example.org>"));
    }

    #[tokio::test]
    async fn no_recipients_means_nothing_sent() {
        let transport = Arc::new(RecordingTransport::default());
        let svc = service(true, transport.clone());
        svc.send(svc.contact_notification(Vec::new(), "A", "a@example.org", "S", "B")).await.unwrap();
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn relay_requires_url() {
        let mut config = Config::for_tests();
        config.email_provider = "relay".into();
        assert!(EmailService::from_config(&config).is_err());

        config.email_relay_url = Some("http://relay.local/send".into());
        assert!(EmailService::from_config(&config).is_ok());
    }
}
