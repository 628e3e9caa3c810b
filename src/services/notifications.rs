//! Outgoing account mail.
//!
//! Handlers hand a [`Notification`] to the [`Mailer`], which delivers it on a
//! background task through whichever [`NotificationSink`] is configured. The
//! request never waits for delivery and a failed delivery is only logged.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{MailConfig, MailTransport};
use crate::constants::mail::{CONFIRM_TEMPLATE, PASSWORD_RESET_TEMPLATE};
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub template: String,
    pub params: BTreeMap<String, String>,
}

impl Notification {
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Plain-text body for the template.
    #[must_use]
    pub fn render_body(&self) -> String {
        let username = self.param("username").unwrap_or("there");

        match self.template.as_str() {
            CONFIRM_TEMPLATE => format!(
                "Dear {username},\n\n\
                 Welcome! To confirm your account please follow this link:\n\n\
                 {}\n\n\
                 The link is valid for two days.\n",
                self.param("activation_link").unwrap_or_default()
            ),
            PASSWORD_RESET_TEMPLATE => format!(
                "Dear {username},\n\n\
                 To reset your password follow this link:\n\n\
                 {}\n\n\
                 The link is valid for thirty minutes. If you did not ask for a \
                 password reset you can ignore this message.\n",
                self.param("password_reset_link").unwrap_or_default()
            ),
            other => {
                let mut body = format!("{other}\n");
                for (key, value) in &self.params {
                    let _ = writeln!(body, "{key}: {value}");
                }
                body
            }
        }
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: Notification) -> Result<()>;
}

/// Writes mail to the log. Default for development.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: Notification) -> Result<()> {
        tracing::info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            template = %notification.template,
            "Mail (log transport)\n{}",
            notification.render_body()
        );
        Ok(())
    }
}

pub struct SmtpSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpSink {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let sender: Mailbox = config
            .sender
            .parse()
            .with_context(|| format!("Invalid mail sender: {}", config.sender))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }
}

#[async_trait]
impl NotificationSink for SmtpSink {
    async fn deliver(&self, notification: Notification) -> Result<()> {
        let recipient: Mailbox = notification
            .recipient
            .parse()
            .with_context(|| format!("Invalid recipient: {}", notification.recipient))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.render_body())?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Keeps delivered mail in memory so tests can read the links back.
#[derive(Clone, Default)]
pub struct MemoryOutbox {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryOutbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for MemoryOutbox {
    async fn deliver(&self, notification: Notification) -> Result<()> {
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

/// Builds the configured sink.
pub fn sink_from_config(config: &MailConfig) -> Result<Arc<dyn NotificationSink>> {
    Ok(match config.transport {
        MailTransport::Log => Arc::new(LogSink),
        MailTransport::Smtp => Arc::new(SmtpSink::new(config)?),
    })
}

#[derive(Clone)]
pub struct Mailer {
    sink: Arc<dyn NotificationSink>,
    base_url: String,
}

impl Mailer {
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>, base_url: &str) -> Self {
        Self {
            sink,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Queues delivery on a background task and returns immediately.
    pub fn dispatch(&self, notification: Notification) {
        let sink = self.sink.clone();

        tokio::spawn(async move {
            let template = notification.template.clone();
            match sink.deliver(notification).await {
                Ok(()) => {
                    metrics::counter!("mail_sent_total", "template" => template).increment(1);
                }
                Err(e) => {
                    metrics::counter!("mail_failed_total", "template" => template.clone())
                        .increment(1);
                    tracing::warn!(template = %template, "Mail delivery failed: {e:#}");
                }
            }
        });
    }

    #[must_use]
    pub fn activation_link(&self, token: &str) -> String {
        format!("{}/api/auth/activate/{token}", self.base_url)
    }

    #[must_use]
    pub fn password_reset_link(&self, token: &str, email: &str) -> String {
        format!(
            "{}/api/auth/update-password/{token}/{}",
            self.base_url,
            urlencoding::encode(email)
        )
    }

    fn notification(
        user: &User,
        subject: &str,
        template: &str,
        link_key: &str,
        link: String,
    ) -> Notification {
        let mut params = BTreeMap::new();
        params.insert("username".to_string(), user.username.clone());
        params.insert("role".to_string(), user.role.to_string());
        params.insert(link_key.to_string(), link);

        Notification {
            recipient: user.email.clone(),
            subject: subject.to_string(),
            template: template.to_string(),
            params,
        }
    }

    pub fn send_activation(&self, user: &User, token: &str) {
        self.dispatch(Self::notification(
            user,
            "Confirm your account",
            CONFIRM_TEMPLATE,
            "activation_link",
            self.activation_link(token),
        ));
    }

    pub fn send_password_reset(&self, user: &User, token: &str) {
        self.dispatch(Self::notification(
            user,
            "Reset password",
            PASSWORD_RESET_TEMPLATE,
            "password_reset_link",
            self.password_reset_link(token, &user.email),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::time::Duration;

    fn user() -> User {
        User {
            id: 1,
            username: "alice_musician".to_string(),
            email: "alice+gigs@example.com".to_string(),
            description: String::new(),
            location: "Oslo".to_string(),
            role: Role::Musician,
            activated: false,
            created_at: String::new(),
        }
    }

    async fn wait_for_mail(outbox: &MemoryOutbox) -> Vec<Notification> {
        for _ in 0..50 {
            let messages = outbox.messages().await;
            if !messages.is_empty() {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Vec::new()
    }

    #[test]
    fn test_links_use_base_url() {
        let mailer = Mailer::new(Arc::new(LogSink), "https://gigs.example.com/");
        assert_eq!(
            mailer.activation_link("abc"),
            "https://gigs.example.com/api/auth/activate/abc"
        );
        assert_eq!(
            mailer.password_reset_link("abc", "a+b@example.com"),
            "https://gigs.example.com/api/auth/update-password/abc/a%2Bb%40example.com"
        );
    }

    #[tokio::test]
    async fn test_activation_mail_is_delivered_in_background() {
        let outbox = MemoryOutbox::new();
        let mailer = Mailer::new(Arc::new(outbox.clone()), "http://localhost:5000");

        mailer.send_activation(&user(), "secret-token");

        let messages = wait_for_mail(&outbox).await;
        assert_eq!(messages.len(), 1);

        let mail = &messages[0];
        assert_eq!(mail.recipient, "alice+gigs@example.com");
        assert_eq!(mail.subject, "Confirm your account");
        assert_eq!(mail.template, CONFIRM_TEMPLATE);
        assert_eq!(mail.param("role"), Some("musician"));
        assert!(
            mail.render_body()
                .contains("http://localhost:5000/api/auth/activate/secret-token")
        );
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_propagate() {
        struct FailingSink;

        #[async_trait]
        impl NotificationSink for FailingSink {
            async fn deliver(&self, _notification: Notification) -> Result<()> {
                anyhow::bail!("relay unavailable")
            }
        }

        let mailer = Mailer::new(Arc::new(FailingSink), "http://localhost:5000");
        mailer.send_password_reset(&user(), "secret-token");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
