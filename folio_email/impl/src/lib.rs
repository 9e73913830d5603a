use std::time::Duration;

use anyhow::{anyhow, bail, ensure, Context};
use folio_email_contracts::{Email, EmailId, EmailService};
use folio_models::email_address::EmailAddressWithName;
use folio_utils::{redact_email, Apply};
use lettre::{
    message::{MessageBuilder, MultiPart},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;
use uuid::Uuid;

pub mod template;

#[derive(Debug, Clone)]
pub struct EmailServiceImpl {
    from: EmailAddressWithName,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailServiceImpl {
    /// Creates a client for the smtp server at `url`.
    ///
    /// Connections are established lazily, so an unreachable server is only
    /// noticed when the first email is sent or the server is pinged.
    pub fn new(url: &str, from: EmailAddressWithName, timeout: Duration) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(url)
            .context("Invalid smtp url")?
            .timeout(Some(timeout))
            .build();

        Ok(Self { from, transport })
    }
}

impl EmailService for EmailServiceImpl {
    #[tracing::instrument(skip_all, fields(subject = %email.subject))]
    async fn send(&self, email: Email) -> anyhow::Result<EmailId> {
        let recipient = redact_email(email.recipient.email().as_ref());
        let (message, id) = build_message(&self.from, email)?;

        let response = self.transport.send(message).await?;
        if !response.is_positive() {
            bail!("smtp server rejected the email with code {}", response.code());
        }

        debug!(%id, %recipient, "email sent");
        Ok(id)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.transport
            .test_connection()
            .await?
            .then_some(())
            .ok_or_else(|| anyhow!("Failed to ping smtp server"))
    }
}

/// Builds a `multipart/alternative` message with a freshly generated
/// `Message-ID`, which doubles as the id returned to the caller.
///
/// Fails if the subject or a display name contains control characters, which
/// cannot be encoded into a header.
fn build_message(from: &EmailAddressWithName, email: Email) -> anyhow::Result<(Message, EmailId)> {
    ensure!(is_header_safe(&email.subject), "Invalid email subject");
    for mailbox in std::iter::once(&email.recipient).chain(&email.reply_to) {
        let name = mailbox.0.name.as_deref().unwrap_or_default();
        ensure!(
            is_header_safe(name),
            "Invalid display name for {}",
            redact_email(mailbox.email().as_ref())
        );
    }

    let id = EmailId(format!("<{}@{}>", Uuid::now_v7(), from.email().domain()));

    let message = Message::builder()
        .from(from.0.clone())
        .to(email.recipient.0)
        .apply_map(email.reply_to.map(|x| x.0), MessageBuilder::reply_to)
        .message_id(Some(id.0.clone()))
        .subject(email.subject)
        .multipart(MultiPart::alternative_plain_html(email.text, email.html))?;

    Ok((message, id))
}

fn is_header_safe(value: &str) -> bool {
    !value.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email {
            recipient: "Jane Owner <owner@example.com>".parse().unwrap(),
            subject: "The Subject".into(),
            html: "<h1>Hello World!</h1>".into(),
            text: "Hello World!".into(),
            reply_to: Some("John Doe <john@example.com>".parse().unwrap()),
        }
    }

    #[test]
    fn build() {
        // Arrange
        let from = "Portfolio <noreply@folio.example.com>".parse().unwrap();

        // Act
        let (message, id) = build_message(&from, email()).unwrap();

        // Assert
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(id.0.starts_with('<'));
        assert!(id.0.ends_with("@folio.example.com>"));
        assert!(formatted.contains(&format!("Message-ID: {id}")));
        assert!(formatted.contains("<noreply@folio.example.com>"));
        assert!(formatted.contains("<owner@example.com>"));
        assert!(formatted.contains("Reply-To: "));
        assert!(formatted.contains("<john@example.com>"));
        assert!(formatted.contains("Subject: The Subject"));
        assert!(formatted.contains("multipart/alternative"));
        assert!(formatted.contains("text/plain"));
        assert!(formatted.contains("text/html"));
    }

    #[test]
    fn build_without_reply_to() {
        // Arrange
        let from = "noreply@folio.example.com".parse().unwrap();

        // Act
        let (message, _) = build_message(
            &from,
            Email {
                reply_to: None,
                ..email()
            },
        )
        .unwrap();

        // Assert
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(!formatted.contains("Reply-To"));
    }

    #[test]
    fn build_rejects_control_characters() {
        // Arrange
        let from = "noreply@folio.example.com".parse().unwrap();
        let injected: EmailAddressWithName = "john@example.com"
            .parse::<folio_models::email_address::EmailAddress>()
            .unwrap()
            .with_name("John\r\nX-Injected: Evil".into());

        // Act
        let reply_to = build_message(
            &from,
            Email {
                reply_to: Some(injected.clone()),
                ..email()
            },
        );
        let recipient = build_message(
            &from,
            Email {
                recipient: injected,
                ..email()
            },
        );
        let subject = build_message(
            &from,
            Email {
                subject: "Hello\r\nBcc: evil@example.com".into(),
                ..email()
            },
        );

        // Assert
        assert!(reply_to.is_err());
        assert!(recipient.is_err());
        assert!(subject.is_err());
    }

    #[test]
    fn ids_are_unique() {
        let from = "noreply@folio.example.com".parse().unwrap();

        let (_, first) = build_message(&from, email()).unwrap();
        let (_, second) = build_message(&from, email()).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn invalid_url() {
        let from = "noreply@folio.example.com".parse().unwrap();

        let result = EmailServiceImpl::new("http://not-smtp", from, Duration::from_secs(1));

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn ping_unreachable() {
        // Arrange
        let from = "noreply@folio.example.com".parse().unwrap();
        let sut = EmailServiceImpl::new("smtp://127.0.0.1:1", from, Duration::from_secs(1))
            .unwrap();

        // Act
        let result = sut.ping().await;

        // Assert
        assert!(result.is_err());
    }
}
