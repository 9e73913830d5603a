use anyhow::Context;
use clap::Subcommand;
use folio_config::Config;
use folio_email_contracts::{Email, EmailService};
use folio_models::email_address::EmailAddressWithName;
use folio_utils::redact_email;
use tracing::info;

use crate::email;

#[derive(Debug, Subcommand)]
pub enum EmailCommand {
    /// Test email deliverability
    Test { recipient: EmailAddressWithName },
}

impl EmailCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        match self {
            EmailCommand::Test { recipient } => test(config, recipient).await,
        }
    }
}

async fn test(config: Config, recipient: EmailAddressWithName) -> anyhow::Result<()> {
    let email_service = email::connect(&config.email)?;
    let redacted = redact_email(recipient.email().as_ref());

    let id = email_service
        .send(Email {
            recipient,
            subject: "Email Deliverability Test".into(),
            html: "<p>Email deliverability seems to be working!</p>".into(),
            text: "Email deliverability seems to be working!".into(),
            reply_to: None,
        })
        .await
        .context("Failed to send email")?;

    info!(%id, recipient = %redacted, "Test email sent");
    println!("{id}");

    Ok(())
}
