use std::future::Future;

use folio_models::email_address::EmailAddressWithName;
use folio_templates_contracts::{ContactAutoReplyTemplate, ContactNotificationTemplate};

use crate::EmailId;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait TemplateEmailService: Send + Sync + 'static {
    /// Notifies the site owner about a contact submission. Replies go to
    /// `reply_to`.
    fn send_contact_notification(
        &self,
        recipient: EmailAddressWithName,
        reply_to: EmailAddressWithName,
        data: &ContactNotificationTemplate,
    ) -> impl Future<Output = anyhow::Result<EmailId>> + Send;

    fn send_contact_auto_reply(
        &self,
        recipient: EmailAddressWithName,
        data: &ContactAutoReplyTemplate,
    ) -> impl Future<Output = anyhow::Result<EmailId>> + Send;
}

#[cfg(feature = "mock")]
impl MockTemplateEmailService {
    pub fn with_send_contact_notification(
        mut self,
        recipient: EmailAddressWithName,
        reply_to: EmailAddressWithName,
        data: ContactNotificationTemplate,
        result: Option<EmailId>,
    ) -> Self {
        self.expect_send_contact_notification()
            .once()
            .with(
                mockall::predicate::eq(recipient),
                mockall::predicate::eq(reply_to),
                mockall::predicate::eq(data),
            )
            .return_once(move |_, _, _| {
                Box::pin(std::future::ready(
                    result.ok_or_else(|| anyhow::anyhow!("smtp connection reset")),
                ))
            });
        self
    }

    pub fn with_send_contact_auto_reply(
        mut self,
        recipient: EmailAddressWithName,
        data: ContactAutoReplyTemplate,
        result: Option<EmailId>,
    ) -> Self {
        self.expect_send_contact_auto_reply()
            .once()
            .with(
                mockall::predicate::eq(recipient),
                mockall::predicate::eq(data),
            )
            .return_once(move |_, _| {
                Box::pin(std::future::ready(
                    result.ok_or_else(|| anyhow::anyhow!("smtp connection reset")),
                ))
            });
        self
    }
}
