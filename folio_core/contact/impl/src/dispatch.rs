use std::sync::Arc;

use folio_core_contact_contracts::dispatch::{
    ContactDispatchError, ContactDispatchReceipt, ContactDispatchService,
};
use folio_email_contracts::template::TemplateEmailService;
use folio_models::{contact::ContactSubmission, email_address::EmailAddressWithName};
use folio_templates_contracts::{ContactAutoReplyTemplate, ContactNotificationTemplate};
use tracing::error;

#[derive(Debug, Clone)]
pub struct ContactDispatchServiceImpl<TemplateEmail> {
    template_email: TemplateEmail,
    config: ContactDispatchConfig,
}

#[derive(Debug, Clone)]
pub struct ContactDispatchConfig {
    /// Mailbox of the site owner.
    pub recipient: Arc<EmailAddressWithName>,
}

impl<TemplateEmail> ContactDispatchServiceImpl<TemplateEmail> {
    pub fn new(template_email: TemplateEmail, config: ContactDispatchConfig) -> Self {
        Self {
            template_email,
            config,
        }
    }
}

impl<TemplateEmail> ContactDispatchService for ContactDispatchServiceImpl<TemplateEmail>
where
    TemplateEmail: TemplateEmailService,
{
    #[tracing::instrument(skip_all, fields(subject = %submission.subject))]
    async fn dispatch(
        &self,
        submission: &ContactSubmission,
    ) -> Result<ContactDispatchReceipt, ContactDispatchError> {
        let author = &submission.author;
        let name = author.name.clone().into_inner();
        let message = submission.message.clone().into_inner();
        let subject = submission.subject.label().to_owned();
        let submitter = author.email.clone().with_name(name.clone());

        let notification = ContactNotificationTemplate {
            name: name.clone(),
            email: author.email.to_string(),
            company: author.company.clone().map(|company| company.into_inner()),
            subject: subject.clone(),
            message: message.clone(),
        };
        let notification_id = self
            .template_email
            .send_contact_notification(
                (*self.config.recipient).clone(),
                submitter.clone(),
                &notification,
            )
            .await
            .inspect_err(|err| error!("Failed to send contact notification: {err:#}"))
            .map_err(ContactDispatchError::Send)?;

        let auto_reply = ContactAutoReplyTemplate {
            name,
            subject,
            guidance: submission.subject.guidance().to_owned(),
            message,
        };
        let auto_reply_id = self
            .template_email
            .send_contact_auto_reply(submitter, &auto_reply)
            .await
            .inspect_err(|err| error!("Failed to send contact auto-reply: {err:#}"))
            .map_err(ContactDispatchError::Send)?;

        Ok(ContactDispatchReceipt {
            notification_id,
            auto_reply_id,
        })
    }
}
