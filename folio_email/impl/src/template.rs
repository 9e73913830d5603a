use folio_email_contracts::{template::TemplateEmailService, Email, EmailId, EmailService};
use folio_models::email_address::EmailAddressWithName;
use folio_templates_contracts::{
    ContactAutoReplyTemplate, ContactNotificationTemplate, Template, TemplateService,
};

#[derive(Debug, Clone)]
pub struct TemplateEmailServiceImpl<Email, Template> {
    email: Email,
    template: Template,
}

impl<Email, Template> TemplateEmailServiceImpl<Email, Template> {
    pub fn new(email: Email, template: Template) -> Self {
        Self { email, template }
    }
}

impl<EmailS, Template> TemplateEmailService for TemplateEmailServiceImpl<EmailS, Template>
where
    EmailS: EmailService,
    Template: TemplateService,
{
    async fn send_contact_notification(
        &self,
        recipient: EmailAddressWithName,
        reply_to: EmailAddressWithName,
        data: &ContactNotificationTemplate,
    ) -> anyhow::Result<EmailId> {
        let subject = format!("New contact request: {} from {}", data.subject, data.name);
        self.send_email(recipient, Some(reply_to), data, subject)
            .await
    }

    async fn send_contact_auto_reply(
        &self,
        recipient: EmailAddressWithName,
        data: &ContactAutoReplyTemplate,
    ) -> anyhow::Result<EmailId> {
        let subject = format!("Thanks for reaching out: {}", data.subject);
        self.send_email(recipient, None, data, subject).await
    }
}

impl<EmailS, TemplateS> TemplateEmailServiceImpl<EmailS, TemplateS>
where
    EmailS: EmailService,
    TemplateS: TemplateService,
{
    async fn send_email<T: Template + 'static>(
        &self,
        recipient: EmailAddressWithName,
        reply_to: Option<EmailAddressWithName>,
        data: &T,
        subject: String,
    ) -> anyhow::Result<EmailId> {
        let rendered = self.template.render(data)?;
        self.email
            .send(Email {
                recipient,
                subject,
                html: rendered.html,
                text: rendered.text,
                reply_to,
            })
            .await
    }
}
