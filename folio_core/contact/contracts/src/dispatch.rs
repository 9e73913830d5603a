use std::future::Future;

use folio_email_contracts::EmailId;
use folio_models::contact::ContactSubmission;
use thiserror::Error;

/// Sends the owner notification and the auto-reply for a submission.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactDispatchService: Send + Sync + 'static {
    /// Sends the owner notification first and the auto-reply second. The
    /// auto-reply is not attempted if the notification fails.
    fn dispatch(
        &self,
        submission: &ContactSubmission,
    ) -> impl Future<Output = Result<ContactDispatchReceipt, ContactDispatchError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDispatchReceipt {
    pub notification_id: EmailId,
    pub auto_reply_id: EmailId,
}

#[derive(Debug, Error)]
pub enum ContactDispatchError {
    #[error("Failed to send email.")]
    Send(#[source] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactDispatchService {
    pub fn with_dispatch(
        mut self,
        submission: ContactSubmission,
        result: Option<ContactDispatchReceipt>,
    ) -> Self {
        self.expect_dispatch()
            .once()
            .with(mockall::predicate::eq(submission))
            .return_once(|_| {
                Box::pin(std::future::ready(result.ok_or_else(|| {
                    ContactDispatchError::Send(anyhow::anyhow!("smtp connection reset"))
                })))
            });
        self
    }
}
