use std::future::Future;

use folio_models::contact::ContactValidationError;
use thiserror::Error;

pub mod dispatch;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFeatureService: Send + Sync + 'static {
    /// Runs a raw contact form submission through every check and sends the
    /// resulting emails.
    ///
    /// The first failing stage ends the submission; nothing after it runs.
    fn submit(
        &self,
        request: ContactSubmitRequest,
    ) -> impl Future<Output = Result<(), ContactSubmitError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmitRequest {
    /// The unparsed request body.
    pub body: Vec<u8>,
    /// Identity of the client the rate limit is applied to.
    pub client_key: String,
    /// Requested skipping of the rate limit. Ignored in production.
    pub bypass_rate_limit: bool,
}

#[derive(Debug, Error)]
pub enum ContactSubmitError {
    #[error("Request too large")]
    TooLarge,
    #[error(
        "Too many requests. Please try again later or send me an email directly."
    )]
    RateLimited,
    #[error("Invalid JSON in request body")]
    InvalidJson,
    #[error(transparent)]
    Invalid(#[from] ContactValidationError),
    #[error("Invalid submission")]
    Honeypot,
    #[error("Verification failed. Please try again.")]
    VerificationFailed,
    #[error("Failed to send message. Please try again later.")]
    Send,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactFeatureService {
    pub fn with_submit(
        mut self,
        request: ContactSubmitRequest,
        result: Result<(), ContactSubmitError>,
    ) -> Self {
        self.expect_submit()
            .once()
            .with(mockall::predicate::eq(request))
            .return_once(|_| Box::pin(std::future::ready(result)));
        self
    }
}
