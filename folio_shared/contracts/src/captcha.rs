use std::future::Future;

use thiserror::Error;

/// Reputation check of the anti-bot token a browser obtained from the captcha
/// provider.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait CaptchaService: Send + Sync + 'static {
    fn check(&self, response: &str) -> impl Future<Output = Result<(), CaptchaCheckError>> + Send;
}

#[derive(Debug, Error)]
pub enum CaptchaCheckError {
    #[error("The response is invalid or the user is probably not human.")]
    Failed,
    /// The verification provider could not be reached. Treated like a failed
    /// check.
    #[error("The captcha provider is unavailable.")]
    Unavailable(#[source] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockCaptchaService {
    pub fn with_check(
        mut self,
        response: String,
        result: Result<(), CaptchaCheckError>,
    ) -> Self {
        self.expect_check()
            .once()
            .with(mockall::predicate::eq(response))
            .return_once(|_| Box::pin(std::future::ready(result)));
        self
    }
}
