use std::future::Future;

use thiserror::Error;

/// Fixed-window limiter for requests keyed by client identity.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait RateLimitService: Send + Sync + 'static {
    /// Counts a request from `key` and returns whether it is admitted.
    fn check(&self, key: &str) -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// Forgets everything known about `key`.
    ///
    /// Only available outside of production, intended for test harnesses.
    fn clear(&self, key: &str) -> impl Future<Output = Result<(), RateLimitClearError>> + Send;

    /// Removes all expired windows and returns how many were removed.
    fn sweep(&self) -> impl Future<Output = anyhow::Result<usize>> + Send;
}

#[derive(Debug, Error)]
pub enum RateLimitClearError {
    #[error("Rate limits cannot be cleared in production.")]
    Production,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockRateLimitService {
    pub fn with_check(mut self, key: String, result: bool) -> Self {
        self.expect_check()
            .once()
            .with(mockall::predicate::eq(key))
            .return_once(move |_| Box::pin(std::future::ready(Ok(result))));
        self
    }

    pub fn with_check_error(mut self, key: String) -> Self {
        self.expect_check()
            .once()
            .with(mockall::predicate::eq(key))
            .return_once(|_| {
                Box::pin(std::future::ready(Err(anyhow::anyhow!(
                    "rate limit store unavailable"
                ))))
            });
        self
    }
}
