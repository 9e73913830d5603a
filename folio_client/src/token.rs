use std::future::Future;

/// Source of single use anti-bot tokens, backed by the captcha provider's
/// browser script.
#[cfg_attr(test, mockall::automock)]
pub trait TokenProvider: Send + Sync + 'static {
    /// Obtains a fresh token for `action`.
    fn fetch(&self, action: &str) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Token submitted in development instead of asking the provider, matching the
/// server skipping verification there.
pub const DEVELOPMENT_TOKEN: &str = "development-token";

#[cfg(test)]
impl MockTokenProvider {
    pub fn with_fetch(mut self, action: String, result: Option<String>) -> Self {
        self.expect_fetch()
            .once()
            .with(mockall::predicate::eq(action))
            .return_once(|_| {
                Box::pin(std::future::ready(
                    result.ok_or_else(|| anyhow::anyhow!("recaptcha script not loaded")),
                ))
            });
        self
    }
}
