use folio_core_contact_contracts::{
    dispatch::ContactDispatchService, ContactFeatureService, ContactSubmitError,
    ContactSubmitRequest,
};
use folio_models::{contact::ContactSubmission, mode::RuntimeMode};
use folio_shared_contracts::{
    captcha::{CaptchaCheckError, CaptchaService},
    rate_limit::RateLimitService,
};
use tracing::{error, warn};

pub mod dispatch;

/// Logs a pipeline transition, at `info` outside of production and at
/// `debug` in production.
macro_rules! stage {
    ($mode:expr, $($arg:tt)+) => {
        if $mode.is_production() {
            ::tracing::debug!($($arg)+)
        } else {
            ::tracing::info!($($arg)+)
        }
    };
}

#[derive(Debug, Clone)]
pub struct ContactFeatureServiceImpl<RateLimit, Captcha, Dispatch> {
    rate_limit: RateLimit,
    captcha: Captcha,
    dispatch: Dispatch,
    config: ContactFeatureConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactFeatureConfig {
    pub mode: RuntimeMode,
    /// Largest accepted request body in bytes.
    pub max_body_size: usize,
}

impl<RateLimit, Captcha, Dispatch> ContactFeatureServiceImpl<RateLimit, Captcha, Dispatch> {
    pub fn new(
        rate_limit: RateLimit,
        captcha: Captcha,
        dispatch: Dispatch,
        config: ContactFeatureConfig,
    ) -> Self {
        Self {
            rate_limit,
            captcha,
            dispatch,
            config,
        }
    }
}

impl<RateLimit, Captcha, Dispatch> ContactFeatureService
    for ContactFeatureServiceImpl<RateLimit, Captcha, Dispatch>
where
    RateLimit: RateLimitService,
    Captcha: CaptchaService,
    Dispatch: ContactDispatchService,
{
    #[tracing::instrument(skip_all, fields(client_key = %request.client_key))]
    async fn submit(&self, request: ContactSubmitRequest) -> Result<(), ContactSubmitError> {
        let mode = self.config.mode;
        let ContactSubmitRequest {
            body,
            client_key,
            bypass_rate_limit,
        } = request;

        if body.len() > self.config.max_body_size {
            warn!(size = body.len(), "contact request too large");
            return Err(ContactSubmitError::TooLarge);
        }
        stage!(mode, size = body.len(), "contact request size checked");

        if bypass_rate_limit && !mode.is_production() {
            stage!(mode, "contact rate limit bypassed");
        } else {
            let allowed = self
                .rate_limit
                .check(&client_key)
                .await
                .unwrap_or_else(|err| {
                    error!("Failed to check contact rate limit, admitting request: {err:#}");
                    true
                });
            if !allowed {
                warn!("contact rate limit exceeded");
                return Err(ContactSubmitError::RateLimited);
            }
            stage!(mode, "contact rate limit checked");
        }

        let value = serde_json::from_slice::<serde_json::Value>(&body).map_err(|err| {
            warn!("contact request body is not valid json: {err}");
            ContactSubmitError::InvalidJson
        })?;
        stage!(mode, "contact request parsed");

        let submission = ContactSubmission::from_json(&value).inspect_err(|err| {
            warn!(field = err.field.key(), "contact submission rejected: {err}");
        })?;
        stage!(mode, subject = %submission.subject, "contact submission validated");

        if submission.honeypot.is_tripped() {
            warn!("contact honeypot tripped");
            return Err(ContactSubmitError::Honeypot);
        }

        self.captcha
            .check(&submission.anti_bot_token)
            .await
            .map_err(|err| {
                match &err {
                    CaptchaCheckError::Failed => warn!("contact captcha check failed"),
                    CaptchaCheckError::Unavailable(err) => {
                        error!("contact captcha provider unavailable: {err:#}")
                    }
                }
                ContactSubmitError::VerificationFailed
            })?;
        stage!(mode, "contact bot defense passed");

        let receipt = self
            .dispatch
            .dispatch(&submission)
            .await
            .map_err(|_| ContactSubmitError::Send)?;
        stage!(
            mode,
            notification_id = %receipt.notification_id,
            auto_reply_id = %receipt.auto_reply_id,
            "contact emails sent"
        );

        Ok(())
    }
}
