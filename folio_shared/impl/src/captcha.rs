use std::sync::Arc;

use anyhow::bail;
use folio_extern_contracts::recaptcha::RecaptchaApiService;
use folio_models::mode::RuntimeMode;
use folio_shared_contracts::captcha::{CaptchaCheckError, CaptchaService};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CaptchaServiceImpl<RecaptchaApi> {
    recaptcha_api: RecaptchaApi,
    config: CaptchaServiceConfig,
}

impl<RecaptchaApi> CaptchaServiceImpl<RecaptchaApi> {
    pub fn new(recaptcha_api: RecaptchaApi, config: CaptchaServiceConfig) -> Self {
        Self {
            recaptcha_api,
            config,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptchaServiceConfig {
    /// Every check passes without contacting the provider.
    Disabled,
    Recaptcha(RecaptchaCaptchaServiceConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecaptchaCaptchaServiceConfig {
    pub secret: Arc<str>,
    pub min_score: f64,
}

impl CaptchaServiceConfig {
    /// Picks the verification strategy for `mode`.
    ///
    /// Development always skips verification, tests skip it unless a secret
    /// is configured and production refuses to start without one.
    pub fn new(
        mode: RuntimeMode,
        recaptcha: Option<RecaptchaCaptchaServiceConfig>,
    ) -> anyhow::Result<Self> {
        Ok(match (mode, recaptcha) {
            (RuntimeMode::Development, _) | (RuntimeMode::Test, None) => Self::Disabled,
            (_, Some(recaptcha)) => Self::Recaptcha(recaptcha),
            (RuntimeMode::Production, None) => {
                bail!("recaptcha must be configured in production")
            }
        })
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Recaptcha(_))
    }
}

impl<RecaptchaApi> CaptchaService for CaptchaServiceImpl<RecaptchaApi>
where
    RecaptchaApi: RecaptchaApiService,
{
    async fn check(&self, response: &str) -> Result<(), CaptchaCheckError> {
        let CaptchaServiceConfig::Recaptcha(config) = &self.config else {
            debug!("captcha verification disabled");
            return Ok(());
        };

        if response.is_empty() {
            return Err(CaptchaCheckError::Failed);
        }

        let response = self
            .recaptcha_api
            .siteverify(response, &config.secret)
            .await
            .inspect_err(|err| warn!("recaptcha siteverify failed: {err:#}"))
            .map_err(CaptchaCheckError::Unavailable)?;

        let score = response.score.unwrap_or(0.0);
        debug!(success = response.success, score, "captcha verified");

        let ok = response.success && score >= config.min_score;
        ok.then_some(()).ok_or(CaptchaCheckError::Failed)
    }
}
