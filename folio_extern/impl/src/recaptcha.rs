use std::sync::Arc;

use folio_extern_contracts::recaptcha::{RecaptchaApiService, RecaptchaSiteverifyResponse};
use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

use crate::http::HttpClient;

const SITEVERIFY_ENDPOINT: &str = "https://www.google.com/recaptcha/api/siteverify";

#[derive(Debug, Clone)]
pub struct RecaptchaApiServiceImpl {
    config: RecaptchaApiServiceConfig,
    client: HttpClient,
}

impl RecaptchaApiServiceImpl {
    pub fn new(config: RecaptchaApiServiceConfig, client: HttpClient) -> Self {
        Self { config, client }
    }
}

#[derive(Debug, Clone)]
pub struct RecaptchaApiServiceConfig {
    siteverify_endpoint: Arc<Url>,
}

impl RecaptchaApiServiceConfig {
    pub fn new(siteverify_endpoint_override: Option<Url>) -> anyhow::Result<Self> {
        let siteverify_endpoint = match siteverify_endpoint_override {
            Some(url) => url,
            None => SITEVERIFY_ENDPOINT.parse()?,
        };
        Ok(Self {
            siteverify_endpoint: siteverify_endpoint.into(),
        })
    }

    pub fn siteverify_endpoint(&self) -> &Url {
        &self.siteverify_endpoint
    }
}

impl RecaptchaApiService for RecaptchaApiServiceImpl {
    async fn siteverify(
        &self,
        response: &str,
        secret: &str,
    ) -> anyhow::Result<RecaptchaSiteverifyResponse> {
        let response = self
            .client
            .post((*self.config.siteverify_endpoint).clone())
            .form(&SiteverifyRequest { response, secret })
            .send()
            .await?
            .error_for_status()?
            .json::<SiteverifyResponse>()
            .await?;

        trace!(
            success = response.success,
            score = response.score,
            error_codes = ?response.error_codes,
            "recaptcha siteverify"
        );

        Ok(response.into())
    }
}

#[derive(Serialize)]
struct SiteverifyRequest<'a> {
    response: &'a str,
    secret: &'a str,
}

#[derive(Deserialize)]
struct SiteverifyResponse {
    success: bool,
    score: Option<f64>,
    action: Option<String>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl From<SiteverifyResponse> for RecaptchaSiteverifyResponse {
    fn from(value: SiteverifyResponse) -> Self {
        Self {
            success: value.success,
            score: value.score,
            action: value.action,
            error_codes: value.error_codes,
        }
    }
}
