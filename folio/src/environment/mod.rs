use folio_api_rest::RestServerConfig;
use folio_config::Config;
use folio_core_contact_impl::{dispatch::ContactDispatchConfig, ContactFeatureConfig};
use folio_core_health_impl::HealthFeatureConfig;
use folio_extern_impl::{http::HttpClient, recaptcha::RecaptchaApiServiceConfig};
use folio_rate_limit_contracts::RateLimitPolicy;
use folio_shared_impl::{
    captcha::{CaptchaServiceConfig, RecaptchaCaptchaServiceConfig},
    rate_limit::RateLimitServiceConfig,
};
use types::{
    Captcha, ContactDispatch, ContactFeature, Email, HealthFeature, RateLimit, RateLimitStore,
    RecaptchaApi, RestServer, Template, TemplateEmail, Time,
};

pub mod types;

/// Every service of the application, wired together from the config.
pub struct Environment {
    pub rest_server: RestServer,
    pub rate_limit: RateLimit,
}

impl Environment {
    pub fn new(config: &Config, email: Email) -> anyhow::Result<Self> {
        let mode = config.mode;
        let time = Time::default();

        // Extern
        let http_client = HttpClient::new(config.extern_.timeout.into())?;
        let recaptcha_api_service_config = RecaptchaApiServiceConfig::new(
            config
                .recaptcha
                .as_ref()
                .and_then(|recaptcha| recaptcha.siteverify_endpoint_override.clone()),
        )?;
        let recaptcha_api = RecaptchaApi::new(recaptcha_api_service_config, http_client);

        // Shared
        let captcha_service_config = CaptchaServiceConfig::new(
            mode,
            config
                .recaptcha
                .as_ref()
                .map(|recaptcha| RecaptchaCaptchaServiceConfig {
                    secret: recaptcha.secret.as_str().into(),
                    min_score: recaptcha.min_score,
                }),
        )?;
        let captcha = Captcha::new(recaptcha_api, captcha_service_config);

        let rate_limit_service_config = RateLimitServiceConfig {
            mode,
            policy: RateLimitPolicy {
                max_requests: config
                    .contact
                    .rate_limit
                    .max_requests
                    .unwrap_or_else(|| mode.default_contact_rate_limit()),
                window: config.contact.rate_limit.window.into(),
            },
        };
        let rate_limit = RateLimit::new(time, RateLimitStore::new(), rate_limit_service_config);

        // Email
        let template = Template::new()?;
        let template_email = TemplateEmail::new(email.clone(), template);

        // Core
        let contact_dispatch_config = ContactDispatchConfig {
            recipient: config.contact.recipient.clone().into(),
        };
        let contact_dispatch = ContactDispatch::new(template_email, contact_dispatch_config);

        let contact_feature_config = ContactFeatureConfig {
            mode,
            max_body_size: config.contact.max_body_size,
        };
        let contact_feature = ContactFeature::new(
            rate_limit.clone(),
            captcha,
            contact_dispatch,
            contact_feature_config,
        );

        let health_feature_config = HealthFeatureConfig {
            cache_ttl: config.health.cache_ttl.into(),
        };
        let health_feature = HealthFeature::new(time, email, health_feature_config);

        // API
        let rest_server_config = RestServerConfig {
            mode,
            allowed_origin: config.http.cors.allowed_origin.as_str().into(),
            max_body_size: config.contact.max_body_size,
        };
        let rest_server = RestServer::new(health_feature, contact_feature, rest_server_config);

        Ok(Self {
            rest_server,
            rate_limit,
        })
    }
}
