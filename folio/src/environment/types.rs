use folio_core_contact_impl::{dispatch::ContactDispatchServiceImpl, ContactFeatureServiceImpl};
use folio_core_health_impl::HealthFeatureServiceImpl;
use folio_email_impl::{template::TemplateEmailServiceImpl, EmailServiceImpl};
use folio_extern_impl::recaptcha::RecaptchaApiServiceImpl;
use folio_rate_limit_memory::MemoryRateLimitStore;
use folio_shared_impl::{
    captcha::CaptchaServiceImpl, rate_limit::RateLimitServiceImpl, time::TimeServiceImpl,
};
use folio_templates_impl::TemplateServiceImpl;

// API
pub type RestServer = folio_api_rest::RestServer<HealthFeature, ContactFeature>;

// Rate limit
pub type RateLimitStore = MemoryRateLimitStore;

// Email
pub type Email = EmailServiceImpl;
pub type TemplateEmail = TemplateEmailServiceImpl<Email, Template>;

// Extern
pub type RecaptchaApi = RecaptchaApiServiceImpl;

// Shared
pub type Captcha = CaptchaServiceImpl<RecaptchaApi>;
pub type RateLimit = RateLimitServiceImpl<Time, RateLimitStore>;
pub type Time = TimeServiceImpl;

// Templates
pub type Template = TemplateServiceImpl;

// Core
pub type ContactFeature = ContactFeatureServiceImpl<RateLimit, Captcha, ContactDispatch>;
pub type ContactDispatch = ContactDispatchServiceImpl<TemplateEmail>;
pub type HealthFeature = HealthFeatureServiceImpl<Time, Email>;
