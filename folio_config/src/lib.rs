use std::{net::IpAddr, path::Path};

use anyhow::Context;
use config::{File, FileFormat};
use folio_models::{email_address::EmailAddressWithName, mode::RuntimeMode};
use serde::Deserialize;
use url::Url;

pub use duration::Duration;

mod duration;

pub const DEFAULT_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml");

/// Environment variable with a colon separated list of config files.
pub const CONFIG_PATHS_ENV: &str = "FOLIO_CONFIG";

/// Loads the config files listed in `FOLIO_CONFIG`, or the default config file
/// if the variable is not set.
pub fn load() -> anyhow::Result<Config> {
    match std::env::var(CONFIG_PATHS_ENV) {
        Ok(paths) => {
            let paths = paths
                .split(':')
                .filter(|path| !path.is_empty())
                .collect::<Vec<_>>();
            load_paths(&paths[..])
        }
        Err(_) => load_paths(&[DEFAULT_CONFIG_PATH]),
    }
}

/// Loads and merges the given config files. Later files take precedence.
pub fn load_paths(paths: &[impl AsRef<Path>]) -> anyhow::Result<Config> {
    load_with_override(paths, &[])
}

/// Like [`load_paths`], with additional TOML snippets applied last.
pub fn load_with_override(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
) -> anyhow::Result<Config> {
    let builder = paths
        .iter()
        .try_fold(config::Config::builder(), |builder, path| {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file at {}", path.display()))?;
            let source = File::from_str(&content, FileFormat::Toml);
            anyhow::Ok(builder.add_source(source))
        })?;

    overrides
        .iter()
        .fold(builder, |builder, content| {
            builder.add_source(File::from_str(content, FileFormat::Toml))
        })
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: RuntimeMode,
    pub http: HttpConfig,
    pub email: EmailConfig,
    pub contact: ContactConfig,
    pub recaptcha: Option<RecaptchaConfig>,
    #[serde(rename = "extern", default)]
    pub extern_: ExternConfig,
    pub health: HealthConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize)]
pub struct CorsConfig {
    /// Origin allowed to call the API outside of development.
    pub allowed_origin: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from: EmailAddressWithName,
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    /// Mailbox receiving the contact notifications.
    pub recipient: EmailAddressWithName,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    #[serde(default)]
    pub rate_limit: ContactRateLimitConfig,
}

#[derive(Debug, Deserialize)]
pub struct ContactRateLimitConfig {
    #[serde(default = "default_rate_limit_window")]
    pub window: Duration,
    /// Defaults to [`RuntimeMode::default_contact_rate_limit`].
    pub max_requests: Option<u32>,
}

impl Default for ContactRateLimitConfig {
    fn default() -> Self {
        Self {
            window: default_rate_limit_window(),
            max_requests: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecaptchaConfig {
    pub secret: String,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    pub siteverify_endpoint_override: Option<Url>,
}

#[derive(Debug, Deserialize)]
pub struct ExternConfig {
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

impl Default for ExternConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthConfig {
    pub cache_ttl: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_max_body_size() -> usize {
    10 * 1024
}

fn default_rate_limit_window() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_min_score() -> f64 {
    0.5
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn load_default_config() {
        let config = load_paths(&[DEFAULT_CONFIG_PATH]).unwrap();

        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.contact.max_body_size, 10240);
        assert_eq!(config.contact.rate_limit.window, Duration::from_secs(3600));
        assert_eq!(config.extern_.timeout, Duration::from_secs(5));
    }

    #[test]
    fn overrides_take_precedence() {
        let config = load_with_override(
            &[DEFAULT_CONFIG_PATH],
            &[
                r#"
                mode = "production"
                [contact.rate_limit]
                max_requests = 3
                [recaptcha]
                secret = "secret"
                "#,
            ],
        )
        .unwrap();

        assert_eq!(config.mode, RuntimeMode::Production);
        assert_eq!(config.contact.rate_limit.max_requests, Some(3));
        assert_eq!(config.contact.rate_limit.window, Duration::from_secs(3600));
        let recaptcha = config.recaptcha.unwrap();
        assert_eq!(recaptcha.min_score, 0.5);
        assert_eq!(recaptcha.siteverify_endpoint_override, None);
    }

    #[test]
    fn invalid_mode() {
        let result = load_with_override(&[DEFAULT_CONFIG_PATH], &[r#"mode = "staging""#]);

        assert!(result.is_err());
    }

    #[test]
    fn missing_file() {
        let result = load_paths(&["/nonexistent/folio.toml"]);

        assert!(result.is_err());
    }
}
