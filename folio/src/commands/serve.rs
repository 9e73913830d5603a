use folio_config::Config;
use folio_email_contracts::EmailService;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{email, environment::Environment};

pub async fn serve(config: Config) -> anyhow::Result<()> {
    info!(mode = %config.mode, "Starting contact backend");

    info!("Connecting to smtp server");
    let email = email::connect(&config.email)?;
    if let Err(err) = email.ping().await {
        warn!("Smtp server is not reachable yet: {err:#}");
    }

    let environment = Environment::new(&config, email)?;

    if environment.rate_limit.spawn_sweeper().is_some() {
        info!("Started rate limit sweeper");
    }

    info!(
        "Starting http server on {}:{}",
        config.http.host, config.http.port
    );
    let listener = TcpListener::bind((config.http.host, config.http.port)).await?;
    environment.rest_server.serve(listener).await
}
