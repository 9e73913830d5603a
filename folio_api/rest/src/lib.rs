use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use folio_core_contact_contracts::ContactFeatureService;
use folio_core_health_contracts::HealthFeatureService;
use folio_models::mode::RuntimeMode;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

mod middlewares;
mod models;
mod routes;

#[derive(Debug, Clone)]
pub struct RestServer<Health, Contact> {
    health: Health,
    contact: Contact,
    config: RestServerConfig,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    pub mode: RuntimeMode,
    /// Origin allowed to submit the contact form from a browser. Every origin is
    /// allowed in development.
    pub allowed_origin: Arc<str>,
    /// Largest accepted contact request body in bytes. Larger bodies are
    /// rejected without being buffered completely.
    pub max_body_size: usize,
}

impl<Health, Contact> RestServer<Health, Contact>
where
    Health: HealthFeatureService,
    Contact: ContactFeatureService,
{
    pub fn new(health: Health, contact: Contact, config: RestServerConfig) -> Self {
        Self {
            health,
            contact,
            config,
        }
    }

    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!("Listening on {addr}");
        }

        let router = self.router()?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .context("Failed to start HTTP server")
    }

    pub fn router(self) -> anyhow::Result<Router<()>> {
        let cors = cors_layer(&self.config)?;

        let router = Router::new()
            .merge(routes::health::router(self.health.into()))
            .merge(routes::contact::router(
                self.contact.into(),
                cors,
                self.config.max_body_size,
            ));

        let router = middlewares::panic_handler::add(router);
        let router = middlewares::trace::add(router);
        let router = middlewares::client_key::add(router);
        let router = middlewares::request_id::add(router);

        Ok(router)
    }
}

fn cors_layer(config: &RestServerConfig) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.mode.is_development() {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(
            HeaderValue::from_str(&config.allowed_origin)
                .with_context(|| format!("Invalid cors origin {:?}", config.allowed_origin))?,
        )
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}
