use std::net::SocketAddr;

use folio_api_rest::{RestServer, RestServerConfig};
use folio_core_contact_contracts::MockContactFeatureService;
use folio_core_health_contracts::MockHealthFeatureService;
use folio_models::mode::RuntimeMode;
use tokio::net::TcpListener;

pub const ALLOWED_ORIGIN: &str = "https://folio.example.com";
pub const MAX_BODY_SIZE: usize = 10 * 1024;

/// Serves the given mocks on a random local port and returns its base url.
pub async fn serve(
    mode: RuntimeMode,
    health: MockHealthFeatureService,
    contact: MockContactFeatureService,
) -> String {
    let server = RestServer::new(
        health,
        contact,
        RestServerConfig {
            mode,
            allowed_origin: ALLOWED_ORIGIN.into(),
            max_body_size: MAX_BODY_SIZE,
        },
    );

    let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    format!("http://{addr}")
}
