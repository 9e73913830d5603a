use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing, Extension, Json, Router,
};
use folio_core_contact_contracts::{
    ContactFeatureService, ContactSubmitError, ContactSubmitRequest,
};
use tower_http::cors::CorsLayer;

use super::{error, internal_server_error, typed_error};
use crate::{middlewares::client_key::ClientKey, models::ApiMessage};

pub const BYPASS_RATE_LIMIT_HEADER: &str = "x-bypass-rate-limit";

pub fn router(
    service: Arc<impl ContactFeatureService>,
    cors: CorsLayer,
    max_body_size: usize,
) -> Router<()> {
    Router::new()
        .route("/contact", routing::post(submit))
        // one byte above the ceiling still reaches the size check
        .layer(DefaultBodyLimit::max(max_body_size.saturating_add(1)))
        // also answers preflight requests
        .layer(cors)
        .with_state(service)
}

async fn submit(
    service: State<Arc<impl ContactFeatureService>>,
    Extension(client_key): Extension<ClientKey>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return error(
                StatusCode::PAYLOAD_TOO_LARGE,
                ContactSubmitError::TooLarge.to_string(),
            );
        }
        Err(rejection) => return error(rejection.status(), rejection.body_text()),
    };

    let bypass_rate_limit = headers
        .get(BYPASS_RATE_LIMIT_HEADER)
        .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"true"));

    let request = ContactSubmitRequest {
        body: body.to_vec(),
        client_key: client_key.0,
        bypass_rate_limit,
    };

    match service.submit(request).await {
        Ok(()) => Json(ApiMessage {
            message: "Message sent successfully!",
        })
        .into_response(),
        Err(err @ ContactSubmitError::TooLarge) => {
            error(StatusCode::PAYLOAD_TOO_LARGE, err.to_string())
        }
        Err(err @ ContactSubmitError::RateLimited) => {
            typed_error(StatusCode::TOO_MANY_REQUESTS, err.to_string(), "rate_limit")
        }
        Err(
            err @ (ContactSubmitError::InvalidJson
            | ContactSubmitError::Invalid(_)
            | ContactSubmitError::Honeypot
            | ContactSubmitError::VerificationFailed),
        ) => error(StatusCode::BAD_REQUEST, err.to_string()),
        Err(err @ ContactSubmitError::Send) => {
            error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        Err(ContactSubmitError::Other(err)) => internal_server_error(err),
    }
}
