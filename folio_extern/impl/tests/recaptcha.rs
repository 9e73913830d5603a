use std::{sync::Arc, time::Duration};

use axum::{extract::State, routing, Form, Json, Router};
use folio_extern_contracts::recaptcha::{RecaptchaApiService, RecaptchaSiteverifyResponse};
use folio_extern_impl::{
    http::HttpClient,
    recaptcha::{RecaptchaApiServiceConfig, RecaptchaApiServiceImpl},
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

const SECRET: &str = "test-secret";
const SITEVERIFY_ROUTE: &str = "/recaptcha/api/siteverify";

#[tokio::test]
async fn success_with_score() {
    let sut = make_sut(FakeSiteverify::Score).await;

    let result = sut.siteverify("success-0.7", SECRET).await.unwrap();

    assert_eq!(
        result,
        RecaptchaSiteverifyResponse {
            success: true,
            score: Some(0.7),
            action: Some("contact".into()),
            error_codes: vec![],
        }
    );
}

#[tokio::test]
async fn invalid_response() {
    let sut = make_sut(FakeSiteverify::Score).await;

    let result = sut.siteverify("garbage", SECRET).await.unwrap();

    assert_eq!(
        result,
        RecaptchaSiteverifyResponse {
            success: false,
            score: None,
            action: None,
            error_codes: vec!["invalid-input-response".into()],
        }
    );
}

#[tokio::test]
async fn invalid_secret() {
    let sut = make_sut(FakeSiteverify::Score).await;

    let result = sut.siteverify("success-0.9", "wrong").await.unwrap();

    assert!(!result.success);
    assert_eq!(result.error_codes, ["invalid-input-secret"]);
}

#[tokio::test]
async fn server_error() {
    let sut = make_sut(FakeSiteverify::Unavailable).await;

    let result = sut.siteverify("success", SECRET).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn timeout() {
    let sut = make_sut(FakeSiteverify::Hang).await;

    let result = sut.siteverify("success", SECRET).await;

    assert!(result.unwrap_err().downcast::<reqwest::Error>().unwrap().is_timeout());
}

#[derive(Clone, Copy)]
enum FakeSiteverify {
    Score,
    Unavailable,
    Hang,
}

async fn make_sut(behavior: FakeSiteverify) -> RecaptchaApiServiceImpl {
    let router = Router::new()
        .route(SITEVERIFY_ROUTE, routing::post(siteverify))
        .with_state((behavior, Arc::<str>::from(SECRET)));
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let endpoint = format!("http://{addr}{SITEVERIFY_ROUTE}").parse().unwrap();
    let config = RecaptchaApiServiceConfig::new(Some(endpoint)).unwrap();
    let client = HttpClient::new(Duration::from_millis(500)).unwrap();
    RecaptchaApiServiceImpl::new(config, client)
}

#[derive(Deserialize)]
struct SiteverifyRequest {
    secret: String,
    response: String,
}

#[derive(Serialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'static str>,
    #[serde(rename = "error-codes")]
    error_codes: Vec<&'static str>,
}

async fn siteverify(
    State((behavior, secret)): State<(FakeSiteverify, Arc<str>)>,
    Form(request): Form<SiteverifyRequest>,
) -> Result<Json<SiteverifyResponse>, axum::http::StatusCode> {
    match behavior {
        FakeSiteverify::Score => {}
        FakeSiteverify::Unavailable => {
            return Err(axum::http::StatusCode::SERVICE_UNAVAILABLE)
        }
        FakeSiteverify::Hang => {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
    }

    if *request.secret != *secret {
        return Ok(Json(SiteverifyResponse {
            success: false,
            score: None,
            action: None,
            error_codes: vec!["invalid-input-secret"],
        }));
    }

    let mut parts = request.response.split('-');
    if parts.next() != Some("success") {
        return Ok(Json(SiteverifyResponse {
            success: false,
            score: None,
            action: None,
            error_codes: vec!["invalid-input-response"],
        }));
    }

    let score = parts
        .next()
        .and_then(|score| score.parse::<f64>().ok())
        .filter(|score| (0.0..=1.0).contains(score))
        .unwrap_or(1.0);

    Ok(Json(SiteverifyResponse {
        success: true,
        score: Some(score),
        action: Some("contact"),
        error_codes: vec![],
    }))
}
