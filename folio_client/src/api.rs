use std::{future::Future, sync::Arc};

use folio_models::contact::ContactSubject;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[cfg_attr(test, mockall::automock)]
pub trait ContactApi: Send + Sync + 'static {
    /// Posts a contact form submission.
    fn submit(
        &self,
        payload: ContactFormPayload,
    ) -> impl Future<Output = Result<(), ContactApiError>> + Send;
}

/// Request body of `POST /contact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormPayload {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub subject: ContactSubject,
    pub message: String,
    pub anti_bot_token: String,
    pub honeypot: String,
}

#[derive(Debug, Error)]
pub enum ContactApiError {
    /// The server answered with a non-success status.
    #[error("The server rejected the submission with status {status}.")]
    Rejected {
        status: u16,
        message: Option<String>,
        rate_limited: bool,
    },
    #[error("The server could not be reached.")]
    Network(#[source] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct HttpContactApi {
    client: reqwest::Client,
    endpoint: Arc<Url>,
}

impl HttpContactApi {
    /// Creates a client for the contact endpoint below `base_url`.
    pub fn new(client: reqwest::Client, base_url: &Url) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            endpoint: base_url.join("contact")?.into(),
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl ContactApi for HttpContactApi {
    async fn submit(&self, payload: ContactFormPayload) -> Result<(), ContactApiError> {
        let response = self
            .client
            .post((*self.endpoint).clone())
            .json(&payload)
            .send()
            .await
            .map_err(|err| ContactApiError::Network(err.into()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.json::<ErrorBody>().await.ok();
        let (message, kind) = body.map(|b| (b.error, b.kind)).unwrap_or_default();
        Err(ContactApiError::Rejected {
            status: status.as_u16(),
            message,
            rate_limited: kind.as_deref() == Some("rate_limit"),
        })
    }
}

#[cfg(test)]
impl MockContactApi {
    pub fn with_submit(
        mut self,
        payload: ContactFormPayload,
        result: Result<(), ContactApiError>,
    ) -> Self {
        self.expect_submit()
            .once()
            .with(mockall::predicate::eq(payload))
            .return_once(|_| Box::pin(std::future::ready(result)));
        self
    }
}
