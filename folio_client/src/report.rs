use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use url::Url;

/// Best effort side channel for unexpected client failures.
///
/// Reporting never blocks the caller and never fails.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, report: ErrorReport);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Where the failure happened, e.g. `contact_form.token`.
    pub source: &'static str,
    pub message: String,
}

/// Posts reports as JSON to a collector endpoint from a detached task.
#[derive(Debug, Clone)]
pub struct BeaconErrorReporter {
    client: reqwest::Client,
    endpoint: Arc<Url>,
}

impl BeaconErrorReporter {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl ErrorReporter for BeaconErrorReporter {
    fn report(&self, report: ErrorReport) {
        let request = self.client.post((*self.endpoint).clone()).json(&report);
        tokio::spawn(async move {
            if let Err(err) = request.send().await {
                debug!("Failed to deliver error report: {err}");
            }
        });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopErrorReporter;

impl ErrorReporter for NoopErrorReporter {
    fn report(&self, _report: ErrorReport) {}
}
