use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use folio_models::{contact::ContactSubject, mode::RuntimeMode};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    api::{ContactApi, ContactApiError, ContactFormPayload},
    report::{ErrorReport, ErrorReporter},
    token::{TokenProvider, DEVELOPMENT_TOKEN},
};

pub const SUBMITTING_ANNOUNCEMENT: &str = "Sending your message...";
pub const SUCCESS_ANNOUNCEMENT: &str = "Message sent successfully! I'll get back to you soon.";

/// Captcha action the anti-bot token is requested for.
pub const TOKEN_ACTION: &str = "contact";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactFormState {
    Idle,
    Submitting,
    Success,
    /// Carries the message shown to the user.
    Error(String),
}

impl ContactFormState {
    /// Text for the form's live region, read out by assistive technology
    /// whenever the state changes.
    pub fn announcement(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Submitting => SUBMITTING_ANNOUNCEMENT,
            Self::Success => SUCCESS_ANNOUNCEMENT,
            Self::Error(message) => message,
        }
    }
}

/// The values a visitor entered into the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub subject: ContactSubject,
    pub message: String,
    pub honeypot: String,
}

#[derive(Debug, Clone)]
pub struct ContactFormConfig {
    pub mode: RuntimeMode,
    /// How long the success and error states stay visible.
    pub revert_delay: Duration,
    /// Address offered as a fallback in the generic error message.
    pub fallback_email: String,
}

impl ContactFormConfig {
    pub fn new(mode: RuntimeMode, fallback_email: String) -> Self {
        Self {
            mode,
            revert_delay: Duration::from_secs(5),
            fallback_email,
        }
    }

    fn generic_error(&self) -> String {
        format!(
            "Something went wrong. Please try again or email me directly at {}.",
            self.fallback_email
        )
    }
}

/// Drives one contact form instance through `idle -> submitting -> success |
/// error -> idle`.
///
/// Only one submission is in flight at a time. After [`unmount`] no state
/// change is published anymore.
///
/// [`unmount`]: ContactFormController::unmount
pub struct ContactFormController<Api, Token, Reporter> {
    api: Api,
    token: Token,
    reporter: Reporter,
    config: ContactFormConfig,
    shared: Arc<Shared>,
}

struct Shared {
    state: watch::Sender<ContactFormState>,
    mounted: AtomicBool,
    in_flight: AtomicBool,
    /// Bumped on every transition so a pending revert can tell whether the
    /// state it was scheduled for is still displayed.
    generation: AtomicU64,
    revert: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn publish(&self, state: ContactFormState) -> Option<u64> {
        if !self.mounted.load(Ordering::Acquire) {
            debug!(?state, "skipping state change of unmounted contact form");
            return None;
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.send_replace(state);
        Some(generation)
    }

    fn replace_revert(&self, handle: Option<JoinHandle<()>>) {
        let mut revert = self.revert.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = std::mem::replace(&mut *revert, handle) {
            previous.abort();
        }
    }
}

/// Clears the in flight flag when a submission ends, including when its
/// future is dropped before completion.
struct InFlight<'a>(&'a Shared);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

impl<Api, Token, Reporter> ContactFormController<Api, Token, Reporter>
where
    Api: ContactApi,
    Token: TokenProvider,
    Reporter: ErrorReporter,
{
    pub fn new(api: Api, token: Token, reporter: Reporter, config: ContactFormConfig) -> Self {
        Self {
            api,
            token,
            reporter,
            config,
            shared: Arc::new(Shared {
                state: watch::Sender::new(ContactFormState::Idle),
                mounted: AtomicBool::new(true),
                in_flight: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                revert: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> ContactFormState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ContactFormState> {
        self.shared.state.subscribe()
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        self.shared.mounted.load(Ordering::Acquire)
            && !self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn announcement(&self) -> String {
        self.shared.state.borrow().announcement().to_owned()
    }

    /// Stops publishing state changes, including pending reverts to idle.
    pub fn unmount(&self) {
        self.shared.mounted.store(false, Ordering::Release);
        self.shared.replace_revert(None);
    }

    /// Submits the form.
    ///
    /// Returns the state the form ended up in, or `None` if the call was
    /// ignored because another submission is in flight or the form is
    /// unmounted.
    pub async fn submit(&self, form: ContactForm) -> Option<ContactFormState> {
        if !self.shared.mounted.load(Ordering::Acquire)
            || self.shared.in_flight.swap(true, Ordering::AcqRel)
        {
            debug!("ignoring contact form submission");
            return None;
        }

        let in_flight = InFlight(&self.shared);
        self.shared.replace_revert(None);
        self.shared.publish(ContactFormState::Submitting);

        let outcome = self.send(form).await;
        drop(in_flight);

        let generation = self.shared.publish(outcome.clone())?;
        self.schedule_revert(generation);
        Some(outcome)
    }

    async fn send(&self, form: ContactForm) -> ContactFormState {
        let anti_bot_token = match self.anti_bot_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!("Failed to obtain anti-bot token: {err:#}");
                self.reporter.report(ErrorReport {
                    source: "contact_form.token",
                    message: format!("{err:#}"),
                });
                return ContactFormState::Error(self.config.generic_error());
            }
        };

        let payload = ContactFormPayload {
            name: form.name,
            email: form.email,
            company: form.company.filter(|company| !company.is_empty()),
            subject: form.subject,
            message: form.message,
            anti_bot_token,
            honeypot: form.honeypot,
        };

        match self.api.submit(payload).await {
            Ok(()) => ContactFormState::Success,
            Err(ContactApiError::Rejected {
                message: Some(message),
                rate_limited: true,
                ..
            }) => ContactFormState::Error(message),
            Err(err) => {
                warn!("Failed to submit contact form: {err}");
                if !matches!(err, ContactApiError::Rejected { status: 400..=499, .. }) {
                    self.reporter.report(ErrorReport {
                        source: "contact_form.submit",
                        message: err.to_string(),
                    });
                }
                ContactFormState::Error(self.config.generic_error())
            }
        }
    }

    async fn anti_bot_token(&self) -> anyhow::Result<String> {
        if self.config.mode.is_development() {
            return Ok(DEVELOPMENT_TOKEN.to_owned());
        }
        self.token.fetch(TOKEN_ACTION).await
    }

    fn schedule_revert(&self, generation: u64) {
        let shared = Arc::clone(&self.shared);
        let delay = self.config.revert_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if shared.generation.load(Ordering::Acquire) == generation {
                shared.publish(ContactFormState::Idle);
            }
        });
        self.shared.replace_revert(Some(handle));
    }
}

impl<Api, Token, Reporter> Drop for ContactFormController<Api, Token, Reporter> {
    fn drop(&mut self) {
        self.shared.mounted.store(false, Ordering::Release);
        self.shared.replace_revert(None);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    use super::*;
    use crate::{api::MockContactApi, report::MockErrorReporter, token::MockTokenProvider};

    const GENERIC_ERROR: &str =
        "Something went wrong. Please try again or email me directly at hello@folio.example.com.";
    const RATE_LIMIT_MESSAGE: &str =
        "Too many requests. Please try again later or send me an email directly.";

    fn config(mode: RuntimeMode) -> ContactFormConfig {
        ContactFormConfig::new(mode, "hello@folio.example.com".into())
    }

    fn form() -> ContactForm {
        ContactForm {
            name: "John Doe".into(),
            email: "john@example.com".into(),
            company: Some(String::new()),
            subject: ContactSubject::Consulting,
            message: "AAAAAAAAAA".into(),
            honeypot: String::new(),
        }
    }

    fn payload(token: &str) -> ContactFormPayload {
        ContactFormPayload {
            name: "John Doe".into(),
            email: "john@example.com".into(),
            company: None,
            subject: ContactSubject::Consulting,
            message: "AAAAAAAAAA".into(),
            anti_bot_token: token.into(),
            honeypot: String::new(),
        }
    }

    fn reporter(times: usize) -> MockErrorReporter {
        let mut reporter = MockErrorReporter::new();
        reporter.expect_report().times(times).return_const(());
        reporter
    }

    #[tokio::test(start_paused = true)]
    async fn success_then_idle() {
        // Arrange
        let api = MockContactApi::new().with_submit(payload("tok"), Ok(()));
        let token = MockTokenProvider::new().with_fetch("contact".into(), Some("tok".into()));
        let sut = ContactFormController::new(api, token, reporter(0), config(RuntimeMode::Production));
        let mut states = sut.subscribe();

        // Act
        let result = sut.submit(form()).await;

        // Assert
        assert_eq!(result, Some(ContactFormState::Success));
        assert_eq!(sut.state(), ContactFormState::Success);
        assert_eq!(sut.announcement(), SUCCESS_ANNOUNCEMENT);
        assert!(sut.can_submit());

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(sut.state(), ContactFormState::Success);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(sut.state(), ContactFormState::Idle);
        assert_eq!(sut.announcement(), "");
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ContactFormState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_message_is_shown() {
        // Arrange
        let api = MockContactApi::new().with_submit(
            payload("tok"),
            Err(ContactApiError::Rejected {
                status: 429,
                message: Some(RATE_LIMIT_MESSAGE.into()),
                rate_limited: true,
            }),
        );
        let token = MockTokenProvider::new().with_fetch("contact".into(), Some("tok".into()));
        let sut = ContactFormController::new(api, token, reporter(0), config(RuntimeMode::Production));

        // Act
        let result = sut.submit(form()).await;

        // Assert
        assert_eq!(
            result,
            Some(ContactFormState::Error(RATE_LIMIT_MESSAGE.into()))
        );
        assert_eq!(sut.announcement(), RATE_LIMIT_MESSAGE);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(sut.state(), ContactFormState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn other_rejection_is_generic() {
        // Arrange
        let api = MockContactApi::new().with_submit(
            payload("tok"),
            Err(ContactApiError::Rejected {
                status: 400,
                message: Some("Please enter a valid email address".into()),
                rate_limited: false,
            }),
        );
        let token = MockTokenProvider::new().with_fetch("contact".into(), Some("tok".into()));
        let sut = ContactFormController::new(api, token, reporter(0), config(RuntimeMode::Production));

        // Act
        let result = sut.submit(form()).await;

        // Assert
        assert_eq!(result, Some(ContactFormState::Error(GENERIC_ERROR.into())));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_is_reported() {
        // Arrange
        let api = MockContactApi::new().with_submit(
            payload("tok"),
            Err(ContactApiError::Rejected {
                status: 500,
                message: Some("Failed to send message. Please try again later.".into()),
                rate_limited: false,
            }),
        );
        let token = MockTokenProvider::new().with_fetch("contact".into(), Some("tok".into()));
        let sut = ContactFormController::new(api, token, reporter(1), config(RuntimeMode::Production));

        // Act
        let result = sut.submit(form()).await;

        // Assert
        assert_eq!(result, Some(ContactFormState::Error(GENERIC_ERROR.into())));
    }

    #[tokio::test(start_paused = true)]
    async fn network_error() {
        // Arrange
        let api = MockContactApi::new().with_submit(
            payload("tok"),
            Err(ContactApiError::Network(anyhow::anyhow!("connection reset"))),
        );
        let token = MockTokenProvider::new().with_fetch("contact".into(), Some("tok".into()));
        let sut = ContactFormController::new(api, token, reporter(1), config(RuntimeMode::Production));

        // Act
        let result = sut.submit(form()).await;

        // Assert
        assert_eq!(result, Some(ContactFormState::Error(GENERIC_ERROR.into())));
        assert_eq!(sut.announcement(), GENERIC_ERROR);
    }

    #[tokio::test(start_paused = true)]
    async fn token_failure_skips_request() {
        // Arrange
        let token = MockTokenProvider::new().with_fetch("contact".into(), None);
        let sut = ContactFormController::new(
            MockContactApi::new(),
            token,
            reporter(1),
            config(RuntimeMode::Production),
        );

        // Act
        let result = sut.submit(form()).await;

        // Assert
        assert_eq!(result, Some(ContactFormState::Error(GENERIC_ERROR.into())));
    }

    #[tokio::test(start_paused = true)]
    async fn development_token() {
        // Arrange
        let api = MockContactApi::new().with_submit(payload(DEVELOPMENT_TOKEN), Ok(()));
        let sut = ContactFormController::new(
            api,
            MockTokenProvider::new(),
            reporter(0),
            config(RuntimeMode::Development),
        );

        // Act
        let result = sut.submit(form()).await;

        // Assert
        assert_eq!(result, Some(ContactFormState::Success));
    }

    #[tokio::test(start_paused = true)]
    async fn single_flight() {
        // Arrange
        let release = Arc::new(Notify::new());
        let mut api = MockContactApi::new();
        let wait = Arc::clone(&release);
        api.expect_submit().once().return_once(move |_| {
            Box::pin(async move {
                wait.notified().await;
                Ok(())
            })
        });
        let sut = ContactFormController::new(
            api,
            MockTokenProvider::new(),
            reporter(0),
            config(RuntimeMode::Development),
        );

        // Act
        let (first, second) = tokio::join!(sut.submit(form()), async {
            tokio::task::yield_now().await;
            assert_eq!(sut.state(), ContactFormState::Submitting);
            assert_eq!(sut.announcement(), SUBMITTING_ANNOUNCEMENT);
            assert!(!sut.can_submit());
            let second = sut.submit(form()).await;
            release.notify_one();
            second
        });

        // Assert
        assert_eq!(first, Some(ContactFormState::Success));
        assert_eq!(second, None);
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_during_submission() {
        // Arrange
        let release = Arc::new(Notify::new());
        let mut api = MockContactApi::new();
        let wait = Arc::clone(&release);
        api.expect_submit().once().return_once(move |_| {
            Box::pin(async move {
                wait.notified().await;
                Ok(())
            })
        });
        let sut = ContactFormController::new(
            api,
            MockTokenProvider::new(),
            reporter(0),
            config(RuntimeMode::Development),
        );

        // Act
        let (result, ()) = tokio::join!(sut.submit(form()), async {
            tokio::task::yield_now().await;
            sut.unmount();
            release.notify_one();
        });

        // Assert
        assert_eq!(result, None);
        assert_eq!(sut.state(), ContactFormState::Submitting);
        assert!(!sut.can_submit());
        assert_eq!(sut.submit(form()).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submission_releases_form() {
        // Arrange
        let mut api = MockContactApi::new();
        api.expect_submit()
            .once()
            .return_once(|_| Box::pin(std::future::pending()));
        api.expect_submit()
            .once()
            .return_once(|_| Box::pin(std::future::ready(Ok(()))));
        let sut = ContactFormController::new(
            api,
            MockTokenProvider::new(),
            reporter(0),
            config(RuntimeMode::Development),
        );

        // Act
        let abandoned =
            tokio::time::timeout(Duration::from_secs(1), sut.submit(form())).await;
        let can_submit = sut.can_submit();
        let result = sut.submit(form()).await;

        // Assert
        assert!(abandoned.is_err());
        assert!(can_submit);
        assert_eq!(result, Some(ContactFormState::Success));
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_cancels_revert() {
        // Arrange
        let api = MockContactApi::new().with_submit(payload(DEVELOPMENT_TOKEN), Ok(()));
        let sut = ContactFormController::new(
            api,
            MockTokenProvider::new(),
            reporter(0),
            config(RuntimeMode::Development),
        );
        sut.submit(form()).await;

        // Act
        sut.unmount();
        tokio::time::sleep(Duration::from_secs(6)).await;

        // Assert
        assert_eq!(sut.state(), ContactFormState::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn resubmission_restarts_revert() {
        // Arrange
        let mut api = MockContactApi::new();
        api.expect_submit()
            .times(2)
            .returning(|_| Box::pin(std::future::ready(Ok(()))));
        let sut = ContactFormController::new(
            api,
            MockTokenProvider::new(),
            reporter(0),
            config(RuntimeMode::Development),
        );
        sut.submit(form()).await;
        tokio::time::sleep(Duration::from_secs(4)).await;

        // Act
        sut.submit(form()).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        // Assert
        assert_eq!(sut.state(), ContactFormState::Success);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(sut.state(), ContactFormState::Idle);
    }
}
