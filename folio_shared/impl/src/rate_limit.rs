use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use folio_models::mode::RuntimeMode;
use folio_rate_limit_contracts::{RateLimitDecision, RateLimitPolicy, RateLimitStore};
use folio_shared_contracts::{
    rate_limit::{RateLimitClearError, RateLimitService},
    time::TimeService,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
pub struct RateLimitServiceImpl<Time, Store> {
    time: Time,
    store: Store,
    config: RateLimitServiceConfig,
    state: Arc<State>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitServiceConfig {
    pub mode: RuntimeMode,
    pub policy: RateLimitPolicy,
}

#[derive(Debug, Default)]
struct State {
    sweeper_started: AtomicBool,
}

impl<Time, Store> RateLimitServiceImpl<Time, Store> {
    pub fn new(time: Time, store: Store, config: RateLimitServiceConfig) -> Self {
        Self {
            time,
            store,
            config,
            state: Default::default(),
        }
    }
}

impl<Time, Store> RateLimitServiceImpl<Time, Store>
where
    Time: TimeService + Clone,
    Store: RateLimitStore + Clone,
{
    /// Starts the background task that periodically removes expired windows.
    ///
    /// The sweeper runs once per window length. Returns `None` if a sweeper
    /// has already been started for this limiter.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        if self.state.sweeper_started.swap(true, Ordering::AcqRel) {
            return None;
        }

        let this = self.clone();
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(this.config.policy.window);
            interval.tick().await;
            loop {
                interval.tick().await;
                let _ = this.sweep().await;
            }
        }))
    }
}

impl<Time, Store> RateLimitService for RateLimitServiceImpl<Time, Store>
where
    Time: TimeService,
    Store: RateLimitStore,
{
    async fn check(&self, key: &str) -> anyhow::Result<bool> {
        let now = self.time.now();
        let decision = self.store.hit(key, now, self.config.policy).await?;

        match decision {
            RateLimitDecision::Allowed { remaining, .. } => {
                debug!(key, remaining, "rate limit check passed");
                Ok(true)
            }
            RateLimitDecision::Limited { reset_time } => {
                warn!(key, %reset_time, "rate limit exceeded");
                Ok(false)
            }
        }
    }

    async fn clear(&self, key: &str) -> Result<(), RateLimitClearError> {
        if self.config.mode.is_production() {
            return Err(RateLimitClearError::Production);
        }

        self.store.remove(key).await?;
        debug!(key, "rate limit cleared");
        Ok(())
    }

    async fn sweep(&self) -> anyhow::Result<usize> {
        let now = self.time.now();
        let removed = self
            .store
            .sweep(now)
            .await
            .inspect_err(|err| error!("Failed to sweep rate limit windows: {err:#}"))?;
        if removed > 0 {
            debug!(removed, "swept expired rate limit windows");
        }
        Ok(removed)
    }
}
