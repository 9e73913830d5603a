use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};

/// Storage for fixed-window request counters.
///
/// Implementations must make the check and the increment of [`hit`] atomic per
/// key, so that concurrent requests from the same client can never be admitted
/// beyond [`RateLimitPolicy::max_requests`].
///
/// [`hit`]: RateLimitStore::hit
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait RateLimitStore: Send + Sync + 'static {
    /// Counts a request for `key` at `now`.
    ///
    /// An entry whose window has ended is discarded before the request is
    /// evaluated.
    fn hit(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: RateLimitPolicy,
    ) -> impl Future<Output = anyhow::Result<RateLimitDecision>> + Send;

    /// Removes the entry for `key`.
    ///
    /// Does nothing if there is no such entry.
    fn remove(&self, key: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Removes every entry whose window ended before `now` and returns how many
    /// were removed.
    fn sweep(&self, now: DateTime<Utc>) -> impl Future<Output = anyhow::Result<usize>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed {
        remaining: u32,
        reset_time: DateTime<Utc>,
    },
    Limited {
        reset_time: DateTime<Utc>,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn reset_time(&self) -> DateTime<Utc> {
        match *self {
            Self::Allowed { reset_time, .. } | Self::Limited { reset_time } => reset_time,
        }
    }
}

/// Request counter of a single client within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: DateTime<Utc>,
}

impl RateLimitEntry {
    /// Opens a new window for the first request of a client.
    pub fn open(now: DateTime<Utc>, policy: RateLimitPolicy) -> (Self, RateLimitDecision) {
        let entry = Self {
            count: 1,
            reset_time: now + policy.window,
        };
        let decision = RateLimitDecision::Allowed {
            remaining: policy.max_requests.saturating_sub(1),
            reset_time: entry.reset_time,
        };
        (entry, decision)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_time
    }

    /// Counts another request in the current window.
    ///
    /// Once the window is full the request is rejected and not counted.
    pub fn hit(&mut self, policy: RateLimitPolicy) -> RateLimitDecision {
        if self.count >= policy.max_requests {
            return RateLimitDecision::Limited {
                reset_time: self.reset_time,
            };
        }

        self.count += 1;
        RateLimitDecision::Allowed {
            remaining: policy.max_requests - self.count,
            reset_time: self.reset_time,
        }
    }
}

#[cfg(feature = "mock")]
impl MockRateLimitStore {
    pub fn with_hit(
        mut self,
        key: String,
        now: DateTime<Utc>,
        policy: RateLimitPolicy,
        result: RateLimitDecision,
    ) -> Self {
        self.expect_hit()
            .once()
            .with(
                mockall::predicate::eq(key),
                mockall::predicate::eq(now),
                mockall::predicate::eq(policy),
            )
            .return_once(move |_, _, _| Box::pin(std::future::ready(Ok(result))));
        self
    }

    pub fn with_remove(mut self, key: String) -> Self {
        self.expect_remove()
            .once()
            .with(mockall::predicate::eq(key))
            .return_once(|_| Box::pin(std::future::ready(Ok(()))));
        self
    }

    pub fn with_sweep(mut self, now: DateTime<Utc>, result: usize) -> Self {
        self.expect_sweep()
            .once()
            .with(mockall::predicate::eq(now))
            .return_once(move |_| Box::pin(std::future::ready(Ok(result))));
        self
    }
}
