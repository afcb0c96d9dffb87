//! Token bucket rate limiter
//!
//! All state lives behind a single reader/writer lock. Checking whether the
//! limiter is enabled takes the shared lock; withdrawing a token or swapping the
//! configuration takes the exclusive lock, so callers always see a consistent
//! `limit`/`burst` pair.

use super::types::{RateLimiterStats, RateSpec};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Upper bound on a single sleep inside [`RateLimiter::wait`], so a waiter
/// picks up reconfiguration within a second.
const MAX_WAIT_SLICE: Duration = Duration::from_secs(1);

/// Bucket contents and the configuration it refills with
#[derive(Debug)]
struct TokenBucket {
    /// Permits added per second
    limit: f64,
    /// Capacity
    burst: u32,
    /// Available permits, fractional for smooth refill
    tokens: f64,
    /// When `tokens` was last brought up to date
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket for the given spec
    fn new(spec: RateSpec) -> Self {
        Self {
            limit: spec.limit(),
            burst: spec.burst(),
            tokens: f64::from(spec.burst()),
            last_refill: Instant::now(),
        }
    }

    /// Tokens that would be available at `now`, without touching state
    fn tokens_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        (self.tokens + elapsed * self.limit).min(f64::from(self.burst))
    }

    fn refill(&mut self, now: Instant) {
        self.tokens = self.tokens_at(now);
        self.last_refill = now;
    }

    /// Take one token, or report how long until one is available
    fn try_take(&mut self, now: Instant) -> std::result::Result<(), Duration> {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - self.tokens;
            // Periods near u64::MAX seconds push the delay past Duration::MAX
            Err(Duration::try_from_secs_f64(deficit / self.limit).unwrap_or(Duration::MAX))
        }
    }

    /// Replace limit and burst, keeping whatever was accumulated under the old rate
    fn reconfigure(&mut self, spec: RateSpec, now: Instant) {
        self.refill(now);
        self.limit = spec.limit();
        self.burst = spec.burst();
        self.tokens = self.tokens.min(f64::from(self.burst));
    }
}

#[derive(Debug)]
struct LimiterState {
    enabled: bool,
    /// Kept while disabled so re-enabling does not hand out a fresh burst
    bucket: Option<TokenBucket>,
}

/// Token bucket rate limiter with runtime reconfiguration
#[derive(Debug)]
pub struct RateLimiter {
    state: RwLock<LimiterState>,
}

impl RateLimiter {
    /// Create a limiter from a rate spec string; an empty string disables it
    pub fn new(rate: &str) -> Result<Self> {
        if rate.is_empty() {
            return Ok(Self::disabled());
        }

        let spec: RateSpec = rate.parse()?;
        Ok(Self::from_spec(spec))
    }

    /// Create a limiter that admits everything
    pub fn disabled() -> Self {
        Self {
            state: RwLock::new(LimiterState {
                enabled: false,
                bucket: None,
            }),
        }
    }

    /// Create an enabled limiter from an already parsed spec
    pub fn from_spec(spec: RateSpec) -> Self {
        debug!(
            limit = spec.limit(),
            burst = spec.burst(),
            "Rate limiter enabled"
        );
        Self {
            state: RwLock::new(LimiterState {
                enabled: true,
                bucket: Some(TokenBucket::new(spec)),
            }),
        }
    }

    /// Take a permit without waiting
    ///
    /// Fails with [`Error::RateLimitExceeded`] when the bucket is empty.
    pub fn allow(&self) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        match self.try_acquire() {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::RateLimitExceeded),
        }
    }

    /// Wait until a permit is available or `cancel` fires
    ///
    /// A cancelled wait returns [`Error::Cancelled`] and leaves the bucket as
    /// it found it.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let delay = match self.try_acquire() {
                Ok(()) => return Ok(()),
                Err(delay) => delay.min(MAX_WAIT_SLICE),
            };

            trace!(?delay, "Waiting for rate limiter");

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Wait for a permit, giving up after `timeout`
    pub async fn wait_with_timeout(&self, timeout: Duration) -> Result<()> {
        let cancel = CancellationToken::new();
        tokio::time::timeout(timeout, self.wait(&cancel))
            .await
            .unwrap_or(Err(Error::Cancelled))
    }

    /// Replace the rate; an empty spec disables the limiter
    pub fn set_rate(&self, rate: &str) -> Result<()> {
        if rate.is_empty() {
            self.state.write().enabled = false;
            debug!("Rate limiter disabled");
            return Ok(());
        }

        let spec: RateSpec = rate.parse()?;
        let now = Instant::now();

        let mut state = self.state.write();
        match state.bucket.as_mut() {
            Some(bucket) => bucket.reconfigure(spec, now),
            None => state.bucket = Some(TokenBucket::new(spec)),
        }
        state.enabled = true;

        debug!(
            limit = spec.limit(),
            burst = spec.burst(),
            "Rate limiter reconfigured"
        );
        Ok(())
    }

    /// Whether admission control is active
    pub fn is_enabled(&self) -> bool {
        self.state.read().enabled
    }

    /// Snapshot of the current configuration and bucket level
    pub fn stats(&self) -> RateLimiterStats {
        let state = self.state.read();

        match (&state.bucket, state.enabled) {
            (Some(bucket), true) => RateLimiterStats {
                enabled: true,
                limit: Some(bucket.limit),
                burst: Some(bucket.burst),
                tokens: Some(bucket.tokens_at(Instant::now())),
            },
            _ => RateLimiterStats::disabled(),
        }
    }

    /// Withdraw one token under the exclusive lock.
    ///
    /// `Ok` also covers a limiter disabled since the caller last looked.
    fn try_acquire(&self) -> std::result::Result<(), Duration> {
        let mut state = self.state.write();
        if !state.enabled {
            return Ok(());
        }

        match state.bucket.as_mut() {
            Some(bucket) => bucket.try_take(Instant::now()),
            None => Ok(()),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::disabled()
    }
}
