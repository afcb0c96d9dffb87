//! Rate limiting module
//!
//! Token bucket admission control for outbound requests.
//!
//! # Features
//!
//! - **Rate Specs**: `"10/s"`, `"100/30s"`, `"50/m"`, `"1000/h"`, `"5/2m"`
//! - **Non-blocking checks**: [`RateLimiter::allow`] never suspends
//! - **Cancellable waits**: [`RateLimiter::wait`] debits nothing when cancelled
//! - **Runtime reconfiguration**: [`RateLimiter::set_rate`] swaps limit and burst atomically

mod limiter;
mod types;

pub use limiter::RateLimiter;
pub use types::{RateLimiterStats, RateSpec};
