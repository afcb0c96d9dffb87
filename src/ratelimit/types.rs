//! Rate limiter configuration types
//!
//! A rate spec is written `<requests>/<duration>`, where the duration is either
//! a bare unit (`s`, `m`, `h`) or a duration literal such as `30s` or `2m30s`.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Parsed `<requests>/<duration>` rate specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSpec {
    /// Number of requests admitted per period (also the burst size)
    pub requests: u32,
    /// Length of the period
    pub period: Duration,
}

impl RateSpec {
    /// Create a rate spec from its parts
    pub fn new(requests: u32, period: Duration) -> Result<Self> {
        if requests == 0 {
            return Err(Error::invalid_rate("requests must be a positive integer"));
        }
        if period.is_zero() {
            return Err(Error::invalid_duration("duration must be positive"));
        }
        Ok(Self { requests, period })
    }

    /// Sustained rate in permits per second
    pub fn limit(&self) -> f64 {
        f64::from(self.requests) / self.period.as_secs_f64()
    }

    /// Maximum number of permits available at once
    pub fn burst(&self) -> u32 {
        self.requests
    }
}

impl FromStr for RateSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (requests, duration) = s.split_once('/').ok_or_else(|| {
            Error::invalid_rate("rate must be in format 'requests/duration' (e.g., '10/s', '100/30s')")
        })?;

        let requests = requests
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| Error::invalid_rate("requests must be a positive integer"))?;

        let period = parse_period(duration)?;

        Self::new(requests, period)
    }
}

impl fmt::Display for RateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.requests,
            humantime::format_duration(self.period)
        )
    }
}

/// Parse the duration half of a rate spec
fn parse_period(s: &str) -> Result<Duration> {
    match s {
        "s" => return Ok(Duration::from_secs(1)),
        "m" => return Ok(Duration::from_secs(60)),
        "h" => return Ok(Duration::from_secs(3600)),
        _ => {}
    }

    let duration = humantime::parse_duration(s).map_err(|e| {
        Error::invalid_duration(format!(
            "duration must be a valid time duration (e.g., 's', '30s', 'm', 'h'): {e}"
        ))
    })?;

    if duration.is_zero() {
        return Err(Error::invalid_duration("duration must be positive"));
    }

    Ok(duration)
}

/// Point-in-time view of a rate limiter, for debugging output
///
/// Numeric fields are only populated while the limiter is enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimiterStats {
    /// Whether admission control is active
    pub enabled: bool,
    /// Permits per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    /// Bucket capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst: Option<u32>,
    /// Permits available right now
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<f64>,
}

impl RateLimiterStats {
    /// Stats for a disabled limiter
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            limit: None,
            burst: None,
            tokens: None,
        }
    }
}
