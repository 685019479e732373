//! Exponential backoff for REST requests that hit a transient failure.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound for a single delay, in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Growth factor between consecutive delays.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Random extra delay as a fraction of the computed delay (0.0 = none).
    #[serde(default = "default_jitter_fraction")]
    pub jitter_fraction: f64,
}

fn default_max_retries() -> u32 { 2 }
fn default_initial_backoff_ms() -> u64 { 200 }
fn default_max_backoff_ms() -> u64 { 5_000 }
fn default_multiplier() -> f64 { 2.0 }
fn default_jitter_fraction() -> f64 { 0.1 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            jitter_fraction: default_jitter_fraction(),
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Computes the delay before each retry from the attempt number.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delay before the `attempt`-th retry (1-based), or `None` once retries
    /// are exhausted.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.config.max_retries {
            return None;
        }
        let exp = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base_ms = self.config.initial_backoff_ms as f64 * self.config.multiplier.powi(exp);
        let capped = base_ms.min(self.config.max_backoff_ms as f64);

        let jitter = if self.config.jitter_fraction > 0.0 {
            capped * self.config.jitter_fraction * rand::random::<f64>()
        } else {
            0.0
        };
        Some(Duration::from_millis((capped + jitter) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries,
            initial_backoff_ms: 100,
            max_backoff_ms: 30_000,
            multiplier: 2.0,
            jitter_fraction: 0.0,
        })
    }

    #[test]
    fn delays_double() {
        let policy = no_jitter(3);
        assert_eq!(policy.next_delay(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.next_delay(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.next_delay(3), Some(Duration::from_millis(400)));
        assert!(policy.next_delay(4).is_none());
    }

    #[test]
    fn delay_capped_at_max() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 10,
            initial_backoff_ms: 100,
            max_backoff_ms: 500,
            multiplier: 10.0,
            jitter_fraction: 0.0,
        });
        assert_eq!(policy.next_delay(5), Some(Duration::from_millis(500)));
    }

    #[test]
    fn jitter_stays_within_fraction() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 1,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 1_000,
            multiplier: 2.0,
            jitter_fraction: 0.5,
        });
        for _ in 0..50 {
            let d = policy.next_delay(1).unwrap();
            assert!(d >= Duration::from_millis(1_000) && d <= Duration::from_millis(1_500));
        }
    }

    #[test]
    fn disabled_never_retries() {
        let policy = RetryPolicy::new(RetryConfig::disabled());
        assert!(policy.next_delay(1).is_none());
    }

    #[test]
    fn config_defaults_from_empty_json() {
        let cfg: RetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.initial_backoff_ms, 200);
        assert!((cfg.jitter_fraction - 0.1).abs() < f64::EPSILON);
    }
}
