use std::{env, time::Duration};

use log::*;
use relay_common::{helpers::parse_seconds, Secret};

pub const DEFAULT_YOOKASSA_API_URL: &str = "https://api.yookassa.ru/v3";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct YookassaConfig {
    /// The merchant's shop id. Used as the basic-auth username.
    pub shop_id: String,
    /// The merchant's secret key. Used as the basic-auth password.
    pub secret_key: Secret<String>,
    /// Base URL of the API, without a trailing slash.
    pub api_url: String,
    /// Upper bound for a single HTTP round trip.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for YookassaConfig {
    fn default() -> Self {
        Self {
            shop_id: String::default(),
            secret_key: Secret::default(),
            api_url: DEFAULT_YOOKASSA_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl YookassaConfig {
    pub fn new_from_env_or_default() -> Self {
        let shop_id = env::var("RELAY_YOOKASSA_SHOP_ID").unwrap_or_else(|_| {
            error!("💳️ RELAY_YOOKASSA_SHOP_ID is not set. Payments cannot be created without it.");
            String::default()
        });
        let secret_key = Secret::new(env::var("RELAY_YOOKASSA_SECRET_KEY").unwrap_or_else(|_| {
            error!("💳️ RELAY_YOOKASSA_SECRET_KEY is not set. Payments cannot be created without it.");
            String::default()
        }));
        let api_url = env::var("RELAY_YOOKASSA_API_URL").unwrap_or_else(|_| {
            debug!("💳️ RELAY_YOOKASSA_API_URL not set, using {DEFAULT_YOOKASSA_API_URL}");
            DEFAULT_YOOKASSA_API_URL.to_string()
        });
        let timeout = env::var("RELAY_YOOKASSA_TIMEOUT")
            .ok()
            .and_then(|s| {
                parse_seconds(&s).or_else(|| {
                    warn!("💳️ Invalid value for RELAY_YOOKASSA_TIMEOUT: {s}. Using the default.");
                    None
                })
            })
            .unwrap_or(DEFAULT_TIMEOUT);
        let max_retries = env::var("RELAY_YOOKASSA_MAX_RETRIES")
            .ok()
            .and_then(|s| {
                s.trim()
                    .parse::<u32>()
                    .map_err(|e| warn!("💳️ Invalid value for RELAY_YOOKASSA_MAX_RETRIES: {s}. {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let retry = RetryPolicy { max_retries, ..RetryPolicy::default() };
        Self { shop_id, secret_key, api_url: api_url.trim_end_matches('/').to_string(), timeout, retry }
    }
}

//-------------------------------------------------  RetryPolicy  ------------------------------------------------------
/// Bounded exponential backoff for transient failures.
///
/// A request is attempted at most `max_retries + 1` times. The delay before retry `n` (1-based) is
/// `initial_backoff * 2^(n-1)`, capped at `max_backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn no_retries() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}
