use bon::Builder;
use std::time::Duration;

// Base URL for the Cloudeya COVID-19 API
pub const DEFAULT_BASE_URL: &str = "https://covid19.cloudeya.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_SLEEP: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Settings shared by every request a client sends.
///
/// `max_retries` bounds how many times a rate-limited (429) request is slept
/// on and re-sent before the call gives up with `Error::RetryExhausted`.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(on(String, into))]
pub struct ClientConfig {
    #[builder(default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    #[builder(default = DEFAULT_RETRY_SLEEP)]
    pub retry_sleep: Duration,
    #[builder(default = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
