use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::transport::HttpResponse;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::warn;

/// Blocks the calling thread between rate-limited attempts.
pub trait Sleep: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Re-sends while the server answers 429, sleeping `retry_sleep` between
/// attempts, for at most `max_retries` sleeps. Any other response, and any
/// error from `send`, is returned as is.
pub(crate) fn send_with_retry<F>(
    config: &ClientConfig,
    sleeper: &dyn Sleep,
    mut send: F,
) -> Result<HttpResponse>
where
    F: FnMut() -> Result<HttpResponse>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let response = send()?;
        if response.status != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        if attempts > config.max_retries {
            return Err(Error::RetryExhausted { attempts });
        }

        warn!(
            attempt = attempts,
            sleep_secs = config.retry_sleep.as_secs_f64(),
            "rate limited, sleeping before retrying"
        );
        sleeper.sleep(config.retry_sleep);
    }
}
