pub mod config;
pub mod daily_report;
mod de;
pub mod error;
pub mod method;
pub mod retry;
pub mod time_series;
pub mod transport;

pub use config::ClientConfig;
pub use daily_report::{DailyReport, DailyReportBatch, DailyReports};
pub use error::{BoxError, Error, Result};
pub use retry::{Sleep, ThreadSleep};
pub use time_series::{Region, SeriesKind, TimeSeries, TimeSeriesBatch, TimeSeriesRecord};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

use chrono::Datelike;
use error::excerpt;
use method::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method as HttpMethod, StatusCode, Url};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Dispatch, debug};

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Blocking client for the COVID-19 statistics API.
///
/// Configuration changes apply to calls made after them. The client holds no
/// per-call state, so `&self` calls may run from several threads at once.
pub struct Covid19Client {
    token: String,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleep>,
    logger: Option<Dispatch>,
}

impl Covid19Client {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_transport(token, ReqwestTransport::default())
    }

    pub fn with_transport(token: impl Into<String>, transport: impl Transport + 'static) -> Self {
        Self {
            token: token.into(),
            config: ClientConfig::default(),
            transport: Arc::new(transport),
            sleeper: Arc::new(ThreadSleep),
            logger: None,
        }
    }

    /// Exchanges the credentials for a token against the default base URL.
    /// The credentials are not kept.
    pub fn from_credentials(username: &str, password: &str) -> Result<Self> {
        Self::new(String::new()).authenticate(username, password)
    }

    /// Replaces this client's token with one obtained from `/token`.
    pub fn authenticate(mut self, username: &str, password: &str) -> Result<Self> {
        let response = self
            .in_scope(|| self.request_token(username, password))
            .map_err(|err| Error::Authentication(err.to_string()))?;

        if response.status != StatusCode::OK {
            return Err(Error::Authentication(format!(
                "token endpoint answered {}: {}",
                response.status,
                excerpt(&response.body)
            )));
        }
        if response.body.is_empty() {
            return Err(Error::Authentication(
                "token endpoint returned an empty body".to_string(),
            ));
        }

        self.token = response.body;
        Ok(self)
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleep + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Routes this client's log events to `logger` instead of the ambient
    /// default subscriber.
    pub fn set_logger(&mut self, logger: Dispatch) {
        self.logger = Some(logger);
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.config.base_url = base_url.into();
    }

    pub fn set_retry_sleep(&mut self, retry_sleep: Duration) {
        self.config.retry_sleep = retry_sleep;
    }

    pub fn set_max_retries(&mut self, max_retries: u32) {
        self.config.max_retries = max_retries;
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POSTs the credentials to `/token` and returns the raw body as the token.
    /// The status code is not inspected here; see `authenticate`.
    pub fn exchange_credentials(&self, username: &str, password: &str) -> Result<String> {
        self.in_scope(|| self.request_token(username, password))
            .map(|response| response.body)
    }

    // Monthly report endpoint, e.g. /sep2020
    pub fn get_reports_at<D: Datelike>(&self, date: &D) -> Result<DailyReportBatch> {
        self.call(&DailyReports::at(date))
    }

    // Time series endpoint, e.g. /time_series_deaths_global
    pub fn get_time_series(&self, kind: SeriesKind, region: Region) -> Result<TimeSeriesBatch> {
        self.call(&TimeSeries::new(kind, region))
    }

    pub fn get_time_series_confirmed_global(&self) -> Result<TimeSeriesBatch> {
        self.get_time_series(SeriesKind::Confirmed, Region::Global)
    }

    pub fn get_time_series_confirmed_us(&self) -> Result<TimeSeriesBatch> {
        self.get_time_series(SeriesKind::Confirmed, Region::Us)
    }

    pub fn get_time_series_deaths_global(&self) -> Result<TimeSeriesBatch> {
        self.get_time_series(SeriesKind::Deaths, Region::Global)
    }

    pub fn get_time_series_deaths_us(&self) -> Result<TimeSeriesBatch> {
        self.get_time_series(SeriesKind::Deaths, Region::Us)
    }

    pub fn get_time_series_recovered_global(&self) -> Result<TimeSeriesBatch> {
        self.get_time_series(SeriesKind::Recovered, Region::Global)
    }

    /// Sends an authenticated GET for `method`, sleeping and re-sending on 429,
    /// and decodes a 200 body with the method's decoder.
    pub fn call<M: Method>(&self, method: &M) -> Result<M::Response> {
        self.in_scope(|| {
            let request = self.authorized_get(&method.path()?)?;

            let response = retry::send_with_retry(&self.config, self.sleeper.as_ref(), || {
                debug!(method = %request.method, url = %request.url, "sending request");
                self.transport
                    .execute(request.clone())
                    .map_err(Error::Transport)
            })?;

            if response.status != StatusCode::OK {
                return Err(Error::UnexpectedStatus {
                    status: response.status.as_u16(),
                    body: excerpt(&response.body),
                });
            }

            M::decode(&response.body)
        })
    }

    fn authorized_get(&self, path: &str) -> Result<HttpRequest> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|err| Error::InvalidHeader(err.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        Ok(HttpRequest {
            method: HttpMethod::GET,
            url: self.endpoint(path)?,
            headers,
            body: None,
            timeout: self.config.timeout,
        })
    }

    fn request_token(&self, username: &str, password: &str) -> Result<HttpResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let request = HttpRequest {
            method: HttpMethod::POST,
            url: self.endpoint("token")?,
            headers,
            body: Some(serde_json::to_vec(&Credentials { username, password })?),
            timeout: self.config.timeout,
        };

        debug!(url = %request.url, "exchanging credentials for a token");
        self.transport.execute(request).map_err(Error::Transport)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|err| Error::InvalidUrl(format!("{raw}: {err}")))
    }

    fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.logger {
            Some(logger) => tracing::dispatcher::with_default(logger, f),
            None => f(),
        }
    }
}

impl fmt::Debug for Covid19Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Covid19Client")
            .field("token", &"<redacted>")
            .field("config", &self.config)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path_with_one_slash() {
        let mut client = Covid19Client::new("t");
        assert_eq!(
            client.endpoint("sep2020").unwrap().as_str(),
            "https://covid19.cloudeya.org/sep2020"
        );

        client.set_base_url("http://localhost:9000/v1/");
        assert_eq!(
            client.endpoint("token").unwrap().as_str(),
            "http://localhost:9000/v1/token"
        );
    }

    #[test]
    fn bad_base_url_is_reported() {
        let mut client = Covid19Client::new("t");
        client.set_base_url("not a url");

        assert!(matches!(client.endpoint("token"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn token_with_control_characters_is_rejected() {
        let client = Covid19Client::new("bad\ntoken");

        assert!(matches!(
            client.authorized_get("sep2020"),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn authorized_get_carries_bearer_token_and_timeout() {
        let mut client = Covid19Client::new("abc");
        client.set_timeout(Duration::from_secs(3));

        let request = client.authorized_get("time_series_deaths_us").unwrap();

        assert_eq!(request.method, HttpMethod::GET);
        assert_eq!(request.headers[AUTHORIZATION], "Bearer abc");
        assert_eq!(request.timeout, Duration::from_secs(3));
        assert!(request.body.is_none());
    }

    #[test]
    fn debug_output_hides_the_token() {
        let client = Covid19Client::new("super-secret");

        assert!(!format!("{client:?}").contains("super-secret"));
    }
}
