use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

// Longest slice of a response body kept in an error message.
const BODY_EXCERPT_CHARS: usize = 512;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),
    #[error("Response was not OK (status {status}): {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Error decoding response body: {0}")]
    Decode(String),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Still rate limited after {attempts} attempts")]
    RetryExhausted { attempts: u32 },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

pub(crate) fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_CHARS {
        return body.to_string();
    }

    let mut short: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
    short.push_str("...");
    short
}
