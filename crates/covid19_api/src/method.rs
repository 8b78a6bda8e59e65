use crate::error::Result;

/// An authenticated GET endpoint: where it lives and how its body decodes.
pub trait Method {
    type Response;

    /// Path relative to the client's base URL, without a leading slash.
    fn path(&self) -> Result<String>;

    fn decode(body: &str) -> Result<Self::Response>;
}
