use thiserror::Error;

/// Errors that can occur when talking to the content service.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connection, timeout, non-2xx status).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Structured error returned by the Action API itself.
    #[error("api error {code}: {info}")]
    Api { code: String, info: String },

    /// The requested page does not exist (or the title is invalid).
    #[error("page not found: {0}")]
    PageMissing(String),

    /// The response decoded, but did not contain what was asked for.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Result type for wiki-api operations.
pub type Result<T> = std::result::Result<T, Error>;
