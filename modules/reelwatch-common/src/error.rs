use thiserror::Error;

pub type Result<T> = std::result::Result<T, RequestError>;

/// Failure kinds for outbound calls. Everything except `Exhausted` is
/// retryable; `Exhausted` is what the executor returns once the retry
/// budget is spent.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Request failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<RequestError>,
    },
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        RequestError::Network(err.to_string())
    }
}
