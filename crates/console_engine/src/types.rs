use console_core::OpError;
use thiserror::Error;

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

impl From<RemoteError> for OpError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(message) => OpError::Network { message },
            RemoteError::Server { status, body } => OpError::Server { status, body },
            RemoteError::InvalidUrl(message) => OpError::Network {
                message: format!("invalid endpoint url: {message}"),
            },
        }
    }
}

/// Knobs forwarded to the backend with a test run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecuteOptions {
    /// Delay the backend waits between steps, in milliseconds.
    pub wait_time_ms: u64,
    pub capture_screenshot: bool,
    /// Run web tests in parallel browsers.
    pub parallel: bool,
}
