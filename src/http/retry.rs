//! Retry classification for package-index requests.

use reqwest::StatusCode;

/// Maximum number of attempts for one network operation.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// HTTP failures that a retry cannot fix.
#[derive(Debug)]
pub enum NonRetryableError {
    /// HTTP 429
    RateLimited,
    /// HTTP 404: unknown project or file
    NotFound,
    /// Any other 4xx
    ClientError(u16),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimited => {
                write!(f, "Too many requests to the package index; try again later")
            }
            NonRetryableError::NotFound => write!(f, "Not found on the package index"),
            NonRetryableError::ClientError(code) => write!(f, "Request rejected with HTTP {}", code),
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Returns `Err` for responses that should not be retried.
///
/// Server errors, timeouts and connection failures are retryable.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    match error.status() {
        Some(StatusCode::TOO_MANY_REQUESTS) => Err(NonRetryableError::RateLimited),
        Some(StatusCode::NOT_FOUND) => Err(NonRetryableError::NotFound),
        Some(s) if s.is_client_error() => Err(NonRetryableError::ClientError(s.as_u16())),
        _ => Ok(()),
    }
}

/// Convert an `error_for_status()` failure, marking it non-retryable where appropriate.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
