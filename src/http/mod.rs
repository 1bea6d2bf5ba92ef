//! HTTP access to the package index, with retry.

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{NonRetryableError, check_retryable, classify_error};
