use std::time::Duration;

use sentry_core::types::ParseDsnError;
use thiserror::Error;

/// Errors raised while setting up or shutting down a [`SentryWriter`].
///
/// Writing log records never fails; problems on the write path are only
/// reported through the error handler.
///
/// [`SentryWriter`]: crate::SentryWriter
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Raised if the DSN cannot be parsed.
    #[error("invalid dsn")]
    InvalidDsn(#[from] ParseDsnError),
    /// Raised if no hub was given.
    #[error("hub cannot be None")]
    MissingHub,
    /// Raised if one of the ignore patterns is not a valid regular expression.
    #[error("invalid ignore pattern")]
    InvalidIgnorePattern(#[from] regex::Error),
    /// Raised if the sample rate is outside of `0.0..=1.0`.
    #[error("sample rate {0} is outside of 0.0..=1.0")]
    InvalidSampleRate(f32),
    /// Raised if a proxy is not a valid URL.
    #[error("invalid proxy url `{url}`")]
    InvalidProxy {
        /// The rejected proxy.
        url: String,
        /// The reason it was rejected.
        #[source]
        source: url::ParseError,
    },
    /// Raised if the HTTP client for the transport cannot be built.
    #[cfg(feature = "transport")]
    #[error("failed to build http client")]
    HttpClient(#[source] reqwest::Error),
    /// Raised if a log record is not a JSON object.
    #[error("failed to decode log record")]
    Decode(#[from] serde_json::Error),
    /// Raised if pending events were not sent before the timeout elapsed.
    #[error("events were not flushed within {0:?}")]
    FlushTimeout(Duration),
}
