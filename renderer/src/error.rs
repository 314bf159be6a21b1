//! Error types of the renderer library.

use thiserror::Error;

/// Failure of one remote read. Callers degrade these to defaults; they never
/// reach the render controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The list id is missing from the page context.
    #[error("page context has no list id")]
    MissingListContext,
    /// The request URL could not be built from the site URL.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    /// The request did not complete.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        message: String,
    },
    /// The service answered with a non-success status.
    #[error("request to {url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The body was not the expected JSON shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder error.
        message: String,
    },
}

/// None of the identifier sources produced a usable row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no row identifier could be resolved")]
pub struct IdentifierMissing;

/// Rejected renderer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Variant name is not one of the known pipelines.
    #[error("unknown pipeline variant `{0}` (expected email-only, admin-match or last-editor)")]
    UnknownVariant(String),
    /// Setting could not be parsed.
    #[error("invalid value `{value}` for {key}")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Rejected raw value.
        value: String,
    },
}
