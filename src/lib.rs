//! Indirect-Image: resolve the image behind a link
//!
//! Given a link found on a page, this crate fetches the linked document in the
//! background, parses it and hands it to a caller-supplied extractor that picks
//! the image URL (or an ordered list of candidates). Requests can be superseded
//! at any time by advancing a shared request epoch; stale requests vanish
//! without ever reporting back.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod state;
pub mod url;

use thiserror::Error;

/// Failure taxonomy of a lookup
///
/// None of these reach the caller of [`fetch::PipelineCoordinator::start`];
/// they are logged and collapse into a `None` result (or no callback at all).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Protocol of {url} is not allowed")]
    ProtocolDisallowed { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unsupported content type for {url}: {content_type}")]
    UnsupportedContentType { url: String, content_type: String },

    #[error("Empty body returned by {url}")]
    EmptyBody { url: String },

    #[error("Request for {url} was superseded")]
    Stale { url: String },

    #[error("Failed to start lookup for {url}: {message}")]
    Setup { url: String, message: String },
}

/// Extraction-specific errors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for extraction operations
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ContextDocument, ExtractionResult, Extractor, LookupFlags};
pub use fetch::{Deferred, PipelineCoordinator, ReqwestTransport};
pub use state::{EpochToken, PipelineState, RequestEpoch};
