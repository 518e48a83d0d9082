//! Doc-Harvest: a documentation and media harvester
//!
//! This crate discovers documentation pages and media files reachable from a
//! seed page, extracts structured text or downloads binary media, and writes
//! the results into a directory tree that mirrors the remote URL layout.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod translate;
pub mod url;

use thiserror::Error;

/// Main error type for Doc-Harvest operations
///
/// Only startup failures surface through this type during a run. Per-item
/// failures are recorded in the [`output::RunReport`] instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid seed URL '{0}': an absolute http(s) URL is required")]
    InvalidSeed(String),

    #[error("Seed page {url} is unreachable: {source}")]
    SeedUnreachable { url: String, source: FetchError },

    #[error("Output root {path} is not writable: {source}")]
    OutputUnwritable {
        path: String,
        source: std::io::Error,
    },

    #[error("Source directory not found: {0}")]
    MissingSource(String),

    #[error("Render backend error: {0}")]
    Render(#[from] crawler::RenderError),
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

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid media pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Transport-level errors for a single fetch or download
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failure of a single media detection strategy on one page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Pattern could not be built for {page}: {source}")]
    Pattern { page: String, source: regex::Error },
}

/// Errors reported by a translation service
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Translation service error: {0}")]
    Service(String),

    #[error("Translation service is rate limiting requests")]
    RateLimited,

    #[error("Unexpected translation response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Doc-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Harvester, HttpFetcher};
pub use output::{PathPlanner, RunReport};
pub use translate::{translate_tree, RetryingTranslator, Translator};
pub use url::{resolve, Resolution, ResolvedUrl, VisitedSet};
