//! Flag-Harvester: an authenticated same-origin crawler over raw HTTP/1.1
//!
//! This crate logs into a single web application, then crawls outward from a
//! start page following same-origin links until it has collected a target
//! number of distinct flags. All HTTP traffic goes through a hand-rolled
//! HTTP/1.1 transport over `std::net::TcpStream`.

pub mod config;
pub mod crawler;
pub mod state;
pub mod transport;
pub mod url;

use thiserror::Error;

/// Main error type for Flag-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("No CSRF token field '{field}' on login page {url}")]
    MissingCsrfToken { url: String, field: String },

    #[error("Login rejected (HTTP {status}): no session cookie was issued")]
    LoginRejected { status: u16 },

    #[error("HTTP 301 from {url} carried no Location header")]
    MissingLocation { url: String },

    #[error("Gave up on {url} after {attempts} attempts (last status {status})")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        status: u16,
    },

    #[error("Frontier exhausted with {found} of {target} flags found")]
    FrontierExhausted { found: usize, target: usize },

    #[error("Refusing to fetch {url}: outside the crawl origin")]
    CrossOrigin { url: String },

    #[error("Illegal crawl phase transition {from} -> {to}")]
    InvalidTransition { from: CrawlPhase, to: CrawlPhase },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
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

    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),
}

/// Result type alias for Flag-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, Credentials, FlagSet};
pub use state::{AuthState, CrawlPhase};
pub use transport::{HttpTransport, ProtocolError, Response, Transport, TransportError};
pub use url::Origin;
