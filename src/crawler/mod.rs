//! Crawler module for authenticated page fetching and flag collection
//!
//! This module contains the crawl policy, including:
//! - Session management (CSRF-protected login, logout, lapse detection)
//! - The FIFO frontier with queued/visited membership
//! - HTML extraction of links, flags and form fields
//! - The advance/dissect loop and its retry and redirect handling

mod coordinator;
mod flags;
mod frontier;
mod parser;
mod session;

pub use coordinator::Crawler;
pub use flags::FlagSet;
pub use frontier::Frontier;
pub use parser::{Extractor, HtmlExtractor, ParsedPage};
pub use session::{cookie_pair, named_cookie, Credentials, Session};

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl with the settings in `config`
///
/// This is the main entry point for the binary. It will:
/// 1. Connect to the configured origin
/// 2. Log in lazily on the first fetch
/// 3. Crawl from the start path until the flag target is reached
/// 4. Log out, whether or not the crawl succeeded
///
/// # Returns
///
/// * `Ok(FlagSet)` - The flags found, in discovery order
/// * `Err(HarvestError)` - Connecting, logging in or crawling failed
pub fn harvest(config: &Config, credentials: Credentials) -> Result<FlagSet> {
    let mut crawler = Crawler::connect(config, credentials)?;
    let outcome = crawler.run(&config.crawler.start_path, config.crawler.target_flags);

    if crawler.auth_state().is_logged_in() {
        if let Err(e) = crawler.logout() {
            tracing::warn!("Logout failed: {}", e);
        }
    }

    outcome
}
