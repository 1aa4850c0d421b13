//! State module for tracking session and crawl progress
//!
//! # Components
//!
//! - `AuthState`: whether the crawler's session is known to be authenticated
//! - `CrawlPhase`: where the crawl as a whole is in its lifecycle

mod auth_state;
mod crawl_phase;

// Re-export main types
pub use auth_state::AuthState;
pub use crawl_phase::CrawlPhase;
