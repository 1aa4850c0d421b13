//! URL handling module for Flag-Harvester
//!
//! The crawler never leaves one origin, so URL handling is limited to composing
//! absolute URLs from hrefs, turning crawl URLs back into request-targets, and
//! resolving redirect `Location` values.

mod origin;

pub use origin::Origin;

use url::Url;

/// Resolves a `Location` header value against the URL that produced it
///
/// Absolute locations are returned in canonical form; relative ones are
/// joined onto `current`.
///
/// # Examples
///
/// ```
/// use flag_harvester::url::resolve_location;
///
/// let next = resolve_location("http://example.com/a/b/", "../c/").unwrap();
/// assert_eq!(next, "http://example.com/a/c/");
/// ```
pub fn resolve_location(current: &str, location: &str) -> Result<String, url::ParseError> {
    let base = Url::parse(current)?;
    Ok(base.join(location.trim())?.to_string())
}
