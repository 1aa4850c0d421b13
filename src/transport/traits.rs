//! The request/response seam between the crawler and the network

use crate::transport::{Response, TransportError};

/// Operations the crawler needs from an HTTP transport
///
/// Implemented by [`crate::transport::Transport`] over TCP; tests substitute
/// scripted implementations to drive the crawl policy.
pub trait HttpTransport {
    /// Sends a GET for `target` over the persistent connection
    ///
    /// # Arguments
    ///
    /// * `target` - Origin-relative request-target, e.g. `/fakebook/`
    /// * `headers` - Extra headers sent after `Host` and `Connection`
    fn get(&mut self, target: &str, headers: &[(&str, &str)]) -> Result<Response, TransportError>;

    /// Sends a form-encoded POST for `target` on a fresh, short-lived connection
    fn post(
        &mut self,
        target: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response, TransportError>;

    /// Tears down the persistent connection and opens a new one
    fn reconnect(&mut self) -> Result<(), TransportError>;
}
