//! HTTP response value and head parsing

use crate::transport::ProtocolError;
use std::collections::HashMap;

/// A fully assembled HTTP response
///
/// Header names keep the case they were received in; when a name repeats,
/// the last value wins. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    body: String,
    status: u16,
    headers: HashMap<String, String>,
}

impl Response {
    pub fn new(body: impl Into<String>, status: u16, headers: HashMap<String, String>) -> Self {
        Self {
            body: body.into(),
            status,
            headers,
        }
    }

    /// The stand-in for a connection that died before a response arrived:
    /// status 500, empty body, no headers.
    pub fn dead_connection() -> Self {
        Self::new(String::new(), 500, HashMap::new())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Looks up a header value, ignoring ASCII case in the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// 300–399
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// 400–499
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// 500 and above
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Returns true if the server asked for the connection to be closed
    pub fn closes_connection(&self) -> bool {
        self.header("Connection")
            .map(|value| value.trim().eq_ignore_ascii_case("close"))
            .unwrap_or(false)
    }
}

/// Parses a response head (status line plus header lines, without the blank
/// separator line) into the status code and header map.
pub(crate) fn parse_head(head: &[u8]) -> Result<(u16, HashMap<String, String>), ProtocolError> {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.split("\r\n");

    let status_line = lines.next().unwrap_or_default();
    let status = parse_status_line(status_line)?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::MalformedHeader(line.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ProtocolError::MalformedHeader(line.to_string()));
        }
        headers.insert(name.to_string(), value.trim().to_string());
    }

    Ok((status, headers))
}

/// Extracts the numeric status code (second token) from `HTTP/1.x NNN Reason`
fn parse_status_line(line: &str) -> Result<u16, ProtocolError> {
    let mut tokens = line.split_whitespace();
    let version = tokens.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(ProtocolError::MalformedStatusLine(line.to_string()));
    }

    tokens
        .next()
        .filter(|code| code.len() == 3)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| ProtocolError::MalformedStatusLine(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_head() {
        let head = b"HTTP/1.1 302 Found\r\nLocation: /accounts/login/?next=/fakebook/\r\nContent-Length: 0";
        let (status, headers) = parse_head(head).unwrap();
        assert_eq!(status, 302);
        assert_eq!(
            headers.get("Location").map(String::as_str),
            Some("/accounts/login/?next=/fakebook/")
        );
        assert_eq!(headers.get("Content-Length").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_header_value_keeps_later_colons() {
        let head = b"HTTP/1.1 200 OK\r\nDate: Mon, 01 Jan 2024 10:00:00 GMT";
        let (_, headers) = parse_head(head).unwrap();
        assert_eq!(
            headers.get("Date").map(String::as_str),
            Some("Mon, 01 Jan 2024 10:00:00 GMT")
        );
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let head = b"HTTP/1.1 200 OK\r\nSet-Cookie: csrftoken=a\r\nSet-Cookie: sessionid=b";
        let (_, headers) = parse_head(head).unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers.get("Set-Cookie").map(String::as_str),
            Some("sessionid=b")
        );
    }

    #[test]
    fn test_header_case_is_preserved() {
        let head = b"HTTP/1.1 200 OK\r\ncontent-length: 3";
        let (_, headers) = parse_head(head).unwrap();
        assert!(headers.contains_key("content-length"));

        let response = Response::new("abc", 200, headers);
        assert_eq!(response.header("Content-Length"), Some("3"));
    }

    #[test]
    fn test_malformed_status_line() {
        assert!(matches!(
            parse_head(b"garbage\r\nContent-Length: 0"),
            Err(ProtocolError::MalformedStatusLine(_))
        ));
        assert!(matches!(
            parse_head(b"HTTP/1.1 OK"),
            Err(ProtocolError::MalformedStatusLine(_))
        ));
        assert!(matches!(
            parse_head(b""),
            Err(ProtocolError::MalformedStatusLine(_))
        ));
    }

    #[test]
    fn test_malformed_header() {
        assert!(matches!(
            parse_head(b"HTTP/1.1 200 OK\r\nno separator here"),
            Err(ProtocolError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_dead_connection_shape() {
        let response = Response::dead_connection();
        assert_eq!(response.status(), 500);
        assert!(response.body().is_empty());
        assert!(response.headers().is_empty());
        assert!(response.is_server_error());
    }

    #[test]
    fn test_status_classes() {
        let redirect = Response::new("", 301, HashMap::new());
        assert!(redirect.is_redirect());
        assert!(!redirect.is_client_error());

        let missing = Response::new("", 404, HashMap::new());
        assert!(missing.is_client_error());
        assert!(!missing.is_server_error());
    }

    #[test]
    fn test_closes_connection() {
        let mut headers = HashMap::new();
        headers.insert("connection".to_string(), "Close".to_string());
        assert!(Response::new("", 200, headers).closes_connection());
        assert!(!Response::new("", 200, HashMap::new()).closes_connection());
    }
}
