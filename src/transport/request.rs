//! Request framing for the two methods the crawler needs

use std::fmt;
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// An HTTP/1.1 request described as plain data
///
/// `Host` and, for requests with a body, `Content-Length` are written by
/// [`Request::serialize`]; every other header is sent in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Request {
    pub fn get(target: &str) -> Self {
        Self {
            method: Method::Get,
            target: target.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST whose body is `fields` in `application/x-www-form-urlencoded` form
    pub fn post_form(target: &str, fields: &[(&str, &str)]) -> Self {
        Self {
            method: Method::Post,
            target: target.to_string(),
            headers: vec![(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: Some(encode_form(fields)),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn headers(mut self, extra: &[(&str, &str)]) -> Self {
        for (name, value) in extra {
            self = self.header(name, value);
        }
        self
    }

    /// Renders the request as wire bytes with CRLF line endings
    pub fn serialize(&self, host: &str) -> Vec<u8> {
        let mut out = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", self.method, self.target, host);
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        if let Some(body) = &self.body {
            out.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        out.push_str("\r\n");
        if let Some(body) = &self.body {
            out.push_str(body);
        }
        out.into_bytes()
    }
}

/// Encodes `key=value` pairs joined by `&`, percent-escaping as forms do
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
