use crate::config::ServerConfig;
use url::Url;

/// The single scheme/host/port the crawler is confined to
///
/// The scheme is always `http`; the port is omitted from rendered URLs and
/// `Host` headers when it is the default 80.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    host: String,
    port: u16,
}

impl Origin {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.host.clone(), config.port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for `TcpStream::connect`
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value of the `Host` request header
    pub fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            self.socket_addr()
        }
    }

    /// `http://host[:port]` with no trailing slash
    pub fn base(&self) -> String {
        format!("http://{}", self.host_header())
    }

    /// Composes an absolute URL by prefixing the origin to `href`
    ///
    /// This is plain concatenation: no normalization is applied, so `href`
    /// is expected to be an origin-relative path such as `/fakebook/1/`.
    pub fn absolute(&self, href: &str) -> String {
        format!("{}{}", self.base(), href)
    }

    /// Returns true if `url` is an absolute URL on this origin
    pub fn contains(&self, url: &Url) -> bool {
        url.scheme() == "http"
            && url.host_str() == Some(self.host.as_str())
            && url.port_or_known_default() == Some(self.port)
    }

    /// Turns a crawl URL into the request-target sent on the wire
    ///
    /// Accepts origin-relative paths and absolute URLs on this origin.
    /// Fragments are dropped. Returns `None` for URLs on any other origin.
    pub fn request_target(&self, url: &str) -> Option<String> {
        let target = if url.starts_with('/') {
            url.to_string()
        } else if let Some(rest) = url
            .strip_prefix(&self.base())
            .filter(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
        {
            if rest.starts_with('/') {
                rest.to_string()
            } else {
                format!("/{}", rest)
            }
        } else {
            let parsed = Url::parse(url).ok()?;
            if !self.contains(&parsed) {
                return None;
            }
            match parsed.query() {
                Some(query) => format!("{}?{}", parsed.path(), query),
                None => parsed.path().to_string(),
            }
        };

        let target = match target.split_once('#') {
            Some((before, _)) => before.to_string(),
            None => target,
        };

        Some(if target.is_empty() {
            "/".to_string()
        } else {
            target
        })
    }
}
