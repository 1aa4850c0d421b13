use serde::Deserialize;

/// Main configuration structure for Flag-Harvester
///
/// Every section and field has a default, so an empty file (or no file at
/// all) yields a configuration aimed at the stock Fakebook deployment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// The single origin the crawler talks to
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host name or IP address of the web application
    pub host: String,

    /// Plaintext HTTP port
    pub port: u16,

    /// Upper bound on a single socket read while assembling a response
    #[serde(rename = "read-block-size")]
    pub read_block_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "fring.ccs.neu.edu".to_string(),
            port: 80,
            read_block_size: 1024,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "flag-harvester".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `Name/Version`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

/// Login/logout endpoints and the anti-forgery field names
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(rename = "login-path")]
    pub login_path: String,

    #[serde(rename = "logout-path")]
    pub logout_path: String,

    /// A protected page used to probe whether the session is authenticated
    #[serde(rename = "probe-path")]
    pub probe_path: String,

    /// Name of the hidden form field carrying the CSRF token
    #[serde(rename = "csrf-field")]
    pub csrf_field: String,

    /// Name of the cookie carrying the CSRF token
    #[serde(rename = "csrf-cookie")]
    pub csrf_cookie: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_path: "/accounts/login/".to_string(),
            logout_path: "/accounts/logout/".to_string(),
            probe_path: "/fakebook/".to_string(),
            csrf_field: "csrfmiddlewaretoken".to_string(),
            csrf_cookie: "csrftoken".to_string(),
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Page the crawl starts from
    #[serde(rename = "start-path")]
    pub start_path: String,

    /// Number of distinct flags that ends the crawl
    #[serde(rename = "target-flags")]
    pub target_flags: usize,

    /// CSS selector matching flag-bearing elements
    #[serde(rename = "flag-selector")]
    pub flag_selector: String,

    /// Literal prefix stripped from a flag element's text
    #[serde(rename = "flag-prefix")]
    pub flag_prefix: String,

    /// Maximum attempts for a URL answering with a 5xx status
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Initial delay between 5xx retries (milliseconds), doubled per attempt
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Cap on the delay between 5xx retries (milliseconds)
    #[serde(rename = "max-backoff-ms")]
    pub max_backoff_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_path: "/fakebook/".to_string(),
            target_flags: 5,
            flag_selector: ".secret_flag".to_string(),
            flag_prefix: "FLAG: ".to_string(),
            max_retries: 10,
            retry_backoff_ms: 100,
            max_backoff_ms: 5000,
        }
    }
}
