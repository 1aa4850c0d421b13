//! Crawler coordinator - authentication, frontier management and the crawl loop
//!
//! The coordinator owns everything a crawl needs:
//! - The session (login state and the cookie that backs it)
//! - The frontier of queued and visited URLs
//! - The set of flags found so far
//! - The transport used for every request
//!
//! Status codes drive the loop: 5xx responses are retried over a fresh
//! connection, 4xx responses abandon the URL, a 301 is followed exactly once
//! and everything else is handed to the extractor.

use crate::config::{Config, CrawlerConfig, SessionConfig};
use crate::crawler::flags::FlagSet;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{Extractor, HtmlExtractor};
use crate::crawler::session::{cookie_pair, named_cookie, Credentials, Session};
use crate::state::{AuthState, CrawlPhase};
use crate::transport::{HttpTransport, Response, Transport};
use crate::url::{resolve_location, Origin};
use crate::{HarvestError, Result};
use std::thread;
use std::time::Duration;

/// Authenticated same-origin crawler
pub struct Crawler<T, X = HtmlExtractor> {
    transport: T,
    extractor: X,
    origin: Origin,
    session_config: SessionConfig,
    crawler_config: CrawlerConfig,
    credentials: Credentials,
    session: Session,
    frontier: Frontier,
    flags: FlagSet,
    phase: CrawlPhase,
}

impl Crawler<Transport, HtmlExtractor> {
    /// Connects to the configured origin and builds a crawler over it
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `credentials` - Account used for the login form
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Connected crawler in the `Idle` phase
    /// * `Err(HarvestError)` - The connection could not be opened or the
    ///   flag selector is invalid
    pub fn connect(config: &Config, credentials: Credentials) -> Result<Self> {
        let extractor = HtmlExtractor::from_config(&config.crawler)?;
        let transport = Transport::from_config(config)?;
        tracing::info!("Connected to {}", transport.origin().socket_addr());
        Ok(Self::new(config, transport, extractor, credentials))
    }
}

impl<T: HttpTransport, X: Extractor> Crawler<T, X> {
    pub fn new(config: &Config, transport: T, extractor: X, credentials: Credentials) -> Self {
        Self {
            transport,
            extractor,
            origin: Origin::from_config(&config.server),
            session_config: config.session.clone(),
            crawler_config: config.crawler.clone(),
            credentials,
            session: Session::new(),
            frontier: Frontier::new(),
            flags: FlagSet::new(config.crawler.target_flags),
            phase: CrawlPhase::Idle,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn auth_state(&self) -> AuthState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Logs in through the CSRF-protected login form
    ///
    /// GETs the login page, pulls the token out of the hidden field and POSTs
    /// it back with the credentials. The session cookie issued in response is
    /// combined with the CSRF cookie to form the credential for later fetches.
    pub fn login(&mut self) -> Result<()> {
        let resume = match self.phase {
            CrawlPhase::Crawling => CrawlPhase::Crawling,
            _ => CrawlPhase::Idle,
        };
        self.enter(CrawlPhase::Authenticating)?;

        // The phase is restored whether or not the exchange succeeded
        let outcome = self.submit_login();
        self.enter(resume)?;
        outcome
    }

    fn submit_login(&mut self) -> Result<()> {
        let login_path = self.session_config.login_path.clone();
        let url = self.origin.absolute(&login_path);
        let page = self.with_retries(&url, |crawler| {
            Ok(crawler.transport.get(&login_path, &[])?)
        })?;

        let field = &self.session_config.csrf_field;
        let token = self
            .extractor
            .form_field(page.body(), field)
            .ok_or_else(|| HarvestError::MissingCsrfToken {
                url: url.clone(),
                field: field.clone(),
            })?;

        let csrf_name = &self.session_config.csrf_cookie;
        let csrf_cookie = page
            .header("Set-Cookie")
            .and_then(|value| named_cookie(value, csrf_name))
            .unwrap_or_else(|| format!("{}={}", csrf_name, token));

        let form = [
            (field.as_str(), token.as_str()),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
        ];
        let response = self
            .transport
            .post(&login_path, &form, &[("Cookie", csrf_cookie.as_str())])?;

        let session_cookie = response
            .header("Set-Cookie")
            .map(cookie_pair)
            .filter(|pair| !pair.is_empty())
            .ok_or(HarvestError::LoginRejected {
                status: response.status(),
            })?;

        self.session
            .establish(format!("{}; {}", session_cookie, csrf_cookie));
        tracing::info!("Logged in as {}", self.credentials.username);
        Ok(())
    }

    /// Ends the session on the server
    ///
    /// The session is marked logged out even if the request fails.
    pub fn logout(&mut self) -> Result<()> {
        let logout_path = self.session_config.logout_path.clone();
        let result = self.get_with_session(&logout_path);
        self.session.log_out();
        let response = result?;
        tracing::debug!("Logged out (HTTP {})", response.status());
        Ok(())
    }

    /// Returns whether requests currently carry a valid session
    ///
    /// While the state is unknown the probe page is fetched without a cookie;
    /// a redirect means the server wants a login. The session itself is not
    /// touched either way.
    pub fn is_authenticated(&mut self) -> Result<bool> {
        match self.session.state() {
            // A single probe, outside the retry loop: a dead-connection 500
            // is not a redirect and so reads as authenticated
            AuthState::Unknown => {
                let response = self.transport.get(&self.session_config.probe_path, &[])?;
                tracing::debug!(
                    "Authentication probe {} answered {}",
                    self.session_config.probe_path,
                    response.status()
                );
                Ok(!response.is_redirect())
            }
            state => Ok(state.is_logged_in()),
        }
    }

    /// GETs `url` with the session credential, logging in first if needed
    ///
    /// A redirect into the login form while logged in means the session
    /// lapsed: the crawler logs in again and repeats the request once.
    pub fn fetch(&mut self, url: &str) -> Result<Response> {
        let target = self
            .origin
            .request_target(url)
            .ok_or_else(|| HarvestError::CrossOrigin {
                url: url.to_string(),
            })?;

        if !self.is_authenticated()? {
            self.login()?;
        }

        let response = self.get_with_session(&target)?;
        if self.session.state().is_logged_in() && self.redirects_to_login(&response) {
            tracing::warn!("Session lapsed while fetching {}, logging in again", url);
            self.session.invalidate();
            self.login()?;
            return self.get_with_session(&target);
        }

        Ok(response)
    }

    /// Queues `href` for crawling
    ///
    /// The href is appended to the origin as-is. Anything containing `:` is
    /// treated as off-site and rejected, as is any URL already queued or
    /// visited.
    ///
    /// # Returns
    ///
    /// `true` if the frontier grew
    pub fn enqueue(&mut self, href: &str) -> bool {
        if href.contains(':') {
            tracing::trace!("Skipping href with scheme or port: {}", href);
            return false;
        }
        self.frontier.push(self.origin.absolute(href))
    }

    /// Feeds a page body to the extractor: links go to the frontier and new
    /// flags to the flag set
    pub fn dissect(&mut self, html: &str) {
        let page = self.extractor.extract(html);

        let queued = page.links.iter().filter(|href| self.enqueue(href)).count();

        for text in &page.flags {
            let text = text.trim();
            let flag = text
                .strip_prefix(self.crawler_config.flag_prefix.as_str())
                .unwrap_or(text)
                .trim();
            if flag.is_empty() {
                continue;
            }
            if self.flags.insert(flag) {
                tracing::info!(
                    "Found flag {}/{}: {}",
                    self.flags.len(),
                    self.flags.target(),
                    flag
                );
            }
        }

        tracing::debug!(
            "Dissected page: {} links ({} new), {} flag elements",
            page.links.len(),
            queued,
            page.flags.len()
        );
    }

    /// Fetches the next URL in the frontier and returns the page to dissect
    ///
    /// Client errors abandon the URL and move on to the next one. A 301 is
    /// followed once; its target is marked visited without being queued.
    pub fn advance(&mut self) -> Result<Response> {
        loop {
            let url = self.frontier.pop().ok_or(HarvestError::FrontierExhausted {
                found: self.flags.len(),
                target: self.flags.target(),
            })?;

            if self.origin.request_target(&url).is_none() {
                tracing::warn!("Abandoning {}: not on {}", url, self.origin.base());
                continue;
            }

            tracing::debug!("Advancing to {}", url);
            let response = self.with_retries(&url, |crawler| crawler.fetch(&url))?;

            if response.is_client_error() {
                tracing::warn!("Abandoning {} (HTTP {})", url, response.status());
                continue;
            }

            if response.status() == 301 {
                let location = response
                    .header("Location")
                    .ok_or_else(|| HarvestError::MissingLocation { url: url.clone() })?;

                let Some(next) = self.redirect_target(&url, location)? else {
                    tracing::warn!("Abandoning {}: redirects off-site to {}", url, location);
                    continue;
                };

                tracing::debug!("Following redirect {} -> {}", url, next);
                self.frontier.mark_visited(&next);
                return self.fetch(&next);
            }

            return Ok(response);
        }
    }

    /// Crawls from `start_url` until `target` distinct flags are found
    ///
    /// # Returns
    ///
    /// * `Ok(FlagSet)` - The flags found, in discovery order
    /// * `Err(HarvestError)` - The frontier ran dry, a URL kept failing, or
    ///   the transport broke
    pub fn run(&mut self, start_url: &str, target: usize) -> Result<FlagSet> {
        self.enter(CrawlPhase::Crawling)?;
        self.flags.set_target(target);

        let start = if start_url.starts_with('/') {
            self.origin.absolute(start_url)
        } else {
            start_url.to_string()
        };
        tracing::info!("Starting crawl at {} (target: {} flags)", start, target);

        self.frontier.mark_visited(&start);
        let mut response = self.with_retries(&start, |crawler| crawler.fetch(&start))?;

        loop {
            self.dissect(response.body());
            if self.flags.is_complete() {
                break;
            }
            response = self.advance()?;
        }

        self.enter(CrawlPhase::Done)?;
        tracing::info!(
            "Crawl complete: {} flags after visiting {} URLs",
            self.flags.len(),
            self.frontier.visited_len()
        );

        Ok(self.flags.clone())
    }

    /// Runs `attempt` until it yields something other than a 5xx, reconnecting
    /// and backing off between tries
    fn with_retries<F>(&mut self, url: &str, mut attempt: F) -> Result<Response>
    where
        F: FnMut(&mut Self) -> Result<Response>,
    {
        let max_attempts = self.crawler_config.max_retries;
        let mut attempts = 1;
        let mut response = attempt(self)?;

        while response.is_server_error() {
            if attempts >= max_attempts {
                return Err(HarvestError::RetriesExhausted {
                    url: url.to_string(),
                    attempts,
                    status: response.status(),
                });
            }

            let delay = self.backoff(attempts);
            tracing::warn!(
                "{} answered {}, retrying in {:?} (attempt {}/{})",
                url,
                response.status(),
                delay,
                attempts + 1,
                max_attempts
            );

            self.transport.reconnect()?;
            if !delay.is_zero() {
                thread::sleep(delay);
            }

            response = attempt(self)?;
            attempts += 1;
        }

        Ok(response)
    }

    /// Delay before retry number `attempt` (1-based): doubles from the base
    /// delay up to the cap
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let millis = self
            .crawler_config
            .retry_backoff_ms
            .saturating_mul(factor)
            .min(self.crawler_config.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// Resolves a `Location` into the form `enqueue` gives the same page, so
    /// the visited set sees one spelling per URL
    ///
    /// Returns `None` when the target is on another origin.
    fn redirect_target(&self, current: &str, location: &str) -> Result<Option<String>> {
        let location = location.trim();
        if location.starts_with('/') && !location.starts_with("//") {
            return Ok(Some(self.origin.absolute(location)));
        }

        let resolved = resolve_location(current, location)?;
        Ok(self
            .origin
            .request_target(location)
            .or_else(|| self.origin.request_target(&resolved))
            .map(|target| self.origin.absolute(&target)))
    }

    fn get_with_session(&mut self, target: &str) -> Result<Response> {
        let cookie = self.session.cookie().map(str::to_string);
        let headers: Vec<(&str, &str)> = cookie.iter().map(|c| ("Cookie", c.as_str())).collect();

        Ok(self.transport.get(target, &headers)?)
    }

    fn redirects_to_login(&self, response: &Response) -> bool {
        if !response.is_redirect() {
            return false;
        }
        let Some(location) = response.header("Location") else {
            return false;
        };
        let Ok(resolved) = resolve_location(&self.origin.base(), location) else {
            return false;
        };

        self.origin
            .request_target(&resolved)
            .is_some_and(|target| target.starts_with(&self.session_config.login_path))
    }

    fn enter(&mut self, next: CrawlPhase) -> Result<()> {
        if self.phase == next {
            return Ok(());
        }
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::debug!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}
