//! Login credentials and the cookie-backed session they unlock

use crate::state::AuthState;
use std::fmt;

/// Username and password used for the login form
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication state plus the `Cookie` header value that backs it
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: AuthState,
    cookie: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// The credential to attach as `Cookie`, only while logged in
    pub fn cookie(&self) -> Option<&str> {
        match self.state {
            AuthState::LoggedIn => self.cookie.as_deref(),
            _ => None,
        }
    }

    /// Records a successful login
    pub fn establish(&mut self, cookie: String) {
        self.state = AuthState::LoggedIn;
        self.cookie = Some(cookie);
    }

    /// Records an explicit logout
    pub fn log_out(&mut self) {
        self.state = AuthState::LoggedOut;
        self.cookie = None;
    }

    /// Forgets everything known about the session so the next fetch re-probes
    pub fn invalidate(&mut self) {
        self.state = AuthState::Unknown;
        self.cookie = None;
    }
}

/// The `name=value` pair at the front of a `Set-Cookie` header value
///
/// ```
/// use flag_harvester::crawler::cookie_pair;
///
/// assert_eq!(cookie_pair("sessionid=abc; HttpOnly; Path=/"), "sessionid=abc");
/// ```
pub fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap_or_default().trim()
}

/// Returns the cookie pair from `set_cookie` if it sets the cookie `name`
pub fn named_cookie(set_cookie: &str, name: &str) -> Option<String> {
    let pair = cookie_pair(set_cookie);
    let (key, _) = pair.split_once('=')?;
    (key.trim() == name).then(|| pair.to_string())
}
