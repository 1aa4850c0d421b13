/// Authentication state of a crawl session
use std::fmt;

/// Represents what the crawler knows about its login status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthState {
    /// No login has been attempted yet, or the last session lapsed
    #[default]
    Unknown,

    /// A login exchange succeeded and a session cookie is held
    LoggedIn,

    /// The session was closed by an explicit logout
    LoggedOut,
}

impl AuthState {
    /// Returns true if the state is settled without probing the server
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns true if a session cookie may be sent
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::LoggedIn => "logged_in",
            Self::LoggedOut => "logged_out",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
