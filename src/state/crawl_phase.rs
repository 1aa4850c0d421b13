/// Lifecycle phases of a crawl
use std::fmt;

/// Represents where a crawl is in its lifecycle
///
/// `Idle → Authenticating → Crawling → Done`. Authentication is entered lazily
/// and re-entered from `Crawling` whenever the session lapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlPhase {
    /// Constructed, nothing fetched yet
    #[default]
    Idle,

    /// Performing the login exchange
    Authenticating,

    /// Running the advance/dissect loop
    Crawling,

    /// Flag target reached; no further frontier work happens
    Done,
}

impl CrawlPhase {
    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Staying in the same non-terminal phase is always allowed.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        match (self, next) {
            (Self::Done, _) => false,
            (from, to) if *from == to => true,
            (Self::Idle, Self::Authenticating | Self::Crawling) => true,
            (Self::Authenticating, Self::Idle | Self::Crawling) => true,
            (Self::Crawling, Self::Authenticating | Self::Done) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::Crawling => "crawling",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
