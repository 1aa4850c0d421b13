use std::collections::HashSet;

/// Distinct flags in discovery order, with the count that ends the crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    flags: Vec<String>,
    seen: HashSet<String>,
    target: usize,
}

impl FlagSet {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Adds `flag` if it has not been seen; returns true if it was new
    pub fn insert(&mut self, flag: impl Into<String>) -> bool {
        let flag = flag.into();
        if !self.seen.insert(flag.clone()) {
            return false;
        }
        self.flags.push(flag);
        true
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.seen.contains(flag)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn set_target(&mut self, target: usize) {
        self.target = target;
    }

    /// Returns true once at least `target` distinct flags are held
    pub fn is_complete(&self) -> bool {
        self.flags.len() >= self.target
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.flags
    }
}
