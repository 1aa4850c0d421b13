//! Crawl frontier: URLs waiting to be fetched and URLs that never will be again
//!
//! Queued URLs come out in FIFO order. A URL lives in at most one of the
//! queued and visited sets, and once visited it can never be queued again.

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default, Clone)]
pub struct Frontier {
    /// FIFO order of queued URLs
    queue: VecDeque<String>,

    /// Membership index for `queue`
    queued: HashSet<String>,

    /// URLs already fetched or explicitly rejected
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `url` unless it is already queued or visited
    ///
    /// # Returns
    ///
    /// `true` if the URL was newly queued
    pub fn push(&mut self, url: String) -> bool {
        if self.is_known(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Takes the oldest queued URL and moves it to the visited set
    pub fn pop(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&url);
        self.visited.insert(url.clone());
        Some(url)
    }

    /// Marks `url` visited, withdrawing it from the queue if it was waiting there
    pub fn mark_visited(&mut self, url: &str) {
        if self.queued.remove(url) {
            self.queue.retain(|queued| queued != url);
        }
        self.visited.insert(url.to_string());
    }

    pub fn is_queued(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Returns true if `url` is queued or visited
    pub fn is_known(&self, url: &str) -> bool {
        self.is_queued(url) || self.is_visited(url)
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Returns true if nothing is waiting to be fetched
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued URLs in the order they will be fetched
    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }
}
