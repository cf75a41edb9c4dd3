// Bounded Most-Recent-First Log
//
// Fixed-capacity log used for per-player session history; the oldest entry
// is evicted once the capacity is reached. Serializes as a plain JSON array
// so stored records stay readable by anything expecting a list.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;

/// Fixed-capacity, most-recent-first log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentLog<T, const N: usize> {
    items: VecDeque<T>,
}

impl<T, const N: usize> RecentLog<T, N> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::with_capacity(N),
        }
    }

    /// Insert at the front, evicting the oldest entry at capacity.
    pub fn push(&mut self, item: T) {
        if self.items.len() == N {
            self.items.pop_back();
        }
        self.items.push_front(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recent entry.
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Iterate newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T, const N: usize> Default for RecentLog<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize, const N: usize> Serialize for RecentLog<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter())
    }
}

impl<'de, T: Deserialize<'de>, const N: usize> Deserialize<'de> for RecentLog<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Stored arrays are already most-recent-first; anything beyond the
        // capacity is stale overflow and dropped.
        let items: Vec<T> = Vec::deserialize(deserializer)?;
        let mut log = Self::new();
        log.items = items.into_iter().take(N).collect();
        Ok(log)
    }
}
