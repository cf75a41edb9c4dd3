// Presence Reconciliation
//
// Pure set partition between the previously known online set and the
// players reported present by the latest snapshot.

use crate::normalize::PresentPlayer;
use std::collections::{BTreeSet, HashSet};

/// Membership changes between two polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceDiff {
    /// Ids present now that were not present before, in snapshot order.
    pub joined: Vec<String>,
    /// Ids present before that are gone now, sorted.
    pub left: Vec<String>,
}

/// Partition current presence against the previously known online set.
///
/// Every reported player is also refreshed by the caller (joined or not),
/// so the diff only carries membership changes: `joined` and `left` are
/// disjoint by construction.
pub fn diff_presence(previous: &HashSet<String>, current: &[PresentPlayer]) -> PresenceDiff {
    let current_ids: HashSet<&str> = current.iter().map(|p| p.id.as_str()).collect();

    let joined = current
        .iter()
        .filter(|p| !previous.contains(&p.id))
        .map(|p| p.id.clone())
        .collect();

    let left = previous
        .iter()
        .filter(|id| !current_ids.contains(id.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    PresenceDiff { joined, left }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str) -> PresentPlayer {
        PresentPlayer {
            id: id.to_string(),
            name: format!("name-{id}"),
        }
    }

    fn ids(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partitions_joins_and_leaves() {
        let previous = ids(&["a", "b"]);
        let current = [player("b"), player("c")];

        let diff = diff_presence(&previous, &current);
        assert_eq!(diff.joined, vec!["c"]);
        assert_eq!(diff.left, vec!["a"]);
    }

    #[test]
    fn joined_and_left_are_disjoint() {
        let previous = ids(&["a", "b", "c"]);
        let current = [player("c"), player("d"), player("e")];

        let diff = diff_presence(&previous, &current);
        for id in &diff.joined {
            assert!(!diff.left.contains(id));
        }
        assert_eq!(diff.joined, vec!["d", "e"]);
        assert_eq!(diff.left, vec!["a", "b"]);
    }

    #[test]
    fn everyone_joins_from_empty() {
        let diff = diff_presence(&HashSet::new(), &[player("a"), player("b")]);
        assert_eq!(diff.joined, vec!["a", "b"]);
        assert!(diff.left.is_empty());
    }

    #[test]
    fn everyone_leaves_to_empty() {
        let diff = diff_presence(&ids(&["b", "a"]), &[]);
        assert!(diff.joined.is_empty());
        assert_eq!(diff.left, vec!["a", "b"]);
    }

    #[test]
    fn steady_state_is_empty_diff() {
        let diff = diff_presence(&ids(&["a"]), &[player("a")]);
        assert_eq!(diff, PresenceDiff::default());
    }

    #[test]
    fn joined_preserves_snapshot_order() {
        let current = [player("z"), player("a"), player("m")];
        let diff = diff_presence(&HashSet::new(), &current);
        assert_eq!(diff.joined, vec!["z", "a", "m"]);
    }
}
