//! Consumption ledger: which features of which part instances are claimed by
//! a placed attachment.
//!
//! Each (part, feature) pair is either free or consumed. Marking is idempotent,
//! and releasing the last feature of a part drops the part's entry entirely, so
//! a mark followed by a release restores the previous ledger state exactly.

use std::collections::{BTreeMap, BTreeSet};

use mount_types::{FeatureRef, PartKey};
use tracing::debug;

/// Consumed features of a single part instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerEntry {
    pub faces: BTreeSet<u32>,
    pub slide_groups: BTreeSet<usize>,
}

impl LedgerEntry {
    fn contains(&self, feature: FeatureRef) -> bool {
        match feature {
            FeatureRef::Face(id) => self.faces.contains(&id),
            FeatureRef::SlideGroup(idx) => self.slide_groups.contains(&idx),
        }
    }

    fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.slide_groups.is_empty()
    }

    fn features(&self) -> impl Iterator<Item = FeatureRef> + '_ {
        self.faces
            .iter()
            .map(|&id| FeatureRef::Face(id))
            .chain(self.slide_groups.iter().map(|&idx| FeatureRef::SlideGroup(idx)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: BTreeMap<PartKey, LedgerEntry>,
    /// child -> parent, used to cascade resets.
    parents: BTreeMap<PartKey, PartKey>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `feature` of `part` consumed. Returns `false` if it already was.
    pub fn mark_used(&mut self, part: &PartKey, feature: FeatureRef) -> bool {
        let entry = self.entries.entry(part.clone()).or_default();
        let inserted = match feature {
            FeatureRef::Face(id) => entry.faces.insert(id),
            FeatureRef::SlideGroup(idx) => entry.slide_groups.insert(idx),
        };
        debug!(%part, ?feature, inserted, "mark used");
        inserted
    }

    /// Free `feature` of `part`. Returns `false` if it was not consumed.
    pub fn release(&mut self, part: &PartKey, feature: FeatureRef) -> bool {
        let Some(entry) = self.entries.get_mut(part) else {
            return false;
        };
        let removed = match feature {
            FeatureRef::Face(id) => entry.faces.remove(&id),
            FeatureRef::SlideGroup(idx) => entry.slide_groups.remove(&idx),
        };
        if entry.is_empty() {
            self.entries.remove(part);
        }
        debug!(%part, ?feature, removed, "release");
        removed
    }

    pub fn is_used(&self, part: &PartKey, feature: FeatureRef) -> bool {
        self.entries.get(part).is_some_and(|e| e.contains(feature))
    }

    pub fn entry(&self, part: &PartKey) -> Option<&LedgerEntry> {
        self.entries.get(part)
    }

    pub fn used_features(&self, part: &PartKey) -> Vec<FeatureRef> {
        self.entries
            .get(part)
            .map(|e| e.features().collect())
            .unwrap_or_default()
    }

    /// Record that `child` is mounted on `parent`, for cascading resets.
    pub fn link_child(&mut self, child: &PartKey, parent: &PartKey) {
        self.parents.insert(child.clone(), parent.clone());
    }

    pub fn children_of(&self, parent: &PartKey) -> Vec<PartKey> {
        self.parents
            .iter()
            .filter(|(_, p)| *p == parent)
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// Clear every entry of `part`; with `cascade`, also of every part mounted
    /// on it, recursively. Returns the parts that were visited, `part` first.
    pub fn reset_for_part(&mut self, part: &PartKey, cascade: bool) -> Vec<PartKey> {
        let mut visited = Vec::new();
        let mut stack = vec![part.clone()];
        while let Some(current) = stack.pop() {
            if visited.contains(&current) {
                continue;
            }
            if cascade {
                stack.extend(self.children_of(&current));
            }
            self.entries.remove(&current);
            visited.push(current);
        }
        debug!(%part, cascade, cleared = visited.len(), "reset for part");
        visited
    }

    /// Drop entries and parent links of every part for which `is_live` is false.
    /// Returns the removed part keys.
    pub fn cleanup_orphans(&mut self, is_live: impl Fn(&PartKey) -> bool) -> Vec<PartKey> {
        let mut removed: Vec<PartKey> = self
            .entries
            .keys()
            .chain(self.parents.keys())
            .filter(|k| !is_live(k))
            .cloned()
            .collect();
        removed.sort();
        removed.dedup();
        for key in &removed {
            self.entries.remove(key);
            self.parents.remove(key);
        }
        if !removed.is_empty() {
            debug!(count = removed.len(), "removed orphaned ledger entries");
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parts with at least one consumed feature.
    pub fn parts(&self) -> impl Iterator<Item = &PartKey> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PartKey {
        PartKey::new(s)
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut once = Ledger::new();
        once.mark_used(&key("base"), FeatureRef::Face(1));

        let mut twice = Ledger::new();
        assert!(twice.mark_used(&key("base"), FeatureRef::Face(1)));
        assert!(!twice.mark_used(&key("base"), FeatureRef::Face(1)));

        assert_eq!(once, twice);
    }

    #[test]
    fn test_release_restores_previous_state() {
        let mut ledger = Ledger::new();
        ledger.mark_used(&key("base"), FeatureRef::Face(7));
        let before = ledger.clone();

        ledger.mark_used(&key("base"), FeatureRef::SlideGroup(0));
        ledger.mark_used(&key("hotend#1"), FeatureRef::Face(2));
        ledger.release(&key("hotend#1"), FeatureRef::Face(2));
        ledger.release(&key("base"), FeatureRef::SlideGroup(0));

        assert_eq!(ledger, before);
        assert!(!ledger.release(&key("base"), FeatureRef::SlideGroup(0)));
    }

    #[test]
    fn test_faces_and_slide_groups_are_distinct() {
        let mut ledger = Ledger::new();
        ledger.mark_used(&key("base"), FeatureRef::Face(0));
        assert!(ledger.is_used(&key("base"), FeatureRef::Face(0)));
        assert!(!ledger.is_used(&key("base"), FeatureRef::SlideGroup(0)));
        assert!(!ledger.is_used(&key("other"), FeatureRef::Face(0)));
    }

    #[test]
    fn test_reset_without_cascade_keeps_children() {
        let mut ledger = Ledger::new();
        ledger.mark_used(&key("skirt#1"), FeatureRef::Face(1));
        ledger.mark_used(&key("guard#2"), FeatureRef::Face(4));
        ledger.link_child(&key("guard#2"), &key("skirt#1"));

        let cleared = ledger.reset_for_part(&key("skirt#1"), false);
        assert_eq!(cleared, vec![key("skirt#1")]);
        assert!(ledger.is_used(&key("guard#2"), FeatureRef::Face(4)));
    }

    #[test]
    fn test_reset_with_cascade_clears_descendants() {
        let mut ledger = Ledger::new();
        ledger.mark_used(&key("base"), FeatureRef::Face(1));
        ledger.mark_used(&key("p#1"), FeatureRef::Face(1));
        ledger.mark_used(&key("p#1"), FeatureRef::Face(2));
        ledger.mark_used(&key("c#2"), FeatureRef::Face(9));
        ledger.mark_used(&key("g#3"), FeatureRef::Face(5));
        ledger.link_child(&key("p#1"), &key("base"));
        ledger.link_child(&key("c#2"), &key("p#1"));
        ledger.link_child(&key("g#3"), &key("c#2"));

        let cleared = ledger.reset_for_part(&key("p#1"), true);
        assert_eq!(cleared.len(), 3);
        assert!(ledger.used_features(&key("p#1")).is_empty());
        assert!(ledger.used_features(&key("c#2")).is_empty());
        assert!(ledger.used_features(&key("g#3")).is_empty());
        // The base is the parent, not a child, and keeps its entry.
        assert!(ledger.is_used(&key("base"), FeatureRef::Face(1)));
    }

    #[test]
    fn test_cleanup_orphans() {
        let mut ledger = Ledger::new();
        ledger.mark_used(&key("base"), FeatureRef::Face(1));
        ledger.mark_used(&key("gone#1"), FeatureRef::Face(1));
        ledger.link_child(&key("gone#1"), &key("base"));

        let removed = ledger.cleanup_orphans(|k| k == &key("base"));
        assert_eq!(removed, vec![key("gone#1")]);
        assert!(ledger.children_of(&key("base")).is_empty());
        assert!(ledger.is_used(&key("base"), FeatureRef::Face(1)));
    }

    #[test]
    fn test_used_features_lists_both_kinds() {
        let mut ledger = Ledger::new();
        ledger.mark_used(&key("base"), FeatureRef::SlideGroup(1));
        ledger.mark_used(&key("base"), FeatureRef::Face(3));
        assert_eq!(
            ledger.used_features(&key("base")),
            vec![FeatureRef::Face(3), FeatureRef::SlideGroup(1)]
        );
    }
}
