//! Weighted, path-compressing union-find over arbitrary hashable objects.
//!
//! Objects receive a dense slot the first time they are seen; slots are handed
//! out by a monotonic counter and never reused because sets only ever grow or
//! merge. A slot whose parent is itself is a root, and only roots carry a
//! weight (the number of objects resolving to them).

use std::collections::HashMap;
use std::hash::Hash;

/// Disjoint sets of `T`, created lazily on first [`UnionFind::find`].
///
/// # Examples
/// ```
/// use topologyx_core::UnionFind;
///
/// let mut sets = UnionFind::new();
/// sets.union(&0_usize, &1);
/// sets.union(&1, &2);
/// assert_eq!(sets.find(&0), sets.find(&2));
/// assert_eq!(sets.set_count(), 1);
/// let root = sets.find(&2);
/// assert_eq!(sets.weight(&root), Some(3));
/// ```
#[derive(Clone, Debug)]
pub struct UnionFind<T> {
    objects: Vec<T>,
    slots: HashMap<T, usize>,
    parent: Vec<usize>,
    weight: Vec<usize>,
    roots: usize,
}

impl<T> Default for UnionFind<T> {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            slots: HashMap::new(),
            parent: Vec::new(),
            weight: Vec::new(),
            roots: 0,
        }
    }
}

impl<T: Clone + Eq + Hash> UnionFind<T> {
    /// Creates an empty structure.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty structure with room for `capacity` objects.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
            parent: Vec::with_capacity(capacity),
            weight: Vec::with_capacity(capacity),
            roots: 0,
        }
    }

    /// Number of objects inserted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether `object` has been inserted.
    #[must_use]
    pub fn contains(&self, object: &T) -> bool {
        self.slots.contains_key(object)
    }

    /// Number of disjoint sets.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.roots
    }

    /// Size of the set rooted at `object`, or `None` when `object` is unknown
    /// or not a root.
    #[must_use]
    pub fn weight(&self, object: &T) -> Option<usize> {
        let slot = *self.slots.get(object)?;
        (self.parent.get(slot) == Some(&slot))
            .then(|| self.weight.get(slot).copied())
            .flatten()
    }

    /// Ensures every object exists, inserting unseen ones as singletons.
    pub fn insert_objects<'a, I>(&mut self, objects: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        for object in objects {
            self.find(object);
        }
    }

    /// Returns the representative of `object`'s set.
    ///
    /// An unseen object becomes a new singleton and is returned unchanged.
    /// Every slot visited on the way to the root is re-pointed at the root.
    pub fn find(&mut self, object: &T) -> T {
        let slot = self.find_slot(object);
        self.object_at(slot)
    }

    /// Whether `left` and `right` currently share a set.
    pub fn connected(&mut self, left: &T, right: &T) -> bool {
        self.find_slot(left) == self.find_slot(right)
    }

    /// Merges the sets containing `left` and `right` and returns the
    /// surviving representative.
    ///
    /// The lighter root is attached under the heavier one; on equal weight the
    /// root of `left` survives. Merging a set with itself changes nothing.
    pub fn union(&mut self, left: &T, right: &T) -> T {
        let mut winner = self.find_slot(left);
        let mut loser = self.find_slot(right);
        if winner == loser {
            return self.object_at(winner);
        }
        if self.weight_at(winner) < self.weight_at(loser) {
            std::mem::swap(&mut winner, &mut loser);
        }

        let merged = self.weight_at(winner) + self.weight_at(loser);
        if let Some(weight) = self.weight.get_mut(winner) {
            *weight = merged;
        }
        if let Some(weight) = self.weight.get_mut(loser) {
            *weight = 0;
        }
        if let Some(parent) = self.parent.get_mut(loser) {
            *parent = winner;
        }
        self.roots -= 1;
        self.object_at(winner)
    }

    /// Groups every object by set.
    ///
    /// Sets are ordered by the slot of their root and members by slot, so the
    /// output depends only on the order of first insertion.
    pub fn sets(&mut self) -> Vec<(T, Vec<T>)> {
        let mut positions: HashMap<usize, usize> = HashMap::with_capacity(self.roots);
        let mut groups: Vec<(T, Vec<T>)> = Vec::with_capacity(self.roots);
        for slot in 0..self.objects.len() {
            let root = self.root_slot(slot);
            let position = *positions.entry(root).or_insert_with(|| {
                groups.push((self.objects[root].clone(), Vec::new()));
                groups.len() - 1
            });
            if let Some((_, members)) = groups.get_mut(position) {
                members.push(self.objects[slot].clone());
            }
        }
        groups.sort_by_key(|(root, _)| self.slots.get(root).copied());
        groups
    }

    fn find_slot(&mut self, object: &T) -> usize {
        match self.slots.get(object) {
            Some(&slot) => self.root_slot(slot),
            None => self.insert(object.clone()),
        }
    }

    fn insert(&mut self, object: T) -> usize {
        let slot = self.objects.len();
        self.slots.insert(object.clone(), slot);
        self.objects.push(object);
        self.parent.push(slot);
        self.weight.push(1);
        self.roots += 1;
        slot
    }

    fn root_slot(&mut self, slot: usize) -> usize {
        let mut root = slot;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = slot;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    fn weight_at(&self, slot: usize) -> usize {
        self.weight.get(slot).copied().unwrap_or(0)
    }

    fn object_at(&self, slot: usize) -> T {
        self.objects[slot].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::suite_proptest_config;
    use proptest::prelude::*;
    use rstest::rstest;

    fn partition(sets: &mut UnionFind<usize>, universe: usize) -> Vec<usize> {
        (0..universe).map(|object| sets.find(&object)).collect()
    }

    #[test]
    fn unseen_object_becomes_singleton() {
        let mut sets = UnionFind::new();

        assert_eq!(sets.find(&"a"), "a");
        assert_eq!(sets.len(), 1);
        assert_eq!(sets.weight(&"a"), Some(1));
        assert_eq!(sets.set_count(), 1);
    }

    #[test]
    fn insert_objects_is_idempotent() {
        let mut sets = UnionFind::new();
        sets.insert_objects(&[3_usize, 4, 3]);
        sets.insert_objects(&[4_usize]);

        assert_eq!(sets.len(), 2);
        assert_eq!(sets.set_count(), 2);
    }

    #[test]
    fn heavier_root_wins() {
        let mut sets = UnionFind::new();
        sets.union(&1_usize, &2);
        sets.union(&1, &3);

        let root = sets.union(&9, &2);

        assert_eq!(root, 1);
        assert_eq!(sets.weight(&1), Some(4));
        assert_eq!(sets.weight(&9), None);
    }

    #[rstest]
    #[case(0_usize, 1_usize)]
    #[case(1, 0)]
    fn first_argument_wins_ties(#[case] left: usize, #[case] right: usize) {
        let mut sets = UnionFind::new();

        assert_eq!(sets.union(&left, &right), left);
        assert_eq!(sets.find(&right), left);
    }

    #[test]
    fn union_within_a_set_is_a_no_op() {
        let mut sets = UnionFind::new();
        sets.union(&0_usize, &1);

        let root = sets.union(&1, &0);

        assert_eq!(root, 0);
        assert_eq!(sets.set_count(), 1);
        assert_eq!(sets.weight(&0), Some(2));
    }

    #[test]
    fn transitive_unions_join_ends() {
        let mut sets = UnionFind::new();
        sets.union(&0_usize, &1);
        sets.union(&1, &2);

        assert!(sets.connected(&0, &2));
    }

    #[test]
    fn sets_follow_insertion_order() {
        let mut sets = UnionFind::new();
        sets.insert_objects(&[5_usize, 6, 7, 8]);
        sets.union(&8, &6);
        sets.union(&7, &5);

        let groups = sets.sets();

        assert_eq!(groups, vec![(7, vec![5, 7]), (8, vec![6, 8])]);
    }

    proptest! {
        #![proptest_config(suite_proptest_config(128))]

        #[test]
        fn union_find_matches_naive_labelling(
            pairs in prop::collection::vec((0_usize..24, 0_usize..24), 0..48),
        ) {
            let mut sets = UnionFind::new();
            let mut labels: Vec<usize> = (0..24).collect();
            sets.insert_objects(&(0..24).collect::<Vec<_>>());

            for (left, right) in &pairs {
                sets.union(left, right);
                prop_assert_eq!(sets.find(left), sets.find(right));

                let (from, to) = (labels[*right], labels[*left]);
                for label in &mut labels {
                    if *label == from {
                        *label = to;
                    }
                }
            }

            for left in 0..24 {
                prop_assert_eq!(sets.find(&left), sets.find(&left));
                for right in 0..24 {
                    prop_assert_eq!(
                        sets.connected(&left, &right),
                        labels[left] == labels[right],
                    );
                }
            }

            let total: usize = sets
                .sets()
                .iter()
                .map(|(root, members)| {
                    assert_eq!(sets.weight(root), Some(members.len()));
                    members.len()
                })
                .sum();
            prop_assert_eq!(total, 24);
        }

        #[test]
        fn union_order_does_not_change_partition(
            pairs in prop::collection::vec((0_usize..16, 0_usize..16), 0..32),
        ) {
            let mut forward = UnionFind::new();
            let mut swapped = UnionFind::new();
            for (left, right) in &pairs {
                forward.union(left, right);
                swapped.union(right, left);
            }

            let forward_labels = partition(&mut forward, 16);
            let swapped_labels = partition(&mut swapped, 16);
            for left in 0..16 {
                for right in 0..16 {
                    prop_assert_eq!(
                        forward_labels[left] == forward_labels[right],
                        swapped_labels[left] == swapped_labels[right],
                    );
                }
            }
        }

        #[test]
        fn compression_keeps_partition_stable(
            pairs in prop::collection::vec((0_usize..16, 0_usize..16), 1..32),
        ) {
            let mut sets = UnionFind::new();
            for (left, right) in &pairs {
                sets.union(left, right);
            }
            let before = partition(&mut sets, 16);
            let after = partition(&mut sets, 16);
            prop_assert_eq!(before, after);
        }
    }
}
