//! # Bar Tree
//!
//! The state model of the renderer: a forest of [`ProgressNode`]s addressed
//! by [`BarId`]. All nodes live in one id-keyed arena. Parent and child
//! links are ids inside the arena, and the ordered root list is the only
//! other structure, so there is exactly one place where a node is stored
//! and destroyed.
//!
//! The tree is owned by the event loop and is never shared. Every operation
//! takes `&mut self`, so there are no concurrent callers by construction.
//!
//! ## Tolerance
//! Events that do not match the live tree never fail the loop:
//! - create with a live id is ignored ([`Anomaly::DuplicateId`])
//! - advance/remove of a dead id is ignored ([`Anomaly::UnknownId`])
//! - create under a dead parent makes a root ([`Anomaly::DanglingParent`])
//!
//! The anomaly is still returned so the caller can log it.

use std::collections::HashMap;

use crate::{Anomaly, BarId, Event};

/// One tracked unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressNode {
    id: BarId,
    current: i64,
    total: i64,
    label: String,
    parent: Option<BarId>,
    children: Vec<BarId>,
}

impl ProgressNode {
    fn new(id: BarId, total: i64, label: String, parent: Option<BarId>) -> Self {
        Self {
            id,
            current: 0,
            total,
            label,
            parent,
            children: Vec::new(),
        }
    }
    #[inline(always)]
    pub fn id(&self) -> BarId {
        self.id
    }
    #[inline(always)]
    pub fn current(&self) -> i64 {
        self.current
    }
    /// Target value. `<= 0` means the total is not known
    #[inline(always)]
    pub fn total(&self) -> i64 {
        self.total
    }
    #[inline(always)]
    pub fn label(&self) -> &str {
        &self.label
    }
    /// The live parent, `None` for roots
    #[inline(always)]
    pub fn parent(&self) -> Option<BarId> {
        self.parent
    }
    /// Ids of the children, in creation order
    #[inline(always)]
    pub fn children(&self) -> &[BarId] {
        &self.children
    }
    /// If the total is known (positive)
    #[inline(always)]
    pub fn is_bounded(&self) -> bool {
        self.total > 0
    }
    /// Completion ratio in `[0, 1]`. Always 0 if the total is not known.
    pub fn ratio(&self) -> f64 {
        if !self.is_bounded() {
            return 0f64;
        }
        (self.current as f64 / self.total as f64).clamp(0f64, 1f64)
    }
}

/// Where a created node was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Created without a parent
    Root,
    /// Attached to the live parent
    Child(BarId),
    /// The requested parent was not live, so the node became a root
    Orphaned(BarId),
}

/// Forest of progress nodes. See [module documentation](self)
#[derive(Debug, Default)]
pub struct BarTree {
    nodes: HashMap<BarId, ProgressNode>,
    roots: Vec<BarId>,
}

impl BarTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event to the tree
    pub fn apply(&mut self, event: &Event) -> Result<(), Anomaly> {
        match event {
            Event::Create {
                id,
                total,
                label,
                parent,
            } => match self.insert(*id, *total, label.clone(), *parent)? {
                Placement::Orphaned(parent) => Err(Anomaly::DanglingParent { id: *id, parent }),
                _ => Ok(()),
            },
            Event::Advance { id, delta } => self.advance(*id, *delta),
            Event::Remove { id } => self.remove(*id).map(|_| ()),
            Event::Unrecognized { kind } => Err(Anomaly::UnrecognizedKind(*kind)),
        }
    }

    /// Create a node with `current = 0`.
    ///
    /// If `parent` is live, the node is appended to its children. Otherwise
    /// the node is appended to the roots. Nothing changes if `id` is live.
    pub fn insert(
        &mut self,
        id: BarId,
        total: i64,
        label: String,
        parent: Option<BarId>,
    ) -> Result<Placement, Anomaly> {
        if self.nodes.contains_key(&id) {
            return Err(Anomaly::DuplicateId(id));
        }
        let placement = match parent {
            None => Placement::Root,
            Some(p) => match self.nodes.get_mut(&p) {
                Some(parent_node) => {
                    parent_node.children.push(id);
                    Placement::Child(p)
                }
                None => Placement::Orphaned(p),
            },
        };
        let parent = match placement {
            Placement::Child(p) => Some(p),
            _ => {
                self.roots.push(id);
                None
            }
        };
        self.nodes
            .insert(id, ProgressNode::new(id, total, label, parent));
        Ok(placement)
    }

    /// Add `delta` to the current count, then clamp to the total if the
    /// total is known.
    ///
    /// Negative deltas are accepted and there is no lower clamp, so the
    /// count can go below zero.
    pub fn advance(&mut self, id: BarId, delta: i64) -> Result<(), Anomaly> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Err(Anomaly::UnknownId(id));
        };
        node.current = node.current.saturating_add(delta);
        if node.total > 0 && node.current > node.total {
            node.current = node.total;
        }
        Ok(())
    }

    /// Remove a node and its entire subtree. Returns the number of removed
    /// nodes. All removed ids can be reused right away.
    pub fn remove(&mut self, id: BarId) -> Result<usize, Anomaly> {
        let Some(node) = self.nodes.get(&id) else {
            return Err(Anomaly::UnknownId(id));
        };
        // detach from the parent or the root list first,
        // the rest of the subtree is only reachable through the arena
        match node.parent {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(&parent) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        // post-order: descendants are erased before their ancestors
        let mut removed = 0;
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                if self.nodes.remove(&current).is_some() {
                    removed += 1;
                }
                continue;
            }
            stack.push((current, true));
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().map(|c| (*c, false)));
            }
        }
        Ok(removed)
    }

    /// Number of live nodes
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline(always)]
    pub fn contains(&self, id: BarId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[inline(always)]
    pub fn get(&self, id: BarId) -> Option<&ProgressNode> {
        self.nodes.get(&id)
    }

    /// Ids of the root nodes, in creation order
    #[inline(always)]
    pub fn roots(&self) -> &[BarId] {
        &self.roots
    }

    /// Ids of the children of `id`. Empty if `id` is not live
    pub fn children(&self, id: BarId) -> &[BarId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Read-only view of the forest for rendering
    #[inline(always)]
    pub fn forest(&self) -> Forest<'_> {
        Forest { tree: self }
    }
}

/// Read-only view of a [`BarTree`]
#[derive(Debug, Clone, Copy)]
pub struct Forest<'a> {
    tree: &'a BarTree,
}

impl<'a> Forest<'a> {
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.tree.roots.is_empty()
    }
    #[inline(always)]
    pub fn roots(&self) -> &'a [BarId] {
        &self.tree.roots
    }
    #[inline(always)]
    pub fn get(&self, id: BarId) -> Option<&'a ProgressNode> {
        self.tree.nodes.get(&id)
    }
    /// Depth-first pre-order walk over the forest.
    ///
    /// The walk is lazy and can be restarted by calling this again.
    pub fn walk(&self) -> Walk<'a> {
        let mut stack = Vec::with_capacity(self.tree.roots.len());
        push_siblings(&mut stack, &self.tree.roots, 0);
        Walk {
            tree: self.tree,
            stack,
        }
    }
}

/// One step of a [`Walk`]
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    /// 0 for roots
    pub depth: usize,
    pub node: &'a ProgressNode,
    /// If this is the last node among its siblings
    pub is_last: bool,
}

/// Iterator returned by [`Forest::walk`]
pub struct Walk<'a> {
    tree: &'a BarTree,
    stack: Vec<(BarId, usize, bool)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, depth, is_last) = self.stack.pop()?;
            // the arena is the source of truth, children always exist in it
            let Some(node) = self.tree.nodes.get(&id) else {
                continue;
            };
            push_siblings(&mut self.stack, &node.children, depth + 1);
            return Some(Visit {
                depth,
                node,
                is_last,
            });
        }
    }
}

fn push_siblings(stack: &mut Vec<(BarId, usize, bool)>, siblings: &[BarId], depth: usize) {
    let last = siblings.len().saturating_sub(1);
    stack.extend(
        siblings
            .iter()
            .enumerate()
            .rev()
            .map(|(i, id)| (*id, depth, i == last)),
    );
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use super::*;

    fn tree_with(events: &[Event]) -> BarTree {
        let mut tree = BarTree::new();
        for e in events {
            let _ = tree.apply(e);
        }
        tree
    }

    fn reachable(tree: &BarTree) -> Vec<BarId> {
        tree.forest().walk().map(|v| v.node.id()).collect()
    }

    #[test]
    fn test_advance_clamps_to_total() {
        let mut tree = tree_with(&[Event::create(1, 10, "x")]);
        tree.advance(1, 10).unwrap();
        assert_eq!(tree.get(1).unwrap().current(), 10);
        tree.advance(1, 5).unwrap();
        assert_eq!(tree.get(1).unwrap().current(), 10);
    }

    #[test]
    fn test_advance_negative_has_no_lower_clamp() {
        let mut tree = tree_with(&[Event::create(1, 10, "x")]);
        tree.advance(1, 3).unwrap();
        tree.advance(1, -5).unwrap();
        assert_eq!(tree.get(1).unwrap().current(), -2);
        assert_eq!(tree.get(1).unwrap().ratio(), 0f64);
    }

    #[test]
    fn test_advance_unbounded_is_not_clamped() {
        let mut tree = tree_with(&[Event::create(1, 0, "x")]);
        tree.advance(1, 42).unwrap();
        assert_eq!(tree.get(1).unwrap().current(), 42);
        assert_eq!(tree.get(1).unwrap().ratio(), 0f64);
    }

    #[test]
    fn test_advance_unknown() {
        let mut tree = BarTree::new();
        assert_eq!(tree.advance(5, 1), Err(Anomaly::UnknownId(5)));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_duplicate_create_keeps_existing() {
        let mut tree = tree_with(&[Event::create(1, 10, "first")]);
        tree.advance(1, 4).unwrap();
        let result = tree.apply(&Event::create(1, 99, "second"));
        assert_eq!(result, Err(Anomaly::DuplicateId(1)));
        let node = tree.get(1).unwrap();
        assert_eq!(node.label(), "first");
        assert_eq!(node.total(), 10);
        assert_eq!(node.current(), 4);
        assert_eq!(tree.roots(), &[1]);
    }

    #[test]
    fn test_child_is_not_a_root() {
        let tree = tree_with(&[
            Event::create(1, 5, "parent"),
            Event::create_child(2, 3, "child", 1),
        ]);
        assert_eq!(tree.roots(), &[1]);
        assert_eq!(tree.children(1), &[2]);
        assert_eq!(tree.get(2).unwrap().parent(), Some(1));
    }

    #[test]
    fn test_remove_parent_removes_child() {
        let mut tree = tree_with(&[
            Event::create(1, 5, "parent"),
            Event::create_child(2, 3, "child", 1),
        ]);
        assert_eq!(tree.remove(1), Ok(2));
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
        assert!(reachable(&tree).is_empty());
    }

    #[test]
    fn test_remove_deep_subtree() {
        let mut tree = tree_with(&[
            Event::create(1, 5, "a"),
            Event::create_child(2, 5, "b", 1),
            Event::create_child(3, 5, "c", 2),
            Event::create_child(4, 5, "d", 3),
            Event::create_child(5, 5, "e", 2),
            Event::create(6, 5, "f"),
        ]);
        assert_eq!(tree.remove(2), Ok(4));
        assert_eq!(reachable(&tree), vec![1, 6]);
        assert!(tree.children(1).is_empty());
        for id in [2, 3, 4, 5] {
            assert!(!tree.contains(id));
        }
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut tree = tree_with(&[Event::create(1, 5, "a")]);
        assert_eq!(tree.remove(1), Ok(1));
        assert_eq!(tree.remove(1), Err(Anomaly::UnknownId(1)));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_removed_id_can_be_reused() {
        let mut tree = tree_with(&[
            Event::create(1, 5, "a"),
            Event::create_child(2, 5, "b", 1),
        ]);
        tree.remove(1).unwrap();
        assert_eq!(
            tree.insert(2, 7, "again".to_string(), None),
            Ok(Placement::Root)
        );
        assert_eq!(tree.roots(), &[2]);
        assert_eq!(tree.get(2).unwrap().total(), 7);
    }

    #[test]
    fn test_dangling_parent_becomes_root() {
        let mut tree = BarTree::new();
        let result = tree.apply(&Event::create_child(1, 5, "x", 999));
        assert_eq!(result, Err(Anomaly::DanglingParent { id: 1, parent: 999 }));
        assert_eq!(tree.roots(), &[1]);
        assert_eq!(tree.get(1).unwrap().parent(), None);
    }

    #[test]
    fn test_unrecognized_is_ignored() {
        let mut tree = tree_with(&[Event::create(1, 5, "a")]);
        assert_eq!(
            tree.apply(&Event::Unrecognized { kind: 9 }),
            Err(Anomaly::UnrecognizedKind(9))
        );
        assert_eq!(reachable(&tree), vec![1]);
    }

    #[test]
    fn test_walk_is_pre_order_with_last_flags() {
        let tree = tree_with(&[
            Event::create(1, 5, "a"),
            Event::create_child(2, 5, "b", 1),
            Event::create_child(3, 5, "c", 2),
            Event::create_child(4, 5, "d", 1),
            Event::create(5, 5, "e"),
        ]);
        let visits: Vec<_> = tree
            .forest()
            .walk()
            .map(|v| (v.node.id(), v.depth, v.is_last))
            .collect();
        assert_eq!(
            visits,
            vec![
                (1, 0, false),
                (2, 1, false),
                (3, 2, true),
                (4, 1, true),
                (5, 0, true),
            ]
        );
        // restartable
        assert_eq!(tree.forest().walk().count(), 5);
    }

    /// xorshift, so the sequence is reproducible without extra dependencies
    struct Rng(u64);
    impl Rng {
        fn next(&mut self, bound: u64) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0 % bound
        }
    }

    #[test]
    fn test_random_sequences_keep_forest_consistent() {
        for seed in 1..=20u64 {
            let mut rng = Rng(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let mut tree = BarTree::new();
            // model: live id -> parent at creation time (None if root)
            let mut live: HashMap<BarId, Option<BarId>> = HashMap::new();
            for _ in 0..400 {
                let id = rng.next(24) as BarId;
                match rng.next(3) {
                    0 => {
                        let parent = match rng.next(3) {
                            0 => None,
                            _ => Some(rng.next(24) as BarId),
                        };
                        let total = rng.next(20) as i64 - 2;
                        let was_live = live.contains_key(&id);
                        let result = tree.apply(&Event::Create {
                            id,
                            total,
                            label: format!("bar {id}"),
                            parent,
                        });
                        if was_live {
                            assert_eq!(result, Err(Anomaly::DuplicateId(id)));
                        } else {
                            let parent = parent.filter(|p| live.contains_key(p));
                            live.insert(id, parent);
                        }
                    }
                    1 => {
                        let delta = rng.next(12) as i64 - 3;
                        let _ = tree.advance(id, delta);
                    }
                    _ => {
                        if live.contains_key(&id) {
                            // collect the model's subtree
                            let mut doomed = BTreeSet::from([id]);
                            loop {
                                let more: Vec<_> = live
                                    .iter()
                                    .filter(|(_, p)| p.is_some_and(|p| doomed.contains(&p)))
                                    .map(|(c, _)| *c)
                                    .filter(|c| !doomed.contains(c))
                                    .collect();
                                if more.is_empty() {
                                    break;
                                }
                                doomed.extend(more);
                            }
                            assert_eq!(tree.remove(id), Ok(doomed.len()));
                            for d in &doomed {
                                live.remove(d);
                            }
                        } else {
                            assert_eq!(tree.remove(id), Err(Anomaly::UnknownId(id)));
                        }
                    }
                }

                // every live node is reachable exactly once
                let walked = reachable(&tree);
                let walked_set: BTreeSet<_> = walked.iter().copied().collect();
                assert_eq!(walked.len(), walked_set.len());
                let live_set: BTreeSet<_> = live.keys().copied().collect();
                assert_eq!(walked_set, live_set);
                assert_eq!(tree.len(), live.len());
                for visit in tree.forest().walk() {
                    let node = visit.node;
                    if node.total() > 0 {
                        assert!(node.current() <= node.total());
                    }
                    if let Some(p) = node.parent() {
                        assert!(tree.children(p).contains(&node.id()));
                        assert!(!tree.roots().contains(&node.id()));
                    }
                }
            }
        }
    }
}
