// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Synthetic node allocation.
use oxrdf::BlankNode;
use rustc_hash::FxHashSet;

use crate::schema::Repeat;

/// Per-call source of fresh blank nodes.
///
/// Each node is a random oxrdf blank, remembered by identity. Blanks the
/// caller already holds can be reserved so that a fresh node never equals
/// one of them.
#[derive(Debug, Clone, Default)]
pub struct BlankAllocator {
    minted: FxHashSet<BlankNode>,
    reserved: FxHashSet<BlankNode>,
}

impl BlankAllocator {
    /// Allocator with nothing minted or reserved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps `node` out of every later [`BlankAllocator::fresh`] result.
    pub fn reserve(&mut self, node: &BlankNode) {
        self.reserved.insert(node.clone());
    }

    /// Mints a new blank node.
    pub fn fresh(&mut self) -> BlankNode {
        loop {
            let node = BlankNode::default();
            if !self.reserved.contains(&node) && self.minted.insert(node.clone()) {
                return node;
            }
        }
    }

    /// Number of nodes minted so far.
    pub fn minted_count(&self) -> usize {
        self.minted.len()
    }

    /// True when `node` was minted by this allocator.
    pub fn minted(&self, node: &BlankNode) -> bool {
        self.minted.contains(node)
    }
}

/// Cardinality-aware identity source for one edge-producing position.
///
/// Up to `max` consecutive calls share an identity; the next call starts a new
/// one. An unbounded position keeps its first identity forever.
#[derive(Debug, Clone)]
pub struct NodeGenerator {
    bound: Repeat,
    current: Option<BlankNode>,
    uses: u32,
}

impl NodeGenerator {
    /// Generator for a position with the given repetition bound.
    pub fn new(bound: Repeat) -> Self {
        Self {
            bound,
            current: None,
            uses: 0,
        }
    }

    /// Identity to use for the next edge.
    pub fn next(&mut self, blanks: &mut BlankAllocator) -> BlankNode {
        let reuse = self.bound.limit().is_none_or(|k| self.uses < k);
        match &self.current {
            Some(node) if reuse => {
                self.uses = self.uses.saturating_add(1);
                node.clone()
            }
            _ => {
                let node = blanks.fresh();
                self.current = Some(node.clone());
                self.uses = 1;
                node
            }
        }
    }

    /// Repetition bound this generator groups by.
    pub fn bound(&self) -> Repeat {
        self.bound
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn minted_is_decided_by_identity() {
        let mut blanks = BlankAllocator::new();
        let first = blanks.fresh();
        assert!(blanks.minted(&first));
        assert!(!blanks.minted(&BlankNode::new("b0").unwrap()));
        assert!(!BlankAllocator::new().minted(&first));
    }

    #[test]
    fn reserved_nodes_are_never_minted() {
        let mut blanks = BlankAllocator::new();
        let held = BlankNode::new("b0").unwrap();
        blanks.reserve(&held);
        for _ in 0..64 {
            assert_ne!(blanks.fresh(), held);
        }
        assert!(!blanks.minted(&held));
        assert_eq!(blanks.minted_count(), 64);
    }

    #[test]
    fn groups_rotate_every_k_calls() {
        let mut blanks = BlankAllocator::new();
        let mut g = NodeGenerator::new(Repeat::from_max(Some(2)));
        let ids: Vec<_> = (0..5).map(|_| g.next(&mut blanks)).collect();
        assert_eq!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_eq!(ids[2], ids[3]);
        assert_ne!(ids[3], ids[4]);
        assert_eq!(blanks.minted_count(), 3);
    }

    #[test]
    fn bound_of_one_never_shares() {
        let mut blanks = BlankAllocator::new();
        let mut g = NodeGenerator::new(Repeat::from_max(Some(1)));
        let a = g.next(&mut blanks);
        let b = g.next(&mut blanks);
        assert_ne!(a, b);
    }

    #[test]
    fn unbounded_never_rotates() {
        let mut blanks = BlankAllocator::new();
        let mut g = NodeGenerator::new(Repeat::Unbounded);
        let first = g.next(&mut blanks);
        for _ in 0..100 {
            assert_eq!(g.next(&mut blanks), first);
        }
        assert_eq!(blanks.minted_count(), 1);
    }
}
