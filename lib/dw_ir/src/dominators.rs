//! Dominance relation over the blocks of a method.

use crate::code::{BlockId, Code};
use petgraph::algo::dominators::{simple_fast, Dominators};
use petgraph::graph::NodeIndex;

/// Dominator tree computed once for a given state of a [`Code`].
///
/// The tree does not borrow the code it was computed from: it has to be
/// dropped (or the [`LazyDominatorTree`] invalidated) whenever the control
/// flow graph is edited.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    dominators: Option<Dominators<NodeIndex>>,
}

impl DominatorTree {
    #[must_use]
    pub fn new(code: &Code) -> Self {
        if code.blocks_count() == 0 {
            return Self { dominators: None };
        }
        let graph = code.flow_graph();
        let dominators = simple_fast(&graph, NodeIndex::new(code.entry().index()));
        Self {
            dominators: Some(dominators),
        }
    }

    /// Returns `true` if every path from the entry block to `block` goes
    /// through `dominator`. A block dominates itself.
    #[must_use]
    pub fn dominated_by(&self, block: BlockId, dominator: BlockId) -> bool {
        self.dominators
            .as_ref()
            .and_then(|dominators| dominators.dominators(NodeIndex::new(block.index())))
            .map_or(false, |mut iter| {
                iter.any(|node| node.index() == dominator.index())
            })
    }

    #[must_use]
    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.dominators
            .as_ref()?
            .immediate_dominator(NodeIndex::new(block.index()))
            .map(|node| BlockId::from_index(node.index()))
    }

    #[must_use]
    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.dominators
            .as_ref()
            .map_or(false, |dominators| {
                dominators
                    .dominators(NodeIndex::new(block.index()))
                    .is_some()
            })
    }
}

/// A dominator tree computed on first use and dropped on invalidation.
#[derive(Debug, Default)]
pub struct LazyDominatorTree {
    tree: Option<DominatorTree>,
}

impl LazyDominatorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, code: &Code) -> &DominatorTree {
        self.tree.get_or_insert_with(|| DominatorTree::new(code))
    }

    /// Must be called after any control flow edit of the code.
    pub fn invalidate(&mut self) {
        self.tree = None;
    }

    #[must_use]
    pub const fn is_computed(&self) -> bool {
        self.tree.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_dominance() {
        // B0 -> B1 -> B2 -> B1, B1 -> B3, B4 unreachable
        let mut code = Code::new();
        let b: Vec<BlockId> = (0..5).map(|_| code.add_block()).collect();
        code.add_edge(b[0], b[1]);
        code.add_edge(b[1], b[2]);
        code.add_edge(b[2], b[1]);
        code.add_edge(b[1], b[3]);

        let tree = DominatorTree::new(&code);
        assert!(tree.dominated_by(b[3], b[1]));
        assert!(tree.dominated_by(b[2], b[0]));
        assert!(tree.dominated_by(b[2], b[2]));
        assert!(!tree.dominated_by(b[1], b[2]));
        assert_eq!(tree.immediate_dominator(b[2]), Some(b[1]));
        assert!(!tree.is_reachable(b[4]));
        assert!(!tree.dominated_by(b[4], b[0]));
    }

    #[test]
    fn lazy_tree_is_recomputed() {
        let mut code = Code::new();
        let b0 = code.add_block();
        let b1 = code.add_block();
        let mut lazy = LazyDominatorTree::new();
        assert!(!lazy.get(&code).is_reachable(b1));
        code.add_edge(b0, b1);
        assert!(!lazy.get(&code).is_reachable(b1));
        lazy.invalidate();
        assert!(!lazy.is_computed());
        assert!(lazy.get(&code).dominated_by(b1, b0));
    }
}
