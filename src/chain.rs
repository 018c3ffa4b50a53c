// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Chain history as an append-only arena indexed by height.
//!
//! Nodes are never mutated after [`Chain::append`]. The parent of a node is
//! implicitly the node one height below it, so ancestor lookup is an index
//! computation rather than a walk over back references. History may be
//! pruned from the bottom; lookups below the retained range report
//! not-found exactly as if the walk had run past the start of history.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// Errors raised by the chain write path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("non-contiguous append: expected height {expected}, got {got}")]
    NonContiguous { expected: u32, got: u32 },

    #[error("height overflow past {0}")]
    HeightOverflow(u32),

    #[error("cannot prune below {requested}: tip is at {tip:?}")]
    PruneBeyondTip { requested: u32, tip: Option<u32> },
}

/// Stake-relevant facts of one simulated block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainNode {
    pub height: u32,
    /// Live tickets eligible to vote at this height.
    pub pool_size: u32,
    /// Price required to buy a ticket valid at this height. Zero before
    /// the stake system activates.
    pub ticket_price: Amount,
    /// Total value locked in live tickets.
    pub staked_coins: Amount,
}

/// Read-only chain access required by the retarget engine.
pub trait ChainView {
    /// The most recent block, `None` before genesis.
    fn tip(&self) -> Option<&ChainNode>;

    /// The node at exactly `height`, or `None` when the height is negative,
    /// above the tip, or before the start of retained history.
    fn ancestor_at_height(&self, height: i64) -> Option<&ChainNode>;
}

/// Contiguous arena of chain nodes.
///
/// Serialized as the plain node list; deserialization replays every node
/// through [`Chain::append`] and fails with [`ChainError`] on a gap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<ChainNode>", into = "Vec<ChainNode>")]
pub struct Chain {
    base_height: u32,
    nodes: Vec<ChainNode>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new tip. The first node may start at any height; every
    /// following node must be exactly one above the current tip.
    pub fn append(&mut self, node: ChainNode) -> Result<(), ChainError> {
        if let Some(tip) = self.nodes.last() {
            let expected = tip
                .height
                .checked_add(1)
                .ok_or(ChainError::HeightOverflow(tip.height))?;
            if node.height != expected {
                return Err(ChainError::NonContiguous { expected, got: node.height });
            }
        } else {
            self.base_height = node.height;
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Drop all history strictly below `height`. Returns the number of nodes
    /// removed. The tip itself is never pruned.
    pub fn prune_below(&mut self, height: u32) -> Result<usize, ChainError> {
        let tip = self.nodes.last().map(|n| n.height);
        match tip {
            Some(tip_height) if height <= tip_height => {}
            _ => return Err(ChainError::PruneBeyondTip { requested: height, tip }),
        }
        if height <= self.base_height {
            return Ok(0);
        }
        let removed = (height - self.base_height) as usize;
        self.nodes.drain(..removed);
        self.base_height = height;
        Ok(removed)
    }

    /// Lowest retained height, `None` when empty.
    pub fn base_height(&self) -> Option<u32> {
        self.nodes.first().map(|n| n.height)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainNode> {
        self.nodes.iter()
    }
}

impl TryFrom<Vec<ChainNode>> for Chain {
    type Error = ChainError;

    fn try_from(nodes: Vec<ChainNode>) -> Result<Self, Self::Error> {
        let mut chain = Chain::new();
        for node in nodes {
            chain.append(node)?;
        }
        Ok(chain)
    }
}

impl From<Chain> for Vec<ChainNode> {
    fn from(chain: Chain) -> Self {
        chain.nodes
    }
}

impl ChainView for Chain {
    fn tip(&self) -> Option<&ChainNode> {
        self.nodes.last()
    }

    fn ancestor_at_height(&self, height: i64) -> Option<&ChainNode> {
        let offset = height.checked_sub(i64::from(self.base_height))?;
        if offset < 0 {
            return None;
        }
        self.nodes.get(usize::try_from(offset).ok()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(height: u32) -> ChainNode {
        ChainNode {
            height,
            pool_size: height * 5,
            ticket_price: Amount(1_000 + i64::from(height)),
            staked_coins: Amount::ZERO,
        }
    }

    fn chain_to(tip: u32) -> Chain {
        let mut chain = Chain::new();
        for h in 0..=tip {
            chain.append(node(h)).expect("test: contiguous append");
        }
        chain
    }

    #[test]
    fn empty_chain_has_no_tip() {
        let chain = Chain::new();
        assert!(chain.tip().is_none());
        assert!(chain.ancestor_at_height(0).is_none());
    }

    #[test]
    fn ancestor_lookup_exact_height() {
        let chain = chain_to(300);
        assert_eq!(chain.tip().map(|n| n.height), Some(300));
        assert_eq!(chain.ancestor_at_height(156).map(|n| n.height), Some(156));
        assert_eq!(chain.ancestor_at_height(0).map(|n| n.height), Some(0));
        assert_eq!(chain.ancestor_at_height(300).map(|n| n.height), Some(300));
    }

    #[test]
    fn ancestor_out_of_range_not_found() {
        let chain = chain_to(10);
        assert!(chain.ancestor_at_height(-1).is_none());
        assert!(chain.ancestor_at_height(11).is_none());
        assert!(chain.ancestor_at_height(i64::MIN).is_none());
    }

    #[test]
    fn ancestor_lookup_is_repeatable() {
        let chain = chain_to(50);
        let a = chain.ancestor_at_height(20).copied();
        let b = chain.ancestor_at_height(20).copied();
        assert_eq!(a, b);
    }

    #[test]
    fn append_rejects_gaps() {
        let mut chain = chain_to(3);
        assert_eq!(
            chain.append(node(5)),
            Err(ChainError::NonContiguous { expected: 4, got: 5 })
        );
        assert_eq!(
            chain.append(node(3)),
            Err(ChainError::NonContiguous { expected: 4, got: 3 })
        );
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn chain_may_start_above_genesis() {
        let mut chain = Chain::new();
        chain.append(node(100)).expect("test: first append");
        chain.append(node(101)).expect("test: second append");
        assert_eq!(chain.base_height(), Some(100));
        assert!(chain.ancestor_at_height(99).is_none());
        assert_eq!(chain.ancestor_at_height(101).map(|n| n.height), Some(101));
    }

    #[test]
    fn pruning_hides_old_history() {
        let mut chain = chain_to(20);
        assert_eq!(chain.prune_below(10), Ok(10));
        assert_eq!(chain.base_height(), Some(10));
        assert!(chain.ancestor_at_height(9).is_none());
        assert_eq!(chain.ancestor_at_height(10).map(|n| n.height), Some(10));
        assert_eq!(chain.prune_below(5), Ok(0));
        assert_eq!(
            chain.prune_below(21),
            Err(ChainError::PruneBeyondTip { requested: 21, tip: Some(20) })
        );
    }

    #[test]
    fn deserialize_replays_append() {
        let json = serde_json::to_string(&chain_to(5)).expect("test: serialize");
        let chain: Chain = serde_json::from_str(&json).expect("test: deserialize");
        assert_eq!(chain.base_height(), Some(0));
        assert_eq!(chain.ancestor_at_height(5).map(|n| n.height), Some(5));

        let mut pruned = chain_to(20);
        pruned.prune_below(7).expect("test: prune");
        let json = serde_json::to_string(&pruned).expect("test: serialize");
        let restored: Chain = serde_json::from_str(&json).expect("test: deserialize");
        assert!(restored.ancestor_at_height(6).is_none());
        assert_eq!(restored.ancestor_at_height(7).map(|n| n.height), Some(7));
    }

    #[test]
    fn deserialize_rejects_height_gap() {
        let nodes = vec![node(0), node(7)];
        let json = serde_json::to_string(&nodes).expect("test: serialize");
        let err = serde_json::from_str::<Chain>(&json).expect_err("test: gap");
        assert!(err.to_string().contains("expected height 1, got 7"), "{}", err);
        assert_eq!(
            Chain::try_from(nodes).map(|c| c.len()),
            Err(ChainError::NonContiguous { expected: 1, got: 7 })
        );
    }
}
