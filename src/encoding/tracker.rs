//! Offset bookkeeping for shared and cyclic structure.
//!
//! The encoder remembers the offset at which each container node was
//! first written; a repeat sighting becomes a reference token instead of
//! a second copy. The decoder keeps the inverse map so reference tokens
//! can be resolved back to nodes, including tokens that point at a
//! container still being decoded.

use crate::NodeId;
use std::collections::HashMap;

/// Encode-side map from container node to first-sighting offset.
pub(crate) struct RefTracker {
    seen: HashMap<NodeId, u64>,
}

impl RefTracker {
    pub fn new() -> RefTracker {
        RefTracker {
            seen: HashMap::new(),
        }
    }

    /// Records a sighting of `id` at `offset`. Returns `None` on the
    /// first sighting and the original offset on every later one.
    pub fn sight(&mut self, id: NodeId, offset: u64) -> Option<u64> {
        match self.seen.get(&id) {
            Some(&first) => Some(first),
            None => {
                self.seen.insert(id, offset);
                None
            }
        }
    }
}

/// Decode-side map from container offset to the node built for it.
pub(crate) struct OffsetTable {
    nodes: HashMap<u64, NodeId>,
}

impl OffsetTable {
    pub fn new() -> OffsetTable {
        OffsetTable {
            nodes: HashMap::new(),
        }
    }

    pub fn register(&mut self, offset: u64, id: NodeId) {
        self.nodes.insert(offset, id);
    }

    pub fn resolve(&self, offset: u64) -> Option<NodeId> {
        self.nodes.get(&offset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_records() {
        let mut tracker = RefTracker::new();
        assert_eq!(tracker.sight(NodeId::new(3), 17), None);
        assert_eq!(tracker.sight(NodeId::new(3), 99), Some(17));
        assert_eq!(tracker.sight(NodeId::new(4), 20), None);
    }

    #[test]
    fn offsets_resolve() {
        let mut table = OffsetTable::new();
        table.register(0, NodeId::new(1));
        assert_eq!(table.resolve(0), Some(NodeId::new(1)));
        assert_eq!(table.resolve(5), None);
    }
}
