//! Ordered path element and sequence diffing.
//!
//! # Responsibility
//! - Hold the ordered node sequence of one way.
//! - Describe structural edits as fine-grained events.
//! - Compute the first edit that reconciles a cached copy with the live
//!   sequence for observers that cannot use fine-grained events.
//!
//! # Invariants
//! - The same node may appear at several positions.
//! - Every node in the sequence is subscribed-to by the way (maintained by
//!   the graph, not by this type).

use crate::model::element::{Element, ElementCore};
use crate::model::ids::{ElementId, NodeId, WayId};
use crate::model::meta::{EventCode, Meta};

#[derive(Debug, Clone)]
pub struct Way {
    pub(crate) id: WayId,
    pub(crate) core: ElementCore,
    pub(crate) nodes: Vec<NodeId>,
}

/// One structural edit on a cached node sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WayDiff {
    /// Insert `node` so that it ends up at `pos`.
    Insert { pos: usize, node: NodeId },
    /// Remove the entry at `pos`.
    Remove { pos: usize },
}

impl WayDiff {
    /// Applies this edit to a cached sequence. Out-of-range edits are ignored.
    pub fn apply(self, cached: &mut Vec<NodeId>) {
        match self {
            Self::Insert { pos, node } if pos <= cached.len() => cached.insert(pos, node),
            Self::Remove { pos } if pos < cached.len() => {
                cached.remove(pos);
            }
            _ => {}
        }
    }
}

impl Way {
    pub(crate) fn new(id: WayId, core: ElementCore) -> Self {
        Self {
            id,
            core,
            nodes: Vec::new(),
        }
    }

    pub fn id(&self) -> WayId {
        self.id
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Loop: at least three entries and the last repeats the first.
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 2 && self.nodes.first() == self.nodes.last()
    }

    /// Consecutive node pairs of the path.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Returns the first structural edit needed to turn `cached` into the
    /// live sequence, or `None` when both already agree.
    ///
    /// At the first mismatching index the cached entry is kept (and the live
    /// entry inserted before it) only when it still occurs later in the live
    /// sequence; otherwise it is removed. Applying results repeatedly always
    /// converges.
    pub fn diff(&self, cached: &[NodeId]) -> Option<WayDiff> {
        let live = self.nodes.as_slice();
        let pos = live
            .iter()
            .zip(cached)
            .position(|(live, cached)| live != cached)
            .unwrap_or_else(|| live.len().min(cached.len()));

        match (live.get(pos), cached.get(pos)) {
            (None, None) => None,
            (Some(&node), None) => Some(WayDiff::Insert { pos, node }),
            (None, Some(_)) => Some(WayDiff::Remove { pos }),
            (Some(&node), Some(stale)) => {
                if live[pos + 1..].contains(stale) {
                    Some(WayDiff::Insert { pos, node })
                } else {
                    Some(WayDiff::Remove { pos })
                }
            }
        }
    }

    /// Index of the left entry of the first adjacent `(a, b)` pair, in
    /// either order.
    pub(crate) fn adjacent_pair(&self, a: NodeId, b: NodeId) -> Option<usize> {
        self.nodes
            .windows(2)
            .position(|pair| (pair[0] == a && pair[1] == b) || (pair[0] == b && pair[1] == a))
    }

    /// Removes every occurrence of `node` and returns the event describing
    /// the removal, or `None` when the node is absent.
    pub(crate) fn take_node(&mut self, node: NodeId) -> Option<Meta> {
        let positions: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, current)| **current == node)
            .map(|(index, _)| index)
            .collect();

        let meta = match positions.as_slice() {
            [] => return None,
            [pos] => {
                let pos = *pos;
                let prev = pos
                    .checked_sub(1)
                    .map(|index| ElementId::Node(self.nodes[index]));
                let next = self.nodes.get(pos + 1).copied().map(ElementId::Node);
                let code = if pos == 0 {
                    EventCode::NodeDeletedFront
                } else if pos + 1 == self.nodes.len() {
                    EventCode::NodeDeletedBack
                } else {
                    EventCode::NodeDeletedAfter
                };
                Meta::new(code)
                    .with_subject(node)
                    .with_neighbours(prev, next)
                    .at(pos)
            }
            _ => Meta::new(EventCode::NodeDeleted).with_subject(node),
        };
        self.nodes.retain(|current| *current != node);
        Some(meta)
    }
}

impl Element for Way {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn element_id(&self) -> ElementId {
        ElementId::Way(self.id)
    }
}
