//! Way structural edits and reactions to member node events.
//!
//! # Invariants
//! - A way is subscribed to a node iff the node occurs in its sequence.
//! - Structural edits announce a fine-grained code whenever the edit
//!   touches a single position.
//! - Node removal is announced before the way lets go of the node.

use super::dispatch::Emission;
use super::Graph;
use crate::model::ids::{ElementId, NodeId, SubscriberId, WayId};
use crate::model::meta::{EventCode, Meta};
use log::warn;

impl Graph {
    /// Appends a node. Announces `NodeAddedBack`.
    pub fn push_node(&mut self, way: WayId, node: NodeId) -> bool {
        let Some(pos) = self.way(way).map(|current| current.len()) else {
            return false;
        };
        self.insert_node_at(way, node, pos, EventCode::NodeAddedBack)
    }

    /// Prepends a node. Announces `NodeAddedFront`.
    pub fn push_front_node(&mut self, way: WayId, node: NodeId) -> bool {
        self.insert_node_at(way, node, 0, EventCode::NodeAddedFront)
    }

    /// Inserts `node` between two adjacent entries, given in either order.
    ///
    /// The first adjacent occurrence of the pair wins. An unknown or
    /// non-adjacent pair marks the way invalid and leaves it unchanged.
    pub fn insert_node_between(
        &mut self,
        way: WayId,
        node: NodeId,
        left: NodeId,
        right: NodeId,
    ) -> bool {
        if !self.is_alive(way) {
            return false;
        }
        let Some(index) = self
            .way(way)
            .and_then(|current| current.adjacent_pair(left, right))
        else {
            warn!(
                "event=way_insert module=graph status=rejected way={way} node={node} reason=pair_not_adjacent left={left} right={right}"
            );
            self.invalidate(way);
            return false;
        };
        self.insert_node_at(way, node, index + 1, EventCode::NodeAddedAfter)
    }

    /// Removes every occurrence of `node`. Absent nodes are a silent no-op.
    pub fn remove_node(&mut self, way: WayId, node: NodeId) -> bool {
        if !self.is_alive(way) {
            return false;
        }
        let Some(meta) = self.ways.get_mut(&way).and_then(|current| current.take_node(node))
        else {
            return false;
        };
        self.emit_update(way, meta);
        self.detach(SubscriberId::Way(way), ElementId::Node(node));
        true
    }

    fn insert_node_at(&mut self, way: WayId, node: NodeId, pos: usize, code: EventCode) -> bool {
        if !self.is_alive(way) {
            return false;
        }
        if !self.is_alive(node) {
            warn!(
                "event=way_insert module=graph status=rejected way={way} node={node} reason=missing_node"
            );
            self.invalidate(way);
            return false;
        }
        let node_valid = self.is_valid(node);
        let Some(target) = self.ways.get_mut(&way) else {
            return false;
        };

        target.nodes.insert(pos, node);
        let prev = pos
            .checked_sub(1)
            .and_then(|index| target.nodes.get(index))
            .copied()
            .map(ElementId::Node);
        let next = target.nodes.get(pos + 1).copied().map(ElementId::Node);
        if !node_valid {
            target.core.set_valid(false);
        }

        self.attach(SubscriberId::Way(way), ElementId::Node(node));
        let meta = Meta::new(code)
            .with_subject(node)
            .with_neighbours(prev, next)
            .at(pos);
        self.emit_update(way, meta);
        true
    }

    pub(super) fn handle_for_way(
        &mut self,
        way: WayId,
        source: ElementId,
        emission: Emission,
        _meta: &Meta,
    ) {
        let ElementId::Node(node) = source else {
            return;
        };
        if !self.is_alive(way) {
            return;
        }

        match emission {
            Emission::Update => {
                if !self.is_valid(node) {
                    self.invalidate(way);
                }
                self.emit_update(way, Meta::new(EventCode::NodeUpdated).with_subject(node));
            }
            Emission::Delete => {
                let removal = self
                    .ways
                    .get_mut(&way)
                    .and_then(|current| current.take_node(node));
                if let Some(meta) = removal {
                    self.emit_update(way, meta);
                }
            }
        }
    }
}
