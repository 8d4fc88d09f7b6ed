//! Incremental copy of one way's node sequence.
//!
//! # Responsibility
//! - Keep a cached node list (and edge list) in step with a live way.
//! - Patch the cache in constant time from fine-grained edit codes.
//! - Fall back to repeated sequence diffs when a patch cannot be applied.
//!
//! # Invariants
//! - After every notification the cache equals the live sequence.
//! - A deleted way leaves an empty cache behind.

use crate::graph::dispatch::Subscriber;
use crate::graph::Graph;
use crate::model::ids::{ElementId, NodeId, ObserverId, RelationId, WayId};
use crate::model::meta::{EventCode, Meta};
use log::trace;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub struct WayMirror {
    way: WayId,
    nodes: RefCell<Vec<NodeId>>,
    patches: Cell<usize>,
    resyncs: Cell<usize>,
    deleted: Cell<bool>,
}

impl WayMirror {
    /// Snapshots `way` and subscribes the mirror to it.
    pub fn attach(graph: &mut Graph, way: WayId) -> (Rc<Self>, ObserverId) {
        let nodes = graph
            .way(way)
            .map(|current| current.nodes().to_vec())
            .unwrap_or_default();
        let mirror = Rc::new(Self {
            way,
            nodes: RefCell::new(nodes),
            patches: Cell::new(0),
            resyncs: Cell::new(0),
            deleted: Cell::new(!graph.is_alive(way)),
        });
        let observer = graph.add_observer(mirror.clone());
        graph.subscribe(observer, way);
        (mirror, observer)
    }

    pub fn way(&self) -> WayId {
        self.way
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.nodes.borrow().clone()
    }

    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.nodes
            .borrow()
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }

    /// Edits applied directly from event positions.
    pub fn patches(&self) -> usize {
        self.patches.get()
    }

    /// Edits that needed a full reconciliation pass.
    pub fn resyncs(&self) -> usize {
        self.resyncs.get()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.get()
    }

    fn patch(&self, meta: &Meta) -> bool {
        let (Some(pos), Some(ElementId::Node(subject))) = (meta.pos, meta.subject) else {
            return false;
        };
        let mut nodes = self.nodes.borrow_mut();
        match meta.code {
            EventCode::NodeAddedFront | EventCode::NodeAddedBack | EventCode::NodeAddedAfter => {
                // Neighbours are read from the cache before the insert, so
                // `next` must currently sit at `pos`.
                let lined_up = pos <= nodes.len()
                    && neighbour_matches(&nodes, meta.prev, pos.checked_sub(1))
                    && neighbour_matches(&nodes, meta.next, Some(pos));
                if lined_up {
                    nodes.insert(pos, subject);
                }
                lined_up
            }
            EventCode::NodeDeletedFront
            | EventCode::NodeDeletedBack
            | EventCode::NodeDeletedAfter => {
                let lined_up = nodes.get(pos) == Some(&subject)
                    && neighbour_matches(&nodes, meta.prev, pos.checked_sub(1))
                    && neighbour_matches(&nodes, meta.next, Some(pos + 1));
                if lined_up {
                    nodes.remove(pos);
                }
                lined_up
            }
            _ => false,
        }
    }

    fn resync(&self, graph: &Graph) {
        let mut nodes = self.nodes.borrow_mut();
        match graph.way(self.way) {
            Some(way) => {
                while let Some(step) = way.diff(&nodes) {
                    step.apply(&mut nodes);
                }
            }
            None => nodes.clear(),
        }
        self.resyncs.set(self.resyncs.get() + 1);
    }
}

/// `expected` must match the cache entry at `index`; `None` must mean the
/// index falls outside the cache.
fn neighbour_matches(nodes: &[NodeId], expected: Option<ElementId>, index: Option<usize>) -> bool {
    let actual = index.and_then(|index| nodes.get(index)).copied();
    expected.and_then(ElementId::as_node) == actual
}

impl Subscriber for WayMirror {
    fn on_update_node(&self, _: &mut Graph, _: NodeId, _: &Meta) {}

    fn on_update_way(&self, graph: &mut Graph, way: WayId, meta: &Meta) {
        if way != self.way || meta.code == EventCode::NodeUpdated {
            return;
        }
        if self.patch(meta) {
            self.patches.set(self.patches.get() + 1);
        } else {
            trace!("event=mirror_resync module=mirror status=ok way={way} code={:?}", meta.code);
            self.resync(graph);
        }
    }

    fn on_update_relation(&self, _: &mut Graph, _: RelationId, _: &Meta) {}

    fn on_delete_node(&self, _: &mut Graph, _: NodeId, _: &Meta) {}

    fn on_delete_way(&self, _: &mut Graph, way: WayId, _: &Meta) {
        if way == self.way {
            self.nodes.borrow_mut().clear();
            self.deleted.set(true);
        }
    }

    fn on_delete_relation(&self, _: &mut Graph, _: RelationId, _: &Meta) {}
}
