//! Top-level element container.
//!
//! # Responsibility
//! - Index registered elements by external id, one table per kind.
//! - Hold the bounding region, parent count and removal policy.
//! - Track nodes waiting for their last structural reference to go away.
//!
//! # Invariants
//! - `keys` and the three kind tables describe the same element set.
//! - One external id maps to at most one element per kind.
//! - A pending orphan is never registered at the same time.
//!
//! Structural operations (register, unregister, clear, destroy) live on
//! [`crate::Graph`] because they subscribe and may destroy elements.

pub mod policy;

use crate::model::ids::{ElementId, NodeId, OsmId, RegistryId, RelationId, WayId};
use policy::RegistryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Geographic bounding region in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bound {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bound {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    id: RegistryId,
    nodes: BTreeMap<OsmId, NodeId>,
    ways: BTreeMap<OsmId, WayId>,
    relations: BTreeMap<OsmId, RelationId>,
    keys: HashMap<ElementId, OsmId>,
    bound: Bound,
    parents: usize,
    policy: RegistryPolicy,
    pending_orphans: BTreeSet<NodeId>,
    /// Ways/relations unfiled by this registry whose destruction is still
    /// releasing their members.
    retiring: BTreeSet<ElementId>,
}

impl Registry {
    pub(crate) fn new(id: RegistryId, policy: RegistryPolicy) -> Self {
        Self {
            id,
            nodes: BTreeMap::new(),
            ways: BTreeMap::new(),
            relations: BTreeMap::new(),
            keys: HashMap::new(),
            bound: Bound::default(),
            parents: 0,
            policy,
            pending_orphans: BTreeSet::new(),
            retiring: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    pub fn get_node(&self, external_id: OsmId) -> Option<NodeId> {
        self.nodes.get(&external_id).copied()
    }

    pub fn get_way(&self, external_id: OsmId) -> Option<WayId> {
        self.ways.get(&external_id).copied()
    }

    pub fn get_relation(&self, external_id: OsmId) -> Option<RelationId> {
        self.relations.get(&external_id).copied()
    }

    /// Presence by identity, independent of the current external id.
    pub fn has(&self, element: impl Into<ElementId>) -> bool {
        self.keys.contains_key(&element.into())
    }

    /// External id the element is filed under.
    pub fn key_of(&self, element: impl Into<ElementId>) -> Option<OsmId> {
        self.keys.get(&element.into()).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Registered nodes in external-id order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.values().copied()
    }

    pub fn ways(&self) -> impl Iterator<Item = WayId> + '_ {
        self.ways.values().copied()
    }

    pub fn relations(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.relations.values().copied()
    }

    /// Every registered element with the key it is filed under.
    pub fn entries(&self) -> impl Iterator<Item = (OsmId, ElementId)> + '_ {
        self.nodes
            .iter()
            .map(|(key, id)| (*key, ElementId::Node(*id)))
            .chain(self.ways.iter().map(|(key, id)| (*key, ElementId::Way(*id))))
            .chain(
                self.relations
                    .iter()
                    .map(|(key, id)| (*key, ElementId::Relation(*id))),
            )
    }

    pub fn bound(&self) -> Bound {
        self.bound
    }

    pub fn set_bound(&mut self, bound: Bound) {
        self.bound = bound;
    }

    /// Records one more enclosing owner.
    pub fn adopt(&mut self) {
        self.parents += 1;
    }

    /// Releases one enclosing owner; never drops below zero.
    pub fn orphan(&mut self) {
        self.parents = self.parents.saturating_sub(1);
    }

    pub fn count_parents(&self) -> usize {
        self.parents
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RegistryPolicy) {
        self.policy = policy;
    }

    pub fn set_remove_physically(&mut self, enabled: bool) {
        self.policy.remove_physically = enabled;
    }

    pub fn set_remove_orphaned_nodes(&mut self, enabled: bool) {
        self.policy.remove_orphaned_nodes = enabled;
    }

    pub fn set_remove_one_node_ways(&mut self, enabled: bool) {
        self.policy.remove_one_node_ways = enabled;
    }

    /// Whether the node left this registry and waits for its last
    /// structural reference to disappear.
    pub fn is_orphan_pending(&self, node: NodeId) -> bool {
        self.pending_orphans.contains(&node)
    }

    pub fn pending_orphans(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.pending_orphans.iter().copied()
    }

    /// Files `element` under `external_id`.
    ///
    /// Returns the element previously filed under the same key, which has
    /// been dropped from the tables. Re-filing a known element is a no-op.
    pub(crate) fn insert(&mut self, element: ElementId, external_id: OsmId) -> Option<ElementId> {
        if self.keys.contains_key(&element) {
            return None;
        }
        if let ElementId::Node(node) = element {
            self.pending_orphans.remove(&node);
        }
        let displaced = match element {
            ElementId::Node(id) => self.nodes.insert(external_id, id).map(ElementId::Node),
            ElementId::Way(id) => self.ways.insert(external_id, id).map(ElementId::Way),
            ElementId::Relation(id) => self
                .relations
                .insert(external_id, id)
                .map(ElementId::Relation),
        };
        if let Some(previous) = displaced {
            self.keys.remove(&previous);
        }
        self.keys.insert(element, external_id);
        displaced
    }

    /// Drops `element` from the tables. Returns `false` when it was absent.
    pub(crate) fn forget(&mut self, element: ElementId) -> bool {
        let Some(external_id) = self.keys.remove(&element) else {
            return false;
        };
        match element {
            ElementId::Node(_) => {
                self.nodes.remove(&external_id);
            }
            ElementId::Way(_) => {
                self.ways.remove(&external_id);
            }
            ElementId::Relation(_) => {
                self.relations.remove(&external_id);
            }
        }
        true
    }

    /// Moves a registered element to a new key.
    ///
    /// Returns the element displaced from the new key, if any.
    pub(crate) fn rekey(&mut self, element: ElementId, external_id: OsmId) -> Option<ElementId> {
        if self.keys.get(&element) == Some(&external_id) || !self.forget(element) {
            return None;
        }
        self.insert(element, external_id)
    }

    pub(crate) fn mark_pending(&mut self, node: NodeId) {
        self.pending_orphans.insert(node);
    }

    pub(crate) fn clear_pending(&mut self, node: NodeId) -> bool {
        self.pending_orphans.remove(&node)
    }

    /// Whether `element` is filed here or is being torn down after leaving.
    pub(crate) fn holds(&self, element: ElementId) -> bool {
        self.keys.contains_key(&element) || self.retiring.contains(&element)
    }

    pub(crate) fn retire(&mut self, element: ElementId) {
        if !matches!(element, ElementId::Node(_)) {
            self.retiring.insert(element);
        }
    }

    pub(crate) fn finish_retiring(&mut self, element: ElementId) {
        self.retiring.remove(&element);
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = (ElementId, OsmId)> + '_ {
        self.keys.iter().map(|(element, key)| (*element, *key))
    }
}
