//! Element arena and liveness bookkeeping.
//!
//! # Responsibility
//! - Own every element, registry and external observer of one graph.
//! - Track the life stage of every internal id ever allocated here.
//! - Drive element destruction: delete emission first, slot release last.
//!
//! # Invariants
//! - An element is in the arena iff its life stage is `Alive` or `Dying`.
//! - Life stage entries are never removed, so a stale id always reads
//!   `Dead` rather than missing.
//! - Cross references are ids only; no element owns another.

pub mod dispatch;
pub mod integrity;
mod nodes;
mod registries;
mod relations;
mod ways;

use crate::model::element::ElementCore;
use crate::model::ids::{
    next_inner_id, ElementId, InnerId, NodeId, ObserverId, OsmId, RegistryId, RelationId,
    SubscriberId, WayId,
};
use crate::model::meta::{EventCode, Meta};
use crate::model::node::Node;
use crate::model::relation::Relation;
use crate::model::way::Way;
use crate::registry::Registry;
use dispatch::{EmitFrame, Subscriber};
use indexmap::IndexSet;
use log::{debug, trace};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Lifecycle of one internal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Alive,
    /// Delete notifications are being delivered.
    Dying,
    Dead,
}

/// In-memory element graph.
///
/// All mutation goes through this type. Operations never fail; rejected
/// references mark the acted-upon element invalid instead.
#[derive(Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
    ways: HashMap<WayId, Way>,
    relations: HashMap<RelationId, Relation>,
    registries: BTreeMap<RegistryId, Registry>,
    observers: HashMap<ObserverId, Rc<dyn Subscriber>>,
    subscriptions: HashMap<SubscriberId, IndexSet<ElementId>>,
    lifestages: HashMap<InnerId, LifeStage>,
    frames: Vec<EmitFrame>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node with a placeholder external id.
    pub fn create_node(&mut self, lat: f64, lon: f64) -> NodeId {
        self.insert_node(None, lat, lon)
    }

    /// Creates a node with a caller-supplied external id.
    pub fn create_node_with_id(&mut self, external_id: OsmId, lat: f64, lon: f64) -> NodeId {
        self.insert_node(Some(external_id), lat, lon)
    }

    pub fn create_way(&mut self) -> WayId {
        self.insert_way(None)
    }

    pub fn create_way_with_id(&mut self, external_id: OsmId) -> WayId {
        self.insert_way(Some(external_id))
    }

    pub fn create_relation(&mut self) -> RelationId {
        self.insert_relation(None)
    }

    pub fn create_relation_with_id(&mut self, external_id: OsmId) -> RelationId {
        self.insert_relation(Some(external_id))
    }

    fn insert_node(&mut self, external_id: Option<OsmId>, lat: f64, lon: f64) -> NodeId {
        let inner = next_inner_id();
        let id = NodeId(inner);
        let core = ElementCore::new(inner, external_id);
        self.nodes.insert(id, Node::new(id, core, lat, lon));
        self.lifestages.insert(inner, LifeStage::Alive);
        trace!("event=element_create module=graph status=ok id={id}");
        id
    }

    fn insert_way(&mut self, external_id: Option<OsmId>) -> WayId {
        let inner = next_inner_id();
        let id = WayId(inner);
        self.ways
            .insert(id, Way::new(id, ElementCore::new(inner, external_id)));
        self.lifestages.insert(inner, LifeStage::Alive);
        trace!("event=element_create module=graph status=ok id={id}");
        id
    }

    fn insert_relation(&mut self, external_id: Option<OsmId>) -> RelationId {
        let inner = next_inner_id();
        let id = RelationId(inner);
        self.relations
            .insert(id, Relation::new(id, ElementCore::new(inner, external_id)));
        self.lifestages.insert(inner, LifeStage::Alive);
        trace!("event=element_create module=graph status=ok id={id}");
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn way(&self, id: WayId) -> Option<&Way> {
        self.ways.get(&id)
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    /// Shared state of any element still in the arena.
    pub fn core(&self, element: impl Into<ElementId>) -> Option<&ElementCore> {
        match element.into() {
            ElementId::Node(id) => self.nodes.get(&id).map(|node| &node.core),
            ElementId::Way(id) => self.ways.get(&id).map(|way| &way.core),
            ElementId::Relation(id) => self.relations.get(&id).map(|relation| &relation.core),
        }
    }

    /// Mutable shared state for tag/attribute edits and validity resets.
    ///
    /// These edits are not announced to subscribers.
    pub fn core_mut(&mut self, element: impl Into<ElementId>) -> Option<&mut ElementCore> {
        match element.into() {
            ElementId::Node(id) => self.nodes.get_mut(&id).map(|node| &mut node.core),
            ElementId::Way(id) => self.ways.get_mut(&id).map(|way| &mut way.core),
            ElementId::Relation(id) => self
                .relations
                .get_mut(&id)
                .map(|relation| &mut relation.core),
        }
    }

    /// Life stage of an id; `None` when it was never allocated here.
    pub fn lifestage(&self, element: impl Into<ElementId>) -> Option<LifeStage> {
        self.lifestages.get(&element.into().inner()).copied()
    }

    pub fn is_alive(&self, element: impl Into<ElementId>) -> bool {
        self.lifestage(element) == Some(LifeStage::Alive)
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

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn way_ids(&self) -> impl Iterator<Item = WayId> + '_ {
        self.ways.keys().copied()
    }

    pub fn relation_ids(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.relations.keys().copied()
    }

    /// Reassigns the external id and rekeys every registry holding the
    /// element.
    pub fn set_external_id(&mut self, element: impl Into<ElementId>, external_id: OsmId) -> bool {
        let element = element.into();
        let Some(core) = self.core_mut(element) else {
            return false;
        };
        core.set_external_id(external_id);

        let holders: Vec<RegistryId> = self
            .registries
            .values()
            .filter(|registry| registry.has(element))
            .map(Registry::id)
            .collect();
        for registry in holders {
            self.rekey(registry, element, external_id);
        }
        true
    }

    /// Destroys an element.
    ///
    /// Every current subscriber receives the delete notification, in
    /// subscription order, before the slot is marked dead. Destroying a
    /// dying or dead element is a no-op.
    pub fn destroy(&mut self, element: impl Into<ElementId>) -> bool {
        let element = element.into();
        if !self.is_alive(element) {
            return false;
        }
        self.lifestages.insert(element.inner(), LifeStage::Dying);
        debug!("event=element_destroy module=graph status=start id={element}");

        let meta = Meta::new(EventCode::deleted(element.kind())).with_subject(element);
        self.emit_delete(element, meta);
        self.finish_destroy(element);

        debug!("event=element_destroy module=graph status=ok id={element}");
        true
    }

    fn finish_destroy(&mut self, element: ElementId) {
        // Subscribers that attached while the delete was being delivered.
        let late: Vec<SubscriberId> = self
            .core(element)
            .map(|core| core.subscribers().collect())
            .unwrap_or_default();
        for subscriber in late {
            self.detach(subscriber, element);
        }

        self.lifestages.insert(element.inner(), LifeStage::Dead);
        match element {
            ElementId::Node(id) => {
                self.nodes.remove(&id);
                for registry in self.registries.values_mut() {
                    registry.clear_pending(id);
                }
            }
            ElementId::Way(id) => {
                self.ways.remove(&id);
                self.release_subscriptions(SubscriberId::Way(id));
            }
            ElementId::Relation(id) => {
                self.relations.remove(&id);
                self.release_subscriptions(SubscriberId::Relation(id));
            }
        }
        for registry in self.registries.values_mut() {
            registry.finish_retiring(element);
        }
    }

    pub(crate) fn invalidate(&mut self, element: impl Into<ElementId>) {
        if let Some(core) = self.core_mut(element) {
            core.set_valid(false);
        }
    }

    pub(crate) fn is_valid(&self, element: impl Into<ElementId>) -> bool {
        self.core(element).is_some_and(ElementCore::is_valid)
    }
}
