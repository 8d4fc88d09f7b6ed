//! Registry lifecycle, registration and cascading removal.
//!
//! # Responsibility
//! - Create and tear down registries inside a graph.
//! - Register elements together with everything they reference.
//! - Apply orphan-node and one-node-way policies as events arrive.
//!
//! # Invariants
//! - A registry is subscribed to exactly the elements it has filed.
//! - Registering a way or relation registers all of its current members.
//! - Orphan collection only touches nodes that are still alive.
//! - A registry collects a filed node only when the way/relation letting go
//!   of it is filed there (or being torn down after leaving); pending nodes
//!   are collected whoever lets go last.

use super::dispatch::Emission;
use super::Graph;
use crate::model::ids::{next_inner_id, ElementId, NodeId, OsmId, RegistryId, SubscriberId};
use crate::model::meta::{EventCode, Meta};
use crate::registry::policy::RegistryPolicy;
use crate::registry::Registry;
use log::{debug, warn};

impl Graph {
    /// Creates a registry with the default (all enabled) policy.
    pub fn create_registry(&mut self) -> RegistryId {
        self.create_registry_with_policy(RegistryPolicy::default())
    }

    pub fn create_registry_with_policy(&mut self, policy: RegistryPolicy) -> RegistryId {
        let id = RegistryId(next_inner_id());
        self.registries.insert(id, Registry::new(id, policy));
        debug!("event=registry_create module=registry status=ok registry={id}");
        id
    }

    pub fn registry(&self, id: RegistryId) -> Option<&Registry> {
        self.registries.get(&id)
    }

    /// Mutable access for bound, policy and parent-count edits.
    pub fn registry_mut(&mut self, id: RegistryId) -> Option<&mut Registry> {
        self.registries.get_mut(&id)
    }

    pub fn registry_ids(&self) -> impl Iterator<Item = RegistryId> + '_ {
        self.registries.keys().copied()
    }

    /// Tears a registry down.
    ///
    /// A top-level registry (no parents) with physical removal enabled
    /// destroys everything it still holds; otherwise it only lets go.
    pub fn destroy_registry(&mut self, id: RegistryId) -> bool {
        let Some(registry) = self.registries.get(&id) else {
            return false;
        };
        if registry.count_parents() == 0 && registry.policy().remove_physically {
            self.clear_registry(id);
        }
        self.registries.remove(&id);
        self.release_subscriptions(SubscriberId::Registry(id));
        debug!("event=registry_destroy module=registry status=ok registry={id}");
        true
    }

    /// Files an element under its external id and adopts everything it
    /// references. Returns `false` when already filed or not alive.
    pub fn register(&mut self, id: RegistryId, element: impl Into<ElementId>) -> bool {
        let element = element.into();
        if !self.is_alive(element) {
            warn!(
                "event=registry_add module=registry status=rejected registry={id} element={element} reason=missing_element"
            );
            return false;
        }
        let Some(external_id) = self.core(element).map(|core| core.external_id()) else {
            return false;
        };
        let Some(registry) = self.registries.get_mut(&id) else {
            return false;
        };
        if registry.has(element) {
            return false;
        }

        let displaced = registry.insert(element, external_id);
        if let Some(previous) = displaced {
            self.release_displaced(id, previous, external_id);
        }
        self.attach(SubscriberId::Registry(id), element);

        for referenced in self.references_of(element) {
            self.register(id, referenced);
        }
        true
    }

    /// Unfiles an element and applies the removal policy to it.
    pub fn unregister(&mut self, id: RegistryId, element: impl Into<ElementId>) -> bool {
        let element = element.into();
        let Some(registry) = self.registries.get_mut(&id) else {
            return false;
        };
        if !registry.forget(element) {
            return false;
        }
        let policy = registry.policy();
        self.detach(SubscriberId::Registry(id), element);

        if !policy.remove_physically || !self.is_alive(element) {
            return true;
        }
        let still_referenced = self
            .core(element)
            .is_some_and(|core| core.element_subscriber_count() > 0);
        match element {
            ElementId::Node(node) if policy.remove_orphaned_nodes && still_referenced => {
                debug!(
                    "event=orphan_pending module=registry status=ok registry={id} node={node}"
                );
                if let Some(registry) = self.registries.get_mut(&id) {
                    registry.mark_pending(node);
                }
            }
            _ => {
                if let Some(registry) = self.registries.get_mut(&id) {
                    registry.retire(element);
                }
                self.destroy(element);
            }
        }
        true
    }

    /// Unregisters relations, then ways, then nodes.
    pub fn clear_registry(&mut self, id: RegistryId) {
        let Some(registry) = self.registries.get(&id) else {
            return;
        };
        let mut filed: Vec<ElementId> = registry
            .relations()
            .map(ElementId::Relation)
            .collect();
        filed.extend(registry.ways().map(ElementId::Way));
        filed.extend(registry.nodes().map(ElementId::Node));

        for element in filed {
            self.unregister(id, element);
        }
        debug!("event=registry_clear module=registry status=ok registry={id}");
    }

    pub(super) fn rekey(&mut self, id: RegistryId, element: ElementId, external_id: OsmId) {
        let Some(registry) = self.registries.get_mut(&id) else {
            return;
        };
        if let Some(previous) = registry.rekey(element, external_id) {
            self.release_displaced(id, previous, external_id);
        }
    }

    fn release_displaced(&mut self, id: RegistryId, previous: ElementId, external_id: OsmId) {
        warn!(
            "event=registry_add module=registry status=displaced registry={id} element={previous} external_id={external_id}"
        );
        self.detach(SubscriberId::Registry(id), previous);
    }

    fn references_of(&self, element: ElementId) -> Vec<ElementId> {
        match element {
            ElementId::Node(_) => Vec::new(),
            ElementId::Way(way) => self
                .way(way)
                .map(|current| current.nodes().iter().copied().map(ElementId::Node).collect())
                .unwrap_or_default(),
            ElementId::Relation(relation) => self
                .relation(relation)
                .map(|current| current.members().collect())
                .unwrap_or_default(),
        }
    }

    /// Runs when `releaser`, the last way/relation referencing a live node,
    /// lets go of it.
    pub(super) fn collect_orphan(&mut self, node: NodeId, releaser: SubscriberId) {
        let releaser = releaser.as_element();
        let holders: Vec<RegistryId> = self
            .registries
            .values()
            .filter(|registry| registry.policy().remove_orphaned_nodes)
            .filter(|registry| {
                registry.is_orphan_pending(node)
                    || (registry.has(node)
                        && releaser.is_some_and(|element| registry.holds(element)))
            })
            .map(Registry::id)
            .collect();

        for id in holders {
            if !self.is_alive(node) {
                break;
            }
            let Some(registry) = self.registries.get_mut(&id) else {
                continue;
            };
            debug!("event=orphan_collect module=registry status=ok registry={id} node={node}");
            if registry.clear_pending(node) {
                if registry.policy().remove_physically {
                    self.destroy(node);
                }
            } else {
                self.unregister(id, node);
            }
        }
    }

    /// Re-files `node` in every registry where it waits as an orphan.
    pub(super) fn restore_pending(&mut self, node: NodeId) {
        let waiting: Vec<RegistryId> = self
            .registries
            .values()
            .filter(|registry| registry.is_orphan_pending(node))
            .map(Registry::id)
            .collect();
        for id in waiting {
            debug!("event=orphan_restore module=registry status=ok registry={id} node={node}");
            self.register(id, node);
        }
    }

    pub(super) fn handle_for_registry(
        &mut self,
        id: RegistryId,
        source: ElementId,
        emission: Emission,
        meta: &Meta,
    ) {
        if emission == Emission::Delete {
            if let Some(registry) = self.registries.get_mut(&id) {
                if registry.forget(source) {
                    registry.retire(source);
                }
            }
            return;
        }

        let Some(policy) = self.registry(id).map(Registry::policy) else {
            return;
        };
        match (source, meta.code.generic()) {
            (ElementId::Way(_), EventCode::NodeAdded)
            | (
                ElementId::Relation(_),
                EventCode::NodeAdded | EventCode::WayAdded | EventCode::RelationAdded,
            ) => {
                if let Some(subject) = meta.subject {
                    self.register(id, subject);
                }
            }
            (ElementId::Way(way), EventCode::NodeDeleted) if policy.remove_one_node_ways => {
                let short = self.way(way).is_some_and(|current| current.len() < 2);
                if short {
                    debug!(
                        "event=short_way_collect module=registry status=ok registry={id} way={way}"
                    );
                    self.unregister(id, way);
                }
            }
            _ => {}
        }
    }
}
