//! Whole-graph consistency audit.
//!
//! # Responsibility
//! - Cross-check arena, subscriber sets, subscription index, liveness table
//!   and registries against each other.
//!
//! # Invariants
//! - The audit is read-only and reports the first violation it finds.

use super::{Graph, LifeStage};
use crate::model::element::ElementCore;
use crate::model::ids::{ElementId, InnerId, OsmId, RegistryId, RelationId, SubscriberId, WayId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// First inconsistency found by [`Graph::verify_integrity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Way references a node that is no longer alive.
    DanglingWayNode { way: WayId, node: ElementId },
    /// Way contains a node it is not subscribed to.
    UnsubscribedWayNode { way: WayId, node: ElementId },
    /// Relation references a member that is no longer alive.
    DanglingMember {
        relation: RelationId,
        member: ElementId,
    },
    /// Relation contains a member it is not subscribed to.
    UnsubscribedMember {
        relation: RelationId,
        member: ElementId,
    },
    /// Role entry without a matching member.
    RoleWithoutMember { relation: RelationId, inner: InnerId },
    /// Cached element-subscriber count disagrees with the subscriber set.
    SubscriberCountMismatch {
        element: ElementId,
        cached: usize,
        actual: usize,
    },
    /// Subscriber set and subscription index disagree.
    SubscriptionIndexMismatch {
        subscriber: SubscriberId,
        element: ElementId,
    },
    /// Registry files an element that is no longer alive.
    StaleRegistryEntry {
        registry: RegistryId,
        element: ElementId,
    },
    /// Registry files an element under an outdated external id.
    RegistryKeyMismatch {
        registry: RegistryId,
        element: ElementId,
        filed: OsmId,
        current: OsmId,
    },
    /// Arena entry whose life stage is not `Alive`.
    LifeStageMismatch {
        element: ElementId,
        stage: Option<LifeStage>,
    },
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingWayNode { way, node } => {
                write!(f, "{way} references dead {node}")
            }
            Self::UnsubscribedWayNode { way, node } => {
                write!(f, "{way} contains {node} without subscribing to it")
            }
            Self::DanglingMember { relation, member } => {
                write!(f, "{relation} references dead member {member}")
            }
            Self::UnsubscribedMember { relation, member } => {
                write!(f, "{relation} contains {member} without subscribing to it")
            }
            Self::RoleWithoutMember { relation, inner } => {
                write!(f, "{relation} holds a role for non-member #{inner}")
            }
            Self::SubscriberCountMismatch {
                element,
                cached,
                actual,
            } => write!(
                f,
                "{element} counts {cached} element subscribers but has {actual}"
            ),
            Self::SubscriptionIndexMismatch {
                subscriber,
                element,
            } => write!(
                f,
                "subscription index out of sync for {subscriber} on {element}"
            ),
            Self::StaleRegistryEntry { registry, element } => {
                write!(f, "{registry} still files dead {element}")
            }
            Self::RegistryKeyMismatch {
                registry,
                element,
                filed,
                current,
            } => write!(
                f,
                "{registry} files {element} under {filed} but its id is {current}"
            ),
            Self::LifeStageMismatch { element, stage } => {
                write!(f, "{element} is in the arena with life stage {stage:?}")
            }
        }
    }
}

impl Error for IntegrityError {}

impl Graph {
    /// Audits every structural invariant of the graph.
    ///
    /// Meant to run between operations, not from inside a handler.
    pub fn verify_integrity(&self) -> Result<(), IntegrityError> {
        self.verify_lifestages()?;
        self.verify_ways()?;
        self.verify_relations()?;
        self.verify_subscribers()?;
        self.verify_registries()
    }

    fn arena(&self) -> impl Iterator<Item = (ElementId, &ElementCore)> + '_ {
        self.nodes
            .values()
            .map(|node| (ElementId::Node(node.id), &node.core))
            .chain(self.ways.values().map(|way| (ElementId::Way(way.id), &way.core)))
            .chain(
                self.relations
                    .values()
                    .map(|relation| (ElementId::Relation(relation.id), &relation.core)),
            )
    }

    fn verify_lifestages(&self) -> Result<(), IntegrityError> {
        for (element, _) in self.arena() {
            let stage = self.lifestage(element);
            if stage != Some(LifeStage::Alive) {
                return Err(IntegrityError::LifeStageMismatch { element, stage });
            }
        }
        Ok(())
    }

    fn verify_ways(&self) -> Result<(), IntegrityError> {
        for way in self.ways.values() {
            for node in way.nodes() {
                let node = ElementId::Node(*node);
                let Some(core) = self.core(node).filter(|_| self.is_alive(node)) else {
                    return Err(IntegrityError::DanglingWayNode { way: way.id, node });
                };
                if !core.has_subscriber(SubscriberId::Way(way.id)) {
                    return Err(IntegrityError::UnsubscribedWayNode { way: way.id, node });
                }
            }
        }
        Ok(())
    }

    fn verify_relations(&self) -> Result<(), IntegrityError> {
        for relation in self.relations.values() {
            for member in relation.members() {
                let Some(core) = self.core(member).filter(|_| self.is_alive(member)) else {
                    return Err(IntegrityError::DanglingMember {
                        relation: relation.id,
                        member,
                    });
                };
                if !core.has_subscriber(SubscriberId::Relation(relation.id)) {
                    return Err(IntegrityError::UnsubscribedMember {
                        relation: relation.id,
                        member,
                    });
                }
            }
            for inner in relation.role_keys() {
                if !relation.members().any(|member| member.inner() == inner) {
                    return Err(IntegrityError::RoleWithoutMember {
                        relation: relation.id,
                        inner,
                    });
                }
            }
        }
        Ok(())
    }

    fn verify_subscribers(&self) -> Result<(), IntegrityError> {
        for (element, core) in self.arena() {
            let actual = core
                .subscribers()
                .filter(|subscriber| subscriber.is_element())
                .count();
            if actual != core.element_subscriber_count() {
                return Err(IntegrityError::SubscriberCountMismatch {
                    element,
                    cached: core.element_subscriber_count(),
                    actual,
                });
            }
            for subscriber in core.subscribers() {
                let indexed = self
                    .subscriptions
                    .get(&subscriber)
                    .is_some_and(|targets| targets.contains(&element));
                if !indexed {
                    return Err(IntegrityError::SubscriptionIndexMismatch {
                        subscriber,
                        element,
                    });
                }
            }
        }

        for (subscriber, targets) in &self.subscriptions {
            for element in targets {
                let listed = self
                    .core(*element)
                    .is_some_and(|core| core.has_subscriber(*subscriber));
                if !listed {
                    return Err(IntegrityError::SubscriptionIndexMismatch {
                        subscriber: *subscriber,
                        element: *element,
                    });
                }
            }
        }
        Ok(())
    }

    fn verify_registries(&self) -> Result<(), IntegrityError> {
        for registry in self.registries.values() {
            for (element, filed) in registry.keys() {
                let Some(core) = self.core(element).filter(|_| self.is_alive(element)) else {
                    return Err(IntegrityError::StaleRegistryEntry {
                        registry: registry.id(),
                        element,
                    });
                };
                if core.external_id() != filed {
                    return Err(IntegrityError::RegistryKeyMismatch {
                        registry: registry.id(),
                        element,
                        filed,
                        current: core.external_id(),
                    });
                }
                if !core.has_subscriber(SubscriberId::Registry(registry.id())) {
                    return Err(IntegrityError::SubscriptionIndexMismatch {
                        subscriber: SubscriberId::Registry(registry.id()),
                        element,
                    });
                }
            }
        }
        Ok(())
    }
}
