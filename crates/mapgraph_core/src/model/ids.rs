//! Element identity and id allocation.
//!
//! # Responsibility
//! - Define typed handles for every element kind, registry and observer.
//! - Allocate internal ids and placeholder external ids.
//!
//! # Invariants
//! - Internal ids are strictly increasing and never reused in one process.
//! - Placeholder external ids are negative and strictly decreasing.
//! - Supplying an external id at or below the placeholder bound rebases the
//!   bound below it, so later placeholders never collide with it.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use uuid::Uuid;

/// Process-unique, immutable engine identifier.
pub type InnerId = u64;

/// Caller-visible identifier. Negative values are unsaved placeholders.
pub type OsmId = i64;

static NEXT_INNER_ID: AtomicU64 = AtomicU64::new(1);
static OSM_ID_BOUND: AtomicI64 = AtomicI64::new(-1);

pub(crate) fn next_inner_id() -> InnerId {
    NEXT_INNER_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn next_placeholder_id() -> OsmId {
    OSM_ID_BOUND.fetch_sub(1, Ordering::Relaxed)
}

/// Records a caller-supplied external id and returns it unchanged.
pub(crate) fn claim_external_id(id: OsmId) -> OsmId {
    OSM_ID_BOUND.fetch_min(id.saturating_sub(1), Ordering::Relaxed);
    id
}

macro_rules! typed_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub(crate) InnerId);

        impl $name {
            /// Returns the internal id behind this handle.
            pub fn inner(self) -> InnerId {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

typed_id!(
    /// Handle of a point element.
    NodeId,
    "node"
);
typed_id!(
    /// Handle of an ordered path element.
    WayId,
    "way"
);
typed_id!(
    /// Handle of a grouping element.
    RelationId,
    "relation"
);
typed_id!(
    /// Handle of a registry living in a graph.
    RegistryId,
    "registry"
);

/// Element kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    /// Stable lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

/// Closed union of element handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ElementId {
    Node(NodeId),
    Way(WayId),
    Relation(RelationId),
}

impl ElementId {
    pub fn kind(self) -> ElementKind {
        match self {
            Self::Node(_) => ElementKind::Node,
            Self::Way(_) => ElementKind::Way,
            Self::Relation(_) => ElementKind::Relation,
        }
    }

    pub fn inner(self) -> InnerId {
        match self {
            Self::Node(id) => id.inner(),
            Self::Way(id) => id.inner(),
            Self::Relation(id) => id.inner(),
        }
    }

    pub fn as_node(self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_way(self) -> Option<WayId> {
        match self {
            Self::Way(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_relation(self) -> Option<RelationId> {
        match self {
            Self::Relation(id) => Some(id),
            _ => None,
        }
    }
}

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(id) => write!(f, "{id}"),
            Self::Way(id) => write!(f, "{id}"),
            Self::Relation(id) => write!(f, "{id}"),
        }
    }
}

impl From<NodeId> for ElementId {
    fn from(value: NodeId) -> Self {
        Self::Node(value)
    }
}

impl From<WayId> for ElementId {
    fn from(value: WayId) -> Self {
        Self::Way(value)
    }
}

impl From<RelationId> for ElementId {
    fn from(value: RelationId) -> Self {
        Self::Relation(value)
    }
}

/// Handle of an external collaborator registered with a graph.
///
/// Random v4 UUIDs keep observer handles distinct across graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObserverId(Uuid);

impl ObserverId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for ObserverId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Anything that can sit in an element's subscriber set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriberId {
    Way(WayId),
    Relation(RelationId),
    Registry(RegistryId),
    Observer(ObserverId),
}

impl SubscriberId {
    /// Whether this subscriber is itself a graph element.
    ///
    /// Only element subscribers count as structural references for the
    /// orphan-node policy.
    pub fn is_element(self) -> bool {
        matches!(self, Self::Way(_) | Self::Relation(_))
    }

    /// Element behind a way/relation subscriber.
    pub fn as_element(self) -> Option<ElementId> {
        match self {
            Self::Way(id) => Some(ElementId::Way(id)),
            Self::Relation(id) => Some(ElementId::Relation(id)),
            Self::Registry(_) | Self::Observer(_) => None,
        }
    }
}

impl From<ObserverId> for SubscriberId {
    fn from(value: ObserverId) -> Self {
        Self::Observer(value)
    }
}

impl From<RegistryId> for SubscriberId {
    fn from(value: RegistryId) -> Self {
        Self::Registry(value)
    }
}

impl Display for SubscriberId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Way(id) => write!(f, "{id}"),
            Self::Relation(id) => write!(f, "{id}"),
            Self::Registry(id) => write!(f, "{id}"),
            Self::Observer(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        claim_external_id, next_inner_id, next_placeholder_id, ElementId, NodeId, RegistryId,
        SubscriberId, WayId,
    };

    #[test]
    fn inner_ids_strictly_increase() {
        let first = next_inner_id();
        let second = next_inner_id();
        assert!(second > first);
    }

    #[test]
    fn placeholders_stay_below_claimed_ids() {
        claim_external_id(-500);
        let placeholder = next_placeholder_id();
        assert!(placeholder < -500);
        assert!(next_placeholder_id() < placeholder);
    }

    #[test]
    fn positive_claims_do_not_move_the_bound() {
        let before = next_placeholder_id();
        claim_external_id(42);
        assert!(next_placeholder_id() < before);
    }

    #[test]
    fn element_id_reports_kind_and_inner() {
        let id = ElementId::from(NodeId(7));
        assert_eq!(id.inner(), 7);
        assert_eq!(id.as_node(), Some(NodeId(7)));
        assert!(id.as_way().is_none());
        assert_eq!(id.to_string(), "node#7");
    }

    #[test]
    fn only_way_and_relation_subscribers_map_to_elements() {
        assert_eq!(
            SubscriberId::Way(WayId(3)).as_element(),
            Some(ElementId::Way(WayId(3)))
        );
        assert_eq!(SubscriberId::Registry(RegistryId(3)).as_element(), None);
    }
}
