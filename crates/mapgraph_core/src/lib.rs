//! In-memory map element graph with referential integrity.
//!
//! Elements (nodes, ways, relations) live in a [`Graph`] arena and refer to
//! each other by id. Every change is announced to subscribers through a
//! reentrancy-safe notification engine, and registries apply cascading
//! removal policies as those notifications arrive.

pub mod graph;
pub mod logging;
pub mod mirror;
pub mod model;
pub mod registry;

pub use graph::dispatch::Subscriber;
pub use graph::integrity::IntegrityError;
pub use graph::{Graph, LifeStage};
pub use logging::{default_log_level, init_logging, logging_status};
pub use mirror::WayMirror;
pub use model::element::{Element, ElementCore, ID_ATTR};
pub use model::ids::{
    ElementId, ElementKind, InnerId, NodeId, ObserverId, OsmId, RegistryId, RelationId,
    SubscriberId, WayId,
};
pub use model::meta::{EventCode, Meta};
pub use model::node::Node;
pub use model::relation::Relation;
pub use model::way::{Way, WayDiff};
pub use registry::policy::RegistryPolicy;
pub use registry::{Bound, Registry};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
