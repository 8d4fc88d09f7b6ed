//! Cascading-removal policy of one registry.

use serde::{Deserialize, Serialize};

/// Garbage-collection flags. All are enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryPolicy {
    /// Destroy elements once they leave the registry.
    pub remove_physically: bool,
    /// Drop nodes that lose their last way/relation reference.
    pub remove_orphaned_nodes: bool,
    /// Drop ways that shrink below two nodes.
    pub remove_one_node_ways: bool,
}

impl Default for RegistryPolicy {
    fn default() -> Self {
        Self {
            remove_physically: true,
            remove_orphaned_nodes: true,
            remove_one_node_ways: true,
        }
    }
}

impl RegistryPolicy {
    /// Policy that never removes anything on its own.
    pub fn retain_all() -> Self {
        Self {
            remove_physically: false,
            remove_orphaned_nodes: false,
            remove_one_node_ways: false,
        }
    }
}
