//! Node coordinate edits.

use super::Graph;
use crate::model::ids::NodeId;
use crate::model::meta::{EventCode, Meta};

impl Graph {
    /// Every call announces `NodeUpdated`, even when the value is unchanged.
    pub fn set_lat(&mut self, node: NodeId, lat: f64) -> bool {
        self.reposition(node, |current| current.0 = lat)
    }

    pub fn set_lon(&mut self, node: NodeId, lon: f64) -> bool {
        self.reposition(node, |current| current.1 = lon)
    }

    pub fn set_lat_lon(&mut self, node: NodeId, lat: f64, lon: f64) -> bool {
        self.reposition(node, |current| *current = (lat, lon))
    }

    fn reposition(&mut self, node: NodeId, edit: impl FnOnce(&mut (f64, f64))) -> bool {
        if !self.is_alive(node) {
            return false;
        }
        let Some(target) = self.nodes.get_mut(&node) else {
            return false;
        };
        let mut position = (target.lat, target.lon);
        edit(&mut position);
        (target.lat, target.lon) = position;

        self.emit_update(node, Meta::new(EventCode::NodeUpdated).with_subject(node));
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::Graph;

    #[test]
    fn coordinate_setters_update_position() {
        let mut graph = Graph::new();
        let node = graph.create_node(1.0, 1.0);
        assert!(graph.set_lat(node, 5.0));
        assert!(graph.set_lon(node, 6.0));
        assert_eq!(graph.node(node).unwrap().lat_lon(), (5.0, 6.0));
        assert!(graph.set_lat_lon(node, 0.5, 0.25));
        assert_eq!(graph.node(node).unwrap().lat_lon(), (0.5, 0.25));
    }

    #[test]
    fn setters_ignore_dead_nodes() {
        let mut graph = Graph::new();
        let node = graph.create_node(1.0, 1.0);
        graph.destroy(node);
        assert!(!graph.set_lat(node, 2.0));
    }
}
