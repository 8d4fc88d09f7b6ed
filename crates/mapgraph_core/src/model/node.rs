//! Point element.

use crate::model::element::{Element, ElementCore};
use crate::model::ids::{ElementId, NodeId};

/// Point with mutable coordinates. Coordinate writes go through
/// [`Graph::set_lat`](crate::Graph::set_lat) and friends so that every
/// change is announced.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) core: ElementCore,
    pub(crate) lat: f64,
    pub(crate) lon: f64,
}

impl Node {
    pub(crate) fn new(id: NodeId, core: ElementCore, lat: f64, lon: f64) -> Self {
        Self { id, core, lat, lon }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat_lon(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

impl Element for Node {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn element_id(&self) -> ElementId {
        ElementId::Node(self.id)
    }
}
