#![allow(dead_code)]

use mapgraph_core::{ElementId, Graph, Meta, NodeId, ObserverId, RelationId, Subscriber, WayId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    NodeUpdate,
    WayUpdate,
    RelationUpdate,
    NodeDelete,
    WayDelete,
    RelationDelete,
}

#[derive(Debug, Clone, Copy)]
pub struct Seen {
    pub event: Event,
    pub source: ElementId,
    pub meta: Meta,
}

/// Observer that records every notification it receives.
#[derive(Default)]
pub struct Recorder {
    seen: RefCell<Vec<Seen>>,
}

impl Recorder {
    pub fn attach(graph: &mut Graph, element: impl Into<ElementId>) -> (Rc<Self>, ObserverId) {
        let recorder = Rc::new(Self::default());
        let observer = graph.add_observer(recorder.clone());
        graph.subscribe(observer, element);
        (recorder, observer)
    }

    /// Drains everything recorded so far.
    pub fn take(&self) -> Vec<Seen> {
        std::mem::take(&mut *self.seen.borrow_mut())
    }

    /// Kind of the most recent notification; clears the log.
    pub fn last(&self) -> Option<Event> {
        self.take().last().map(|seen| seen.event)
    }

    pub fn count(&self) -> usize {
        self.seen.borrow().len()
    }

    fn record(&self, event: Event, source: impl Into<ElementId>, meta: &Meta) {
        self.seen.borrow_mut().push(Seen {
            event,
            source: source.into(),
            meta: *meta,
        });
    }
}

impl Subscriber for Recorder {
    fn on_update_node(&self, _: &mut Graph, node: NodeId, meta: &Meta) {
        self.record(Event::NodeUpdate, node, meta);
    }

    fn on_update_way(&self, _: &mut Graph, way: WayId, meta: &Meta) {
        self.record(Event::WayUpdate, way, meta);
    }

    fn on_update_relation(&self, _: &mut Graph, relation: RelationId, meta: &Meta) {
        self.record(Event::RelationUpdate, relation, meta);
    }

    fn on_delete_node(&self, _: &mut Graph, node: NodeId, meta: &Meta) {
        self.record(Event::NodeDelete, node, meta);
    }

    fn on_delete_way(&self, _: &mut Graph, way: WayId, meta: &Meta) {
        self.record(Event::WayDelete, way, meta);
    }

    fn on_delete_relation(&self, _: &mut Graph, relation: RelationId, meta: &Meta) {
        self.record(Event::RelationDelete, relation, meta);
    }
}
