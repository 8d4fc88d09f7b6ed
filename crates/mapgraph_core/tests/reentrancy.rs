mod common;

use common::{Event, Recorder};
use mapgraph_core::{Graph, Meta, NodeId, ObserverId, RelationId, Subscriber, WayId};
use std::cell::Cell;
use std::rc::Rc;

/// Observer that runs an arbitrary graph edit from its update handler.
struct Hook {
    updates: Cell<usize>,
    deletes: Cell<usize>,
    action: Box<dyn Fn(&mut Graph)>,
}

impl Hook {
    fn attach(
        graph: &mut Graph,
        node: NodeId,
        action: impl Fn(&mut Graph) + 'static,
    ) -> (Rc<Self>, ObserverId) {
        let hook = Rc::new(Self {
            updates: Cell::new(0),
            deletes: Cell::new(0),
            action: Box::new(action),
        });
        let observer = graph.add_observer(hook.clone());
        graph.subscribe(observer, node);
        (hook, observer)
    }
}

impl Subscriber for Hook {
    fn on_update_node(&self, graph: &mut Graph, _: NodeId, _: &Meta) {
        self.updates.set(self.updates.get() + 1);
        (self.action)(graph);
    }

    fn on_update_way(&self, _: &mut Graph, _: WayId, _: &Meta) {}

    fn on_update_relation(&self, _: &mut Graph, _: RelationId, _: &Meta) {}

    fn on_delete_node(&self, _: &mut Graph, _: NodeId, _: &Meta) {
        self.deletes.set(self.deletes.get() + 1);
    }

    fn on_delete_way(&self, _: &mut Graph, _: WayId, _: &Meta) {}

    fn on_delete_relation(&self, _: &mut Graph, _: RelationId, _: &Meta) {}
}

#[test]
fn self_unsubscribe_inside_handler_is_served_once() {
    let mut graph = Graph::new();
    let node = graph.create_node(0.0, 0.0);
    let own_id = Rc::new(Cell::new(None::<ObserverId>));
    let slot = own_id.clone();
    let (hook, observer) = Hook::attach(&mut graph, node, move |graph| {
        if let Some(id) = slot.get() {
            graph.unsubscribe(id, node);
        }
    });
    own_id.set(Some(observer));
    let (after, _) = Recorder::attach(&mut graph, node);

    graph.set_lat(node, 1.0);
    assert_eq!(hook.updates.get(), 1);
    assert_eq!(after.last(), Some(Event::NodeUpdate));

    graph.set_lat(node, 2.0);
    assert_eq!(hook.updates.get(), 1);
    assert_eq!(after.last(), Some(Event::NodeUpdate));
}

#[test]
fn destroying_emitter_inside_handler_stops_delivery() {
    let mut graph = Graph::new();
    let node = graph.create_node(0.0, 0.0);
    let (before, _) = Recorder::attach(&mut graph, node);
    let (hook, _) = Hook::attach(&mut graph, node, move |graph| {
        graph.destroy(node);
    });
    let (after, _) = Recorder::attach(&mut graph, node);

    graph.set_lat(node, 1.0);

    assert!(!graph.is_alive(node));
    assert_eq!(hook.updates.get(), 1);
    assert_eq!(hook.deletes.get(), 1);
    let before_seen: Vec<_> = before.take().into_iter().map(|seen| seen.event).collect();
    assert_eq!(before_seen, vec![Event::NodeUpdate, Event::NodeDelete]);
    let after_seen: Vec<_> = after.take().into_iter().map(|seen| seen.event).collect();
    assert_eq!(after_seen, vec![Event::NodeDelete]);
    assert_eq!(graph.verify_integrity(), Ok(()));
}

#[test]
fn observer_subscribed_mid_emission_waits_for_next_edit() {
    let mut graph = Graph::new();
    let node = graph.create_node(0.0, 0.0);
    let late = Rc::new(Recorder::default());
    let late_id = graph.add_observer(late.clone());
    let (hook, _) = Hook::attach(&mut graph, node, move |graph| {
        graph.subscribe(late_id, node);
    });

    graph.set_lat(node, 1.0);
    assert_eq!(late.count(), 0);
    assert_eq!(hook.updates.get(), 1);

    graph.set_lat(node, 2.0);
    assert_eq!(late.last(), Some(Event::NodeUpdate));
}

#[test]
fn observer_dropped_by_earlier_handler_is_skipped() {
    let mut graph = Graph::new();
    let node = graph.create_node(0.0, 0.0);
    let victim = Rc::new(Recorder::default());
    let victim_id = graph.add_observer(victim.clone());
    let (hook, _) = Hook::attach(&mut graph, node, move |graph| {
        graph.unsubscribe(victim_id, node);
    });
    graph.subscribe(victim_id, node);

    graph.set_lat(node, 1.0);
    assert_eq!(hook.updates.get(), 1);
    assert_eq!(victim.count(), 0);
}

#[test]
fn nested_emission_on_same_element_serves_everyone_once_per_edit() {
    let mut graph = Graph::new();
    let node = graph.create_node(0.0, 0.0);
    let fired = Rc::new(Cell::new(false));
    let guard = fired.clone();
    let (hook, _) = Hook::attach(&mut graph, node, move |graph| {
        if !guard.replace(true) {
            graph.set_lon(node, 9.0);
        }
    });
    let (after, _) = Recorder::attach(&mut graph, node);

    graph.set_lat(node, 1.0);
    assert_eq!(hook.updates.get(), 2);
    assert_eq!(after.take().len(), 2);
    assert_eq!(graph.node(node).unwrap().lat_lon(), (1.0, 9.0));
}

/// Observer that tries to destroy a node again from its delete handler.
#[derive(Default)]
struct Redestroy {
    deletes: Cell<usize>,
    outcome: Cell<Option<bool>>,
}

impl Subscriber for Redestroy {
    fn on_update_node(&self, _: &mut Graph, _: NodeId, _: &Meta) {}

    fn on_update_way(&self, _: &mut Graph, _: WayId, _: &Meta) {}

    fn on_update_relation(&self, _: &mut Graph, _: RelationId, _: &Meta) {}

    fn on_delete_node(&self, graph: &mut Graph, node: NodeId, _: &Meta) {
        self.deletes.set(self.deletes.get() + 1);
        self.outcome.set(Some(graph.destroy(node)));
    }

    fn on_delete_way(&self, _: &mut Graph, _: WayId, _: &Meta) {}

    fn on_delete_relation(&self, _: &mut Graph, _: RelationId, _: &Meta) {}
}

#[test]
fn destroy_is_a_no_op_while_dying() {
    let mut graph = Graph::new();
    let node = graph.create_node(0.0, 0.0);
    let (first, _) = Recorder::attach(&mut graph, node);
    let again = Rc::new(Redestroy::default());
    let again_id = graph.add_observer(again.clone());
    graph.subscribe(again_id, node);
    let (second, _) = Recorder::attach(&mut graph, node);

    assert!(graph.destroy(node));
    assert_eq!(again.outcome.get(), Some(false));
    assert_eq!(again.deletes.get(), 1);
    assert_eq!(first.take().len(), 1);
    assert_eq!(second.take().len(), 1);
    assert!(!graph.destroy(node));
    assert_eq!(graph.verify_integrity(), Ok(()));
}

#[test]
fn way_destroyed_by_observer_during_node_update_keeps_graph_consistent() {
    let mut graph = Graph::new();
    let way = graph.create_way();
    let a = graph.create_node(0.0, 0.0);
    let b = graph.create_node(0.0, 0.0);
    graph.push_node(way, a);
    graph.push_node(way, b);
    let (hook, _) = Hook::attach(&mut graph, a, move |graph| {
        graph.destroy(way);
    });

    graph.set_lat(a, 3.0);
    assert_eq!(hook.updates.get(), 1);
    assert!(!graph.is_alive(way));
    assert!(graph.is_alive(a));
    assert_eq!(graph.core(a).unwrap().element_subscriber_count(), 0);
    assert_eq!(graph.verify_integrity(), Ok(()));
}
