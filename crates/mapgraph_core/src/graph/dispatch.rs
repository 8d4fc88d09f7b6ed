//! Subscription bookkeeping and reentrancy-safe event delivery.
//!
//! # Responsibility
//! - Attach and detach subscribers, keeping both directions indexed.
//! - Deliver update/delete notifications over a per-emission snapshot.
//! - Route each notification to the subscriber's kind-specific handler.
//!
//! # Invariants
//! - Every subscriber in a snapshot is dispatched to at most once.
//! - Nothing is dispatched on behalf of a dead source.
//! - Detaching a subscriber also drops it from every live snapshot of that
//!   source, so a self-removal inside a handler is observed by the emitter.
//! - After a delete notification each dispatched subscriber is detached.
//! - A new way/relation reference re-files a node that is orphan-pending in
//!   any registry.

use super::{Graph, LifeStage};
use crate::model::ids::{ElementId, NodeId, ObserverId, RelationId, SubscriberId, WayId};
use crate::model::meta::Meta;
use log::{debug, trace};
use std::collections::VecDeque;
use std::rc::Rc;

/// External collaborator notified about element changes.
///
/// The handler kind names the element that emitted; `meta.code` names the
/// cause. Handlers may freely mutate `graph`, including destroying the
/// emitting element. Implementors keep their own state behind `Cell` or
/// `RefCell` and must not hold a borrow across a graph call.
pub trait Subscriber {
    fn on_update_node(&self, graph: &mut Graph, node: NodeId, meta: &Meta);
    fn on_update_way(&self, graph: &mut Graph, way: WayId, meta: &Meta);
    fn on_update_relation(&self, graph: &mut Graph, relation: RelationId, meta: &Meta);
    fn on_delete_node(&self, graph: &mut Graph, node: NodeId, meta: &Meta);
    fn on_delete_way(&self, graph: &mut Graph, way: WayId, meta: &Meta);
    fn on_delete_relation(&self, graph: &mut Graph, relation: RelationId, meta: &Meta);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Emission {
    Update,
    Delete,
}

/// Subscribers of one in-flight emission that have not been served yet.
pub(crate) struct EmitFrame {
    source: ElementId,
    pending: VecDeque<SubscriberId>,
}

impl Graph {
    /// Registers an external observer. It receives nothing until it is
    /// subscribed to at least one element.
    pub fn add_observer(&mut self, observer: Rc<dyn Subscriber>) -> ObserverId {
        let id = ObserverId::new();
        self.observers.insert(id, observer);
        debug!("event=observer_add module=dispatch status=ok observer={id}");
        id
    }

    /// Drops an observer and every subscription it holds.
    pub fn remove_observer(&mut self, observer: ObserverId) -> Option<Rc<dyn Subscriber>> {
        self.release_subscriptions(SubscriberId::Observer(observer));
        let removed = self.observers.remove(&observer);
        if removed.is_some() {
            debug!("event=observer_remove module=dispatch status=ok observer={observer}");
        }
        removed
    }

    /// Idempotent. Returns `false` for unknown observers, missing elements
    /// and repeated subscriptions.
    pub fn subscribe(&mut self, observer: ObserverId, element: impl Into<ElementId>) -> bool {
        if !self.observers.contains_key(&observer) {
            return false;
        }
        self.attach(SubscriberId::Observer(observer), element.into())
    }

    /// Returns `false` when the observer was not subscribed.
    pub fn unsubscribe(&mut self, observer: ObserverId, element: impl Into<ElementId>) -> bool {
        self.detach(SubscriberId::Observer(observer), element.into())
    }

    /// Elements a subscriber currently listens to, in subscription order.
    pub fn subscriptions_of(
        &self,
        subscriber: SubscriberId,
    ) -> impl Iterator<Item = ElementId> + '_ {
        self.subscriptions
            .get(&subscriber)
            .into_iter()
            .flat_map(|targets| targets.iter().copied())
    }

    pub(crate) fn attach(&mut self, subscriber: SubscriberId, target: ElementId) -> bool {
        let Some(core) = self.core_mut(target) else {
            return false;
        };
        if !core.add_subscriber(subscriber) {
            return false;
        }
        self.subscriptions.entry(subscriber).or_default().insert(target);
        trace!("event=subscribe module=dispatch status=ok subscriber={subscriber} target={target}");

        if let (true, ElementId::Node(node)) = (subscriber.is_element(), target) {
            self.restore_pending(node);
        }
        true
    }

    pub(crate) fn detach(&mut self, subscriber: SubscriberId, target: ElementId) -> bool {
        for frame in self.frames.iter_mut().filter(|frame| frame.source == target) {
            frame.pending.retain(|pending| *pending != subscriber);
        }
        if let Some(targets) = self.subscriptions.get_mut(&subscriber) {
            targets.shift_remove(&target);
            if targets.is_empty() {
                self.subscriptions.remove(&subscriber);
            }
        }

        let Some(core) = self.core_mut(target) else {
            return false;
        };
        if !core.remove_subscriber(subscriber) {
            return false;
        }
        let orphaned = subscriber.is_element() && core.element_subscriber_count() == 0;
        trace!(
            "event=unsubscribe module=dispatch status=ok subscriber={subscriber} target={target}"
        );

        if let (true, ElementId::Node(node)) = (orphaned, target) {
            if self.is_alive(node) {
                self.collect_orphan(node, subscriber);
            }
        }
        true
    }

    /// Detaches `subscriber` from everything it listens to.
    pub(crate) fn release_subscriptions(&mut self, subscriber: SubscriberId) {
        let Some(targets) = self.subscriptions.remove(&subscriber) else {
            return;
        };
        for target in targets {
            self.detach(subscriber, target);
        }
    }

    pub(crate) fn emit_update(&mut self, source: impl Into<ElementId>, meta: Meta) {
        self.emit(source.into(), Emission::Update, meta);
    }

    pub(crate) fn emit_delete(&mut self, source: impl Into<ElementId>, meta: Meta) {
        self.emit(source.into(), Emission::Delete, meta);
    }

    fn emit(&mut self, source: ElementId, emission: Emission, meta: Meta) {
        let pending: VecDeque<SubscriberId> = match self.core(source) {
            Some(core) => core.subscribers().collect(),
            None => return,
        };
        if pending.is_empty() {
            return;
        }

        let depth = self.frames.len();
        self.frames.push(EmitFrame { source, pending });

        while let Some(current) = self
            .frames
            .get(depth)
            .and_then(|frame| frame.pending.front().copied())
        {
            self.dispatch(current, source, emission, &meta);

            if self.lifestage(source) == Some(LifeStage::Dead) {
                trace!("event=emit_abort module=dispatch status=ok source={source}");
                break;
            }
            let Some(frame) = self.frames.get_mut(depth) else {
                break;
            };
            if frame.pending.front() == Some(&current) {
                frame.pending.pop_front();
                if emission == Emission::Delete {
                    self.detach(current, source);
                }
            }
        }

        self.frames.truncate(depth);
    }

    fn dispatch(
        &mut self,
        subscriber: SubscriberId,
        source: ElementId,
        emission: Emission,
        meta: &Meta,
    ) {
        trace!(
            "event=dispatch module=dispatch subscriber={subscriber} source={source} emission={emission:?} code={:?}",
            meta.code
        );
        match subscriber {
            SubscriberId::Way(way) => self.handle_for_way(way, source, emission, meta),
            SubscriberId::Relation(relation) => {
                self.handle_for_relation(relation, source, emission, meta)
            }
            SubscriberId::Registry(registry) => {
                self.handle_for_registry(registry, source, emission, meta)
            }
            SubscriberId::Observer(id) => {
                let Some(observer) = self.observers.get(&id).cloned() else {
                    return;
                };
                match (emission, source) {
                    (Emission::Update, ElementId::Node(node)) => {
                        observer.on_update_node(self, node, meta)
                    }
                    (Emission::Update, ElementId::Way(way)) => {
                        observer.on_update_way(self, way, meta)
                    }
                    (Emission::Update, ElementId::Relation(relation)) => {
                        observer.on_update_relation(self, relation, meta)
                    }
                    (Emission::Delete, ElementId::Node(node)) => {
                        observer.on_delete_node(self, node, meta)
                    }
                    (Emission::Delete, ElementId::Way(way)) => {
                        observer.on_delete_way(self, way, meta)
                    }
                    (Emission::Delete, ElementId::Relation(relation)) => {
                        observer.on_delete_relation(self, relation, meta)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Subscriber;
    use crate::graph::Graph;
    use crate::model::ids::{NodeId, RelationId, WayId};
    use crate::model::meta::Meta;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counter {
        updates: Cell<usize>,
        deletes: Cell<usize>,
    }

    impl Subscriber for Counter {
        fn on_update_node(&self, _: &mut Graph, _: NodeId, _: &Meta) {
            self.updates.set(self.updates.get() + 1);
        }
        fn on_update_way(&self, _: &mut Graph, _: WayId, _: &Meta) {
            self.updates.set(self.updates.get() + 1);
        }
        fn on_update_relation(&self, _: &mut Graph, _: RelationId, _: &Meta) {
            self.updates.set(self.updates.get() + 1);
        }
        fn on_delete_node(&self, _: &mut Graph, _: NodeId, _: &Meta) {
            self.deletes.set(self.deletes.get() + 1);
        }
        fn on_delete_way(&self, _: &mut Graph, _: WayId, _: &Meta) {
            self.deletes.set(self.deletes.get() + 1);
        }
        fn on_delete_relation(&self, _: &mut Graph, _: RelationId, _: &Meta) {
            self.deletes.set(self.deletes.get() + 1);
        }
    }

    #[test]
    fn subscribe_is_idempotent() {
        let mut graph = Graph::new();
        let node = graph.create_node(0.0, 0.0);
        let counter = Rc::new(Counter::default());
        let observer = graph.add_observer(counter.clone());

        assert!(graph.subscribe(observer, node));
        assert!(!graph.subscribe(observer, node));
        assert_eq!(graph.core(node).unwrap().subscriber_count(), 1);

        graph.set_lat(node, 3.0);
        assert_eq!(counter.updates.get(), 1);
    }

    #[test]
    fn delete_detaches_every_subscriber() {
        let mut graph = Graph::new();
        let node = graph.create_node(0.0, 0.0);
        let counter = Rc::new(Counter::default());
        let observer = graph.add_observer(counter.clone());
        graph.subscribe(observer, node);

        graph.destroy(node);
        assert_eq!(counter.deletes.get(), 1);
        assert_eq!(graph.subscriptions_of(observer.into()).count(), 0);
    }

    #[test]
    fn removed_observer_loses_subscriptions() {
        let mut graph = Graph::new();
        let node = graph.create_node(0.0, 0.0);
        let counter = Rc::new(Counter::default());
        let observer = graph.add_observer(counter.clone());
        graph.subscribe(observer, node);

        assert!(graph.remove_observer(observer).is_some());
        graph.set_lon(node, 1.0);
        assert_eq!(counter.updates.get(), 0);
        assert!(!graph.subscribe(observer, node));
    }

    #[test]
    fn subscribe_to_missing_element_is_a_no_op() {
        let mut graph = Graph::new();
        let node = graph.create_node(0.0, 0.0);
        graph.destroy(node);
        let observer = graph.add_observer(Rc::new(Counter::default()));
        assert!(!graph.subscribe(observer, node));
        assert!(!graph.unsubscribe(observer, node));
    }
}
