//! State shared by every element kind.
//!
//! # Responsibility
//! - Hold identity, free-form attributes/tags and the validity flag.
//! - Keep the ordered, duplicate-free subscriber set of one element.
//!
//! # Invariants
//! - The `"id"` attribute always mirrors `external_id` and is read-only.
//! - `element_subscriber_count` equals the number of element subscribers in
//!   the subscriber set.
//! - Validity is sticky: only an explicit `set_valid(true)` clears it.

use crate::model::ids::{
    claim_external_id, next_placeholder_id, ElementId, ElementKind, InnerId, OsmId, SubscriberId,
};
use indexmap::IndexSet;
use std::collections::BTreeMap;

/// Reserved attribute key mirroring the external id.
pub const ID_ATTR: &str = "id";

#[derive(Debug, Clone)]
pub struct ElementCore {
    inner_id: InnerId,
    external_id: OsmId,
    attributes: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    valid: bool,
    subscribers: IndexSet<SubscriberId>,
    element_subscribers: usize,
}

impl ElementCore {
    /// Creates core state; `None` assigns the next placeholder id.
    pub(crate) fn new(inner_id: InnerId, external_id: Option<OsmId>) -> Self {
        let external_id = match external_id {
            Some(id) => claim_external_id(id),
            None => next_placeholder_id(),
        };
        let mut attributes = BTreeMap::new();
        attributes.insert(ID_ATTR.to_string(), external_id.to_string());
        Self {
            inner_id,
            external_id,
            attributes,
            tags: BTreeMap::new(),
            valid: true,
            subscribers: IndexSet::new(),
            element_subscribers: 0,
        }
    }

    pub fn inner_id(&self) -> InnerId {
        self.inner_id
    }

    pub fn external_id(&self) -> OsmId {
        self.external_id
    }

    pub(crate) fn set_external_id(&mut self, external_id: OsmId) {
        self.external_id = claim_external_id(external_id);
        self.attributes
            .insert(ID_ATTR.to_string(), external_id.to_string());
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Sets one attribute. Returns `false` for the reserved `"id"` key.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if key == ID_ATTR {
            return false;
        }
        self.attributes.insert(key, value.into());
        true
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn remove_tag(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Overrides the validity flag. The engine itself only ever clears it.
    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// Subscribers in subscription order.
    pub fn subscribers(&self) -> impl Iterator<Item = SubscriberId> + '_ {
        self.subscribers.iter().copied()
    }

    pub fn has_subscriber(&self, subscriber: SubscriberId) -> bool {
        self.subscribers.contains(&subscriber)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of subscribers that are graph elements (ways, relations).
    pub fn element_subscriber_count(&self) -> usize {
        self.element_subscribers
    }

    pub(crate) fn add_subscriber(&mut self, subscriber: SubscriberId) -> bool {
        if !self.subscribers.insert(subscriber) {
            return false;
        }
        if subscriber.is_element() {
            self.element_subscribers += 1;
        }
        true
    }

    pub(crate) fn remove_subscriber(&mut self, subscriber: SubscriberId) -> bool {
        if !self.subscribers.shift_remove(&subscriber) {
            return false;
        }
        if subscriber.is_element() {
            self.element_subscribers -= 1;
        }
        true
    }
}

/// Capability set shared by nodes, ways and relations.
pub trait Element {
    fn core(&self) -> &ElementCore;

    fn element_id(&self) -> ElementId;

    fn kind(&self) -> ElementKind {
        self.element_id().kind()
    }

    fn external_id(&self) -> OsmId {
        self.core().external_id()
    }

    fn inner_id(&self) -> InnerId {
        self.core().inner_id()
    }

    fn is_valid(&self) -> bool {
        self.core().is_valid()
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.core().tag(key)
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.core().attr(key)
    }
}
