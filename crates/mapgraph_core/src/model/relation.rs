//! Role-tagged grouping element.
//!
//! # Responsibility
//! - Hold distinct node/way/relation members in insertion order.
//! - Map member internal ids to role strings.
//!
//! # Invariants
//! - A member appears at most once in its kind-specific sequence.
//! - A role entry exists only for a current member.
//! - A relation never contains itself, directly or through nested members
//!   (enforced by the graph before insertion).

use crate::model::element::{Element, ElementCore};
use crate::model::ids::{ElementId, InnerId, NodeId, RelationId, WayId};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Relation {
    pub(crate) id: RelationId,
    pub(crate) core: ElementCore,
    nodes: Vec<NodeId>,
    ways: Vec<WayId>,
    relations: Vec<RelationId>,
    roles: HashMap<InnerId, String>,
}

impl Relation {
    pub(crate) fn new(id: RelationId, core: ElementCore) -> Self {
        Self {
            id,
            core,
            nodes: Vec::new(),
            ways: Vec::new(),
            relations: Vec::new(),
            roles: HashMap::new(),
        }
    }

    pub fn id(&self) -> RelationId {
        self.id
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn ways(&self) -> &[WayId] {
        &self.ways
    }

    pub fn relations(&self) -> &[RelationId] {
        &self.relations
    }

    /// All members, nodes first, then ways, then relations.
    pub fn members(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.nodes
            .iter()
            .copied()
            .map(ElementId::Node)
            .chain(self.ways.iter().copied().map(ElementId::Way))
            .chain(self.relations.iter().copied().map(ElementId::Relation))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Total member count across all kinds.
    pub fn size(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len()
    }

    pub fn has(&self, member: ElementId) -> bool {
        match member {
            ElementId::Node(id) => self.nodes.contains(&id),
            ElementId::Way(id) => self.ways.contains(&id),
            ElementId::Relation(id) => self.relations.contains(&id),
        }
    }

    /// Role of a current member. Members added without a role report `""`.
    pub fn role(&self, member: ElementId) -> Option<&str> {
        if !self.has(member) {
            return None;
        }
        Some(
            self.roles
                .get(&member.inner())
                .map(String::as_str)
                .unwrap_or(""),
        )
    }

    /// Appends a member. Returns `false` when it is already present.
    pub(crate) fn insert(&mut self, member: ElementId, role: String) -> bool {
        if self.has(member) {
            return false;
        }
        match member {
            ElementId::Node(id) => self.nodes.push(id),
            ElementId::Way(id) => self.ways.push(id),
            ElementId::Relation(id) => self.relations.push(id),
        }
        if !role.is_empty() {
            self.roles.insert(member.inner(), role);
        }
        true
    }

    /// Drops a member and its role. Returns `false` when it was absent.
    pub(crate) fn remove(&mut self, member: ElementId) -> bool {
        let before = self.size();
        match member {
            ElementId::Node(id) => self.nodes.retain(|current| *current != id),
            ElementId::Way(id) => self.ways.retain(|current| *current != id),
            ElementId::Relation(id) => self.relations.retain(|current| *current != id),
        }
        self.roles.remove(&member.inner());
        self.size() != before
    }

    pub(crate) fn set_role(&mut self, member: ElementId, role: String) -> bool {
        if !self.has(member) {
            return false;
        }
        if role.is_empty() {
            self.roles.remove(&member.inner());
        } else {
            self.roles.insert(member.inner(), role);
        }
        true
    }

    pub(crate) fn role_keys(&self) -> impl Iterator<Item = InnerId> + '_ {
        self.roles.keys().copied()
    }
}

impl Element for Relation {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn element_id(&self) -> ElementId {
        ElementId::Relation(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::Relation;
    use crate::model::element::ElementCore;
    use crate::model::ids::{ElementId, NodeId, RelationId, WayId};

    fn relation() -> Relation {
        Relation::new(RelationId(900), ElementCore::new(900, None))
    }

    #[test]
    fn members_are_distinct_per_kind() {
        let mut relation = relation();
        assert!(relation.insert(ElementId::Node(NodeId(1)), "stop".to_string()));
        assert!(!relation.insert(ElementId::Node(NodeId(1)), "other".to_string()));
        assert!(relation.insert(ElementId::Way(WayId(2)), String::new()));
        assert!(relation.insert(ElementId::Relation(RelationId(3)), "sub".to_string()));

        assert_eq!(relation.size(), 3);
        assert_eq!(relation.role(ElementId::Node(NodeId(1))), Some("stop"));
        assert_eq!(relation.role(ElementId::Way(WayId(2))), Some(""));
        assert_eq!(relation.role(ElementId::Way(WayId(9))), None);

        let members: Vec<_> = relation.members().collect();
        assert_eq!(members[0], ElementId::Node(NodeId(1)));
        assert_eq!(members[2], ElementId::Relation(RelationId(3)));
    }

    #[test]
    fn remove_clears_role_and_reports_membership() {
        let mut relation = relation();
        relation.insert(ElementId::Node(NodeId(1)), "stop".to_string());
        assert!(relation.remove(ElementId::Node(NodeId(1))));
        assert!(!relation.remove(ElementId::Node(NodeId(1))));
        assert_eq!(relation.role_keys().count(), 0);
        assert_eq!(relation.size(), 0);
    }

    #[test]
    fn set_role_only_applies_to_members() {
        let mut relation = relation();
        assert!(!relation.set_role(ElementId::Way(WayId(4)), "outer".to_string()));
        relation.insert(ElementId::Way(WayId(4)), String::new());
        assert!(relation.set_role(ElementId::Way(WayId(4)), "outer".to_string()));
        assert_eq!(relation.role(ElementId::Way(WayId(4))), Some("outer"));
    }
}
