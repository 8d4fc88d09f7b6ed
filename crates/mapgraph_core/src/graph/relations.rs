//! Relation membership edits and reactions to member events.
//!
//! # Invariants
//! - Membership cycles are rejected before insertion, so update
//!   propagation through nested relations always terminates.
//! - Invalid members taint the relation; nothing clears the taint.

use super::dispatch::Emission;
use super::Graph;
use crate::model::ids::{ElementId, RelationId, SubscriberId};
use crate::model::meta::{EventCode, Meta};
use log::warn;
use std::collections::HashSet;

impl Graph {
    /// Adds a member with a role (`""` for none).
    ///
    /// Missing members, the relation itself and members that would close a
    /// cycle mark the relation invalid and change nothing else. Existing
    /// members are left untouched.
    pub fn add_member(
        &mut self,
        relation: RelationId,
        member: impl Into<ElementId>,
        role: impl Into<String>,
    ) -> bool {
        let member = member.into();
        if !self.is_alive(relation) {
            return false;
        }
        let reason = if !self.is_alive(member) {
            Some("missing_member")
        } else if member == ElementId::Relation(relation) {
            Some("self_membership")
        } else if self.would_create_cycle(relation, member) {
            Some("cycle")
        } else {
            None
        };
        if let Some(reason) = reason {
            warn!(
                "event=relation_add module=graph status=rejected relation={relation} member={member} reason={reason}"
            );
            self.invalidate(relation);
            return false;
        }

        let member_valid = self.is_valid(member);
        let Some(target) = self.relations.get_mut(&relation) else {
            return false;
        };
        if !target.insert(member, role.into()) {
            return false;
        }
        if !member_valid {
            target.core.set_valid(false);
        }

        self.attach(SubscriberId::Relation(relation), member);
        self.emit_update(
            relation,
            Meta::new(EventCode::added(member.kind())).with_subject(member),
        );
        true
    }

    /// Removes a member. Announces the removal only when it was a member.
    pub fn remove_member(&mut self, relation: RelationId, member: impl Into<ElementId>) -> bool {
        let member = member.into();
        if !self.is_alive(relation) {
            return false;
        }
        let removed = self
            .relations
            .get_mut(&relation)
            .is_some_and(|target| target.remove(member));
        if !removed {
            return false;
        }

        self.emit_update(
            relation,
            Meta::new(EventCode::deleted(member.kind())).with_subject(member),
        );
        self.detach(SubscriberId::Relation(relation), member);
        true
    }

    /// Changes the role of a current member. Announces `RoleSet`.
    pub fn set_role(
        &mut self,
        relation: RelationId,
        member: impl Into<ElementId>,
        role: impl Into<String>,
    ) -> bool {
        let member = member.into();
        if !self.is_alive(relation) {
            return false;
        }
        let changed = self
            .relations
            .get_mut(&relation)
            .is_some_and(|target| target.set_role(member, role.into()));
        if !changed {
            return false;
        }

        self.emit_update(relation, Meta::new(EventCode::RoleSet).with_subject(member));
        true
    }

    /// Whether `relation` is reachable from `candidate` through nested
    /// relation members.
    fn would_create_cycle(&self, relation: RelationId, candidate: ElementId) -> bool {
        let ElementId::Relation(start) = candidate else {
            return false;
        };
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if current == relation {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(nested) = self.relation(current) {
                stack.extend(nested.relations().iter().copied());
            }
        }
        false
    }

    pub(super) fn handle_for_relation(
        &mut self,
        relation: RelationId,
        source: ElementId,
        emission: Emission,
        _meta: &Meta,
    ) {
        if !self.is_alive(relation) {
            return;
        }

        match emission {
            Emission::Update => {
                if !self.is_valid(source) {
                    self.invalidate(relation);
                }
                self.emit_update(
                    relation,
                    Meta::new(EventCode::updated(source.kind())).with_subject(source),
                );
            }
            Emission::Delete => {
                let removed = self
                    .relations
                    .get_mut(&relation)
                    .is_some_and(|target| target.remove(source));
                if removed {
                    self.emit_update(
                        relation,
                        Meta::new(EventCode::deleted(source.kind())).with_subject(source),
                    );
                }
            }
        }
    }
}
