//! Event descriptors delivered to subscribers.
//!
//! # Responsibility
//! - Define the closed set of change codes.
//! - Carry the changed subject and its sequence neighbours.
//!
//! # Invariants
//! - Fine-grained codes always fold to a generic `NodeAdded`/`NodeDeleted`.
//! - `pos` is the subject index in the new sequence for additions and in the
//!   old sequence for deletions.

use crate::model::ids::{ElementId, ElementKind};
use serde::{Deserialize, Serialize};

/// Change code carried by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCode {
    NodeAdded,
    NodeDeleted,
    NodeUpdated,
    WayAdded,
    WayDeleted,
    WayUpdated,
    RelationAdded,
    RelationDeleted,
    RelationUpdated,
    /// Node prepended to a way.
    NodeAddedFront,
    /// Node appended to a way.
    NodeAddedBack,
    /// Node inserted between two neighbours.
    NodeAddedAfter,
    NodeDeletedFront,
    NodeDeletedBack,
    NodeDeletedAfter,
    /// Member role changed inside a relation.
    RoleSet,
}

impl EventCode {
    pub fn added(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Node => Self::NodeAdded,
            ElementKind::Way => Self::WayAdded,
            ElementKind::Relation => Self::RelationAdded,
        }
    }

    pub fn deleted(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Node => Self::NodeDeleted,
            ElementKind::Way => Self::WayDeleted,
            ElementKind::Relation => Self::RelationDeleted,
        }
    }

    pub fn updated(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Node => Self::NodeUpdated,
            ElementKind::Way => Self::WayUpdated,
            ElementKind::Relation => Self::RelationUpdated,
        }
    }

    /// Folds a fine-grained sequence code to its generic counterpart.
    pub fn generic(self) -> Self {
        match self {
            Self::NodeAddedFront | Self::NodeAddedBack | Self::NodeAddedAfter => Self::NodeAdded,
            Self::NodeDeletedFront | Self::NodeDeletedBack | Self::NodeDeletedAfter => {
                Self::NodeDeleted
            }
            other => other,
        }
    }

    pub fn is_generic(self) -> bool {
        self.generic() == self
    }
}

/// Typed descriptor of one change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub code: EventCode,
    /// Element that changed.
    pub subject: Option<ElementId>,
    /// Element immediately before the subject in a sequence.
    pub prev: Option<ElementId>,
    /// Element immediately after the subject in a sequence.
    pub next: Option<ElementId>,
    pub pos: Option<usize>,
}

impl Meta {
    pub fn new(code: EventCode) -> Self {
        Self {
            code,
            subject: None,
            prev: None,
            next: None,
            pos: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<ElementId>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_neighbours(mut self, prev: Option<ElementId>, next: Option<ElementId>) -> Self {
        self.prev = prev;
        self.next = next;
        self
    }

    pub fn at(mut self, pos: usize) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn is_generic(&self) -> bool {
        self.code.is_generic()
    }
}
