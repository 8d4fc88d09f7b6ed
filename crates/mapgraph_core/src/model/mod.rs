//! Element data model.
//!
//! # Responsibility
//! - Define element identity, shared element state and the three element
//!   kinds.
//! - Define the event descriptor delivered to subscribers.
//!
//! # Invariants
//! - Elements refer to each other only by typed id, never by reference.
//! - Structural mutation goes through [`crate::Graph`] so that every change
//!   is announced to subscribers.

pub mod element;
pub mod ids;
pub mod meta;
pub mod node;
pub mod relation;
pub mod way;
