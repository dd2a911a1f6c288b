//! Domain model for owner-scoped user lists.
//!
//! # Responsibility
//! - Define the canonical list record persisted by the core.
//! - Keep access-descriptor and timestamp semantics in one place.
//!
//! # Invariants
//! - Every stored list is identified by a stable `ListId`.
//! - (`creator`, `name`) is unique across all stored lists.
//! - Deletion is hard delete; ids are never reused.

pub mod list;
