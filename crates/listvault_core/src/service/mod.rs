//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - Validation and capacity gates always run before any write.
//! - Every public operation authorizes before touching list data.

pub mod capacity;
pub mod changeset;
pub mod list_service;
pub mod reconciler;
