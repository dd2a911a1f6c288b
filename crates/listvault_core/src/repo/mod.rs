//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence-gateway contract consumed by the service layer.
//! - Isolate SQLite query details from reconciliation/business orchestration.
//!
//! # Invariants
//! - Write paths validate model invariants before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateName`) in
//!   addition to DB transport errors.

pub mod list_repo;
