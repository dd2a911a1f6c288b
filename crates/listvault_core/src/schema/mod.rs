//! Item schema registry and structural validation.
//!
//! # Responsibility
//! - Map an item's declared `type` tag to its validation schema.
//! - Validate item payloads before any persistence call.
//!
//! # Invariants
//! - The registry is built once at startup and never mutated.
//! - Unknown or absent type tags resolve to the generic fallback schema.

pub mod registry;
pub mod validator;
