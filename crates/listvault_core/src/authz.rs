//! Authorization seam and resource-path conventions.
//!
//! # Responsibility
//! - Define the policy-engine contract consumed before any data access.
//! - Own the `/users/{owner}/user-data-library` resource-path convention.
//!
//! # Invariants
//! - An explicit deny and an unreachable policy engine stay distinguishable
//!   all the way to the caller.
//! - Core code never retries a failed authorization check.

use crate::model::list::ListId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Access method requested against a resource path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMethod {
    Create,
    Read,
    Update,
    Delete,
}

impl AccessMethod {
    /// Stable string id used in policy requests and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for AccessMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when the policy engine cannot be consulted at all.
///
/// This is deliberately not the same thing as an explicit deny, which the
/// `Authorizer` reports as `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzUnreachable {
    /// Transport-level detail from the policy client.
    pub detail: String,
}

impl Display for AuthzUnreachable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "policy engine unreachable: {}", self.detail)
    }
}

impl Error for AuthzUnreachable {}

/// Policy-engine contract consumed by the service layer.
///
/// Implementations wrap whatever wire protocol the deployment uses; the core
/// only needs the decision.
pub trait Authorizer {
    /// Returns whether `user` may perform `method` on `resource`.
    ///
    /// `Ok(false)` is an explicit deny. `Err(_)` means no decision could be
    /// obtained and must never be treated as a deny or a grant.
    fn authorize(
        &self,
        user: &str,
        method: AccessMethod,
        resource: &str,
    ) -> Result<bool, AuthzUnreachable>;
}

/// Local policy granting a user access to their own subtree only.
///
/// Stands in for the external policy engine in the CLI probe and tests; a
/// deployment substitutes its own `Authorizer` implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerPolicy;

impl Authorizer for OwnerPolicy {
    fn authorize(
        &self,
        user: &str,
        _method: AccessMethod,
        resource: &str,
    ) -> Result<bool, AuthzUnreachable> {
        let prefix = user_library_path(user);
        Ok(resource == prefix || resource.starts_with(&format!("{prefix}/")))
    }
}

/// Root of one user's data-library subtree.
pub fn user_library_path(owner: &str) -> String {
    format!("/users/{owner}/user-data-library")
}

/// Collection path guarding list creation and bulk operations.
pub fn lists_collection_path(owner: &str) -> String {
    format!("/users/{owner}/user-data-library/lists")
}

/// Id-scoped path guarding one stored list.
pub fn list_resource_path(owner: &str, id: ListId) -> String {
    format!("/users/{owner}/user-data-library/lists/{id}")
}
