//! Capacity guard over per-owner list and per-list item ceilings.
//!
//! # Responsibility
//! - Enforce `max_lists` and `max_list_items` bounds as pure count checks.
//!
//! # Invariants
//! - These functions never fetch data; callers supply just-fetched counts.
//! - A failed check carries every count involved for diagnostics.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Capacity bound violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    /// Creating `incoming` lists would push the owner past `max_lists`.
    TooManyLists {
        existing: usize,
        incoming: usize,
        max_lists: usize,
    },
    /// The proposed item set exceeds `max_list_items`.
    TooManyItems {
        current: usize,
        proposed: usize,
        max_list_items: usize,
    },
}

impl Display for CapacityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyLists {
                existing,
                incoming,
                max_lists,
            } => write!(
                f,
                "owner has {existing} lists and submitted {incoming} new; limit is {max_lists}"
            ),
            Self::TooManyItems {
                current,
                proposed,
                max_list_items,
            } => write!(
                f,
                "list would grow from {current} to {proposed} items; limit is {max_list_items}"
            ),
        }
    }
}

impl Error for CapacityError {}

/// Checks the per-owner list ceiling for a batch about to create new lists.
///
/// `existing` must be the owner's just-fetched stored count so concurrent
/// batches cannot widen the stale-read window further than storage allows.
pub fn check_list_count(
    existing: usize,
    incoming: usize,
    max_lists: usize,
) -> Result<(), CapacityError> {
    if existing + incoming > max_lists {
        return Err(CapacityError::TooManyLists {
            existing,
            incoming,
            max_lists,
        });
    }
    Ok(())
}

/// Checks the per-list item ceiling against a proposed full item count.
///
/// `current` is the record's stored count (0 for creates); `proposed` is the
/// complete desired count after the operation, not a delta.
pub fn check_item_count(
    current: usize,
    proposed: usize,
    max_list_items: usize,
) -> Result<(), CapacityError> {
    if proposed > max_list_items {
        return Err(CapacityError::TooManyItems {
            current,
            proposed,
            max_list_items,
        });
    }
    Ok(())
}
