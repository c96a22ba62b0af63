//! Nullifier registry: prevents the same secret from settling twice.
//!
//! Like a spent-output set: each nullifier can be inserted exactly once.
//! Attempting to insert it again returns [`ShroudError::NullifierReused`].
//!
//! Unlike a bounded idempotency cache, nothing is ever evicted. A
//! nullifier that could be forgotten could be replayed.

use std::collections::HashSet;

use shroud_types::{Nullifier, Result, ShroudError};

/// Append-only set of consumed nullifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullifierRegistry {
    /// Membership index.
    spent: HashSet<Nullifier>,
    /// Insertion order, for audit export.
    log: Vec<Nullifier>,
}

impl NullifierRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a nullifier.
    ///
    /// # Errors
    /// Returns [`ShroudError::NullifierReused`] if `nullifier` is already
    /// in the registry.
    pub fn insert(&mut self, nullifier: Nullifier) -> Result<()> {
        if !self.spent.insert(nullifier) {
            tracing::warn!(nullifier = %nullifier, "nullifier replay rejected");
            return Err(ShroudError::NullifierReused(nullifier));
        }
        self.log.push(nullifier);
        Ok(())
    }

    /// Fail with [`ShroudError::NullifierReused`] if already consumed,
    /// without inserting.
    pub fn ensure_unused(&self, nullifier: &Nullifier) -> Result<()> {
        if self.contains(nullifier) {
            tracing::warn!(nullifier = %nullifier, "nullifier replay rejected");
            return Err(ShroudError::NullifierReused(*nullifier));
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, nullifier: &Nullifier) -> bool {
        self.spent.contains(nullifier)
    }

    /// Consumed nullifiers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Nullifier> {
        self.log.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
