//! Commitment store.
//!
//! Sole owner of [`TradeCommitment`] records and their one-way
//! `executed` transition.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use shroud_types::{
    AccountId, CommitmentId, CommitmentPhase, Nullifier, Result, ShroudError, TradeCommitment,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitmentStore {
    commitments: HashMap<CommitmentId, TradeCommitment>,
}

impl CommitmentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new commitment created at `now`.
    ///
    /// # Errors
    /// [`ShroudError::DuplicateCommitment`] if `id` exists. The existing
    /// record is left as it was.
    pub fn submit(
        &mut self,
        id: CommitmentId,
        creator: AccountId,
        now: DateTime<Utc>,
        phase_duration: TimeDelta,
    ) -> Result<&TradeCommitment> {
        if self.commitments.contains_key(&id) {
            return Err(ShroudError::DuplicateCommitment(id));
        }
        Ok(self
            .commitments
            .entry(id)
            .or_insert_with(|| TradeCommitment::new(id, creator, now, phase_duration)))
    }

    #[must_use]
    pub fn get(&self, id: &CommitmentId) -> Option<&TradeCommitment> {
        self.commitments.get(id)
    }

    /// Look up `id` and check it would accept a reveal at `now`.
    pub fn ensure_revealable(&self, id: &CommitmentId, now: DateTime<Utc>) -> Result<&TradeCommitment> {
        let commitment = self
            .commitments
            .get(id)
            .ok_or(ShroudError::CommitmentNotFound(*id))?;
        commitment.ensure_revealable(now)?;
        Ok(commitment)
    }

    pub fn mark_executed(&mut self, id: &CommitmentId, nullifier: Nullifier) -> Result<()> {
        self.commitments
            .get_mut(id)
            .ok_or(ShroudError::CommitmentNotFound(*id))?
            .mark_executed(nullifier)
    }

    /// Phase of `id` at `now`, or `None` if unknown.
    #[must_use]
    pub fn phase(&self, id: &CommitmentId, now: DateTime<Utc>) -> Option<CommitmentPhase> {
        self.commitments.get(id).map(|c| c.phase_at(now))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commitments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commitments.is_empty()
    }
}
