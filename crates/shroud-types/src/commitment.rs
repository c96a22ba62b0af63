//! # TradeCommitment: the commit-reveal primitive
//!
//! A trader first publishes only the hash of their trade parameters. After
//! the maturation window has elapsed they reveal the parameters together
//! with a proof and a one-time nullifier, and the trade settles.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  phase elapses  ┌───────┐  valid reveal  ┌──────────┐
//!   │ CREATED ├────────────────▶│ READY ├───────────────▶│ EXECUTED │
//!   └─────────┘                 └───────┘                └──────────┘
//! ```
//!
//! `Created → Ready` is purely a function of time; only `Ready → Executed`
//! mutates the record, and it happens at most once.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, CommitmentId, Nullifier, Result, ShroudError};

/// Where a commitment is in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommitmentPhase {
    /// Submitted; the maturation window is still running.
    Created,
    /// Window elapsed; a reveal may now settle it.
    Ready,
    /// Revealed and settled. Terminal.
    Executed,
}

impl std::fmt::Display for CommitmentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Ready => write!(f, "READY"),
            Self::Executed => write!(f, "EXECUTED"),
        }
    }
}

/// A submitted trade commitment.
///
/// `nullifier` is `Some` if and only if `executed` is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCommitment {
    pub id: CommitmentId,
    pub creator: AccountId,
    pub created_at: DateTime<Utc>,
    /// Earliest instant a reveal is accepted.
    pub phase_deadline: DateTime<Utc>,
    pub executed: bool,
    pub nullifier: Option<Nullifier>,
}

impl TradeCommitment {
    /// New commitment in the `Created` phase.
    #[must_use]
    pub fn new(
        id: CommitmentId,
        creator: AccountId,
        created_at: DateTime<Utc>,
        phase_duration: TimeDelta,
    ) -> Self {
        let phase_deadline = created_at
            .checked_add_signed(phase_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            id,
            creator,
            created_at,
            phase_deadline,
            executed: false,
            nullifier: None,
        }
    }

    /// Phase at `now`.
    #[must_use]
    pub fn phase_at(&self, now: DateTime<Utc>) -> CommitmentPhase {
        if self.executed {
            CommitmentPhase::Executed
        } else if now >= self.phase_deadline {
            CommitmentPhase::Ready
        } else {
            CommitmentPhase::Created
        }
    }

    /// Check that a reveal at `now` would be accepted by the timing gate.
    pub fn ensure_revealable(&self, now: DateTime<Utc>) -> Result<()> {
        match self.phase_at(now) {
            CommitmentPhase::Executed => Err(ShroudError::AlreadyExecuted(self.id)),
            CommitmentPhase::Created => Err(ShroudError::PhaseNotElapsed {
                id: self.id,
                deadline: self.phase_deadline,
                now,
            }),
            CommitmentPhase::Ready => Ok(()),
        }
    }

    /// `Ready → Executed`, recording the nullifier that settled it.
    ///
    /// # Errors
    /// Returns [`ShroudError::AlreadyExecuted`] if the commitment was
    /// already executed.
    pub fn mark_executed(&mut self, nullifier: Nullifier) -> Result<()> {
        if self.executed {
            return Err(ShroudError::AlreadyExecuted(self.id));
        }
        self.executed = true;
        self.nullifier = Some(nullifier);
        Ok(())
    }
}
