//! Error types for the Shroud protocol.
//!
//! All errors use the `SH_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by category:
//! - 1xx: Validation errors
//! - 2xx: Timing errors
//! - 3xx: Replay errors
//! - 4xx: Proof errors
//! - 5xx: State errors
//! - 6xx: Funds errors
//! - 7xx: Administrative errors
//! - 9xx: General / internal errors
//!
//! Every error is terminal for the operation that raised it, and no
//! operation leaves partial state behind when it fails.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    Amount, CommitmentId, MatchCommitment, MatchId, Nullifier, OrderCommitment, OrderId,
};

/// Coarse grouping of [`ShroudError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Timing,
    Replay,
    Proof,
    State,
    Funds,
    Admin,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::Timing => write!(f, "TIMING"),
            Self::Replay => write!(f, "REPLAY"),
            Self::Proof => write!(f, "PROOF"),
            Self::State => write!(f, "STATE"),
            Self::Funds => write!(f, "FUNDS"),
            Self::Admin => write!(f, "ADMIN"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Central error enum for all Shroud operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShroudError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A commitment with this id was already submitted.
    #[error("SH_ERR_100: Duplicate commitment: {0}")]
    DuplicateCommitment(CommitmentId),

    /// Parallel batch inputs have different lengths.
    #[error("SH_ERR_101: Arity mismatch: {field} has {actual} entries, expected {expected}")]
    ArityMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Trade amount is below the configured minimum.
    #[error("SH_ERR_102: Amount too small: {amount} < minimum {minimum}")]
    AmountTooSmall { amount: Amount, minimum: Amount },

    /// Zero or otherwise unusable amount for a custody operation.
    #[error("SH_ERR_103: Invalid amount")]
    InvalidAmount,

    /// An order with this id already exists.
    #[error("SH_ERR_104: Duplicate order: {0}")]
    DuplicateOrder(OrderId),

    // =================================================================
    // Timing Errors (2xx)
    // =================================================================
    /// The commit → reveal maturation window has not elapsed yet.
    #[error("SH_ERR_200: Phase not elapsed for {id}: reveal allowed at {deadline}, now {now}")]
    PhaseNotElapsed {
        id: CommitmentId,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    // =================================================================
    // Replay Errors (3xx)
    // =================================================================
    /// Nullifier already consumed (double-settlement attempt).
    #[error("SH_ERR_300: Nullifier already used: {0}")]
    NullifierReused(Nullifier),

    /// The order commitment was already consumed by another order.
    #[error("SH_ERR_301: Order commitment already used: {0}")]
    CommitmentAlreadyUsed(OrderCommitment),

    /// A match with this id already exists.
    #[error("SH_ERR_302: Duplicate match: {0}")]
    DuplicateMatch(MatchId),

    // =================================================================
    // Proof Errors (4xx)
    // =================================================================
    /// The reveal proof did not verify against the commitment.
    #[error("SH_ERR_400: Invalid reveal proof for {0}")]
    InvalidProof(CommitmentId),

    /// The matching proof did not verify against the match commitment.
    #[error("SH_ERR_401: Invalid match proof for {0}")]
    InvalidMatchProof(MatchCommitment),

    /// The execution proof did not verify against the match id.
    #[error("SH_ERR_402: Invalid execution proof for {0}")]
    InvalidExecutionProof(MatchId),

    // =================================================================
    // State Errors (5xx)
    // =================================================================
    /// No commitment with this id.
    #[error("SH_ERR_500: Commitment not found: {0}")]
    CommitmentNotFound(CommitmentId),

    /// The commitment has already been revealed and settled.
    #[error("SH_ERR_501: Commitment already executed: {0}")]
    AlreadyExecuted(CommitmentId),

    /// No order with this id.
    #[error("SH_ERR_502: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Order is filled or on the wrong side for the requested operation.
    #[error("SH_ERR_503: Order not active: {0}")]
    OrderNotActive(OrderId),

    /// No match with this id.
    #[error("SH_ERR_504: Match not found: {0}")]
    MatchNotFound(MatchId),

    /// The match has already been executed.
    #[error("SH_ERR_505: Match already executed: {0}")]
    MatchAlreadyExecuted(MatchId),

    // =================================================================
    // Funds Errors (6xx)
    // =================================================================
    /// Custodial balance too low.
    #[error("SH_ERR_600: Insufficient {asset} balance: need {needed}, have {available}")]
    InsufficientBalance {
        asset: String,
        needed: Amount,
        available: Amount,
    },

    /// Protocol custody cannot cover an outgoing transfer.
    #[error("SH_ERR_601: Insufficient {asset} custody: need {needed}, have {available}")]
    InsufficientCustodyBalance {
        asset: String,
        needed: Amount,
        available: Amount,
    },

    /// The external wallet has not approved (or does not hold) enough tokens.
    #[error("SH_ERR_602: Insufficient {asset} allowance: need {needed}, have {available}")]
    InsufficientAllowance {
        asset: String,
        needed: Amount,
        available: Amount,
    },

    // =================================================================
    // Administrative Errors (7xx)
    // =================================================================
    /// Mutating entry points are disabled while paused.
    #[error("SH_ERR_700: Protocol is paused")]
    Paused,

    #[error("SH_ERR_701: Protocol is already paused")]
    AlreadyPaused,

    #[error("SH_ERR_702: Protocol is not paused")]
    NotPaused,

    /// Settlement was entered while another settlement was in progress.
    #[error("SH_ERR_703: Reentrant settlement rejected")]
    Reentrancy,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Fixed-point arithmetic result does not fit.
    #[error("SH_ERR_900: Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: &'static str },

    /// Supply conservation invariant violated. Critical safety alert.
    #[error("SH_ERR_901: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("SH_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("SH_ERR_903: Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("SH_ERR_904: I/O error: {0}")]
    Io(String),
}

impl ShroudError {
    /// The taxonomy group this error belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateCommitment(_)
            | Self::ArityMismatch { .. }
            | Self::AmountTooSmall { .. }
            | Self::InvalidAmount
            | Self::DuplicateOrder(_) => ErrorCategory::Validation,
            Self::PhaseNotElapsed { .. } => ErrorCategory::Timing,
            Self::NullifierReused(_) | Self::CommitmentAlreadyUsed(_) | Self::DuplicateMatch(_) => {
                ErrorCategory::Replay
            }
            Self::InvalidProof(_) | Self::InvalidMatchProof(_) | Self::InvalidExecutionProof(_) => {
                ErrorCategory::Proof
            }
            Self::CommitmentNotFound(_)
            | Self::AlreadyExecuted(_)
            | Self::OrderNotFound(_)
            | Self::OrderNotActive(_)
            | Self::MatchNotFound(_)
            | Self::MatchAlreadyExecuted(_) => ErrorCategory::State,
            Self::InsufficientBalance { .. }
            | Self::InsufficientCustodyBalance { .. }
            | Self::InsufficientAllowance { .. } => ErrorCategory::Funds,
            Self::Paused | Self::AlreadyPaused | Self::NotPaused | Self::Reentrancy => {
                ErrorCategory::Admin
            }
            Self::ArithmeticOverflow { .. }
            | Self::SupplyInvariantViolation { .. }
            | Self::Configuration(_)
            | Self::Serialization(_)
            | Self::Io(_) => ErrorCategory::Internal,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ShroudError>;

impl From<std::io::Error> for ShroudError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ShroudError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
