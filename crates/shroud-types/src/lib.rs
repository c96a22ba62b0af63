//! # shroud-types
//!
//! Shared types, errors, and configuration for the **Shroud** commit-reveal
//! trading protocol.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`CommitmentId`], [`Nullifier`], [`AccountId`], [`OrderId`],
//!   [`OrderCommitment`], [`MatchCommitment`], [`MatchId`], [`AssetPair`]
//! - **Commit-reveal model**: [`TradeCommitment`], [`CommitmentPhase`]
//! - **Private order model**: [`PrivateOrder`], [`OrderMatch`], [`OrderSide`]
//! - **Proof oracle**: [`Proof`], [`PublicInputs`], [`ProofVerifier`]
//! - **Settlement output**: [`SettlementReceipt`], [`MatchSettlement`]
//! - **Audit trail**: [`ProtocolEvent`]
//! - **Configuration**: [`ProtocolConfig`]
//! - **Errors**: [`ShroudError`] with `SH_ERR_` prefix codes
//! - **Constants**: fixed-point scale, fee denominator, defaults

pub mod balance;
pub mod commitment;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod proof;
pub mod receipt;

// Re-export all primary types at crate root for ergonomic imports:
//   use shroud_types::{CommitmentId, Nullifier, TradeCommitment, ...};

pub use balance::*;
pub use commitment::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use proof::*;
pub use receipt::*;

// Constants are accessed via `shroud_types::constants::FOO`
// (not re-exported to avoid name collisions).
