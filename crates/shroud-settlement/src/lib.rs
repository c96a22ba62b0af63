//! # shroud-settlement
//!
//! **Settlement plane**: replay prevention, custodial balances, and the
//! fixed-point swap arithmetic that moves them.
//!
//! ## Architecture
//!
//! The lifecycle façade hands every accepted reveal to the
//! [`SettlementEngine`], which:
//! 1. Enters the non-reentrant [`SettlementLock`]
//! 2. Computes `quote = amount * price / SCALE` and `fee = quote * bps / 10_000`
//! 3. Validates balances and pending credits before touching anything
//! 4. Moves base tokens through the external [`TokenLedger`]
//! 5. Applies the quote deltas to the [`BalanceLedger`] and fee recipient
//! 6. Records issuance / redemption for [`SupplyConservation`]
//!
//! The [`NullifierRegistry`] lives here too: it is consulted before
//! settlement and appended to only after settlement succeeded.

pub mod engine;
pub mod fixed_point;
pub mod ledger;
pub mod nullifier;
pub mod settlement_lock;
pub mod supply_conservation;
pub mod token_ledger;

pub use engine::SettlementEngine;
pub use fixed_point::SettlementQuote;
pub use ledger::BalanceLedger;
pub use nullifier::NullifierRegistry;
pub use settlement_lock::SettlementLock;
pub use supply_conservation::{FlowKind, SupplyConservation};
pub use token_ledger::{InMemoryTokenLedger, TokenLedger};
