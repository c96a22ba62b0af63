//! # shroud-lifecycle
//!
//! The protocol façade for **Shroud** commit-reveal trading.
//!
//! - [`TradeLifecycleController`]: every operation enters here
//! - [`CommitmentStore`]: commitment records and the `Created → Ready → Executed` machine
//! - [`BatchProcessor`] / [`RevealBatch`]: all-or-nothing multi-reveal
//! - [`PauseGuard`]: administrative circuit breaker
//!
//! ## Atomicity
//!
//! Every public operation either completes or leaves the protocol exactly
//! as it found it. Single operations get there by running all checks before
//! the first mutation; batches run against a staged clone that is swapped
//! in only when every item succeeded.
//!
//! ```text
//! submit_commitment ──▶ [CREATED] ──(phase elapses)──▶ [READY] ──reveal──▶ [EXECUTED]
//!                                                          │
//!                      NullifierRegistry ◀── insert ───────┤
//!                      SettlementEngine  ◀── settle ───────┘
//! ```

pub mod batch;
pub mod controller;
pub mod pause;
pub mod store;

pub use batch::{BatchProcessor, RevealBatch};
pub use controller::{RevealRequest, TradeLifecycleController};
pub use pause::PauseGuard;
pub use store::CommitmentStore;

// Collaborator types callers need to drive the façade.
pub use shroud_orderbook::{MatchParties, OrderRequest, PrivateOrderBook};
pub use shroud_settlement::{InMemoryTokenLedger, NullifierRegistry, SettlementEngine, TokenLedger};
