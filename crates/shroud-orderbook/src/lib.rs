//! # shroud-orderbook
//!
//! **Private order book for Shroud.**
//!
//! Orders carry only a commitment hash and encrypted amount/price. Pairing
//! a buy with a sell requires a match proof; executing the pairing
//! requires a second proof bound to the match id. The book never sees
//! plaintext amounts until execution and never moves funds: the lifecycle
//! façade settles a match through the settlement engine, then calls
//! [`PrivateOrderBook::finalize_execution`].
//!
//! - **Single-use commitments**: an order commitment backs at most one order
//! - **Side discipline**: a match is exactly one unfilled buy and one unfilled sell
//! - **Terminal states**: filled orders and executed matches never change again

pub mod book;
pub mod matching;

pub use book::{OrderRequest, PrivateOrderBook};
pub use matching::MatchParties;
