//! Numeric and asset aliases shared by the ledger and settlement code.
//!
//! All quantities are unsigned integers. Prices are fixed-point values
//! scaled by [`crate::constants::SCALE`].

/// Asset identifier (e.g., "WETH", "USDC").
pub type Asset = String;

/// Token quantity in the asset's smallest unit.
pub type Amount = u128;

/// Quote units per base unit, scaled by [`crate::constants::SCALE`].
pub type Price = u128;

/// Fee rate in basis points.
pub type FeeBps = u16;
