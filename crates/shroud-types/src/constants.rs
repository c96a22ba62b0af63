//! System-wide constants for the Shroud protocol.

/// Fixed-point scale for prices: a price of `p * SCALE` means `p` quote
/// units per base unit.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Denominator for fee rates expressed in basis points.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Highest accepted fee rate (100%).
pub const MAX_FEE_BPS: u16 = 10_000;

/// Default fee rate: 0.30%.
pub const DEFAULT_FEE_BPS: u16 = 30;

/// Default commit → reveal maturation window (one hour).
pub const DEFAULT_PHASE_DURATION_SECS: u64 = 3_600;

/// Upper bound on the maturation window (one year).
pub const MAX_PHASE_DURATION_SECS: u64 = 365 * 24 * 3_600;

/// Default minimum base amount for a single settlement.
pub const DEFAULT_MIN_TRADE_AMOUNT: u128 = 1;

/// Default base asset symbol.
pub const DEFAULT_BASE_ASSET: &str = "WETH";

/// Default quote asset symbol.
pub const DEFAULT_QUOTE_ASSET: &str = "USDC";

/// Label hashed into the default fee recipient account.
pub const DEFAULT_FEE_RECIPIENT_LABEL: &str = "shroud:fee-recipient";
