//! Fixed-point swap arithmetic.
//!
//! Prices carry 18 decimals (`SCALE = 10^18`). All division floors.
//! Products that do not fit in `u128` are computed in a [`BigUint`]
//! intermediate; only a final result that still exceeds `u128` is an
//! error.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use shroud_types::{
    Amount, FeeBps, Price, Result, ShroudError,
    constants::{BPS_DENOMINATOR, SCALE},
};

/// `floor(a * b / denominator)` without intermediate overflow.
fn mul_div_floor(
    a: u128,
    b: u128,
    denominator: u128,
    operation: &'static str,
) -> Result<u128> {
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / denominator);
    }
    let wide = BigUint::from(a) * BigUint::from(b) / BigUint::from(denominator);
    u128::try_from(wide).map_err(|_| ShroudError::ArithmeticOverflow { operation })
}

/// `floor(amount * price / SCALE)`.
pub fn quote_amount(amount: Amount, price: Price) -> Result<Amount> {
    mul_div_floor(amount, price, SCALE, "quote_amount")
}

/// `floor(quote * fee_bps / 10_000)`.
pub fn fee_amount(quote: Amount, fee_bps: FeeBps) -> Result<Amount> {
    mul_div_floor(quote, u128::from(fee_bps), BPS_DENOMINATOR, "fee_amount")
}

/// The three numbers every settlement moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementQuote {
    pub quote_amount: Amount,
    pub fee: Amount,
    /// `quote_amount - fee`.
    pub net_quote: Amount,
}

impl SettlementQuote {
    /// Price a trade of `amount` base units at `price`.
    ///
    /// # Errors
    /// Returns [`ShroudError::ArithmeticOverflow`] if the quote amount does
    /// not fit in `u128`.
    pub fn compute(amount: Amount, price: Price, fee_bps: FeeBps) -> Result<Self> {
        let quote_amount = quote_amount(amount, price)?;
        let fee = fee_amount(quote_amount, fee_bps)?;
        // fee_bps <= 10_000, so fee <= quote_amount.
        let net_quote = quote_amount
            .checked_sub(fee)
            .ok_or(ShroudError::ArithmeticOverflow { operation: "net_quote" })?;
        Ok(Self {
            quote_amount,
            fee,
            net_quote,
        })
    }
}
