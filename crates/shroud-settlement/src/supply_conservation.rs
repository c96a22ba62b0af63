//! Supply conservation invariant checker.
//!
//! Invariant enforced after every settlement:
//! ```text
//! ∀ asset: Σ(custodial balances) == deposits - withdrawals + issued - redeemed
//! ```
//!
//! Deposits and withdrawals move tokens across the custody boundary.
//! Issuance and redemption are the quote-side legs of single-party
//! settlements, where base tokens leave or enter custody against a
//! custodial quote credit or debit. Two-party matches are internal
//! transfers and touch neither.

use std::collections::HashMap;

use shroud_types::{Amount, Asset, Result, ShroudError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Flows {
    deposits: Amount,
    withdrawals: Amount,
    issued: Amount,
    redeemed: Amount,
}

/// Per-asset flow totals since genesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplyConservation {
    flows: HashMap<Asset, Flows>,
}

/// Which counter a flow lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Deposit,
    Withdrawal,
    /// Custodial balance created by a settlement (sell proceeds).
    Issuance,
    /// Custodial balance consumed by a settlement (buy cost net of fee).
    Redemption,
}

impl FlowKind {
    fn operation(self) -> &'static str {
        match self {
            Self::Deposit => "supply_deposits",
            Self::Withdrawal => "supply_withdrawals",
            Self::Issuance => "supply_issued",
            Self::Redemption => "supply_redeemed",
        }
    }
}

impl Flows {
    fn counter(&self, kind: FlowKind) -> Amount {
        match kind {
            FlowKind::Deposit => self.deposits,
            FlowKind::Withdrawal => self.withdrawals,
            FlowKind::Issuance => self.issued,
            FlowKind::Redemption => self.redeemed,
        }
    }

    fn counter_mut(&mut self, kind: FlowKind) -> &mut Amount {
        match kind {
            FlowKind::Deposit => &mut self.deposits,
            FlowKind::Withdrawal => &mut self.withdrawals,
            FlowKind::Issuance => &mut self.issued,
            FlowKind::Redemption => &mut self.redeemed,
        }
    }
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, asset: &str) -> Flows {
        self.flows.get(asset).copied().unwrap_or_default()
    }

    fn next_total(&self, asset: &str, kind: FlowKind, amount: Amount) -> Result<Amount> {
        self.get(asset)
            .counter(kind)
            .checked_add(amount)
            .ok_or(ShroudError::ArithmeticOverflow {
                operation: kind.operation(),
            })
    }

    /// Check that recording `amount` under `kind` cannot overflow. Pure.
    ///
    /// Settlement calls this before its first mutation so the later
    /// `record_*` call cannot fail.
    pub fn ensure_recordable(&self, asset: &str, kind: FlowKind, amount: Amount) -> Result<()> {
        self.next_total(asset, kind, amount).map(|_| ())
    }

    /// Add `amount` to the `kind` counter of `asset`. On overflow nothing
    /// is recorded.
    pub fn record(&mut self, asset: &str, kind: FlowKind, amount: Amount) -> Result<()> {
        let total = self.next_total(asset, kind, amount)?;
        *self
            .flows
            .entry(asset.to_string())
            .or_default()
            .counter_mut(kind) = total;
        Ok(())
    }

    pub fn record_deposit(&mut self, asset: &str, amount: Amount) -> Result<()> {
        self.record(asset, FlowKind::Deposit, amount)
    }

    pub fn record_withdrawal(&mut self, asset: &str, amount: Amount) -> Result<()> {
        self.record(asset, FlowKind::Withdrawal, amount)
    }

    pub fn record_issuance(&mut self, asset: &str, amount: Amount) -> Result<()> {
        self.record(asset, FlowKind::Issuance, amount)
    }

    pub fn record_redemption(&mut self, asset: &str, amount: Amount) -> Result<()> {
        self.record(asset, FlowKind::Redemption, amount)
    }

    /// `deposits + issued - withdrawals - redeemed`.
    ///
    /// # Errors
    /// [`ShroudError::SupplyInvariantViolation`] if outflows exceed inflows,
    /// which can only happen if bookkeeping is corrupt.
    pub fn expected_supply(&self, asset: &str) -> Result<Amount> {
        let f = self.get(asset);
        let inflow = f.deposits.checked_add(f.issued);
        let outflow = f.withdrawals.checked_add(f.redeemed);
        match (inflow, outflow) {
            (Some(inflow), Some(outflow)) if inflow >= outflow => Ok(inflow - outflow),
            _ => Err(ShroudError::SupplyInvariantViolation {
                reason: format!(
                    "Asset {asset}: outflows exceed inflows (deposits={}, issued={}, \
                     withdrawals={}, redeemed={})",
                    f.deposits, f.issued, f.withdrawals, f.redeemed
                ),
            }),
        }
    }

    /// Verify that `actual_supply` (sum of custodial balances) matches
    /// the expected supply for `asset`.
    ///
    /// # Errors
    /// Returns [`ShroudError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, asset: &str, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(asset)?;
        if actual_supply != expected {
            let f = self.get(asset);
            tracing::error!(asset, actual_supply, expected, "supply invariant violated");
            return Err(ShroudError::SupplyInvariantViolation {
                reason: format!(
                    "Asset {asset}: actual supply {actual_supply} != expected {expected} \
                     (deposits={}, withdrawals={}, issued={}, redeemed={})",
                    f.deposits, f.withdrawals, f.issued, f.redeemed
                ),
            });
        }
        Ok(())
    }
}
