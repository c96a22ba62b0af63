//! Custodial balance ledger.
//!
//! Per-(account, asset) amounts held by the protocol on behalf of traders.
//! Only the [`SettlementEngine`](crate::SettlementEngine) mutates it, via
//! deposit, withdraw, and settlement.

use std::collections::HashMap;

use shroud_types::{AccountId, Amount, Asset, Result, ShroudError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceLedger {
    balances: HashMap<(AccountId, Asset), Amount>,
}

impl BalanceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account` in `asset`. Unknown pairs read as zero.
    #[must_use]
    pub fn balance(&self, account: AccountId, asset: &str) -> Amount {
        self.balances
            .get(&(account, asset.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Fail with [`ShroudError::InsufficientBalance`] unless `account`
    /// holds at least `needed` of `asset`.
    pub fn ensure_available(&self, account: AccountId, asset: &str, needed: Amount) -> Result<()> {
        let available = self.balance(account, asset);
        if available < needed {
            return Err(ShroudError::InsufficientBalance {
                asset: asset.to_string(),
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Check that every credit in `credits` can be applied without
    /// overflow. Repeated accounts are accumulated.
    pub fn ensure_creditable(&self, asset: &str, credits: &[(AccountId, Amount)]) -> Result<()> {
        let mut pending: HashMap<AccountId, Amount> = HashMap::new();
        for &(account, amount) in credits {
            let running = pending
                .entry(account)
                .or_insert_with(|| self.balance(account, asset));
            *running = running
                .checked_add(amount)
                .ok_or(ShroudError::ArithmeticOverflow {
                    operation: "balance_credit",
                })?;
        }
        Ok(())
    }

    pub(crate) fn credit(&mut self, account: AccountId, asset: &str, amount: Amount) -> Result<()> {
        let entry = self
            .balances
            .entry((account, asset.to_string()))
            .or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(ShroudError::ArithmeticOverflow {
                operation: "balance_credit",
            })?;
        Ok(())
    }

    pub(crate) fn debit(&mut self, account: AccountId, asset: &str, amount: Amount) -> Result<()> {
        self.ensure_available(account, asset, amount)?;
        if let Some(entry) = self.balances.get_mut(&(account, asset.to_string())) {
            *entry -= amount;
        }
        Ok(())
    }

    /// Sum of every account's balance in `asset`.
    ///
    /// # Errors
    /// Returns [`ShroudError::ArithmeticOverflow`] if the sum exceeds `u128`.
    pub fn total_supply(&self, asset: &str) -> Result<Amount> {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .try_fold(0u128, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or(ShroudError::ArithmeticOverflow {
                operation: "total_supply",
            })
    }
}
