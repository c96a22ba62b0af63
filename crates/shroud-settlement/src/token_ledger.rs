//! External token ledger seam.
//!
//! Real deployments move tokens on a chain or a custodian's books; the
//! engine only needs two atomic primitives plus their dry-run checks. A
//! failed transfer must leave the ledger untouched.

use std::collections::HashMap;

use shroud_types::{AccountId, Amount, Asset, Result, ShroudError};

/// Moves tokens between trader wallets and protocol custody.
pub trait TokenLedger {
    /// Pull `amount` of `asset` from `from`'s wallet into custody.
    ///
    /// # Errors
    /// [`ShroudError::InsufficientAllowance`] when the wallet's approval or
    /// holdings cannot cover the transfer.
    fn transfer_in(&mut self, asset: &str, from: AccountId, amount: Amount) -> Result<()>;

    /// Release `amount` of `asset` from custody to `to`'s wallet.
    ///
    /// # Errors
    /// [`ShroudError::InsufficientCustodyBalance`] when custody holds less
    /// than `amount`.
    fn transfer_out(&mut self, asset: &str, to: AccountId, amount: Amount) -> Result<()>;

    /// Whether [`transfer_in`](Self::transfer_in) of `amount` would
    /// succeed right now. Pure.
    fn check_transfer_in(&self, asset: &str, from: AccountId, amount: Amount) -> Result<()>;

    /// Whether `to`'s wallet can accept `amount` more of `asset`. Pure.
    ///
    /// Custody is not consulted: a match pulls the base it releases in
    /// the same step, so only the receiving side can refuse.
    fn check_receivable(&self, asset: &str, to: AccountId, amount: Amount) -> Result<()>;
}

/// In-process token ledger with ERC-20-style allowances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryTokenLedger {
    wallets: HashMap<(AccountId, Asset), Amount>,
    allowances: HashMap<(AccountId, Asset), Amount>,
    custody: HashMap<Asset, Amount>,
}

impl InMemoryTokenLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a wallet out of thin air (faucet / genesis allocation).
    pub fn mint_to_wallet(&mut self, account: AccountId, asset: &str, amount: Amount) -> Result<()> {
        let entry = self
            .wallets
            .entry((account, asset.to_string()))
            .or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(ShroudError::ArithmeticOverflow {
                operation: "mint_to_wallet",
            })?;
        Ok(())
    }

    /// Set how much of `asset` the protocol may pull from `owner`.
    pub fn approve(&mut self, owner: AccountId, asset: &str, amount: Amount) {
        self.allowances.insert((owner, asset.to_string()), amount);
    }

    /// Seed protocol custody directly, e.g. base-asset inventory for buys.
    pub fn fund_custody(&mut self, asset: &str, amount: Amount) -> Result<()> {
        let entry = self.custody.entry(asset.to_string()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(ShroudError::ArithmeticOverflow {
                operation: "fund_custody",
            })?;
        Ok(())
    }

    #[must_use]
    pub fn wallet_balance(&self, account: AccountId, asset: &str) -> Amount {
        self.wallets
            .get(&(account, asset.to_string()))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn allowance(&self, owner: AccountId, asset: &str) -> Amount {
        self.allowances
            .get(&(owner, asset.to_string()))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn custody_balance(&self, asset: &str) -> Amount {
        self.custody.get(asset).copied().unwrap_or(0)
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn transfer_in(&mut self, asset: &str, from: AccountId, amount: Amount) -> Result<()> {
        self.check_transfer_in(asset, from, amount)?;
        let key = (from, asset.to_string());
        let new_wallet = self.wallet_balance(from, asset) - amount;
        let new_allowance = self.allowance(from, asset) - amount;
        let new_custody = self.custody_balance(asset) + amount;

        self.wallets.insert(key.clone(), new_wallet);
        self.allowances.insert(key, new_allowance);
        self.custody.insert(asset.to_string(), new_custody);
        Ok(())
    }

    fn transfer_out(&mut self, asset: &str, to: AccountId, amount: Amount) -> Result<()> {
        let custody = self.custody_balance(asset);
        if custody < amount {
            return Err(ShroudError::InsufficientCustodyBalance {
                asset: asset.to_string(),
                needed: amount,
                available: custody,
            });
        }
        self.check_receivable(asset, to, amount)?;
        let new_wallet = self.wallet_balance(to, asset) + amount;

        self.custody.insert(asset.to_string(), custody - amount);
        self.wallets.insert((to, asset.to_string()), new_wallet);
        Ok(())
    }

    fn check_transfer_in(&self, asset: &str, from: AccountId, amount: Amount) -> Result<()> {
        let available = self
            .allowance(from, asset)
            .min(self.wallet_balance(from, asset));
        if available < amount {
            return Err(ShroudError::InsufficientAllowance {
                asset: asset.to_string(),
                needed: amount,
                available,
            });
        }
        self.custody_balance(asset)
            .checked_add(amount)
            .ok_or(ShroudError::ArithmeticOverflow {
                operation: "transfer_in",
            })?;
        Ok(())
    }

    fn check_receivable(&self, asset: &str, to: AccountId, amount: Amount) -> Result<()> {
        self.wallet_balance(to, asset)
            .checked_add(amount)
            .ok_or(ShroudError::ArithmeticOverflow {
                operation: "transfer_out",
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(account: AccountId, amount: Amount) -> InMemoryTokenLedger {
        let mut tokens = InMemoryTokenLedger::new();
        tokens.mint_to_wallet(account, "USDC", amount).unwrap();
        tokens.approve(account, "USDC", amount);
        tokens
    }

    #[test]
    fn transfer_in_moves_to_custody() {
        let alice = AccountId::from_label("alice");
        let mut tokens = funded(alice, 1_000);
        tokens.transfer_in("USDC", alice, 400).unwrap();

        assert_eq!(tokens.wallet_balance(alice, "USDC"), 600);
        assert_eq!(tokens.allowance(alice, "USDC"), 600);
        assert_eq!(tokens.custody_balance("USDC"), 400);
    }

    #[test]
    fn transfer_in_requires_allowance() {
        let alice = AccountId::from_label("alice");
        let mut tokens = funded(alice, 1_000);
        tokens.approve(alice, "USDC", 10);
        let before = tokens.clone();

        let err = tokens.transfer_in("USDC", alice, 11).unwrap_err();
        assert!(matches!(
            err,
            ShroudError::InsufficientAllowance {
                needed: 11,
                available: 10,
                ..
            }
        ));
        assert_eq!(tokens, before);
    }

    #[test]
    fn transfer_in_requires_wallet_funds() {
        let alice = AccountId::from_label("alice");
        let mut tokens = funded(alice, 5);
        tokens.approve(alice, "USDC", 1_000);
        assert!(matches!(
            tokens.transfer_in("USDC", alice, 6),
            Err(ShroudError::InsufficientAllowance { available: 5, .. })
        ));
    }

    #[test]
    fn transfer_out_requires_custody() {
        let bob = AccountId::from_label("bob");
        let mut tokens = InMemoryTokenLedger::new();
        tokens.fund_custody("WETH", 3).unwrap();

        let err = tokens.transfer_out("WETH", bob, 4).unwrap_err();
        assert!(matches!(err, ShroudError::InsufficientCustodyBalance { .. }));
        assert_eq!(tokens.custody_balance("WETH"), 3);

        tokens.transfer_out("WETH", bob, 3).unwrap();
        assert_eq!(tokens.custody_balance("WETH"), 0);
        assert_eq!(tokens.wallet_balance(bob, "WETH"), 3);
    }

    #[test]
    fn checks_do_not_mutate() {
        let alice = AccountId::from_label("alice");
        let bob = AccountId::from_label("bob");
        let mut tokens = funded(alice, 10);
        tokens.mint_to_wallet(bob, "USDC", u128::MAX).unwrap();
        let before = tokens.clone();

        tokens.check_transfer_in("USDC", alice, 10).unwrap();
        assert!(matches!(
            tokens.check_transfer_in("USDC", alice, 11),
            Err(ShroudError::InsufficientAllowance { .. })
        ));
        tokens.check_receivable("USDC", alice, 1).unwrap();
        assert!(matches!(
            tokens.check_receivable("USDC", bob, 1),
            Err(ShroudError::ArithmeticOverflow { operation: "transfer_out" })
        ));
        assert_eq!(tokens, before);
    }
}
