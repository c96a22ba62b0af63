//! Settlement engine.
//!
//! Single-party settlement of a revealed trade:
//! 1. Enter the settlement lock (reject reentrancy)
//! 2. Check the minimum trade size and price the trade
//! 3. Validate custodial balances, pending credits and supply counters
//! 4. Move base tokens through the [`TokenLedger`]
//! 5. Apply quote deltas to the trader and the fee recipient
//! 6. Record issuance / redemption for supply conservation
//!
//! Steps 2 and 3 never mutate. Step 4 is the only mutation that can still
//! fail, and a failed transfer leaves the token ledger untouched, so a
//! failure at any step leaves the engine exactly as it was.

use shroud_types::{
    AccountId, Amount, Asset, FeeBps, MatchSettlement, OrderSide, Price, ProtocolConfig, Result,
    SettlementReceipt, ShroudError,
};
use tracing::{debug, error, info};

use crate::fixed_point::SettlementQuote;
use crate::ledger::BalanceLedger;
use crate::settlement_lock::SettlementLock;
use crate::supply_conservation::{FlowKind, SupplyConservation};
use crate::token_ledger::TokenLedger;

/// Custodial balances plus the rules that move them.
///
/// `Clone` when `T` is, which lets callers stage a copy, run several
/// operations against it, and swap it in only if all of them succeed.
#[derive(Debug, Clone)]
pub struct SettlementEngine<T> {
    base_asset: Asset,
    quote_asset: Asset,
    fee_bps: FeeBps,
    min_trade_amount: Amount,
    fee_recipient: AccountId,
    ledger: BalanceLedger,
    tokens: T,
    supply: SupplyConservation,
    lock: SettlementLock,
}

impl<T: TokenLedger> SettlementEngine<T> {
    #[must_use]
    pub fn new(config: &ProtocolConfig, tokens: T) -> Self {
        Self {
            base_asset: config.base_asset.clone(),
            quote_asset: config.quote_asset.clone(),
            fee_bps: config.fee_bps,
            min_trade_amount: config.min_trade_amount,
            fee_recipient: config.fee_recipient,
            ledger: BalanceLedger::new(),
            tokens,
            supply: SupplyConservation::new(),
            lock: SettlementLock::new(),
        }
    }

    /// Run `op` with the settlement lock held. The lock is released on
    /// both success and failure.
    fn locked<R>(&mut self, op: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.lock.enter()?;
        let result = op(self);
        self.lock.exit();
        result
    }

    /// Minimum-size check plus fixed-point pricing. Pure.
    ///
    /// # Errors
    /// [`ShroudError::AmountTooSmall`] or [`ShroudError::ArithmeticOverflow`].
    pub fn quote(&self, amount: Amount, price: Price) -> Result<SettlementQuote> {
        if amount < self.min_trade_amount {
            return Err(ShroudError::AmountTooSmall {
                amount,
                minimum: self.min_trade_amount,
            });
        }
        let quote = SettlementQuote::compute(amount, price, self.fee_bps)?;
        debug!(
            amount,
            price,
            quote_amount = quote.quote_amount,
            fee = quote.fee,
            net_quote = quote.net_quote,
            fee_bps = self.fee_bps,
            "priced trade"
        );
        Ok(quote)
    }

    /// Pull `amount` of `asset` from `account`'s wallet and credit it to
    /// the custodial ledger.
    pub fn deposit(&mut self, account: AccountId, asset: &str, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(ShroudError::InvalidAmount);
        }
        self.locked(|engine| {
            engine.ledger.ensure_creditable(asset, &[(account, amount)])?;
            engine.supply.ensure_recordable(asset, FlowKind::Deposit, amount)?;
            engine.tokens.transfer_in(asset, account, amount)?;
            engine.ledger.credit(account, asset, amount)?;
            engine.supply.record_deposit(asset, amount)?;
            info!(account = %account, asset, amount, "deposit credited");
            Ok(())
        })
    }

    /// Debit `amount` of `asset` from the custodial ledger and release it
    /// to `account`'s wallet.
    pub fn withdraw(&mut self, account: AccountId, asset: &str, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(ShroudError::InvalidAmount);
        }
        self.locked(|engine| {
            engine.ledger.ensure_available(account, asset, amount)?;
            engine
                .supply
                .ensure_recordable(asset, FlowKind::Withdrawal, amount)?;
            engine.tokens.transfer_out(asset, account, amount)?;
            engine.ledger.debit(account, asset, amount)?;
            engine.supply.record_withdrawal(asset, amount)?;
            info!(account = %account, asset, amount, "withdrawal released");
            Ok(())
        })
    }

    /// Settle one revealed trade for `trader`.
    ///
    /// A buy releases `amount` base from custody to the trader's wallet and
    /// debits `quote_amount` of quote. A sell pulls `amount` base from the
    /// trader's wallet into custody and credits `quote_amount - fee`.
    /// Either way the fee recipient is credited `fee`.
    ///
    /// # Errors
    /// - [`ShroudError::Reentrancy`] if a settlement is already in progress
    /// - [`ShroudError::AmountTooSmall`], [`ShroudError::ArithmeticOverflow`]
    /// - [`ShroudError::InsufficientBalance`] on a buy without enough quote
    /// - any error from the [`TokenLedger`] transfer
    pub fn settle(
        &mut self,
        trader: AccountId,
        amount: Amount,
        price: Price,
        side: OrderSide,
    ) -> Result<SettlementReceipt> {
        self.locked(|engine| {
            let quote = engine.quote(amount, price)?;
            let quote_asset = engine.quote_asset.clone();
            let base_asset = engine.base_asset.clone();
            let fee_recipient = engine.fee_recipient;

            match side {
                OrderSide::Buy => {
                    engine
                        .ledger
                        .ensure_available(trader, &quote_asset, quote.quote_amount)?;
                    engine
                        .ledger
                        .ensure_creditable(&quote_asset, &[(fee_recipient, quote.fee)])?;
                    engine.supply.ensure_recordable(
                        &quote_asset,
                        FlowKind::Redemption,
                        quote.net_quote,
                    )?;
                    engine.tokens.transfer_out(&base_asset, trader, amount)?;

                    engine.ledger.debit(trader, &quote_asset, quote.quote_amount)?;
                    engine.ledger.credit(fee_recipient, &quote_asset, quote.fee)?;
                    engine
                        .supply
                        .record_redemption(&quote_asset, quote.net_quote)?;
                }
                OrderSide::Sell => {
                    engine.ledger.ensure_creditable(
                        &quote_asset,
                        &[(trader, quote.net_quote), (fee_recipient, quote.fee)],
                    )?;
                    engine.supply.ensure_recordable(
                        &quote_asset,
                        FlowKind::Issuance,
                        quote.quote_amount,
                    )?;
                    engine.tokens.transfer_in(&base_asset, trader, amount)?;

                    engine.ledger.credit(trader, &quote_asset, quote.net_quote)?;
                    engine.ledger.credit(fee_recipient, &quote_asset, quote.fee)?;
                    engine
                        .supply
                        .record_issuance(&quote_asset, quote.quote_amount)?;
                }
            }

            let receipt = SettlementReceipt {
                trader,
                side,
                amount,
                price,
                quote_amount: quote.quote_amount,
                fee: quote.fee,
                net_quote: quote.net_quote,
            };
            info!(receipt = %receipt, "trade settled");
            Ok(receipt)
        })
    }

    /// Settle a matched pair: the seller's base goes to the buyer, the
    /// buyer's quote goes to the seller net of the fee.
    ///
    /// Quote moves between custodial balances only, so supply is
    /// unchanged.
    pub fn settle_match(
        &mut self,
        buyer: AccountId,
        seller: AccountId,
        amount: Amount,
        price: Price,
    ) -> Result<MatchSettlement> {
        self.locked(|engine| {
            let quote = engine.quote(amount, price)?;
            let quote_asset = engine.quote_asset.clone();
            let base_asset = engine.base_asset.clone();
            let fee_recipient = engine.fee_recipient;

            engine
                .ledger
                .ensure_available(buyer, &quote_asset, quote.quote_amount)?;
            // The buyer's debit may fund the seller's credit when they are
            // the same account; checking credits against the pre-debit
            // balance is conservative.
            engine.ledger.ensure_creditable(
                &quote_asset,
                &[(seller, quote.net_quote), (fee_recipient, quote.fee)],
            )?;

            engine.tokens.check_transfer_in(&base_asset, seller, amount)?;
            engine.tokens.check_receivable(&base_asset, buyer, amount)?;

            engine.tokens.transfer_in(&base_asset, seller, amount)?;
            if let Err(e) = engine.tokens.transfer_out(&base_asset, buyer, amount) {
                // Only reachable if the ledger contradicts its own checks.
                // The refund restores the seller's wallet but not the spent
                // approval.
                error!(
                    buyer = %buyer,
                    seller = %seller,
                    amount,
                    error = %e,
                    "match release failed after checks passed"
                );
                if let Err(refund) = engine.tokens.transfer_out(&base_asset, seller, amount) {
                    error!(seller = %seller, amount, error = %refund, "match refund failed");
                }
                return Err(e);
            }

            engine.ledger.debit(buyer, &quote_asset, quote.quote_amount)?;
            engine.ledger.credit(seller, &quote_asset, quote.net_quote)?;
            engine.ledger.credit(fee_recipient, &quote_asset, quote.fee)?;

            let settlement = MatchSettlement {
                buyer,
                seller,
                amount,
                price,
                quote_amount: quote.quote_amount,
                fee: quote.fee,
                net_quote: quote.net_quote,
            };
            info!(
                buyer = %buyer,
                seller = %seller,
                amount,
                price,
                quote_amount = quote.quote_amount,
                fee = quote.fee,
                "match settled"
            );
            Ok(settlement)
        })
    }

    /// Custodial balance of `account` in `asset`.
    #[must_use]
    pub fn balance(&self, account: AccountId, asset: &str) -> Amount {
        self.ledger.balance(account, asset)
    }

    /// Verify supply conservation for `asset`.
    pub fn verify_supply(&self, asset: &str) -> Result<()> {
        let actual = self.ledger.total_supply(asset)?;
        self.supply.verify(asset, actual)
    }

    #[must_use]
    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }

    #[must_use]
    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    /// Mutable access to the external token ledger (wallet funding,
    /// approvals). Custodial balances are not reachable through it.
    pub fn tokens_mut(&mut self) -> &mut T {
        &mut self.tokens
    }

    #[must_use]
    pub fn base_asset(&self) -> &str {
        &self.base_asset
    }

    #[must_use]
    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    #[must_use]
    pub fn fee_recipient(&self) -> AccountId {
        self.fee_recipient
    }

    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.lock.is_held()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_ledger::InMemoryTokenLedger;
    use shroud_types::constants::SCALE;

    const WETH: &str = "WETH";
    const USDC: &str = "USDC";

    fn alice() -> AccountId {
        AccountId::from_label("alice")
    }

    fn bob() -> AccountId {
        AccountId::from_label("bob")
    }

    fn engine() -> SettlementEngine<InMemoryTokenLedger> {
        SettlementEngine::new(&ProtocolConfig::default(), InMemoryTokenLedger::new())
    }

    /// Give `account` `amount` of `asset` in the custodial ledger.
    fn deposit(engine: &mut SettlementEngine<InMemoryTokenLedger>, account: AccountId, asset: &str, amount: Amount) {
        engine.tokens_mut().mint_to_wallet(account, asset, amount).unwrap();
        engine.tokens_mut().approve(account, asset, amount);
        engine.deposit(account, asset, amount).unwrap();
    }

    /// Give `account` base tokens in its external wallet, approved.
    fn fund_wallet(engine: &mut SettlementEngine<InMemoryTokenLedger>, account: AccountId, amount: Amount) {
        engine.tokens_mut().mint_to_wallet(account, WETH, amount).unwrap();
        engine.tokens_mut().approve(account, WETH, amount);
    }

    #[test]
    fn deposit_and_withdraw() {
        let mut e = engine();
        deposit(&mut e, alice(), USDC, 1_000);
        assert_eq!(e.balance(alice(), USDC), 1_000);
        assert_eq!(e.tokens().custody_balance(USDC), 1_000);

        e.withdraw(alice(), USDC, 400).unwrap();
        assert_eq!(e.balance(alice(), USDC), 600);
        assert_eq!(e.tokens().wallet_balance(alice(), USDC), 400);
        e.verify_supply(USDC).unwrap();
    }

    #[test]
    fn zero_deposit_rejected() {
        let mut e = engine();
        assert!(matches!(
            e.deposit(alice(), USDC, 0),
            Err(ShroudError::InvalidAmount)
        ));
        assert!(matches!(
            e.withdraw(alice(), USDC, 0),
            Err(ShroudError::InvalidAmount)
        ));
    }

    #[test]
    fn withdraw_more_than_balance() {
        let mut e = engine();
        deposit(&mut e, alice(), USDC, 10);
        let err = e.withdraw(alice(), USDC, 11).unwrap_err();
        assert!(matches!(err, ShroudError::InsufficientBalance { .. }));
        assert_eq!(e.balance(alice(), USDC), 10);
        assert_eq!(e.tokens().custody_balance(USDC), 10);
    }

    #[test]
    fn sell_reference_trade() {
        let mut e = engine();
        fund_wallet(&mut e, alice(), 100);

        let receipt = e.settle(alice(), 100, 2_000 * SCALE, OrderSide::Sell).unwrap();
        assert_eq!(receipt.quote_amount, 200_000);
        assert_eq!(receipt.fee, 600);
        assert_eq!(receipt.net_quote, 199_400);

        assert_eq!(e.balance(alice(), USDC), 199_400);
        assert_eq!(e.balance(e.fee_recipient(), USDC), 600);
        assert_eq!(e.tokens().custody_balance(WETH), 100);
        assert_eq!(e.tokens().wallet_balance(alice(), WETH), 0);
        e.verify_supply(USDC).unwrap();
        assert!(!e.is_settling());
    }

    #[test]
    fn buy_reference_trade() {
        let mut e = engine();
        deposit(&mut e, alice(), USDC, 250_000);
        e.tokens_mut().fund_custody(WETH, 100).unwrap();

        let receipt = e.settle(alice(), 100, 2_000 * SCALE, OrderSide::Buy).unwrap();
        assert_eq!(receipt.quote_amount, 200_000);
        assert_eq!(receipt.fee, 600);

        assert_eq!(e.balance(alice(), USDC), 50_000);
        assert_eq!(e.balance(e.fee_recipient(), USDC), 600);
        assert_eq!(e.tokens().wallet_balance(alice(), WETH), 100);
        e.verify_supply(USDC).unwrap();
    }

    #[test]
    fn buy_without_quote_balance_leaves_state() {
        let mut e = engine();
        deposit(&mut e, alice(), USDC, 199_999);
        e.tokens_mut().fund_custody(WETH, 100).unwrap();
        let ledger_before = e.ledger().clone();
        let tokens_before = e.tokens().clone();

        let err = e.settle(alice(), 100, 2_000 * SCALE, OrderSide::Buy).unwrap_err();
        assert!(matches!(
            err,
            ShroudError::InsufficientBalance {
                needed: 200_000,
                available: 199_999,
                ..
            }
        ));
        assert_eq!(e.ledger(), &ledger_before);
        assert_eq!(e.tokens(), &tokens_before);
        assert!(!e.is_settling(), "lock released after failure");
    }

    #[test]
    fn buy_without_custody_leaves_ledger() {
        let mut e = engine();
        deposit(&mut e, alice(), USDC, 1_000_000);
        let ledger_before = e.ledger().clone();

        let err = e.settle(alice(), 100, 2_000 * SCALE, OrderSide::Buy).unwrap_err();
        assert!(matches!(err, ShroudError::InsufficientCustodyBalance { .. }));
        assert_eq!(e.ledger(), &ledger_before);
    }

    #[test]
    fn sell_without_allowance_leaves_ledger() {
        let mut e = engine();
        e.tokens_mut().mint_to_wallet(alice(), WETH, 100).unwrap();
        e.tokens_mut().approve(alice(), WETH, 99);

        let err = e.settle(alice(), 100, 2_000 * SCALE, OrderSide::Sell).unwrap_err();
        assert!(matches!(err, ShroudError::InsufficientAllowance { .. }));
        assert_eq!(e.balance(alice(), USDC), 0);
        assert_eq!(e.tokens().wallet_balance(alice(), WETH), 100);
    }

    #[test]
    fn below_minimum_rejected() {
        let config = ProtocolConfig {
            min_trade_amount: 10,
            ..ProtocolConfig::default()
        };
        let mut e = SettlementEngine::new(&config, InMemoryTokenLedger::new());
        let err = e.settle(alice(), 9, SCALE, OrderSide::Sell).unwrap_err();
        assert!(matches!(
            err,
            ShroudError::AmountTooSmall {
                amount: 9,
                minimum: 10
            }
        ));
    }

    #[test]
    fn overflowing_quote_rejected() {
        let mut e = engine();
        fund_wallet(&mut e, alice(), u128::MAX);
        let err = e.settle(alice(), u128::MAX, 2 * SCALE, OrderSide::Sell).unwrap_err();
        assert!(matches!(err, ShroudError::ArithmeticOverflow { .. }));
        assert_eq!(e.tokens().custody_balance(WETH), 0);
    }

    #[test]
    fn reentrant_settlement_rejected() {
        let mut e = engine();
        e.lock.enter().unwrap();
        let err = e.settle(alice(), 1, SCALE, OrderSide::Sell).unwrap_err();
        assert!(matches!(err, ShroudError::Reentrancy));
        e.lock.exit();
    }

    #[test]
    fn settle_match_moves_both_legs() {
        let mut e = engine();
        deposit(&mut e, alice(), USDC, 200_000);
        fund_wallet(&mut e, bob(), 100);

        let s = e.settle_match(alice(), bob(), 100, 2_000 * SCALE).unwrap();
        assert_eq!(s.quote_amount, 200_000);
        assert_eq!(s.fee, 600);
        assert_eq!(s.net_quote, 199_400);

        assert_eq!(e.balance(alice(), USDC), 0);
        assert_eq!(e.balance(bob(), USDC), 199_400);
        assert_eq!(e.balance(e.fee_recipient(), USDC), 600);
        assert_eq!(e.tokens().wallet_balance(alice(), WETH), 100);
        assert_eq!(e.tokens().wallet_balance(bob(), WETH), 0);
        assert_eq!(e.tokens().custody_balance(WETH), 0);
        e.verify_supply(USDC).unwrap();
    }

    #[test]
    fn settle_match_buyer_short_leaves_state() {
        let mut e = engine();
        deposit(&mut e, alice(), USDC, 1);
        fund_wallet(&mut e, bob(), 100);
        let tokens_before = e.tokens().clone();

        let err = e.settle_match(alice(), bob(), 100, 2_000 * SCALE).unwrap_err();
        assert!(matches!(err, ShroudError::InsufficientBalance { .. }));
        assert_eq!(e.tokens(), &tokens_before);
        assert_eq!(e.balance(bob(), USDC), 0);
    }

    #[test]
    fn settle_match_unreceivable_base_leaves_tokens() {
        let mut e = engine();
        deposit(&mut e, alice(), USDC, 1_000);
        e.tokens_mut().mint_to_wallet(alice(), WETH, u128::MAX).unwrap();
        fund_wallet(&mut e, bob(), 10);
        let tokens_before = e.tokens().clone();
        let ledger_before = e.ledger().clone();

        let err = e.settle_match(alice(), bob(), 10, SCALE).unwrap_err();
        assert!(matches!(err, ShroudError::ArithmeticOverflow { operation: "transfer_out" }));
        assert_eq!(e.tokens(), &tokens_before);
        assert_eq!(e.tokens().allowance(bob(), WETH), 10);
        assert_eq!(e.ledger(), &ledger_before);
        assert!(!e.is_settling());
    }

    #[test]
    fn saturated_issuance_rejects_sell_before_moving_tokens() {
        let mut e = engine();
        fund_wallet(&mut e, alice(), 10);
        e.supply.record_issuance(USDC, u128::MAX).unwrap();
        let tokens_before = e.tokens().clone();
        let ledger_before = e.ledger().clone();
        let supply_before = e.supply().clone();

        for _ in 0..3 {
            let err = e.settle(alice(), 1, SCALE, OrderSide::Sell).unwrap_err();
            assert!(matches!(err, ShroudError::ArithmeticOverflow { operation: "supply_issued" }));
        }
        assert_eq!(e.tokens(), &tokens_before);
        assert_eq!(e.ledger(), &ledger_before);
        assert_eq!(e.supply(), &supply_before);
        assert_eq!(e.balance(alice(), USDC), 0);
    }

    #[test]
    fn saturated_deposits_reject_deposit_before_pulling() {
        let mut e = engine();
        e.supply.record_deposit(USDC, u128::MAX).unwrap();
        e.tokens_mut().mint_to_wallet(alice(), USDC, 5).unwrap();
        e.tokens_mut().approve(alice(), USDC, 5);
        let tokens_before = e.tokens().clone();

        let err = e.deposit(alice(), USDC, 5).unwrap_err();
        assert!(matches!(err, ShroudError::ArithmeticOverflow { operation: "supply_deposits" }));
        assert_eq!(e.tokens(), &tokens_before);
        assert_eq!(e.balance(alice(), USDC), 0);
    }

    #[test]
    fn supply_holds_across_mixed_flow() {
        let mut e = engine();
        deposit(&mut e, alice(), USDC, 1_000_000);
        fund_wallet(&mut e, bob(), 500);

        e.settle(bob(), 200, 3 * SCALE, OrderSide::Sell).unwrap();
        e.settle(alice(), 150, 3 * SCALE, OrderSide::Buy).unwrap();
        e.withdraw(alice(), USDC, 10_000).unwrap();
        e.verify_supply(USDC).unwrap();
    }
}
