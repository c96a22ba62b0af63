//! Proof-gated matching and two-step match execution.
//!
//! Execution is split so the caller can settle in between:
//! [`PrivateOrderBook::prepare_execution`] checks everything and returns the
//! parties without mutating; [`PrivateOrderBook::finalize_execution`] applies
//! the terminal transitions once settlement has succeeded.

use chrono::{DateTime, Utc};
use shroud_types::{
    AccountId, Amount, MatchCommitment, MatchId, OrderId, OrderMatch, OrderSide, Price, Proof,
    ProofVerifier, PublicInputs, Result, ShroudError,
};
use tracing::{info, warn};

use crate::book::PrivateOrderBook;

/// The two sides of a match that passed every execution check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchParties {
    pub match_id: MatchId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer: AccountId,
    pub seller: AccountId,
}

impl PrivateOrderBook {
    /// Fail unless `id` names an unfilled order on `side`.
    fn ensure_active_on(&self, id: &OrderId, side: OrderSide) -> Result<AccountId> {
        let order = self.orders.get(id).ok_or(ShroudError::OrderNotFound(*id))?;
        if !order.is_active_on(side) {
            return Err(ShroudError::OrderNotActive(*id));
        }
        Ok(order.creator)
    }

    /// Pair an active buy with an active sell under a verified match proof.
    ///
    /// Public inputs are `[match_commitment]`. The match id is derived from
    /// the order pair and `now`.
    ///
    /// # Errors
    /// - [`ShroudError::OrderNotFound`] if either order is unknown
    /// - [`ShroudError::OrderNotActive`] unless `buy_id` is an unfilled buy
    ///   and `sell_id` an unfilled sell
    /// - [`ShroudError::InvalidMatchProof`] if the verifier rejects
    /// - [`ShroudError::DuplicateMatch`] if the derived id already exists
    pub fn match_orders<V: ProofVerifier>(
        &mut self,
        buy_id: OrderId,
        sell_id: OrderId,
        match_commitment: MatchCommitment,
        proof: &Proof,
        verifier: &V,
        now: DateTime<Utc>,
    ) -> Result<MatchId> {
        if !self.orders.contains_key(&buy_id) {
            return Err(ShroudError::OrderNotFound(buy_id));
        }
        if !self.orders.contains_key(&sell_id) {
            return Err(ShroudError::OrderNotFound(sell_id));
        }
        self.ensure_active_on(&buy_id, OrderSide::Buy)?;
        self.ensure_active_on(&sell_id, OrderSide::Sell)?;

        let inputs = PublicInputs::single(*match_commitment.as_bytes());
        if !verifier.verify(proof, &inputs) {
            warn!(commitment = %match_commitment, "match proof rejected");
            return Err(ShroudError::InvalidMatchProof(match_commitment));
        }

        let id = MatchId::derive(&buy_id, &sell_id, now);
        if self.matches.contains_key(&id) {
            return Err(ShroudError::DuplicateMatch(id));
        }

        self.matches.insert(
            id,
            OrderMatch {
                id,
                buy_order_id: buy_id,
                sell_order_id: sell_id,
                match_commitment,
                matched_at: now,
                executed: false,
                amount: 0,
                price: 0,
            },
        );
        info!(match_id = %id, buy = %buy_id, sell = %sell_id, "orders matched");
        Ok(id)
    }

    /// Structural checks shared by both execution steps: the match exists,
    /// is unexecuted, and both of its orders are still active.
    fn executable_parties(&self, match_id: &MatchId) -> Result<MatchParties> {
        let m = self
            .matches
            .get(match_id)
            .ok_or(ShroudError::MatchNotFound(*match_id))?;
        if m.executed {
            return Err(ShroudError::MatchAlreadyExecuted(*match_id));
        }
        Ok(MatchParties {
            match_id: *match_id,
            buy_order_id: m.buy_order_id,
            sell_order_id: m.sell_order_id,
            buyer: self.ensure_active_on(&m.buy_order_id, OrderSide::Buy)?,
            seller: self.ensure_active_on(&m.sell_order_id, OrderSide::Sell)?,
        })
    }

    /// Check that `match_id` can execute under `proof`. Does not mutate.
    ///
    /// Public inputs are `[match_id]`.
    ///
    /// # Errors
    /// - [`ShroudError::MatchNotFound`], [`ShroudError::MatchAlreadyExecuted`]
    /// - [`ShroudError::InvalidExecutionProof`] if the verifier rejects
    /// - [`ShroudError::OrderNotActive`] if either order has since been filled
    pub fn prepare_execution<V: ProofVerifier>(
        &self,
        match_id: &MatchId,
        proof: &Proof,
        verifier: &V,
    ) -> Result<MatchParties> {
        let m = self
            .matches
            .get(match_id)
            .ok_or(ShroudError::MatchNotFound(*match_id))?;
        if m.executed {
            return Err(ShroudError::MatchAlreadyExecuted(*match_id));
        }

        let inputs = PublicInputs::single(*match_id.as_bytes());
        if !verifier.verify(proof, &inputs) {
            warn!(match_id = %match_id, "execution proof rejected");
            return Err(ShroudError::InvalidExecutionProof(*match_id));
        }

        self.executable_parties(match_id)
    }

    /// Mark both orders filled with `(amount, price)`, drop them from the
    /// active lists, and mark the match executed.
    ///
    /// Re-runs the structural checks, so either everything transitions or
    /// nothing does.
    pub fn finalize_execution(
        &mut self,
        match_id: &MatchId,
        amount: Amount,
        price: Price,
    ) -> Result<&OrderMatch> {
        let parties = self.executable_parties(match_id)?;

        for (id, side) in [
            (parties.buy_order_id, OrderSide::Buy),
            (parties.sell_order_id, OrderSide::Sell),
        ] {
            if let Some(order) = self.orders.get_mut(&id) {
                order.mark_filled(amount, price)?;
            }
            self.active_list_mut(side).retain(|active| *active != id);
        }

        let m = self
            .matches
            .get_mut(match_id)
            .ok_or(ShroudError::MatchNotFound(*match_id))?;
        m.mark_executed(amount, price)?;
        info!(match_id = %match_id, amount, price, "match executed");
        Ok(&*m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::OrderRequest;
    use shroud_types::{BindingVerifier, OrderCommitment, StaticVerifier};

    fn place(book: &mut PrivateOrderBook, side: OrderSide, now: DateTime<Utc>) -> OrderId {
        book.commit_order(
            OrderRequest {
                id: OrderId::random(),
                creator: AccountId::random(),
                commitment: OrderCommitment::random(),
                side,
                encrypted_amount: vec![1; 16],
                encrypted_price: vec![2; 16],
            },
            now,
        )
        .unwrap()
    }

    fn matched(book: &mut PrivateOrderBook) -> (OrderId, OrderId, MatchId) {
        let now = Utc::now();
        let buy = place(book, OrderSide::Buy, now);
        let sell = place(book, OrderSide::Sell, now);
        let mc = MatchCommitment::random();
        let id = book
            .match_orders(buy, sell, mc, &Proof::binding_single(*mc.as_bytes()), &BindingVerifier, now)
            .unwrap();
        (buy, sell, id)
    }

    #[test]
    fn match_creates_unexecuted_record() {
        let mut book = PrivateOrderBook::new();
        let (buy, sell, id) = matched(&mut book);
        let m = book.order_match(&id).unwrap();
        assert_eq!(m.buy_order_id, buy);
        assert_eq!(m.sell_order_id, sell);
        assert!(!m.executed);
        assert_eq!(m.id, MatchId::derive(&buy, &sell, m.matched_at));
        // Orders stay active until execution.
        assert!(book.order(&buy).unwrap().is_active());
    }

    #[test]
    fn match_rejects_wrong_sides() {
        let mut book = PrivateOrderBook::new();
        let now = Utc::now();
        let b1 = place(&mut book, OrderSide::Buy, now);
        let b2 = place(&mut book, OrderSide::Buy, now);
        let err = book
            .match_orders(b1, b2, MatchCommitment::random(), &Proof::default(), &StaticVerifier::accept_all(), now)
            .unwrap_err();
        assert!(matches!(err, ShroudError::OrderNotActive(id) if id == b2));

        let s = place(&mut book, OrderSide::Sell, now);
        let err = book
            .match_orders(s, b1, MatchCommitment::random(), &Proof::default(), &StaticVerifier::accept_all(), now)
            .unwrap_err();
        assert!(matches!(err, ShroudError::OrderNotActive(id) if id == s));
        assert_eq!(book.match_count(), 0);
    }

    #[test]
    fn match_rejects_unknown_order() {
        let mut book = PrivateOrderBook::new();
        let now = Utc::now();
        let buy = place(&mut book, OrderSide::Buy, now);
        let ghost = OrderId::random();
        let err = book
            .match_orders(buy, ghost, MatchCommitment::random(), &Proof::default(), &StaticVerifier::accept_all(), now)
            .unwrap_err();
        assert!(matches!(err, ShroudError::OrderNotFound(id) if id == ghost));
    }

    #[test]
    fn match_rejects_bad_proof() {
        let mut book = PrivateOrderBook::new();
        let now = Utc::now();
        let buy = place(&mut book, OrderSide::Buy, now);
        let sell = place(&mut book, OrderSide::Sell, now);
        let mc = MatchCommitment::random();
        let err = book
            .match_orders(buy, sell, mc, &Proof::binding_single([0; 32]), &BindingVerifier, now)
            .unwrap_err();
        assert!(matches!(err, ShroudError::InvalidMatchProof(c) if c == mc));
        assert_eq!(book.match_count(), 0);
    }

    #[test]
    fn same_pair_same_instant_is_duplicate() {
        let mut book = PrivateOrderBook::new();
        let now = Utc::now();
        let buy = place(&mut book, OrderSide::Buy, now);
        let sell = place(&mut book, OrderSide::Sell, now);
        let v = StaticVerifier::accept_all();
        let id = book
            .match_orders(buy, sell, MatchCommitment::random(), &Proof::default(), &v, now)
            .unwrap();
        let err = book
            .match_orders(buy, sell, MatchCommitment::random(), &Proof::default(), &v, now)
            .unwrap_err();
        assert!(matches!(err, ShroudError::DuplicateMatch(d) if d == id));
    }

    #[test]
    fn prepare_returns_parties_without_mutation() {
        let mut book = PrivateOrderBook::new();
        let (buy, sell, id) = matched(&mut book);
        let parties = book
            .prepare_execution(&id, &Proof::binding_single(*id.as_bytes()), &BindingVerifier)
            .unwrap();
        assert_eq!(parties.buyer, book.order(&buy).unwrap().creator);
        assert_eq!(parties.seller, book.order(&sell).unwrap().creator);
        assert!(!book.order_match(&id).unwrap().executed);
    }

    #[test]
    fn prepare_rejects_proof_over_wrong_input() {
        let mut book = PrivateOrderBook::new();
        let (_, _, id) = matched(&mut book);
        let err = book
            .prepare_execution(&id, &Proof::binding_single([7; 32]), &BindingVerifier)
            .unwrap_err();
        assert!(matches!(err, ShroudError::InvalidExecutionProof(m) if m == id));
    }

    #[test]
    fn finalize_fills_orders_once() {
        let mut book = PrivateOrderBook::new();
        let (buy, sell, id) = matched(&mut book);

        let m = book.finalize_execution(&id, 5, 7).unwrap();
        assert!(m.executed);
        assert_eq!((m.amount, m.price), (5, 7));

        for oid in [buy, sell] {
            let o = book.order(&oid).unwrap();
            assert!(o.filled);
            assert_eq!((o.executed_amount, o.executed_price), (5, 7));
        }
        assert!(book.active_order_ids(OrderSide::Buy).is_empty());
        assert!(book.active_order_ids(OrderSide::Sell).is_empty());

        let err = book.finalize_execution(&id, 9, 9).unwrap_err();
        assert!(matches!(err, ShroudError::MatchAlreadyExecuted(m) if m == id));
        assert_eq!(book.order(&buy).unwrap().executed_amount, 5);
    }

    #[test]
    fn sibling_match_blocked_after_fill() {
        let mut book = PrivateOrderBook::new();
        let now = Utc::now();
        let buy = place(&mut book, OrderSide::Buy, now);
        let s1 = place(&mut book, OrderSide::Sell, now);
        let s2 = place(&mut book, OrderSide::Sell, now);
        let v = StaticVerifier::accept_all();
        let m1 = book.match_orders(buy, s1, MatchCommitment::random(), &Proof::default(), &v, now).unwrap();
        let m2 = book.match_orders(buy, s2, MatchCommitment::random(), &Proof::default(), &v, now).unwrap();

        book.finalize_execution(&m1, 1, 1).unwrap();
        let err = book.prepare_execution(&m2, &Proof::default(), &v).unwrap_err();
        assert!(matches!(err, ShroudError::OrderNotActive(id) if id == buy));
        assert!(book.order(&s2).unwrap().is_active());
    }
}
