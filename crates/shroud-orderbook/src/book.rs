//! Order storage, commitment tracking and the per-side active lists.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use shroud_types::{
    AccountId, MatchId, OrderCommitment, OrderId, OrderMatch, OrderSide, PrivateOrder, Result,
    ShroudError,
};
use tracing::info;

/// Everything a trader submits to place a private order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub id: OrderId,
    pub creator: AccountId,
    pub commitment: OrderCommitment,
    pub side: OrderSide,
    pub encrypted_amount: Vec<u8>,
    pub encrypted_price: Vec<u8>,
}

/// Private order book.
///
/// `Clone` so the façade can stage a copy for all-or-nothing execution.
#[derive(Debug, Clone, Default)]
pub struct PrivateOrderBook {
    pub(crate) orders: HashMap<OrderId, PrivateOrder>,
    /// Every order commitment ever consumed. Never shrinks.
    used_commitments: HashSet<OrderCommitment>,
    /// Unfilled buy orders, in submission order.
    pub(crate) active_buys: Vec<OrderId>,
    /// Unfilled sell orders, in submission order.
    pub(crate) active_sells: Vec<OrderId>,
    pub(crate) matches: HashMap<MatchId, OrderMatch>,
}

impl PrivateOrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Store a new private order and append it to its side's active list.
    ///
    /// # Errors
    /// - [`ShroudError::CommitmentAlreadyUsed`] if the commitment backed any earlier order
    /// - [`ShroudError::DuplicateOrder`] if the order id exists
    pub fn commit_order(&mut self, request: OrderRequest, now: DateTime<Utc>) -> Result<OrderId> {
        if self.used_commitments.contains(&request.commitment) {
            return Err(ShroudError::CommitmentAlreadyUsed(request.commitment));
        }
        if self.orders.contains_key(&request.id) {
            return Err(ShroudError::DuplicateOrder(request.id));
        }

        let order = PrivateOrder {
            id: request.id,
            creator: request.creator,
            side: request.side,
            commitment: request.commitment,
            encrypted_amount: request.encrypted_amount,
            encrypted_price: request.encrypted_price,
            created_at: now,
            filled: false,
            executed_amount: 0,
            executed_price: 0,
        };

        self.used_commitments.insert(order.commitment);
        self.active_list_mut(order.side).push(order.id);
        info!(order = %order.id, creator = %order.creator, side = %order.side, "order committed");
        let id = order.id;
        self.orders.insert(id, order);
        Ok(id)
    }

    pub(crate) fn active_list_mut(&mut self, side: OrderSide) -> &mut Vec<OrderId> {
        match side {
            OrderSide::Buy => &mut self.active_buys,
            OrderSide::Sell => &mut self.active_sells,
        }
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<&PrivateOrder> {
        self.orders.get(id)
    }

    #[must_use]
    pub fn order_match(&self, id: &MatchId) -> Option<&OrderMatch> {
        self.matches.get(id)
    }

    /// Ids of unfilled orders on `side`, in submission order.
    #[must_use]
    pub fn active_order_ids(&self, side: OrderSide) -> &[OrderId] {
        match side {
            OrderSide::Buy => &self.active_buys,
            OrderSide::Sell => &self.active_sells,
        }
    }

    /// Unfilled orders on `side`, in submission order.
    #[must_use]
    pub fn active_orders(&self, side: OrderSide) -> Vec<&PrivateOrder> {
        self.active_order_ids(side)
            .iter()
            .filter_map(|id| self.orders.get(id))
            .collect()
    }

    #[must_use]
    pub fn is_commitment_used(&self, commitment: &OrderCommitment) -> bool {
        self.used_commitments.contains(commitment)
    }

    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}
