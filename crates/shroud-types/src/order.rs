//! Private order and match records.
//!
//! Private orders carry only encrypted amount/price blobs until a match
//! is executed, at which point the proven execution amount and price are
//! written back to both orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AccountId, Amount, MatchCommitment, MatchId, OrderCommitment, OrderId, Price, Result,
    ShroudError,
};

/// Which side of the book an order or reveal is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Canonical byte used in hash preimages.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A two-sided private order. Amount and price stay encrypted until fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateOrder {
    pub id: OrderId,
    pub creator: AccountId,
    pub side: OrderSide,
    /// Commitment hash consumed by this order.
    pub commitment: OrderCommitment,
    pub encrypted_amount: Vec<u8>,
    pub encrypted_price: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub filled: bool,
    pub executed_amount: Amount,
    pub executed_price: Price,
}

impl PrivateOrder {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.filled
    }

    /// Active and on `side`.
    #[must_use]
    pub fn is_active_on(&self, side: OrderSide) -> bool {
        self.is_active() && self.side == side
    }

    /// Terminal transition: record the execution and mark filled.
    ///
    /// # Errors
    /// Returns [`ShroudError::OrderNotActive`] if already filled.
    pub fn mark_filled(&mut self, amount: Amount, price: Price) -> Result<()> {
        if self.filled {
            return Err(ShroudError::OrderNotActive(self.id));
        }
        self.filled = true;
        self.executed_amount = amount;
        self.executed_price = price;
        Ok(())
    }
}

/// A proven pairing of one buy and one sell order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMatch {
    pub id: MatchId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub match_commitment: MatchCommitment,
    pub matched_at: DateTime<Utc>,
    pub executed: bool,
    pub amount: Amount,
    pub price: Price,
}

impl OrderMatch {
    /// Terminal transition to executed.
    ///
    /// # Errors
    /// Returns [`ShroudError::MatchAlreadyExecuted`] if already executed.
    pub fn mark_executed(&mut self, amount: Amount, price: Price) -> Result<()> {
        if self.executed {
            return Err(ShroudError::MatchAlreadyExecuted(self.id));
        }
        self.executed = true;
        self.amount = amount;
        self.price = price;
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl PrivateOrder {
    pub fn dummy(side: OrderSide) -> Self {
        Self {
            id: OrderId::random(),
            creator: AccountId::random(),
            side,
            commitment: OrderCommitment::random(),
            encrypted_amount: vec![0xAA; 32],
            encrypted_price: vec![0xBB; 32],
            created_at: Utc::now(),
            filled: false,
            executed_amount: 0,
            executed_price: 0,
        }
    }
}
