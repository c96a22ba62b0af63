//! Append-only audit events emitted by the lifecycle façade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AccountId, Amount, CommitmentId, MatchId, MatchSettlement, Nullifier, OrderId, OrderSide,
    SettlementReceipt,
};

/// A state transition that has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolEvent {
    CommitmentSubmitted {
        id: CommitmentId,
        creator: AccountId,
        at: DateTime<Utc>,
    },
    TradeSettled {
        id: CommitmentId,
        nullifier: Nullifier,
        receipt: SettlementReceipt,
        at: DateTime<Utc>,
    },
    OrderCommitted {
        id: OrderId,
        creator: AccountId,
        side: OrderSide,
        at: DateTime<Utc>,
    },
    OrdersMatched {
        id: MatchId,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        at: DateTime<Utc>,
    },
    MatchExecuted {
        id: MatchId,
        settlement: MatchSettlement,
        at: DateTime<Utc>,
    },
    Deposited {
        account: AccountId,
        asset: String,
        amount: Amount,
    },
    Withdrawn {
        account: AccountId,
        asset: String,
        amount: Amount,
    },
    Paused,
    Unpaused,
}

impl ProtocolEvent {
    /// Stable short name, used in log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommitmentSubmitted { .. } => "commitment_submitted",
            Self::TradeSettled { .. } => "trade_settled",
            Self::OrderCommitted { .. } => "order_committed",
            Self::OrdersMatched { .. } => "orders_matched",
            Self::MatchExecuted { .. } => "match_executed",
            Self::Deposited { .. } => "deposited",
            Self::Withdrawn { .. } => "withdrawn",
            Self::Paused => "paused",
            Self::Unpaused => "unpaused",
        }
    }
}
