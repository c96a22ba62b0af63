//! Settlement receipts.
//!
//! Every successful settlement returns a receipt carrying the exact integer
//! results of the fixed-point arithmetic, so callers and auditors can
//! reproduce them bit-for-bit.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, OrderSide, Price};

/// Outcome of a single-party reveal settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub trader: AccountId,
    pub side: OrderSide,
    /// Base amount moved.
    pub amount: Amount,
    pub price: Price,
    /// `amount * price / SCALE`.
    pub quote_amount: Amount,
    /// `quote_amount * fee_bps / 10_000`.
    pub fee: Amount,
    /// `quote_amount - fee`.
    pub net_quote: Amount,
}

impl std::fmt::Display for SettlementReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Settlement[{}] {} {} @ {} = {} (fee {}, net {})",
            self.trader.short(),
            self.side,
            self.amount,
            self.price,
            self.quote_amount,
            self.fee,
            self.net_quote,
        )
    }
}

/// Outcome of a two-party matched-order settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettlement {
    pub buyer: AccountId,
    pub seller: AccountId,
    pub amount: Amount,
    pub price: Price,
    /// Debited from the buyer.
    pub quote_amount: Amount,
    pub fee: Amount,
    /// Credited to the seller.
    pub net_quote: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_display() {
        let r = SettlementReceipt {
            trader: AccountId::from_bytes([0xCD; 32]),
            side: OrderSide::Sell,
            amount: 100,
            price: 2_000,
            quote_amount: 200_000,
            fee: 600,
            net_quote: 199_400,
        };
        let s = format!("{r}");
        assert!(s.contains("cdcdcdcd"));
        assert!(s.contains("SELL"));
        assert!(s.contains("199400"));
    }

    #[test]
    fn receipt_serde_roundtrip() {
        let r = MatchSettlement {
            buyer: AccountId::from_label("b"),
            seller: AccountId::from_label("s"),
            amount: 1,
            price: 2,
            quote_amount: 3,
            fee: 0,
            net_quote: 3,
        };
        let json = serde_json::to_string(&r).unwrap();
        let back: MatchSettlement = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
