//! All-or-nothing batch reveals.
//!
//! A batch arrives as parallel vectors. Lengths are checked before anything
//! runs. Items are then applied in order against a staged copy of the
//! protocol state, so later items see earlier items' effects (a reused
//! nullifier is caught). The staged copy replaces live state only if every
//! item succeeded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shroud_settlement::TokenLedger;
use shroud_types::{
    Amount, CommitmentId, Nullifier, OrderSide, Price, Proof, ProofVerifier, ProtocolEvent,
    Result, SettlementReceipt, ShroudError,
};
use tracing::{info, warn};

use crate::controller::{RevealRequest, TradeLifecycleController};

/// Reveals in column form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealBatch {
    pub ids: Vec<CommitmentId>,
    pub proofs: Vec<Proof>,
    pub nullifiers: Vec<Nullifier>,
    pub amounts: Vec<Amount>,
    pub prices: Vec<Price>,
    pub sides: Vec<OrderSide>,
}

impl RevealBatch {
    /// Columnise a list of reveal requests.
    pub fn from_requests(requests: impl IntoIterator<Item = RevealRequest>) -> Self {
        let mut batch = Self::default();
        for r in requests {
            batch.ids.push(r.id);
            batch.proofs.push(r.proof);
            batch.nullifiers.push(r.nullifier);
            batch.amounts.push(r.amount);
            batch.prices.push(r.price);
            batch.sides.push(r.side);
        }
        batch
    }

    /// Number of items, taken from `ids`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Fail with [`ShroudError::ArityMismatch`] naming the first column
    /// whose length differs from `ids`.
    pub fn ensure_arity(&self) -> Result<()> {
        let expected = self.ids.len();
        for (field, actual) in [
            ("proofs", self.proofs.len()),
            ("nullifiers", self.nullifiers.len()),
            ("amounts", self.amounts.len()),
            ("prices", self.prices.len()),
            ("sides", self.sides.len()),
        ] {
            if actual != expected {
                return Err(ShroudError::ArityMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Row form. Assumes [`Self::ensure_arity`] passed.
    fn into_requests(self) -> impl Iterator<Item = RevealRequest> {
        self.ids
            .into_iter()
            .zip(self.proofs)
            .zip(self.nullifiers)
            .zip(self.amounts)
            .zip(self.prices)
            .zip(self.sides)
            .map(|(((((id, proof), nullifier), amount), price), side)| RevealRequest {
                id,
                proof,
                nullifier,
                amount,
                price,
                side,
            })
    }
}

/// Applies a [`RevealBatch`] to a controller atomically.
pub struct BatchProcessor<'a, V, T> {
    controller: &'a mut TradeLifecycleController<V, T>,
}

impl<'a, V: ProofVerifier, T: TokenLedger + Clone> BatchProcessor<'a, V, T> {
    pub fn new(controller: &'a mut TradeLifecycleController<V, T>) -> Self {
        Self { controller }
    }

    /// Reveal every item in order. Returns one receipt per item.
    ///
    /// Items run against a staged copy of the commitment store, the
    /// nullifier registry and the settlement engine (ledger and token
    /// ledger included), so each call costs a clone proportional to those
    /// stores regardless of batch size. The order book is never touched by
    /// a reveal and is moved aside rather than copied.
    ///
    /// # Errors
    /// [`ShroudError::Paused`], [`ShroudError::ArityMismatch`], or the first
    /// item's error. On error, live state is exactly as before the call.
    pub fn process_batch(
        &mut self,
        batch: RevealBatch,
        now: DateTime<Utc>,
    ) -> Result<Vec<SettlementReceipt>> {
        self.controller.ensure_active()?;
        batch.ensure_arity()?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let size = batch.len();
        let orderbook = std::mem::take(&mut self.controller.state.orderbook);
        let mut staged = self.controller.state.clone();
        self.controller.state.orderbook = orderbook;
        let mut receipts = Vec::with_capacity(size);
        let mut events = Vec::with_capacity(size);

        for (index, request) in batch.into_requests().enumerate() {
            let receipt = staged
                .reveal(self.controller.verifier(), &request, now)
                .inspect_err(|e| {
                    warn!(index, size, commitment = %request.id, error = %e, "batch aborted");
                })?;
            events.push(ProtocolEvent::TradeSettled {
                id: request.id,
                nullifier: request.nullifier,
                receipt: receipt.clone(),
                at: now,
            });
            receipts.push(receipt);
        }

        staged.orderbook = std::mem::take(&mut self.controller.state.orderbook);
        self.controller.state = staged;
        self.controller.events.extend(events);
        info!(size, "batch committed");
        Ok(receipts)
    }
}

impl<V: ProofVerifier, T: TokenLedger + Clone> TradeLifecycleController<V, T> {
    /// Shorthand for [`BatchProcessor::process_batch`].
    pub fn process_batch(
        &mut self,
        batch: RevealBatch,
        now: DateTime<Utc>,
    ) -> Result<Vec<SettlementReceipt>> {
        BatchProcessor::new(self).process_batch(batch, now)
    }
}
