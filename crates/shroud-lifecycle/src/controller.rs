//! Trade lifecycle controller.
//!
//! Single entry point for every protocol operation. Composes the commitment
//! store, nullifier registry, settlement engine, and private order book,
//! and gates all mutations behind the pause switch.
//!
//! ## Reveal pipeline
//!
//! ```text
//! pause gate → lookup → executed? → phase elapsed? → nullifier unused?
//!            → proof([id]) → settle → consume nullifier → mark executed
//! ```
//!
//! Every check runs before settlement, and settlement itself validates
//! before it mutates, so a reveal that fails at any step changes nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shroud_orderbook::{OrderRequest, PrivateOrderBook};
use shroud_settlement::{NullifierRegistry, SettlementEngine, TokenLedger};
use shroud_types::{
    AccountId, Amount, CommitmentId, CommitmentPhase, MatchCommitment, MatchId, MatchSettlement,
    Nullifier, OrderCommitment, OrderId, OrderMatch, OrderSide, Price, PrivateOrder, Proof,
    ProofVerifier, ProtocolConfig, ProtocolEvent, PublicInputs, Result, SettlementReceipt,
    ShroudError, TradeCommitment,
};
use tracing::{info, warn};

use crate::pause::PauseGuard;
use crate::store::CommitmentStore;

/// A reveal: the now-public trade parameters plus proof and nullifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRequest {
    pub id: CommitmentId,
    pub proof: Proof,
    pub nullifier: Nullifier,
    pub amount: Amount,
    pub price: Price,
    pub side: OrderSide,
}

/// Everything a reveal can touch. Cloned wholesale to stage a batch.
#[derive(Debug, Clone)]
pub(crate) struct ProtocolState<T> {
    pub(crate) commitments: CommitmentStore,
    pub(crate) nullifiers: NullifierRegistry,
    pub(crate) engine: SettlementEngine<T>,
    pub(crate) orderbook: PrivateOrderBook,
}

impl<T: TokenLedger> ProtocolState<T> {
    /// Run one reveal to completion or fail without mutation.
    pub(crate) fn reveal<V: ProofVerifier>(
        &mut self,
        verifier: &V,
        request: &RevealRequest,
        now: DateTime<Utc>,
    ) -> Result<SettlementReceipt> {
        let creator = self.commitments.ensure_revealable(&request.id, now)?.creator;
        self.nullifiers.ensure_unused(&request.nullifier)?;

        let inputs = PublicInputs::single(*request.id.as_bytes());
        if !verifier.verify(&request.proof, &inputs) {
            warn!(commitment = %request.id, "reveal proof rejected");
            return Err(ShroudError::InvalidProof(request.id));
        }

        let receipt = self
            .engine
            .settle(creator, request.amount, request.price, request.side)?;

        // Both checked above; neither can fail now.
        self.nullifiers.insert(request.nullifier)?;
        self.commitments.mark_executed(&request.id, request.nullifier)?;

        info!(
            commitment = %request.id,
            nullifier = %request.nullifier,
            receipt = %receipt,
            "reveal settled"
        );
        Ok(receipt)
    }
}

/// The protocol façade.
///
/// Every mutating method takes `&mut self`; callers that need shared access
/// wrap the controller in their own lock.
pub struct TradeLifecycleController<V, T> {
    config: ProtocolConfig,
    verifier: V,
    pub(crate) state: ProtocolState<T>,
    pause: PauseGuard,
    pub(crate) events: Vec<ProtocolEvent>,
}

impl<V: ProofVerifier, T: TokenLedger> TradeLifecycleController<V, T> {
    /// Build a controller over `tokens`, checking proofs with `verifier`.
    ///
    /// # Errors
    /// [`ShroudError::Configuration`] if `config` fails validation.
    pub fn new(config: ProtocolConfig, verifier: V, tokens: T) -> Result<Self> {
        config.validate()?;
        let engine = SettlementEngine::new(&config, tokens);
        info!(
            base = %config.base_asset,
            quote = %config.quote_asset,
            fee_bps = config.fee_bps,
            phase_secs = config.phase_duration_secs,
            "lifecycle controller initialised"
        );
        Ok(Self {
            config,
            verifier,
            state: ProtocolState {
                commitments: CommitmentStore::new(),
                nullifiers: NullifierRegistry::new(),
                engine,
                orderbook: PrivateOrderBook::new(),
            },
            pause: PauseGuard::new(),
            events: Vec::new(),
        })
    }

    pub(crate) fn verifier(&self) -> &V {
        &self.verifier
    }

    pub(crate) fn ensure_active(&self) -> Result<()> {
        self.pause.ensure_active()
    }

    // =================================================================
    // Commit-reveal
    // =================================================================

    /// Record a commitment for `creator` at `now`.
    ///
    /// # Errors
    /// [`ShroudError::Paused`], [`ShroudError::DuplicateCommitment`].
    pub fn submit_commitment(
        &mut self,
        id: CommitmentId,
        creator: AccountId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_active()?;
        let phase_duration = self.config.phase_duration();
        let commitment = self.state.commitments.submit(id, creator, now, phase_duration)?;
        info!(
            commitment = %id,
            creator = %creator,
            deadline = %commitment.phase_deadline,
            "commitment submitted"
        );
        self.events.push(ProtocolEvent::CommitmentSubmitted {
            id,
            creator,
            at: now,
        });
        Ok(())
    }

    /// Reveal and settle a matured commitment.
    ///
    /// # Errors
    /// In check order: [`ShroudError::Paused`], [`ShroudError::CommitmentNotFound`],
    /// [`ShroudError::AlreadyExecuted`], [`ShroudError::PhaseNotElapsed`],
    /// [`ShroudError::NullifierReused`], [`ShroudError::InvalidProof`], then any
    /// settlement error.
    pub fn reveal(&mut self, request: RevealRequest, now: DateTime<Utc>) -> Result<SettlementReceipt> {
        self.ensure_active()?;
        let receipt = self.state.reveal(&self.verifier, &request, now)?;
        self.events.push(ProtocolEvent::TradeSettled {
            id: request.id,
            nullifier: request.nullifier,
            receipt: receipt.clone(),
            at: now,
        });
        Ok(receipt)
    }

    /// Lifecycle phase of `id` at `now`.
    ///
    /// # Errors
    /// [`ShroudError::CommitmentNotFound`] if `id` is unknown.
    pub fn phase(&self, id: &CommitmentId, now: DateTime<Utc>) -> Result<CommitmentPhase> {
        self.state
            .commitments
            .phase(id, now)
            .ok_or(ShroudError::CommitmentNotFound(*id))
    }

    // =================================================================
    // Custody
    // =================================================================

    pub fn deposit(&mut self, account: AccountId, asset: &str, amount: Amount) -> Result<()> {
        self.ensure_active()?;
        self.state.engine.deposit(account, asset, amount)?;
        self.events.push(ProtocolEvent::Deposited {
            account,
            asset: asset.to_string(),
            amount,
        });
        Ok(())
    }

    pub fn withdraw(&mut self, account: AccountId, asset: &str, amount: Amount) -> Result<()> {
        self.ensure_active()?;
        self.state.engine.withdraw(account, asset, amount)?;
        self.events.push(ProtocolEvent::Withdrawn {
            account,
            asset: asset.to_string(),
            amount,
        });
        Ok(())
    }

    // =================================================================
    // Private orders
    // =================================================================

    pub fn commit_order(&mut self, request: OrderRequest, now: DateTime<Utc>) -> Result<OrderId> {
        self.ensure_active()?;
        let (creator, side) = (request.creator, request.side);
        let id = self.state.orderbook.commit_order(request, now)?;
        self.events.push(ProtocolEvent::OrderCommitted {
            id,
            creator,
            side,
            at: now,
        });
        Ok(id)
    }

    /// Pair an active buy with an active sell. Public inputs for `proof`
    /// are `[match_commitment]`.
    pub fn match_orders(
        &mut self,
        buy_id: OrderId,
        sell_id: OrderId,
        match_commitment: MatchCommitment,
        proof: &Proof,
        now: DateTime<Utc>,
    ) -> Result<MatchId> {
        self.ensure_active()?;
        let id = self.state.orderbook.match_orders(
            buy_id,
            sell_id,
            match_commitment,
            proof,
            &self.verifier,
            now,
        )?;
        self.events.push(ProtocolEvent::OrdersMatched {
            id,
            buy_order_id: buy_id,
            sell_order_id: sell_id,
            at: now,
        });
        Ok(id)
    }

    /// Execute a match at `(amount, price)`: settle both parties, then fill
    /// both orders and mark the match executed. Public inputs for `proof`
    /// are `[match_id]`.
    ///
    /// # Errors
    /// [`ShroudError::Paused`], [`ShroudError::MatchNotFound`],
    /// [`ShroudError::MatchAlreadyExecuted`], [`ShroudError::InvalidExecutionProof`],
    /// [`ShroudError::OrderNotActive`], then any settlement error.
    pub fn execute_match(
        &mut self,
        match_id: &MatchId,
        proof: &Proof,
        amount: Amount,
        price: Price,
        now: DateTime<Utc>,
    ) -> Result<MatchSettlement> {
        self.ensure_active()?;
        let parties = self
            .state
            .orderbook
            .prepare_execution(match_id, proof, &self.verifier)?;

        let settlement =
            self.state
                .engine
                .settle_match(parties.buyer, parties.seller, amount, price)?;

        // prepare_execution checked everything finalize re-checks.
        self.state
            .orderbook
            .finalize_execution(match_id, amount, price)?;

        self.events.push(ProtocolEvent::MatchExecuted {
            id: *match_id,
            settlement: settlement.clone(),
            at: now,
        });
        Ok(settlement)
    }

    // =================================================================
    // Administration
    // =================================================================

    /// # Errors
    /// [`ShroudError::AlreadyPaused`].
    pub fn pause(&mut self) -> Result<()> {
        self.pause.pause()?;
        warn!("protocol paused");
        self.events.push(ProtocolEvent::Paused);
        Ok(())
    }

    /// # Errors
    /// [`ShroudError::NotPaused`].
    pub fn unpause(&mut self) -> Result<()> {
        self.pause.unpause()?;
        info!("protocol unpaused");
        self.events.push(ProtocolEvent::Unpaused);
        Ok(())
    }

    // =================================================================
    // Reads
    // =================================================================

    #[must_use]
    pub fn commitment(&self, id: &CommitmentId) -> Option<&TradeCommitment> {
        self.state.commitments.get(id)
    }

    #[must_use]
    pub fn commitments(&self) -> &CommitmentStore {
        &self.state.commitments
    }

    #[must_use]
    pub fn is_nullifier_used(&self, nullifier: &Nullifier) -> bool {
        self.state.nullifiers.contains(nullifier)
    }

    #[must_use]
    pub fn nullifiers(&self) -> &NullifierRegistry {
        &self.state.nullifiers
    }

    #[must_use]
    pub fn balance(&self, account: AccountId, asset: &str) -> Amount {
        self.state.engine.balance(account, asset)
    }

    #[must_use]
    pub fn engine(&self) -> &SettlementEngine<T> {
        &self.state.engine
    }

    /// The external token ledger, for wallet funding and approvals.
    pub fn tokens_mut(&mut self) -> &mut T {
        self.state.engine.tokens_mut()
    }

    /// Verify supply conservation for `asset`.
    pub fn verify_supply(&self, asset: &str) -> Result<()> {
        self.state.engine.verify_supply(asset)
    }

    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<&PrivateOrder> {
        self.state.orderbook.order(id)
    }

    #[must_use]
    pub fn order_match(&self, id: &MatchId) -> Option<&OrderMatch> {
        self.state.orderbook.order_match(id)
    }

    #[must_use]
    pub fn active_orders(&self, side: OrderSide) -> Vec<&PrivateOrder> {
        self.state.orderbook.active_orders(side)
    }

    #[must_use]
    pub fn is_commitment_used(&self, commitment: &OrderCommitment) -> bool {
        self.state.orderbook.is_commitment_used(commitment)
    }

    /// Committed state transitions, oldest first.
    #[must_use]
    pub fn events(&self) -> &[ProtocolEvent] {
        &self.events
    }

    #[must_use]
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }
}
