//! Deployment configuration.
//!
//! A [`ProtocolConfig`] is fixed for the lifetime of a controller. It can be
//! built in code, or loaded from JSON where every field is optional and
//! falls back to the defaults in [`crate::constants`].

use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, AssetPair, FeeBps, Result, ShroudError, constants};

/// Per-deployment protocol parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Base asset bought and sold by reveals (e.g., "WETH").
    pub base_asset: String,
    /// Quote asset held in custodial balances (e.g., "USDC").
    pub quote_asset: String,
    /// Minimum seconds between commitment and reveal.
    pub phase_duration_secs: u64,
    /// Smallest base amount a single settlement may move.
    pub min_trade_amount: Amount,
    /// Protocol fee in basis points of the quote amount.
    pub fee_bps: FeeBps,
    /// Account credited with protocol fees.
    pub fee_recipient: AccountId,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            base_asset: constants::DEFAULT_BASE_ASSET.to_string(),
            quote_asset: constants::DEFAULT_QUOTE_ASSET.to_string(),
            phase_duration_secs: constants::DEFAULT_PHASE_DURATION_SECS,
            min_trade_amount: constants::DEFAULT_MIN_TRADE_AMOUNT,
            fee_bps: constants::DEFAULT_FEE_BPS,
            fee_recipient: AccountId::from_label(constants::DEFAULT_FEE_RECIPIENT_LABEL),
        }
    }
}

impl ProtocolConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Reject values the settlement arithmetic cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.base_asset.is_empty() || self.quote_asset.is_empty() {
            return Err(ShroudError::Configuration(
                "asset symbols must be non-empty".into(),
            ));
        }
        if self.base_asset == self.quote_asset {
            return Err(ShroudError::Configuration(format!(
                "base and quote asset are both {}",
                self.base_asset
            )));
        }
        if self.fee_bps > constants::MAX_FEE_BPS {
            return Err(ShroudError::Configuration(format!(
                "fee_bps {} exceeds {}",
                self.fee_bps,
                constants::MAX_FEE_BPS
            )));
        }
        if self.phase_duration_secs > constants::MAX_PHASE_DURATION_SECS {
            return Err(ShroudError::Configuration(format!(
                "phase_duration_secs {} exceeds {}",
                self.phase_duration_secs,
                constants::MAX_PHASE_DURATION_SECS
            )));
        }
        Ok(())
    }

    /// The maturation window as a [`TimeDelta`].
    #[must_use]
    pub fn phase_duration(&self) -> TimeDelta {
        i64::try_from(self.phase_duration_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    #[must_use]
    pub fn pair(&self) -> AssetPair {
        AssetPair::new(&self.base_asset, &self.quote_asset)
    }
}
