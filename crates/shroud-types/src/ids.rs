//! Content-derived identifiers used throughout Shroud.
//!
//! Every persisted entity is addressed by a 32-byte hash: commitments by
//! the hash of their hidden trade parameters, nullifiers by the hash of the
//! trader's secret, matches by the hash of the order pair plus timestamp.
//! All derivations are domain-separated SHA-256.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Amount, OrderSide, Price, Result, ShroudError};

/// SHA-256 over `tag || parts...`.
#[must_use]
pub fn domain_hash(tag: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// First four bytes, hex-encoded. For log lines.
            #[must_use]
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }

            #[must_use]
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from a 64-character hex string (optional `0x` prefix).
            pub fn from_hex(s: &str) -> Result<Self> {
                let raw = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(raw)
                    .map_err(|e| ShroudError::Serialization(format!("{}: {e}", $label)))?;
                let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
                    ShroudError::Serialization(format!(
                        "{}: expected 32 bytes, got {}",
                        $label,
                        v.len()
                    ))
                })?;
                Ok(Self(arr))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $label, hex::encode(&self.0[..8]))
            }
        }

        #[cfg(any(test, feature = "test-helpers"))]
        impl $name {
            /// Random identifier for tests.
            pub fn random() -> Self {
                Self(rand::random::<[u8; 32]>())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// CommitmentId
// ---------------------------------------------------------------------------

hash_id!(
    /// Hiding, binding hash of a trade's parameters plus a secret salt.
    CommitmentId,
    "cm"
);

impl CommitmentId {
    /// Canonical commitment over `(amount, price, side, salt)`.
    ///
    /// Clients compute this off-protocol; the core only ever sees the hash
    /// until the reveal.
    #[must_use]
    pub fn from_trade(amount: Amount, price: Price, side: OrderSide, salt: &[u8; 32]) -> Self {
        Self(domain_hash(
            b"shroud:commitment:v1:",
            &[
                &amount.to_le_bytes(),
                &price.to_le_bytes(),
                &[side.as_byte()],
                salt,
            ],
        ))
    }
}

// ---------------------------------------------------------------------------
// Nullifier
// ---------------------------------------------------------------------------

hash_id!(
    /// One-time-use tag derived from a trader's secret.
    Nullifier,
    "nf"
);

impl Nullifier {
    /// Derive the nullifier for `secret` spending `commitment`.
    #[must_use]
    pub fn derive(secret: &[u8; 32], commitment: &CommitmentId) -> Self {
        Self(domain_hash(
            b"shroud:nullifier:v1:",
            &[secret, commitment.as_bytes()],
        ))
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

hash_id!(
    /// Trader / protocol account identity.
    AccountId,
    "acct"
);

impl AccountId {
    /// Deterministic account id from a human-readable label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self(domain_hash(b"shroud:account:v1:", &[label.as_bytes()]))
    }
}

// ---------------------------------------------------------------------------
// Private order identifiers
// ---------------------------------------------------------------------------

hash_id!(
    /// Identifier of a private order.
    OrderId,
    "ord"
);

hash_id!(
    /// Commitment hash backing a private order. Single-use across all orders.
    OrderCommitment,
    "oc"
);

hash_id!(
    /// Commitment over a proposed buy/sell pairing, proven by the matcher.
    MatchCommitment,
    "mc"
);

hash_id!(
    /// Identifier of an [`crate::OrderMatch`].
    MatchId,
    "match"
);

impl MatchId {
    /// Deterministic match id from the order pair and the match timestamp.
    #[must_use]
    pub fn derive(buy_order: &OrderId, sell_order: &OrderId, matched_at: DateTime<Utc>) -> Self {
        Self(domain_hash(
            b"shroud:match_id:v1:",
            &[
                buy_order.as_bytes(),
                sell_order.as_bytes(),
                &matched_at.timestamp().to_le_bytes(),
                &matched_at.timestamp_subsec_nanos().to_le_bytes(),
            ],
        ))
    }
}

// ---------------------------------------------------------------------------
// AssetPair
// ---------------------------------------------------------------------------

/// The base/quote pair a deployment settles (e.g., WETH/USDC).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AssetPair {
    pub base: String,
    pub quote: String,
}

impl AssetPair {
    #[must_use]
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
