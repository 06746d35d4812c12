//! Fixed-width identifiers used throughout xswap.
//!
//! Ledger accounts, mints and programs are 32-byte public keys. Order
//! signers are 20-byte Ethereum-style addresses. Messaging endpoints are
//! identified by a `u32` endpoint id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, XswapError};

// ---------------------------------------------------------------------------
// Pubkey
// ---------------------------------------------------------------------------

/// A 32-byte ledger address: an account, a mint, a program or a derived
/// address. The all-zero key denotes the native asset when used as a mint.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Pubkey(pub [u8; 32]);

impl Pubkey {
    /// The all-zero key.
    pub const ZERO: Self = Self([0u8; 32]);

    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// First four bytes as hex, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|e| {
            XswapError::InvalidInput {
                reason: format!("pubkey hex: {e}"),
            }
        })?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| XswapError::InvalidInput {
            reason: "pubkey must be 32 bytes".to_string(),
        })?;
        Ok(Self(arr))
    }

    /// Random key for tests.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn new_unique() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Pubkey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// EthAddress
// ---------------------------------------------------------------------------

/// 20-byte address of a secp256k1 key: the trailing 20 bytes of the
/// keccak-256 hash of the uncompressed public key.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct EthAddress(pub [u8; 20]);

impl EthAddress {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Nonce
// ---------------------------------------------------------------------------

/// Width of an order nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Width of the custom-data field of an XFER payload.
pub const CUSTOM_DATA_LEN: usize = 18;

/// 12-byte order nonce. Uniqueness per `(nonce, trader)` is enforced by the
/// ledger refusing to re-create the derived address, never by a counter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Nonce(pub [u8; NONCE_LEN]);

impl Nonce {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    /// Place the nonce in the trailing 12 bytes of an XFER custom-data field.
    /// The leading 6 bytes carry flags and are left zero.
    #[must_use]
    pub fn to_custom_data(&self) -> [u8; CUSTOM_DATA_LEN] {
        let mut data = [0u8; CUSTOM_DATA_LEN];
        data[CUSTOM_DATA_LEN - NONCE_LEN..].copy_from_slice(&self.0);
        data
    }

    /// Inverse of [`Nonce::to_custom_data`]; flag bytes are ignored.
    #[must_use]
    pub fn from_custom_data(data: &[u8; CUSTOM_DATA_LEN]) -> Self {
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&data[CUSTOM_DATA_LEN - NONCE_LEN..]);
        Self(nonce)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// A token symbol right-padded with zero bytes to 32 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub [u8; 32]);

impl Symbol {
    /// Pad an ASCII symbol. Symbols longer than 32 bytes are rejected.
    pub fn new(symbol: &str) -> Result<Self> {
        let raw = symbol.as_bytes();
        if raw.len() > 32 {
            return Err(XswapError::InvalidInput {
                reason: format!("symbol {symbol:?} longer than 32 bytes"),
            });
        }
        let mut padded = [0u8; 32];
        padded[..raw.len()].copy_from_slice(raw);
        Ok(Self(padded))
    }

    /// The symbol with trailing padding stripped.
    #[must_use]
    pub fn as_str(&self) -> String {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(32);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}
