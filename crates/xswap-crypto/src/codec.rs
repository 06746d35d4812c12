//! Canonical order encoding and hashing.
//!
//! Each order type is encoded as its type-descriptor string followed by its
//! fields in descriptor order, fixed-width and big-endian:
//!
//! | field kind | encoding |
//! |---|---|
//! | public key | 32 raw bytes |
//! | `u64` amount | 8 bytes BE |
//! | `u128` expiry | 16 bytes BE |
//! | nonce | 12 raw bytes |
//! | symbol | 32 raw bytes |
//! | destination chain id | 4 bytes BE |
//!
//! The order hash is `keccak256(encoding)`. Any change to field order or
//! width changes every hash and invalidates every outstanding signature.

use sha2::{Digest as _, Sha256};
use sha3::Keccak256;
use xswap_types::constants::{CROSS_SWAP_TYPE, ORDER_TYPE};
use xswap_types::{CrossOrder, Order, Result, XswapError};

/// `keccak256(data)`.
#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// First 8 bytes of `sha256("global:<name>")`.
#[must_use]
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("global:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// An intent with a canonical byte encoding that can be signed.
pub trait SignableOrder {
    fn encode(&self) -> Vec<u8>;

    fn order_hash(&self) -> [u8; 32] {
        keccak256(&self.encode())
    }
}

impl SignableOrder for Order {
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ORDER_TYPE.len() + 172);
        out.extend_from_slice(ORDER_TYPE.as_bytes());
        out.extend_from_slice(self.maker_asset.as_bytes());
        out.extend_from_slice(self.taker_asset.as_bytes());
        out.extend_from_slice(self.taker.as_bytes());
        out.extend_from_slice(&self.maker_amount.to_be_bytes());
        out.extend_from_slice(&self.taker_amount.to_be_bytes());
        out.extend_from_slice(&self.expiry.to_be_bytes());
        out.extend_from_slice(self.dest_trader.as_bytes());
        out.extend_from_slice(self.nonce.as_bytes());
        out
    }
}

impl SignableOrder for CrossOrder {
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CROSS_SWAP_TYPE.len() + 224);
        out.extend_from_slice(CROSS_SWAP_TYPE.as_bytes());
        out.extend_from_slice(self.taker.as_bytes());
        out.extend_from_slice(self.dest_trader.as_bytes());
        out.extend_from_slice(&self.maker_symbol.0);
        out.extend_from_slice(self.maker_asset.as_bytes());
        out.extend_from_slice(self.taker_asset.as_bytes());
        out.extend_from_slice(&self.maker_amount.to_be_bytes());
        out.extend_from_slice(&self.taker_amount.to_be_bytes());
        out.extend_from_slice(self.nonce.as_bytes());
        out.extend_from_slice(&self.expiry.to_be_bytes());
        out.extend_from_slice(&self.dest_chain_id.to_be_bytes());
        out
    }
}

// ---------------------------------------------------------------------------
// Partial fills
// ---------------------------------------------------------------------------

/// `floor(maker_amount * provided / taker_amount)` when `provided` is below
/// `taker_amount`, otherwise `maker_amount`.
pub fn adjusted_maker_amount(maker_amount: u64, taker_amount: u64, provided: u64) -> Result<u64> {
    if provided >= taker_amount {
        return Ok(maker_amount);
    }
    let scaled = u128::from(maker_amount) * u128::from(provided) / u128::from(taker_amount);
    u64::try_from(scaled).map_err(|_| XswapError::ArithmeticOverflow {
        context: "partial fill",
    })
}

/// An order as it will actually settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// The order with its maker amount adjusted; this is what gets hashed.
    pub order: Order,
    /// Amount the taker transfers in.
    pub taker_paid: u64,
}

/// Apply a partial fill. The signature must cover the adjusted maker
/// amount, so a maker signs for the exact taker amount it expects.
pub fn fill(order: &Order, is_partial: bool, provided: u64) -> Result<Fill> {
    if !is_partial || provided >= order.taker_amount {
        return Ok(Fill {
            order: order.clone(),
            taker_paid: order.taker_amount,
        });
    }
    if provided == 0 {
        return Err(XswapError::ZeroAmount);
    }
    let mut adjusted = order.clone();
    adjusted.maker_amount =
        adjusted_maker_amount(order.maker_amount, order.taker_amount, provided)?;
    Ok(Fill {
        order: adjusted,
        taker_paid: provided,
    })
}
