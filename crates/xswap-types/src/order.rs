//! Signed swap intents.
//!
//! An [`Order`] settles on this ledger; a [`CrossOrder`] escrows the taker
//! side here and delivers the maker side on `dest_chain_id`. Both are
//! immutable once signed and identified by `(nonce, dest_trader)`.

use serde::{Deserialize, Serialize};

use crate::{Nonce, Pubkey, Symbol};

/// Same-ledger swap intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Asset released from the vault. Zero for native.
    pub maker_asset: Pubkey,
    /// Asset collected from the taker. Zero for native.
    pub taker_asset: Pubkey,
    pub taker: Pubkey,
    pub maker_amount: u64,
    pub taker_amount: u64,
    /// Unix seconds after which the order is void.
    pub expiry: u128,
    pub dest_trader: Pubkey,
    pub nonce: Nonce,
}

/// Cross-ledger swap intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossOrder {
    pub taker: Pubkey,
    /// Recipient on the destination ledger.
    pub dest_trader: Pubkey,
    /// Symbol of the maker asset as the destination ledger knows it.
    pub maker_symbol: Symbol,
    pub maker_asset: Pubkey,
    pub taker_asset: Pubkey,
    pub maker_amount: u64,
    pub taker_amount: u64,
    pub nonce: Nonce,
    pub expiry: u128,
    pub dest_chain_id: u32,
}
