//! Packet translation between ledgers.
//!
//! The sending program addresses the maker asset by symbol (128-byte XFER);
//! the receiving program wants its own mint (104-byte XFER). The bridge
//! swaps the symbol slot for the destination mint and keeps the header,
//! trader and quantity as sent.

use std::collections::HashMap;

use xswap_ledger::SentPacket;
use xswap_types::constants::NATIVE_SYMBOL;
use xswap_types::{LzReceiveParams, Pubkey, Result, Symbol, XferMessage, XferPayload, XswapError};

/// Symbol-to-mint table of the destination ledger.
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    mints: HashMap<Symbol, Pubkey>,
}

impl SymbolMap {
    /// A table that knows only the native asset.
    pub fn with_native() -> Result<Self> {
        let mut map = Self::default();
        map.insert(Symbol::new(NATIVE_SYMBOL)?, Pubkey::ZERO);
        Ok(map)
    }

    pub fn insert(&mut self, symbol: Symbol, mint: Pubkey) {
        self.mints.insert(symbol, mint);
    }

    pub fn resolve(&self, symbol: &Symbol) -> Result<Pubkey> {
        self.mints
            .get(symbol)
            .copied()
            .ok_or_else(|| XswapError::InvalidInput {
                reason: format!("no destination mint for symbol {symbol}"),
            })
    }
}

/// Turn a packet sent by `(src_eid, sender)` into the delivery its
/// receiver expects.
pub fn translate(
    packet: &SentPacket,
    src_eid: u32,
    sender: Pubkey,
    symbols: &SymbolMap,
) -> Result<LzReceiveParams> {
    let message = XferMessage::unpack(&packet.message)?;
    let token_mint = symbols.resolve(&message.symbol)?;
    let payload = XferPayload {
        header: message.header,
        trader: Pubkey(message.trader),
        token_mint,
        quantity: message.quantity,
    };
    tracing::debug!(
        src_eid,
        dst_eid = packet.dst_eid,
        nonce = packet.nonce,
        symbol = %message.symbol,
        mint = %token_mint.short(),
        "packet translated"
    );
    Ok(LzReceiveParams {
        src_eid,
        sender,
        nonce: packet.nonce,
        guid: packet.guid,
        message: payload.pack().to_vec(),
        extra_data: Vec::new(),
    })
}
