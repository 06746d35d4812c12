//! Events emitted by the settlement program.
//!
//! Events are appended to the program's event log only when the instruction
//! that produced them commits.

use serde::{Deserialize, Serialize};

use crate::{BanReason, Nonce, Pubkey, Tx};

/// Whether a swap-queue entry was added or left the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueAction {
    Added,
    Finalized,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    Paused,
    AllowDeposit,
    NativeDepositsRestricted,
    DefaultChain,
    AirdropAmount,
    SwapSigner,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolEvent {
    SwapExecuted {
        nonce: Nonce,
        taker: Pubkey,
        dest_trader: Pubkey,
        dest_chain_id: u32,
        src_asset: Pubkey,
        dest_asset: Pubkey,
        src_amount: u64,
        dest_amount: u64,
    },
    SwapQueue {
        action: QueueAction,
        nonce: Nonce,
        trader: Pubkey,
        token_mint: Pubkey,
        quantity: u64,
    },
    XChainFinalized {
        nonce: Nonce,
        trader: Pubkey,
        token_mint: Pubkey,
        quantity: u64,
        timestamp: u32,
    },
    PortfolioUpdated {
        transaction: Tx,
        trader: Pubkey,
        token_mint: Pubkey,
        quantity: u64,
        out_nonce: u64,
    },
    NativeTransfer {
        from: Pubkey,
        to: Pubkey,
        amount: u64,
    },
    RoleChanged {
        role: String,
        account: Pubkey,
        granted: bool,
    },
    BanStatusChanged {
        account: Pubkey,
        reason: BanReason,
    },
    ParameterUpdated {
        parameter: ParameterKind,
        value: String,
    },
}
