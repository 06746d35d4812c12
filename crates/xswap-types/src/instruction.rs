//! The settlement program's instruction surface.

use serde::{Deserialize, Serialize};

use crate::{AccountMeta, BanReason, CrossOrder, EthAddress, Nonce, Order, Pubkey, Symbol};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeParams {
    pub swap_signer: EthAddress,
    pub default_chain_id: u32,
    /// Messaging endpoint program the portfolio is bound to.
    pub endpoint: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRemoteParams {
    pub dst_eid: u32,
    pub remote: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanAccountParams {
    pub account: Pubkey,
    pub reason: BanReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTokenParams {
    pub symbol: Symbol,
    pub token_address: Pubkey,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositNativeParams {
    pub amount: u64,
    /// Beneficiary on the destination ledger.
    pub trader: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositParams {
    pub token_mint: Pubkey,
    pub amount: u64,
    pub trader: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmountParams {
    pub token_mint: Pubkey,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    pub order: Order,
    /// 65-byte recoverable signature over the order hash.
    pub signature: Vec<u8>,
    pub is_partial: bool,
    /// Taker amount actually provided; only read when `is_partial`.
    pub taker_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSwapParams {
    pub order: CrossOrder,
    pub signature: Vec<u8>,
    /// Endpoint program the caller routes through.
    pub endpoint: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LzReceiveParams {
    pub src_eid: u32,
    /// Peer program on the source ledger.
    pub sender: Pubkey,
    /// Endpoint inbound nonce.
    pub nonce: u64,
    pub guid: [u8; 32],
    pub message: Vec<u8>,
    pub extra_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapKeyParams {
    pub nonce: Nonce,
    pub trader: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveFromSwapQueueParams {
    pub nonce: Nonce,
    pub dest_trader: Pubkey,
    /// Account to pay; must match the one derived from the stored entry.
    pub destination: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSwapExpiryParams {
    pub nonce: Nonce,
    pub trader: Pubkey,
    pub expiry: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDestinationParams {
    pub eid: u32,
    pub token_address: Pubkey,
}

// ---------------------------------------------------------------------------
// Instruction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Initialize(InitializeParams),
    SetRemote(SetRemoteParams),
    AddAdmin { account: Pubkey },
    RemoveAdmin { account: Pubkey },
    AddRebalancer { account: Pubkey },
    RemoveRebalancer { account: Pubkey },
    BanAccount(BanAccountParams),
    UnbanAccount { account: Pubkey },
    SetPaused { paused: bool },
    SetAllowDeposit { allow: bool },
    SetNativeDepositsRestricted { restricted: bool },
    SetDefaultChain { chain_id: u32 },
    SetAirdropAmount { amount: u64 },
    SetSwapSigner { swap_signer: EthAddress },
    AddToken(AddTokenParams),
    RemoveToken { token_address: Pubkey },
    DepositNative(DepositNativeParams),
    Deposit(DepositParams),
    DepositAirdrop { amount: u64 },
    FundSol { amount: u64 },
    FundSpl(TokenAmountParams),
    ClaimNativeBalance { amount: u64 },
    ClaimSplBalance(TokenAmountParams),
    ClaimAirdropBalance { amount: u64 },
    Swap(SwapParams),
    CrossSwap(CrossSwapParams),
    LzReceive(LzReceiveParams),
    FinalizePendingSwap(SwapKeyParams),
    RemoveFromSwapQueue(RemoveFromSwapQueueParams),
    UpdateSwapExpiry(UpdateSwapExpiryParams),
    AddDestination(AddDestinationParams),
}

impl Instruction {
    /// Snake-case name; the instruction discriminator is derived from it.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize(_) => "initialize",
            Self::SetRemote(_) => "set_remote",
            Self::AddAdmin { .. } => "add_admin",
            Self::RemoveAdmin { .. } => "remove_admin",
            Self::AddRebalancer { .. } => "add_rebalancer",
            Self::RemoveRebalancer { .. } => "remove_rebalancer",
            Self::BanAccount(_) => "ban_account",
            Self::UnbanAccount { .. } => "unban_account",
            Self::SetPaused { .. } => "set_paused",
            Self::SetAllowDeposit { .. } => "set_allow_deposit",
            Self::SetNativeDepositsRestricted { .. } => "set_native_deposits_restricted",
            Self::SetDefaultChain { .. } => "set_default_chain",
            Self::SetAirdropAmount { .. } => "set_airdrop_amount",
            Self::SetSwapSigner { .. } => "set_swap_signer",
            Self::AddToken(_) => "add_token",
            Self::RemoveToken { .. } => "remove_token",
            Self::DepositNative(_) => "deposit_native",
            Self::Deposit(_) => "deposit",
            Self::DepositAirdrop { .. } => "deposit_airdrop",
            Self::FundSol { .. } => "fund_sol",
            Self::FundSpl(_) => "fund_spl",
            Self::ClaimNativeBalance { .. } => "claim_native_balance",
            Self::ClaimSplBalance(_) => "claim_spl_balance",
            Self::ClaimAirdropBalance { .. } => "claim_airdrop_balance",
            Self::Swap(_) => "swap",
            Self::CrossSwap(_) => "cross_swap",
            Self::LzReceive(_) => "lz_receive",
            Self::FinalizePendingSwap(_) => "finalize_pending_swap",
            Self::RemoveFromSwapQueue(_) => "remove_from_swap_queue",
            Self::UpdateSwapExpiry(_) => "update_swap_expiry",
            Self::AddDestination(_) => "add_destination",
        }
    }

    /// Whether the instruction forwards relay accounts to the endpoint.
    #[must_use]
    pub fn sends_message(&self) -> bool {
        matches!(
            self,
            Self::DepositNative(_) | Self::Deposit(_) | Self::CrossSwap(_)
        )
    }
}

/// A signed instruction plus the accounts forwarded to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub signer: Pubkey,
    pub instruction: Instruction,
    pub remaining_accounts: Vec<AccountMeta>,
}
