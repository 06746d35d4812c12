//! Records stored at derived addresses.
//!
//! Existence of a record *is* state: a pending swap is pending because a
//! [`PendingSwap`] exists at its derived address, a key is an admin because
//! an [`AdminRecord`] exists at `derive("Admin", key)`, and so on.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::{EthAddress, Pubkey, Symbol, constants};

// ---------------------------------------------------------------------------
// Portfolio / global config
// ---------------------------------------------------------------------------

/// Program-wide switches and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Sequence number of the next outbound message.
    pub out_nonce: u64,
    pub allow_deposit: bool,
    pub program_paused: bool,
    pub native_deposits_restricted: bool,
    /// Endpoint id deposits are relayed to.
    pub default_chain_id: u32,
    pub airdrop_amount: u64,
    /// Address whose signatures authorize orders.
    pub swap_signer: EthAddress,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            out_nonce: 0,
            allow_deposit: true,
            program_paused: false,
            native_deposits_restricted: false,
            default_chain_id: 0,
            airdrop_amount: constants::DEFAULT_AIRDROP_AMOUNT,
            swap_signer: EthAddress::default(),
        }
    }
}

/// Singleton root record at `derive("Pfl")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub global_config: GlobalConfig,
    /// Messaging endpoint program this portfolio talks to.
    pub endpoint: Pubkey,
    pub bump: u8,
}

/// Peer program on another ledger, at `derive("Remote", eid BE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub address: Pubkey,
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalancerRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BanReason {
    #[default]
    NotBanned,
    Ofac,
    Abuse,
    Terms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedAccount {
    pub reason: BanReason,
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Registered token, at `derive("TokenDetails", mint)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDetails {
    pub token_address: Pubkey,
    pub symbol: Symbol,
    pub decimals: u8,
}

impl TokenDetails {
    /// Base units expressed in whole tokens: 5000 at 3 decimals is 5.
    #[must_use]
    pub fn to_units(&self, amount: u64) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(amount), u32::from(self.decimals))
    }

    /// Whole tokens to base units, truncating sub-unit precision.
    /// `None` if the result does not fit a `u64`.
    #[must_use]
    pub fn from_units(&self, units: Decimal) -> Option<u64> {
        let scaled = units.checked_mul(Decimal::from(10u64.checked_pow(u32::from(self.decimals))?))?;
        scaled.trunc().to_u64()
    }
}

/// Every supported mint, at `derive("TokenList", "1")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenList {
    pub tokens: Vec<Pubkey>,
}

impl TokenList {
    #[must_use]
    pub fn contains(&self, mint: &Pubkey) -> bool {
        self.tokens.contains(mint)
    }
}

/// Marker at `derive("Cads", eid BE, asset)` allowing cross swaps of `asset`
/// to destination `eid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedDestination {
    pub eid: u32,
    pub token_address: Pubkey,
}

// ---------------------------------------------------------------------------
// Swap queue
// ---------------------------------------------------------------------------

/// Escrowed inbound transfer the trading vault could not cover on receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSwap {
    pub trader: Pubkey,
    pub quantity: u64,
    /// Zero for the native asset.
    pub token_mint: Pubkey,
}

/// Terminal marker blocking replay of `(nonce, dest_trader)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSwapEntry {
    /// Unix seconds until which the marker must be retained.
    pub expiry: i64,
}

/// Audit marker written when a pending entry is unwound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredSwapEntry {
    pub trader: Pubkey,
    pub quantity: u64,
    pub token_mint: Pubkey,
    pub removed_at: i64,
}

/// Observable lifecycle of one `(nonce, trader)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapState {
    Absent,
    Pending,
    Completed,
    Expired,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Marker stored at a vault authority address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord;

/// Everything an account store can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Portfolio(Portfolio),
    Remote(Remote),
    Admin(AdminRecord),
    Rebalancer(RebalancerRecord),
    Banned(BannedAccount),
    TokenDetails(TokenDetails),
    TokenList(TokenList),
    AllowedDestination(AllowedDestination),
    PendingSwap(PendingSwap),
    CompletedSwap(CompletedSwapEntry),
    ExpiredSwap(ExpiredSwapEntry),
    Vault(VaultRecord),
}

/// Typed view over [`Record`].
pub trait StoredRecord: Sized {
    /// Used in `NotFound` messages.
    const NAME: &'static str;

    fn from_record(record: &Record) -> Option<&Self>;
    fn from_record_mut(record: &mut Record) -> Option<&mut Self>;
    fn into_record(self) -> Record;
}

macro_rules! stored_record {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl StoredRecord for $ty {
            const NAME: &'static str = $name;

            fn from_record(record: &Record) -> Option<&Self> {
                match record {
                    Record::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_record_mut(record: &mut Record) -> Option<&mut Self> {
                match record {
                    Record::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn into_record(self) -> Record {
                Record::$variant(self)
            }
        }
    };
}

stored_record!(Portfolio, Portfolio, "portfolio");
stored_record!(Remote, Remote, "remote");
stored_record!(AdminRecord, Admin, "admin");
stored_record!(RebalancerRecord, Rebalancer, "rebalancer");
stored_record!(BannedAccount, Banned, "banned account");
stored_record!(TokenDetails, TokenDetails, "token details");
stored_record!(TokenList, TokenList, "token list");
stored_record!(AllowedDestination, AllowedDestination, "allowed destination");
stored_record!(PendingSwap, PendingSwap, "pending swap");
stored_record!(CompletedSwapEntry, CompletedSwap, "completed swap");
stored_record!(ExpiredSwapEntry, ExpiredSwap, "expired swap");
stored_record!(VaultRecord, Vault, "vault");
