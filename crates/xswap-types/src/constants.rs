//! Protocol-wide constants.

// ---------------------------------------------------------------------------
// Seed tags
// ---------------------------------------------------------------------------

pub const PORTFOLIO_SEED: &[u8] = b"Pfl";
pub const SOL_VAULT_SEED: &[u8] = b"Solv";
pub const SOL_USER_FUNDS_VAULT_SEED: &[u8] = b"Soufv";
pub const AIRDROP_VAULT_SEED: &[u8] = b"Adv";
pub const SPL_VAULT_SEED: &[u8] = b"Splv";
pub const SPL_USER_FUNDS_VAULT_SEED: &[u8] = b"Sufv";
pub const REMOTE_SEED: &[u8] = b"Remote";
pub const ADMIN_SEED: &[u8] = b"Admin";
pub const REBALANCER_SEED: &[u8] = b"Rebalancer";
pub const BANNED_ACCOUNT_SEED: &[u8] = b"Banned";
pub const TOKEN_DETAILS_SEED: &[u8] = b"TokenDetails";
pub const TOKEN_LIST_SEED: &[u8] = b"TokenList";
/// Second seed of the singleton token list page.
pub const TOKEN_LIST_PAGE: &[u8] = b"1";
pub const COMPLETED_SWAPS_SEED: &[u8] = b"CompletedSwaps";
pub const EXPIRED_SWAPS_SEED: &[u8] = b"ExpiredSwaps";
pub const PENDING_SWAPS_SEED: &[u8] = b"PendingSwaps";
pub const CCTRADE_ALLOWED_DEST_SEED: &[u8] = b"Cads";

// Seeds owned by the messaging endpoint program.
pub const ENDPOINT_SEED: &[u8] = b"Endpoint";
pub const NONCE_SEED: &[u8] = b"Nonce";
pub const PAYLOAD_HASH_SEED: &[u8] = b"PayloadHash";
pub const OAPP_SEED: &[u8] = b"OApp";
pub const EVENT_AUTHORITY_SEED: &[u8] = b"__event_authority";
pub const SEND_LIBRARY_CONFIG_SEED: &[u8] = b"SendLibraryConfig";
pub const MESSAGE_LIB_SEED: &[u8] = b"MessageLib";

// ---------------------------------------------------------------------------
// Address derivation
// ---------------------------------------------------------------------------

/// Maximum length of a single derivation seed.
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds, bump included.
pub const MAX_SEEDS: usize = 16;

/// Domain marker appended to every derived-address preimage.
pub const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

// ---------------------------------------------------------------------------
// Order type descriptors
// ---------------------------------------------------------------------------

/// Hashed verbatim as the encoding prefix. The declared `nonce: u128` is
/// encoded as 12 raw bytes, not 16; signers on other ledgers hash the same
/// string, so it must not be corrected.
pub const ORDER_TYPE: &str = "Order(maker_asset: Pubkey, taker_asset: Pubkey, taker: Pubkey, maker_amount: u64, taker_amount: u64, expiry: u128, dest_trader: Pubkey, nonce: u128)";

/// Hashed verbatim as the encoding prefix. `nonce: u128` is encoded as 12
/// raw bytes and `dest_chaind_id: u64` (misspelling included) as a 4-byte
/// `u32`; both differ from the declared widths on purpose.
pub const CROSS_SWAP_TYPE: &str = "XChainSwap(taker: Pubkey, dest_trader: Pubkey, maker_symbol: [u8; 32], maker_asset: Pubkey, taker_asset: Pubkey, maker_amount: u64, taker_amount: u64, nonce: u128, expiry: u128, dest_chaind_id: u64)";

/// Length of a recoverable secp256k1 signature: `r || s || v`.
pub const SIGNATURE_LEN: usize = 65;

// ---------------------------------------------------------------------------
// Chains and messaging
// ---------------------------------------------------------------------------

/// Endpoint id of this ledger, reported as the destination of local swaps.
pub const LOCAL_CHAIN_ID: u32 = 40168;

/// Split index of forwarded relay accounts: `[0, 18)` quote, `[18, ..)` send.
pub const QUOTE_REMAINING_ACCOUNTS_COUNT: usize = 18;

/// Executor options attached to every outbound message (type-3 options,
/// `lzReceive` gas 200 000 and native value 0).
pub const GAS_OPTIONS: [u8; 22] = [
    0, 3, 1, 0, 17, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 6, 26, 128,
];

/// `(major, minor, endpoint_version)` of the simple message library.
pub const SIMPLE_MESSAGE_LIB_VERSION: (u64, u8, u8) = (0, 0, 2);

/// `(major, minor, endpoint_version)` of the ultra-light-node library.
pub const ULN_MESSAGE_LIB_VERSION: (u64, u8, u8) = (3, 0, 2);

// ---------------------------------------------------------------------------
// Funds
// ---------------------------------------------------------------------------

/// Lamports a native vault must retain after any outflow.
pub const NATIVE_VAULT_MIN_THRESHOLD: u64 = 900_000;

/// Lamports paid to a trader whose inbound transfer requests an airdrop.
pub const DEFAULT_AIRDROP_AMOUNT: u64 = 10_000;

/// Storage deposit of a pending swap entry, paid by the airdrop vault.
pub const PENDING_SWAP_RENT: u64 = 1_280_640;

/// Symbol used for native-asset deposits.
pub const NATIVE_SYMBOL: &str = "SOL";

/// Bit of `custom_data[0]` that requests an airdrop on receive.
pub const AIRDROP_FLAG: u8 = 0x80;
