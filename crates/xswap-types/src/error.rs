//! Error types for xswap settlement.
//!
//! All errors use the `XS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order authentication errors
//! - 2xx: Replay errors
//! - 3xx: Access-control errors
//! - 4xx: State gates (pause / deposit switches)
//! - 5xx: Messaging configuration errors
//! - 6xx: Fund errors
//! - 7xx: Lookup errors
//! - 8xx: Account binding and codec errors
//! - 9xx: General / internal errors
//!
//! Every variant maps onto one [`ErrorKind`], which is what callers use to
//! decide whether a failure is retryable.

use thiserror::Error;

use crate::{AddressTrace, BanReason, EthAddress, Pubkey};

/// Coarse classification used by submitters and relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Signature does not recover to the configured signer.
    AuthenticationFailure,
    /// The derived address already exists.
    ReplayRejected,
    /// Missing role, banned account or unknown remote.
    AccessDenied,
    /// Paused, deposits disabled or native deposits restricted.
    StateGate,
    /// Messaging library or account list could not be resolved.
    ConfigurationUnresolved,
    InsufficientFunds,
    NotFound,
    /// Malformed order, payload or account argument.
    InvalidInput,
    /// RPC or I/O failure. The only retryable kind.
    Transport,
    Internal,
}

/// Role required by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Rebalancer,
    /// The trader named by a swap entry.
    Trader,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Rebalancer => f.write_str("rebalancer"),
            Self::Trader => f.write_str("trader"),
        }
    }
}

/// Central error enum for all xswap operations.
#[derive(Debug, Error)]
pub enum XswapError {
    // =================================================================
    // Authentication Errors (1xx)
    // =================================================================
    /// The order signature recovered to a different signer.
    #[error("XS_ERR_100: Order signature recovers to {recovered}, expected swap signer {expected}")]
    InvalidSigner {
        expected: EthAddress,
        recovered: EthAddress,
    },

    /// The signature bytes could not be parsed or recovered.
    #[error("XS_ERR_101: Malformed signature: {reason}")]
    MalformedSignature { reason: String },

    #[error("XS_ERR_102: Order expired at {expiry}, now {now}")]
    OrderExpired { expiry: u128, now: i64 },

    /// The taker named in the order is not the taker supplied.
    #[error("XS_ERR_103: Invalid taker: order names {expected}, got {provided}")]
    InvalidTaker { expected: Pubkey, provided: Pubkey },

    /// Signer is neither the order taker nor the destination trader.
    #[error("XS_ERR_104: Signer {signer} is neither taker nor aggregator destination")]
    InvalidAggregatorFlow { signer: Pubkey },

    // =================================================================
    // Replay Errors (2xx)
    // =================================================================
    /// A nonce-keyed or role record already exists at the derived address.
    #[error("XS_ERR_200: Replay rejected, account already exists: {trace}")]
    ReplayRejected { trace: AddressTrace },

    /// The inbound message nonce has already been cleared by the endpoint.
    #[error("XS_ERR_201: Inbound message already cleared: src_eid={src_eid} nonce={nonce}")]
    MessageAlreadyCleared { src_eid: u32, nonce: u64 },

    // =================================================================
    // Access Errors (3xx)
    // =================================================================
    #[error("XS_ERR_300: {account} lacks {role} role: {trace}")]
    Unauthorized {
        role: Role,
        account: Pubkey,
        trace: AddressTrace,
    },

    #[error("XS_ERR_301: Account {account} is banned ({reason:?})")]
    AccountBanned { account: Pubkey, reason: BanReason },

    /// Role records and ban records must never coexist for one key.
    #[error("XS_ERR_302: Role conflict for {account}: {reason}")]
    RoleConflict { account: Pubkey, reason: String },

    #[error("XS_ERR_303: Zero account not allowed")]
    ZeroAccount,

    /// The inbound message sender is not the registered remote.
    #[error("XS_ERR_304: Sender {sender} is not the remote registered for eid {src_eid}")]
    UnauthorizedRemote { src_eid: u32, sender: Pubkey },

    /// The endpoint program supplied does not match the configured one.
    #[error("XS_ERR_305: Invalid endpoint program: expected {expected}, got {provided}")]
    InvalidEndpoint { expected: Pubkey, provided: Pubkey },

    // =================================================================
    // State Gates (4xx)
    // =================================================================
    #[error("XS_ERR_400: Program is paused")]
    ProgramPaused,

    #[error("XS_ERR_401: Program must be paused for this operation")]
    ProgramNotPaused,

    #[error("XS_ERR_402: Deposits are paused")]
    DepositsPaused,

    #[error("XS_ERR_403: Native deposits are restricted")]
    NativeDepositsRestricted,

    // =================================================================
    // Messaging Configuration Errors (5xx)
    // =================================================================
    #[error("XS_ERR_500: Send library not initialized or blocked message library for eid {dst_eid}")]
    SendLibraryNotFound { dst_eid: u32 },

    #[error("XS_ERR_501: Unsupported message library version {version}")]
    UnsupportedMessageLibVersion { version: String },

    /// Fees must be paid in native currency only.
    #[error("XS_ERR_502: Messaging fee in lz token must be zero, got {fee}")]
    PositiveLzTokenFee { fee: u64 },

    #[error("XS_ERR_503: Not enough relay accounts provided: expected at least {expected}, got {provided}")]
    AccountsNotProvided { expected: usize, provided: usize },

    #[error("XS_ERR_504: Configuration error: {reason}")]
    Configuration { reason: String },

    // =================================================================
    // Fund Errors (6xx)
    // =================================================================
    #[error("XS_ERR_600: Insufficient funds in {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: AddressTrace,
        needed: u64,
        available: u64,
    },

    #[error("XS_ERR_601: Amount must be greater than zero")]
    ZeroAmount,

    #[error("XS_ERR_602: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    // =================================================================
    // Lookup Errors (7xx)
    // =================================================================
    #[error("XS_ERR_700: {what} not found: {trace}")]
    NotFound {
        what: &'static str,
        trace: AddressTrace,
    },

    #[error("XS_ERR_701: Token {mint} is not supported")]
    TokenNotSupported { mint: Pubkey },

    #[error("XS_ERR_702: Destination eid {dst_eid} not allowed for asset {asset}")]
    DestinationNotAllowed { dst_eid: u32, asset: Pubkey },

    // =================================================================
    // Account Binding & Codec Errors (8xx)
    // =================================================================
    /// Caller-supplied destination is not the one derived from the entry.
    #[error("XS_ERR_800: Invalid destination: expected {expected}, got {provided}")]
    InvalidDestination { expected: Pubkey, provided: Pubkey },

    #[error("XS_ERR_801: Invalid mint: expected {expected}, got {found}")]
    InvalidMint { expected: Pubkey, found: Pubkey },

    #[error("XS_ERR_802: Invalid token account owner: expected {expected}, got {found}")]
    InvalidTokenOwner { expected: Pubkey, found: Pubkey },

    #[error("XS_ERR_803: Invalid derived address: {reason}")]
    InvalidPda { reason: String },

    #[error("XS_ERR_804: Invalid trader")]
    InvalidTrader,

    /// A pending entry exists and blocks the requested transition.
    #[error("XS_ERR_805: Swap still pending: {trace}")]
    SwapStillPending { trace: AddressTrace },

    #[error("XS_ERR_806: Malformed XFER payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("XS_ERR_807: Unsupported transaction type {code}")]
    UnsupportedTransaction { code: u8 },

    #[error("XS_ERR_808: Invalid input: {reason}")]
    InvalidInput { reason: String },

    // =================================================================
    // General / Internal Errors (9xx)
    // =================================================================
    #[error("XS_ERR_900: Transport error: {reason}")]
    Transport { reason: String },

    #[error("XS_ERR_901: Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XS_ERR_902: I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XS_ERR_903: Internal error: {reason}")]
    Internal { reason: String },
}

impl XswapError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSigner { .. } | Self::MalformedSignature { .. } => {
                ErrorKind::AuthenticationFailure
            }
            Self::ReplayRejected { .. } | Self::MessageAlreadyCleared { .. } => {
                ErrorKind::ReplayRejected
            }
            Self::Unauthorized { .. }
            | Self::AccountBanned { .. }
            | Self::RoleConflict { .. }
            | Self::UnauthorizedRemote { .. }
            | Self::InvalidEndpoint { .. } => ErrorKind::AccessDenied,
            Self::ProgramPaused
            | Self::ProgramNotPaused
            | Self::DepositsPaused
            | Self::NativeDepositsRestricted
            | Self::SwapStillPending { .. } => ErrorKind::StateGate,
            Self::SendLibraryNotFound { .. }
            | Self::UnsupportedMessageLibVersion { .. }
            | Self::PositiveLzTokenFee { .. }
            | Self::AccountsNotProvided { .. }
            | Self::Configuration { .. } => ErrorKind::ConfigurationUnresolved,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::NotFound { .. }
            | Self::TokenNotSupported { .. }
            | Self::DestinationNotAllowed { .. } => ErrorKind::NotFound,
            Self::OrderExpired { .. }
            | Self::InvalidTaker { .. }
            | Self::InvalidAggregatorFlow { .. }
            | Self::ZeroAccount
            | Self::ZeroAmount
            | Self::InvalidDestination { .. }
            | Self::InvalidMint { .. }
            | Self::InvalidTokenOwner { .. }
            | Self::InvalidPda { .. }
            | Self::InvalidTrader
            | Self::MalformedPayload { .. }
            | Self::UnsupportedTransaction { .. }
            | Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Transport { .. } | Self::Io(_) => ErrorKind::Transport,
            Self::ArithmeticOverflow { .. }
            | Self::Serialization(_)
            | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Only transport failures are worth retrying; everything else is a
    /// deterministic outcome of ledger state.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

/// Convenience alias used throughout the xswap codebase.
pub type Result<T> = std::result::Result<T, XswapError>;
