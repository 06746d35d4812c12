//! # xswap-types
//!
//! Shared types, errors, and configuration for **xswap** settlement.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Pubkey`], [`EthAddress`], [`Nonce`], [`Symbol`]
//! - **Derived addresses**: [`DerivedAddress`], [`AddressTrace`]
//! - **Orders**: [`Order`], [`CrossOrder`]
//! - **Ledger records**: [`Portfolio`], [`GlobalConfig`], [`PendingSwap`],
//!   [`CompletedSwapEntry`], [`TokenDetails`], role and ban records
//! - **Wire payloads**: [`XferMessage`], [`XferPayload`], [`Tx`]
//! - **Messaging vocabulary**: [`AccountMeta`], [`MessagingFee`], [`MessageLibVersion`]
//! - **Instruction surface**: [`Instruction`] and its parameter structs
//! - **Events**: [`ProtocolEvent`]
//! - **Configuration**: [`NetworkConfig`], [`RelayConfig`], [`LoggingConfig`]
//! - **Errors**: [`XswapError`] with `XS_ERR_` prefix codes
//! - **Constants**: seed tags, type descriptors, thresholds

pub mod address;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ids;
pub mod instruction;
pub mod messaging;
pub mod order;
pub mod state;
pub mod xfer;

// Re-export all primary types at crate root for ergonomic imports:
//   use xswap_types::{Order, Pubkey, PendingSwap, ...};

pub use address::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use ids::*;
pub use instruction::*;
pub use messaging::*;
pub use order::*;
pub use state::*;
pub use xfer::*;

// Constants are accessed via `xswap_types::constants::FOO`
// (not re-exported to avoid name collisions).
