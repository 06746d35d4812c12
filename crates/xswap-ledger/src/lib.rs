//! # xswap-ledger
//!
//! In-process model of the settlement program for **xswap**.
//!
//! - [`SettlementProgram`]: the program. Every instruction is atomic.
//! - [`AccountStore`]: records at derived addresses; existence is state
//! - [`Bank`]: native balances and token accounts
//! - [`FlowLedger`]: per-vault inflow/outflow record for conservation checks
//! - [`MessagingEndpoint`]: the `quote`/`send`/`clear` seam to the
//!   cross-ledger endpoint, with [`LoopbackEndpoint`] in memory
//! - [`SharedProgram`]: mutex-guarded handle for concurrent submitters
//! - [`wire`]: discriminator-prefixed instruction encoding
//!
//! ## Instruction flow
//!
//! ```text
//! Submission ─► process ─► handler (instructions/*)
//!                              │  atomically { gates → roles → records → vault moves → endpoint }
//!                              ▼
//!                   Ok: state + events committed    Err: snapshot restored
//! ```

pub mod access;
pub mod bank;
pub mod clock;
pub mod endpoint;
pub mod flows;
mod instructions;
pub mod outbound;
pub mod program;
pub mod shared;
pub mod store;
pub mod wire;

pub use access::Roles;
pub use bank::{Bank, TokenAccount};
pub use clock::{Clock, ManualClock, SystemClock};
pub use endpoint::{LoopbackEndpoint, MessagingEndpoint, SentPacket};
pub use flows::FlowLedger;
pub use outbound::{OutboundXfer, split_relay_accounts};
pub use program::{LedgerState, SettlementProgram, VaultKind};
pub use shared::SharedProgram;
pub use store::AccountStore;
