//! # xswap-relay
//!
//! Off-ledger side of the cross-ledger hand-off.
//!
//! - [`PacketPath`]: `(src_eid, dst_eid, sender, receiver)` of one packet
//! - [`MessageLib`]: send library resolved from its reported version
//! - [`AccountPlanner`]: quote, send, receive and clear account lists
//! - [`EndpointReader`]: async read seam, with [`LocalEndpointReader`]
//!   over an in-process program
//! - [`RelayOrchestrator`]: prepares message-bearing submissions, batches
//!   them on a bounded [`tokio::task::JoinSet`]
//! - [`submit_idempotent`]: retry on transport failure, report a lost
//!   acknowledgement as [`SubmitOutcome::AlreadyApplied`]
//! - [`translate`]: outbound packet to the receiving ledger's delivery
//!
//! ## Outbound
//!
//! ```text
//! CrossSwapParams ─► prepare(dst_eid) ─► Submission{CrossSwap, quote ++ send}
//!                                              │
//!                                              ▼
//!                                   submit_idempotent ─► ledger A
//!                                              │ SentPacket
//!                                              ▼
//!                  translate ─► delivery(params) ─► submit_idempotent ─► ledger B
//! ```

pub mod accounts;
pub mod adapter;
pub mod bridge;
pub mod client;
pub mod library;
pub mod orchestrator;
pub mod path;
pub mod retry;
pub mod submit;
pub mod telemetry;

pub use accounts::AccountPlanner;
pub use adapter::{LibraryRegistry, LocalEndpointReader};
pub use bridge::{SymbolMap, translate};
pub use client::EndpointReader;
pub use library::{MessageLib, SIMPLE_MESSAGE_LIB_VERSION, ULN_VERSION, resolve_send_library};
pub use orchestrator::{PreparedRelay, Relay, RelayOrchestrator, RelayRequest};
pub use path::PacketPath;
pub use retry::{SubmitOutcome, Submitter, submit_idempotent};
pub use submit::{LocalSubmitter, SubmissionId};
pub use telemetry::init_tracing;
