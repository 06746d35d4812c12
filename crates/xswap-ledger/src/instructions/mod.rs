//! Instruction handlers, one file per concern. Each file adds an `impl`
//! block to [`crate::SettlementProgram`].
//!
//! | File | Instructions |
//! |---|---|
//! | `admin` | initialize, remotes, roles, bans, switches, tokens, destinations |
//! | `vault` | deposits, funding, claims |
//! | `swap` | same-ledger and cross-ledger swaps |
//! | `queue` | inbound messages and the pending-swap queue |

mod admin;
mod queue;
mod swap;
mod vault;
