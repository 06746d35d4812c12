//! Read-side seam between the relay and a ledger node.
//!
//! Everything the relay needs to know before submitting a message-sending
//! instruction comes through [`EndpointReader`]. A deployment would back it
//! with RPC calls; [`crate::adapter::LocalEndpointReader`] backs it with an
//! in-process program.

use async_trait::async_trait;
use xswap_types::{AccountMeta, MessageLibVersion, Nonce, PendingSwap, Pubkey, Remote, Result};

use crate::library::MessageLib;
use crate::path::PacketPath;

#[async_trait]
pub trait EndpointReader: Send + Sync {
    /// Remote registered for `dst_eid`, if any.
    async fn remote(&self, dst_eid: u32) -> Result<Option<Remote>>;

    /// Send library configured for `(sender, dst_eid)`, if any.
    async fn send_library(&self, sender: &Pubkey, dst_eid: u32) -> Result<Option<Pubkey>>;

    async fn message_lib_version(&self, library: &Pubkey) -> Result<MessageLibVersion>;

    /// Accounts the endpoint's quote needs for `path`, in order.
    async fn quote_accounts(
        &self,
        payer: &Pubkey,
        path: &PacketPath,
        library: &MessageLib,
    ) -> Result<Vec<AccountMeta>>;

    /// Accounts the endpoint's send needs for `path`, in order.
    async fn send_accounts(
        &self,
        payer: &Pubkey,
        path: &PacketPath,
        library: &MessageLib,
    ) -> Result<Vec<AccountMeta>>;

    async fn pending_swap(&self, nonce: &Nonce, trader: &Pubkey) -> Result<Option<PendingSwap>>;
}
