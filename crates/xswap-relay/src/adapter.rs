//! In-process [`EndpointReader`] over a [`SharedProgram`].
//!
//! Program state (remotes, pending swaps) is read straight from the shared
//! instance. Endpoint configuration the program never stores, namely which
//! send library serves a path and what version it reports, lives in a
//! [`LibraryRegistry`].

use std::collections::HashMap;

use async_trait::async_trait;
use xswap_ledger::{LoopbackEndpoint, MessagingEndpoint, SharedProgram};
use xswap_types::{
    AccountMeta, AddressTrace, MessageLibVersion, NetworkConfig, Nonce, PendingSwap, Pubkey,
    Remote, Result, XswapError,
};

use crate::accounts::AccountPlanner;
use crate::client::EndpointReader;
use crate::library::MessageLib;
use crate::path::PacketPath;

/// Endpoint-side library configuration.
#[derive(Debug, Clone, Default)]
pub struct LibraryRegistry {
    send_libraries: HashMap<(Pubkey, u32), Pubkey>,
    versions: HashMap<Pubkey, MessageLibVersion>,
}

impl LibraryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a library program and the version it reports.
    pub fn register(&mut self, program: Pubkey, version: MessageLibVersion) {
        self.versions.insert(program, version);
    }

    /// Route `(sender, dst_eid)` through `program`.
    pub fn set_send_library(&mut self, sender: Pubkey, dst_eid: u32, program: Pubkey) {
        self.send_libraries.insert((sender, dst_eid), program);
    }

    #[must_use]
    pub fn send_library(&self, sender: &Pubkey, dst_eid: u32) -> Option<Pubkey> {
        self.send_libraries.get(&(*sender, dst_eid)).copied()
    }

    #[must_use]
    pub fn version(&self, program: &Pubkey) -> Option<MessageLibVersion> {
        self.versions.get(program).copied()
    }
}

pub struct LocalEndpointReader<E: MessagingEndpoint = LoopbackEndpoint> {
    program: SharedProgram<E>,
    planner: AccountPlanner,
    libraries: LibraryRegistry,
}

impl<E: MessagingEndpoint> LocalEndpointReader<E> {
    #[must_use]
    pub fn new(program: SharedProgram<E>, network: &NetworkConfig, libraries: LibraryRegistry) -> Self {
        Self {
            program,
            planner: AccountPlanner::new(network),
            libraries,
        }
    }

    #[must_use]
    pub fn program(&self) -> &SharedProgram<E> {
        &self.program
    }
}

#[async_trait]
impl<E: MessagingEndpoint + 'static> EndpointReader for LocalEndpointReader<E> {
    async fn remote(&self, dst_eid: u32) -> Result<Option<Remote>> {
        let at = self.planner.deriver().remote(dst_eid)?;
        self.program.read(|p| p.store().get::<Remote>(&at).copied())
    }

    async fn send_library(&self, sender: &Pubkey, dst_eid: u32) -> Result<Option<Pubkey>> {
        Ok(self.libraries.send_library(sender, dst_eid))
    }

    async fn message_lib_version(&self, library: &Pubkey) -> Result<MessageLibVersion> {
        self.libraries
            .version(library)
            .ok_or_else(|| XswapError::NotFound {
                what: "message library",
                trace: AddressTrace::plain(*library),
            })
    }

    async fn quote_accounts(
        &self,
        _payer: &Pubkey,
        path: &PacketPath,
        library: &MessageLib,
    ) -> Result<Vec<AccountMeta>> {
        self.planner.quote_accounts(path, library)
    }

    async fn send_accounts(
        &self,
        payer: &Pubkey,
        path: &PacketPath,
        library: &MessageLib,
    ) -> Result<Vec<AccountMeta>> {
        self.planner.send_accounts(payer, path, library)
    }

    async fn pending_swap(&self, nonce: &Nonce, trader: &Pubkey) -> Result<Option<PendingSwap>> {
        self.program.read(|p| p.pending_swap(nonce, trader))?
    }
}
