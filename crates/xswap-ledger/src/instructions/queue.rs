//! Inbound messages and the pending-swap queue.
//!
//! ```text
//!                 lz_receive (CCTrade, vault short)
//!   Absent ───────────────────────────────────────────► Pending
//!     │                                                  │    │
//!     │ lz_receive (vault covers) / swap                 │    │ remove_from_swap_queue
//!     ▼                                                  │    ▼
//!   Completed ◄────────── finalize_pending_swap ─────────┘  Expired
//! ```
//!
//! Pending and Completed never coexist for one `(nonce, trader)`; a receive
//! for a pair in any non-absent state is a replay. The pending entry's
//! storage deposit comes from the airdrop vault and is returned there when
//! the entry is closed.

use xswap_types::constants::{NATIVE_VAULT_MIN_THRESHOLD, PENDING_SWAP_RENT};
use xswap_types::{
    AccountMeta, ClearParams, CompletedSwapEntry, ExpiredSwapEntry, LzReceiveParams, Nonce,
    PendingSwap, ProtocolEvent, Pubkey, QueueAction, RemoveFromSwapQueueParams, Remote, Result,
    SwapKeyParams, TokenList, Tx, UpdateSwapExpiryParams, XferPayload, XswapError,
};

use crate::access::require_not_paused;
use crate::bank::check_binding;
use crate::endpoint::MessagingEndpoint;
use crate::program::{SettlementProgram, VaultKind};

impl<E: MessagingEndpoint> SettlementProgram<E> {
    // -----------------------------------------------------------------
    // Receive
    // -----------------------------------------------------------------

    /// Apply an inbound XFER delivered by the endpoint.
    ///
    /// `CCTrade` pays from the trading vault, or queues the transfer when
    /// the vault is short. `Withdraw` pays from the user-funds vault and
    /// never queues. The endpoint clear runs last and fails on a second
    /// delivery of the same message.
    pub fn lz_receive(
        &mut self,
        executor: &Pubkey,
        params: &LzReceiveParams,
        accounts: &[AccountMeta],
    ) -> Result<()> {
        self.atomically("lz_receive", |p| {
            require_not_paused(p.config()?)?;
            p.require_registered_remote(params.src_eid, &params.sender)?;

            let payload = XferPayload::unpack(&params.message)?;
            let kind = match payload.header.transaction {
                Tx::CCTrade => VaultKind::Trading,
                Tx::Withdraw => VaultKind::UserFunds,
                other => {
                    return Err(XswapError::UnsupportedTransaction { code: other as u8 });
                }
            };
            if payload.quantity == 0 {
                return Err(XswapError::ZeroAmount);
            }
            if payload.trader.is_zero() {
                return Err(XswapError::InvalidTrader);
            }
            if !payload.token_mint.is_zero() {
                let list = p.deriver.token_list()?;
                if !p.state.store.require::<TokenList>(&list)?.contains(&payload.token_mint) {
                    return Err(XswapError::TokenNotSupported {
                        mint: payload.token_mint,
                    });
                }
            }

            if payload.header.wants_airdrop() {
                let amount = p.config()?.airdrop_amount;
                let vault = p.deriver.airdrop_vault()?;
                p.native_vault_out(&vault, &payload.trader, amount, NATIVE_VAULT_MIN_THRESHOLD)?;
                p.emit(ProtocolEvent::NativeTransfer {
                    from: vault.address,
                    to: payload.trader,
                    amount,
                });
            }

            let nonce = payload.header.order_nonce();
            match kind {
                VaultKind::Trading => {
                    p.require_fresh_swap(&nonce, &payload.trader)?;
                    if p.vault_can_cover(kind, &payload.token_mint, payload.quantity)? {
                        p.pay_from_vault(kind, &payload.token_mint, &payload.trader, payload.quantity)?;
                        let at = p.deriver.completed_swap(&nonce, &payload.trader)?;
                        let expiry = p.now();
                        p.state.store.create(&at, CompletedSwapEntry { expiry })?;
                        p.emit_finalized(&nonce, &payload);
                    } else {
                        p.enqueue(
                            &nonce,
                            PendingSwap {
                                trader: payload.trader,
                                quantity: payload.quantity,
                                token_mint: payload.token_mint,
                            },
                        )?;
                    }
                }
                VaultKind::UserFunds => {
                    p.pay_from_vault(kind, &payload.token_mint, &payload.trader, payload.quantity)?;
                    p.emit_finalized(&nonce, &payload);
                }
            }

            let receiver = p.deriver.portfolio()?.address;
            p.endpoint.clear(
                &ClearParams {
                    receiver,
                    src_eid: params.src_eid,
                    sender: params.sender,
                    nonce: params.nonce,
                    guid: params.guid,
                    message: params.message.clone(),
                },
                accounts,
            )?;
            tracing::info!(
                executor = %executor.short(),
                src_eid = params.src_eid,
                endpoint_nonce = params.nonce,
                tx = ?payload.header.transaction,
                trader = %payload.trader.short(),
                quantity = payload.quantity,
                "xfer received"
            );
            Ok(())
        })
    }

    fn require_registered_remote(&self, src_eid: u32, sender: &Pubkey) -> Result<()> {
        let at = self.deriver.remote(src_eid)?;
        match self.state.store.get::<Remote>(&at) {
            Some(remote) if remote.address == *sender => Ok(()),
            _ => {
                tracing::warn!(src_eid, sender = %sender.short(), "message from unregistered remote");
                Err(XswapError::UnauthorizedRemote {
                    src_eid,
                    sender: *sender,
                })
            }
        }
    }

    /// A `(nonce, trader)` pair that was ever pending, completed or expired
    /// cannot be received or settled again.
    pub(crate) fn require_fresh_swap(&self, nonce: &Nonce, trader: &Pubkey) -> Result<()> {
        for at in [
            self.deriver.pending_swap(nonce, trader)?,
            self.deriver.completed_swap(nonce, trader)?,
            self.deriver.expired_swap(nonce, trader)?,
        ] {
            if self.state.store.exists(&at) {
                tracing::warn!(%nonce, trader = %trader.short(), tag = at.tag, "swap replay rejected");
                return Err(XswapError::ReplayRejected { trace: at.trace() });
            }
        }
        Ok(())
    }

    fn emit_finalized(&mut self, nonce: &Nonce, payload: &XferPayload) {
        self.emit(ProtocolEvent::XChainFinalized {
            nonce: *nonce,
            trader: payload.trader,
            token_mint: payload.token_mint,
            quantity: payload.quantity,
            timestamp: payload.header.timestamp,
        });
    }

    // -----------------------------------------------------------------
    // Queue transitions
    // -----------------------------------------------------------------

    fn enqueue(&mut self, nonce: &Nonce, entry: PendingSwap) -> Result<()> {
        let at = self.deriver.pending_swap(nonce, &entry.trader)?;
        self.state.store.create(&at, entry.clone())?;
        let airdrop = self.deriver.airdrop_vault()?;
        self.native_vault_out(&airdrop, &at.address, PENDING_SWAP_RENT, 0)?;
        tracing::info!(
            %nonce,
            trader = %entry.trader.short(),
            mint = %entry.token_mint.short(),
            quantity = entry.quantity,
            entry = %at.address,
            "swap queued"
        );
        self.emit(ProtocolEvent::SwapQueue {
            action: QueueAction::Added,
            nonce: *nonce,
            trader: entry.trader,
            token_mint: entry.token_mint,
            quantity: entry.quantity,
        });
        Ok(())
    }

    /// Close a pending entry and return its storage deposit to the
    /// airdrop vault.
    fn dequeue(&mut self, nonce: &Nonce, trader: &Pubkey) -> Result<PendingSwap> {
        let at = self.deriver.pending_swap(nonce, trader)?;
        let entry = self.state.store.close::<PendingSwap>(&at)?;
        let deposit = self.state.bank.lamports(&at.address);
        if deposit > 0 {
            let airdrop = self.deriver.airdrop_vault()?;
            self.native_vault_in(&at.address, &airdrop, deposit)?;
        }
        Ok(entry)
    }

    /// Pay out a pending entry from the trading vault to its trader.
    pub fn finalize_pending_swap(&mut self, signer: &Pubkey, params: &SwapKeyParams) -> Result<()> {
        self.atomically("finalize_pending_swap", |p| {
            require_not_paused(p.config()?)?;
            p.roles()
                .require_trader_or_rebalancer(signer, &params.trader)?;
            let entry = p.dequeue(&params.nonce, &params.trader)?;
            p.pay_from_vault(
                VaultKind::Trading,
                &entry.token_mint,
                &entry.trader,
                entry.quantity,
            )?;
            let at = p.deriver.completed_swap(&params.nonce, &entry.trader)?;
            let expiry = p.now();
            p.state.store.create(&at, CompletedSwapEntry { expiry })?;

            p.emit(ProtocolEvent::SwapQueue {
                action: QueueAction::Finalized,
                nonce: params.nonce,
                trader: entry.trader,
                token_mint: entry.token_mint,
                quantity: entry.quantity,
            });
            p.emit(ProtocolEvent::XChainFinalized {
                nonce: params.nonce,
                trader: entry.trader,
                token_mint: entry.token_mint,
                quantity: entry.quantity,
                timestamp: p.message_timestamp()?,
            });
            tracing::info!(
                nonce = %params.nonce,
                trader = %entry.trader.short(),
                quantity = entry.quantity,
                by = %signer.short(),
                "pending swap finalized"
            );
            Ok(())
        })
    }

    /// Unwind a pending entry to a caller-supplied destination, which must
    /// be the one derived from the stored trader and mint.
    pub fn remove_from_swap_queue(
        &mut self,
        signer: &Pubkey,
        params: &RemoveFromSwapQueueParams,
    ) -> Result<()> {
        self.atomically("remove_from_swap_queue", |p| {
            p.roles()
                .require_trader_or_rebalancer(signer, &params.dest_trader)?;
            let at = p.deriver.pending_swap(&params.nonce, &params.dest_trader)?;
            let entry = p.state.store.require::<PendingSwap>(&at)?.clone();

            let expected = if entry.token_mint.is_zero() {
                entry.trader
            } else {
                p.deriver
                    .associated_token_account(&entry.trader, &entry.token_mint)?
                    .address
            };
            if params.destination != expected {
                tracing::warn!(
                    nonce = %params.nonce,
                    expected = %expected.short(),
                    provided = %params.destination.short(),
                    "queue removal to unbound destination"
                );
                return Err(XswapError::InvalidDestination {
                    expected,
                    provided: params.destination,
                });
            }
            if !entry.token_mint.is_zero() {
                if let Some(account) = p.state.bank.token_account(&params.destination) {
                    check_binding(account, &entry.trader, &entry.token_mint)?;
                }
            }

            p.dequeue(&params.nonce, &params.dest_trader)?;
            p.pay_from_vault(
                VaultKind::Trading,
                &entry.token_mint,
                &entry.trader,
                entry.quantity,
            )?;
            let removed_at = p.now();
            p.state.store.create(
                &p.deriver.expired_swap(&params.nonce, &params.dest_trader)?,
                ExpiredSwapEntry {
                    trader: entry.trader,
                    quantity: entry.quantity,
                    token_mint: entry.token_mint,
                    removed_at,
                },
            )?;

            p.emit(ProtocolEvent::SwapQueue {
                action: QueueAction::Removed,
                nonce: params.nonce,
                trader: entry.trader,
                token_mint: entry.token_mint,
                quantity: entry.quantity,
            });
            tracing::info!(
                nonce = %params.nonce,
                trader = %entry.trader.short(),
                quantity = entry.quantity,
                by = %signer.short(),
                "pending swap removed"
            );
            Ok(())
        })
    }

    /// Set how long the completed marker for `(nonce, trader)` must be
    /// kept. Refused while the pair is still pending.
    pub fn update_swap_expiry(&mut self, signer: &Pubkey, params: &UpdateSwapExpiryParams) -> Result<()> {
        self.atomically("update_swap_expiry", |p| {
            p.roles().require_rebalancer(signer)?;
            let pending = p.deriver.pending_swap(&params.nonce, &params.trader)?;
            if p.state.store.exists(&pending) {
                return Err(XswapError::SwapStillPending {
                    trace: pending.trace(),
                });
            }
            let at = p.deriver.completed_swap(&params.nonce, &params.trader)?;
            let created = p.state.store.upsert(
                &at,
                CompletedSwapEntry {
                    expiry: params.expiry,
                },
            );
            tracing::info!(
                nonce = %params.nonce,
                trader = %params.trader.short(),
                expiry = params.expiry,
                created,
                "swap expiry updated"
            );
            Ok(())
        })
    }
}
