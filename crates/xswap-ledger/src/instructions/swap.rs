//! Signed-order settlement.
//!
//! # Same-ledger swap
//!
//! ```text
//! signer ∈ {taker, dest_trader}   (dest_trader signing = aggregator flow)
//!   → expiry → fill (partial) → signature over the *filled* order
//!   → create CompletedSwaps(nonce, dest_trader)      ← replay guard
//!   → taker pays taker_paid into the trading vault
//!   → trading vault releases maker_amount to dest_trader
//! ```
//!
//! # Cross-ledger swap
//!
//! The taker side settles here exactly as above; the maker side is relayed
//! to `dest_chain_id` as a `CCTrade` XFER whose custom data carries the
//! order nonce. The receiving ledger pays out of its own trading vault.

use xswap_crypto::{SignableOrder, fill};
use xswap_types::constants::LOCAL_CHAIN_ID;
use xswap_types::{
    AccountMeta, AllowedDestination, CompletedSwapEntry, CrossSwapParams, Nonce, ProtocolEvent,
    Pubkey, Result, SwapParams, Tx, XswapError,
};

use crate::access::require_not_paused;
use crate::endpoint::MessagingEndpoint;
use crate::outbound::OutboundXfer;
use crate::program::{SettlementProgram, VaultKind};

impl<E: MessagingEndpoint> SettlementProgram<E> {
    fn require_unexpired(&self, expiry: u128) -> Result<()> {
        let now = self.now();
        if u128::try_from(now).unwrap_or(0) > expiry {
            return Err(XswapError::OrderExpired { expiry, now });
        }
        Ok(())
    }

    /// Recover the signer of `digest` and compare with the configured
    /// swap signer.
    fn authenticate(&self, digest: &[u8; 32], signature: &[u8]) -> Result<()> {
        let expected = self.config()?.swap_signer;
        self.verifier
            .verify(digest, signature, &expected)
            .inspect_err(|e| {
                tracing::warn!(expected = %expected, error = %e, "order signature rejected");
            })
    }

    /// Write the terminal marker for `(nonce, dest_trader)`; fails if the
    /// pair was already settled, is queued, or was removed from the queue.
    fn mark_completed(&mut self, nonce: &Nonce, dest_trader: &Pubkey, expiry: u128) -> Result<()> {
        self.require_fresh_swap(nonce, dest_trader)?;
        let at = self.deriver.completed_swap(nonce, dest_trader)?;
        self.state
            .store
            .create(
                &at,
                CompletedSwapEntry {
                    expiry: i64::try_from(expiry).unwrap_or(i64::MAX),
                },
            )
            .inspect_err(|_| {
                tracing::warn!(%nonce, dest_trader = %dest_trader.short(), "order replay rejected");
            })
    }

    pub fn swap(&mut self, signer: &Pubkey, params: &SwapParams) -> Result<()> {
        self.atomically("swap", |p| {
            require_not_paused(p.config()?)?;
            p.roles().require_not_banned(signer)?;
            let order = &params.order;
            if *signer != order.taker && *signer != order.dest_trader {
                return Err(XswapError::InvalidAggregatorFlow { signer: *signer });
            }
            if order.dest_trader.is_zero() {
                return Err(XswapError::InvalidTrader);
            }
            p.require_unexpired(order.expiry)?;

            let filled = fill(order, params.is_partial, params.taker_amount)?;
            if filled.order.maker_amount == 0 || filled.taker_paid == 0 {
                return Err(XswapError::ZeroAmount);
            }
            p.authenticate(&filled.order.order_hash(), &params.signature)?;
            p.mark_completed(&order.nonce, &order.dest_trader, order.expiry)?;

            p.collect_into_vault(VaultKind::Trading, &order.taker_asset, signer, filled.taker_paid)?;
            p.pay_from_vault(
                VaultKind::Trading,
                &order.maker_asset,
                &order.dest_trader,
                filled.order.maker_amount,
            )?;

            p.emit(ProtocolEvent::SwapExecuted {
                nonce: order.nonce,
                taker: order.taker,
                dest_trader: order.dest_trader,
                dest_chain_id: LOCAL_CHAIN_ID,
                src_asset: order.taker_asset,
                dest_asset: order.maker_asset,
                src_amount: filled.taker_paid,
                dest_amount: filled.order.maker_amount,
            });
            tracing::info!(
                nonce = %order.nonce,
                taker = %order.taker.short(),
                dest_trader = %order.dest_trader.short(),
                paid = filled.taker_paid,
                released = filled.order.maker_amount,
                partial = params.is_partial,
                "swap executed"
            );
            Ok(())
        })
    }

    pub fn cross_swap(
        &mut self,
        signer: &Pubkey,
        params: &CrossSwapParams,
        accounts: &[AccountMeta],
    ) -> Result<()> {
        self.atomically("cross_swap", |p| {
            let bound = p.portfolio()?.endpoint;
            if params.endpoint != bound {
                return Err(XswapError::InvalidEndpoint {
                    expected: bound,
                    provided: params.endpoint,
                });
            }
            require_not_paused(p.config()?)?;
            p.roles().require_not_banned(signer)?;
            let order = &params.order;

            let destination = p
                .deriver
                .allowed_destination(order.dest_chain_id, &order.maker_asset)?;
            if p.state.store.get::<AllowedDestination>(&destination).is_none() {
                return Err(XswapError::DestinationNotAllowed {
                    dst_eid: order.dest_chain_id,
                    asset: order.maker_asset,
                });
            }
            if *signer != order.taker {
                return Err(XswapError::InvalidTaker {
                    expected: order.taker,
                    provided: *signer,
                });
            }
            if order.dest_trader.is_zero() {
                return Err(XswapError::InvalidTrader);
            }
            p.require_unexpired(order.expiry)?;
            if order.maker_amount == 0 || order.taker_amount == 0 {
                return Err(XswapError::ZeroAmount);
            }
            let timestamp = u32::try_from(order.expiry).map_err(|_| XswapError::InvalidInput {
                reason: format!("expiry {} does not fit a message timestamp", order.expiry),
            })?;
            p.authenticate(&order.order_hash(), &params.signature)?;
            p.mark_completed(&order.nonce, &order.dest_trader, order.expiry)?;

            p.collect_into_vault(VaultKind::Trading, &order.taker_asset, signer, order.taker_amount)?;
            let xfer = OutboundXfer {
                transaction: Tx::CCTrade,
                trader: order.dest_trader.to_bytes(),
                symbol: order.maker_symbol,
                token_mint: order.maker_asset,
                quantity: order.maker_amount,
                custom_data: order.nonce.to_custom_data(),
                timestamp,
                dst_eid: order.dest_chain_id,
            };
            p.send_xfer(signer, &xfer, accounts)?;

            p.emit(ProtocolEvent::SwapExecuted {
                nonce: order.nonce,
                taker: order.taker,
                dest_trader: order.dest_trader,
                dest_chain_id: order.dest_chain_id,
                src_asset: order.taker_asset,
                dest_asset: order.maker_asset,
                src_amount: order.taker_amount,
                dest_amount: order.maker_amount,
            });
            tracing::info!(
                nonce = %order.nonce,
                taker = %order.taker.short(),
                dst_eid = order.dest_chain_id,
                symbol = %order.maker_symbol,
                "cross swap relayed"
            );
            Ok(())
        })
    }
}
