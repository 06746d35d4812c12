//! Outbound cross-ledger messages.
//!
//! ```text
//! remaining accounts ─┬─ [0, 18)  → endpoint.quote
//!                     └─ [18, ..) → endpoint.send
//!
//! build XFER → quote (lz-token fee must be 0) → collect native fee
//!   → out_nonce += 1 → send
//! ```
//!
//! The send is the last fallible step so that a rejected send leaves the
//! endpoint untouched and the ledger snapshot restores everything else.

use xswap_types::constants::{GAS_OPTIONS, QUOTE_REMAINING_ACCOUNTS_COUNT};
use xswap_types::ids::CUSTOM_DATA_LEN;
use xswap_types::{
    AccountMeta, MessagingReceipt, ProtocolEvent, Pubkey, QuoteParams, Remote, Result,
    SendParams, Symbol, Tx, XChainMsgType, XferHeader, XferMessage, XswapError,
};

use crate::endpoint::MessagingEndpoint;
use crate::program::SettlementProgram;

/// One XFER to hand to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundXfer {
    pub transaction: Tx,
    /// Beneficiary on the destination ledger.
    pub trader: [u8; 32],
    pub symbol: Symbol,
    /// Local asset the message accounts for; only used for the event.
    pub token_mint: Pubkey,
    pub quantity: u64,
    pub custom_data: [u8; CUSTOM_DATA_LEN],
    pub timestamp: u32,
    pub dst_eid: u32,
}

/// Split forwarded relay accounts into `(quote, send)` lists.
///
/// # Errors
/// [`XswapError::AccountsNotProvided`] unless more than
/// [`QUOTE_REMAINING_ACCOUNTS_COUNT`] accounts are present.
pub fn split_relay_accounts(accounts: &[AccountMeta]) -> Result<(&[AccountMeta], &[AccountMeta])> {
    if accounts.len() <= QUOTE_REMAINING_ACCOUNTS_COUNT {
        return Err(XswapError::AccountsNotProvided {
            expected: QUOTE_REMAINING_ACCOUNTS_COUNT + 1,
            provided: accounts.len(),
        });
    }
    Ok(accounts.split_at(QUOTE_REMAINING_ACCOUNTS_COUNT))
}

impl<E: MessagingEndpoint> SettlementProgram<E> {
    /// Quote, pay for and send one XFER on behalf of `payer`.
    pub(crate) fn send_xfer(
        &mut self,
        payer: &Pubkey,
        xfer: &OutboundXfer,
        accounts: &[AccountMeta],
    ) -> Result<MessagingReceipt> {
        let (quote_accounts, send_accounts) = split_relay_accounts(accounts)?;
        let remote_at = self.deriver.remote(xfer.dst_eid)?;
        let remote = *self.state.store.require::<Remote>(&remote_at)?;
        let portfolio = self.deriver.portfolio()?;
        let out_nonce = self.config()?.out_nonce;

        let message = XferMessage {
            header: XferHeader {
                custom_data: xfer.custom_data,
                timestamp: xfer.timestamp,
                nonce: out_nonce,
                transaction: xfer.transaction,
                msg_type: XChainMsgType::Xfer,
            },
            trader: xfer.trader,
            symbol: xfer.symbol,
            quantity: xfer.quantity,
        }
        .pack()
        .to_vec();

        let fee = self.endpoint.quote(
            &QuoteParams {
                sender: portfolio.address,
                dst_eid: xfer.dst_eid,
                receiver: remote.address,
                message: message.clone(),
                options: GAS_OPTIONS.to_vec(),
                pay_in_lz_token: false,
            },
            quote_accounts,
        )?;
        if fee.lz_token_fee > 0 {
            return Err(XswapError::PositiveLzTokenFee {
                fee: fee.lz_token_fee,
            });
        }

        self.state
            .bank
            .transfer_lamports(payer, &portfolio.address, fee.native_fee)?;
        let config = self.config_mut()?;
        config.out_nonce = config
            .out_nonce
            .checked_add(1)
            .ok_or(XswapError::ArithmeticOverflow {
                context: "outbound nonce",
            })?;

        let receipt = self.endpoint.send(
            &SendParams {
                dst_eid: xfer.dst_eid,
                receiver: remote.address,
                message,
                options: GAS_OPTIONS.to_vec(),
                native_fee: fee.native_fee,
                lz_token_fee: 0,
            },
            send_accounts,
        )?;

        self.emit(ProtocolEvent::NativeTransfer {
            from: *payer,
            to: portfolio.address,
            amount: fee.native_fee,
        });
        self.emit(ProtocolEvent::PortfolioUpdated {
            transaction: xfer.transaction,
            trader: Pubkey(xfer.trader),
            token_mint: xfer.token_mint,
            quantity: xfer.quantity,
            out_nonce,
        });
        tracing::info!(
            tx = ?xfer.transaction,
            dst_eid = xfer.dst_eid,
            out_nonce,
            endpoint_nonce = receipt.nonce,
            fee = fee.native_fee,
            "xfer sent"
        );
        Ok(receipt)
    }
}
