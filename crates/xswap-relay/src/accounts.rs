//! Account planning for relay submissions.
//!
//! The settlement program forwards whatever accounts it is handed to the
//! endpoint, so the relay has to know them up front:
//!
//! ```text
//! cross_swap / deposit:  [quote accounts (18)] ++ [send accounts]
//! lz_receive:            [program accounts (13)] ++ [clear accounts (8)]
//! ```
//!
//! Endpoint-owned addresses derive under the endpoint program, library
//! addresses under the library program, program addresses through
//! [`AddressDeriver`].

use xswap_crypto::{AddressDeriver, find_program_address};
use xswap_types::constants::{
    ENDPOINT_SEED, EVENT_AUTHORITY_SEED, MESSAGE_LIB_SEED, NONCE_SEED, OAPP_SEED,
    PAYLOAD_HASH_SEED, QUOTE_REMAINING_ACCOUNTS_COUNT, SEND_LIBRARY_CONFIG_SEED,
};
use xswap_types::{
    AccountMeta, LzReceiveParams, NetworkConfig, Pubkey, Result, Tx, XferPayload, XswapError,
};

use crate::library::MessageLib;
use crate::path::PacketPath;

/// Endpoint-owned entries at the head of the quote list.
pub const ENDPOINT_QUOTE_ACCOUNTS: usize = 7;

/// Library-owned entries completing the quote list.
pub const LIBRARY_QUOTE_ACCOUNTS: usize = QUOTE_REMAINING_ACCOUNTS_COUNT - ENDPOINT_QUOTE_ACCOUNTS;

const SEND_CONFIG_SEED: &[u8] = b"SendConfig";
const WORKER_SEED: &[u8] = b"Worker";
const TREASURY_SEED: &[u8] = b"Treasury";

/// Native system program.
const SYSTEM_PROGRAM: Pubkey = Pubkey::ZERO;

#[derive(Debug, Clone)]
pub struct AccountPlanner {
    network: NetworkConfig,
    deriver: AddressDeriver,
}

impl AccountPlanner {
    #[must_use]
    pub fn new(network: &NetworkConfig) -> Self {
        Self {
            network: network.clone(),
            deriver: AddressDeriver::new(network),
        }
    }

    #[must_use]
    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    fn endpoint_address(&self, seeds: &[&[u8]]) -> Result<Pubkey> {
        Ok(find_program_address(seeds, &self.network.endpoint_program)?.0)
    }

    fn library_address(library: &MessageLib, seeds: &[&[u8]]) -> Result<Pubkey> {
        Ok(find_program_address(seeds, &library.program())?.0)
    }

    // -----------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------

    /// Exactly [`QUOTE_REMAINING_ACCOUNTS_COUNT`] accounts for the quote.
    pub fn quote_accounts(&self, path: &PacketPath, library: &MessageLib) -> Result<Vec<AccountMeta>> {
        let dst = path.dst_eid.to_be_bytes();
        let library_program = library.program();
        let mut accounts = vec![
            AccountMeta::readonly(self.network.endpoint_program),
            AccountMeta::readonly(self.endpoint_address(&[
                SEND_LIBRARY_CONFIG_SEED,
                &path.sender,
                &dst,
            ])?),
            AccountMeta::readonly(self.endpoint_address(&[SEND_LIBRARY_CONFIG_SEED, &dst])?),
            AccountMeta::readonly(self.endpoint_address(&[
                MESSAGE_LIB_SEED,
                library_program.as_bytes(),
            ])?),
            AccountMeta::readonly(self.endpoint_address(&[ENDPOINT_SEED])?),
            AccountMeta::readonly(self.endpoint_address(&[
                NONCE_SEED,
                &path.sender,
                &dst,
                &path.receiver,
            ])?),
            AccountMeta::readonly(library_program),
        ];
        accounts.extend(Self::library_accounts(path, library, LIBRARY_QUOTE_ACCOUNTS)?);
        Ok(accounts)
    }

    /// Accounts for the send; the payer signs and pays the fee.
    pub fn send_accounts(
        &self,
        payer: &Pubkey,
        path: &PacketPath,
        library: &MessageLib,
    ) -> Result<Vec<AccountMeta>> {
        let dst = path.dst_eid.to_be_bytes();
        let library_program = library.program();
        let mut accounts = vec![
            AccountMeta::readonly(self.network.endpoint_program),
            AccountMeta {
                pubkey: *payer,
                is_signer: true,
                is_writable: true,
            },
            AccountMeta::readonly(self.endpoint_address(&[
                SEND_LIBRARY_CONFIG_SEED,
                &path.sender,
                &dst,
            ])?),
            AccountMeta::readonly(self.endpoint_address(&[SEND_LIBRARY_CONFIG_SEED, &dst])?),
            AccountMeta::readonly(self.endpoint_address(&[
                MESSAGE_LIB_SEED,
                library_program.as_bytes(),
            ])?),
            AccountMeta::readonly(self.endpoint_address(&[ENDPOINT_SEED])?),
            AccountMeta::writable(self.endpoint_address(&[
                NONCE_SEED,
                &path.sender,
                &dst,
                &path.receiver,
            ])?),
            AccountMeta::readonly(self.endpoint_address(&[EVENT_AUTHORITY_SEED])?),
            AccountMeta::readonly(library_program),
            AccountMeta::writable(Self::library_address(library, &[TREASURY_SEED])?),
        ];
        accounts.extend(Self::library_accounts(path, library, 3)?);
        accounts.push(AccountMeta::readonly(SYSTEM_PROGRAM));
        Ok(accounts)
    }

    /// Library settings, the path's send config, the default send config,
    /// then worker slots up to `count`.
    fn library_accounts(
        path: &PacketPath,
        library: &MessageLib,
        count: usize,
    ) -> Result<Vec<AccountMeta>> {
        let dst = path.dst_eid.to_be_bytes();
        let mut accounts = vec![
            AccountMeta::readonly(Self::library_address(library, &[MESSAGE_LIB_SEED])?),
            AccountMeta::readonly(Self::library_address(
                library,
                &[SEND_CONFIG_SEED, &dst, &path.sender],
            )?),
            AccountMeta::readonly(Self::library_address(library, &[SEND_CONFIG_SEED, &dst])?),
        ];
        let mut slot = 0u8;
        while accounts.len() < count {
            accounts.push(AccountMeta::writable(Self::library_address(
                library,
                &[WORKER_SEED, &dst, &[slot]],
            )?));
            slot += 1;
        }
        accounts.truncate(count);
        Ok(accounts)
    }

    // -----------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------

    /// Endpoint accounts consumed when the receiver clears an inbound
    /// message.
    pub fn clear_accounts(
        &self,
        receiver: &Pubkey,
        src_eid: u32,
        sender: &[u8; 32],
        nonce: u64,
    ) -> Result<Vec<AccountMeta>> {
        let src = src_eid.to_be_bytes();
        let nonce_bytes = nonce.to_be_bytes();
        Ok(vec![
            AccountMeta::readonly(self.network.endpoint_program),
            AccountMeta::readonly(*receiver),
            AccountMeta::readonly(self.endpoint_address(&[OAPP_SEED, receiver.as_bytes()])?),
            AccountMeta::writable(self.endpoint_address(&[
                NONCE_SEED,
                receiver.as_bytes(),
                &src,
                sender,
            ])?),
            AccountMeta::writable(self.endpoint_address(&[
                PAYLOAD_HASH_SEED,
                receiver.as_bytes(),
                &src,
                sender,
                &nonce_bytes,
            ])?),
            AccountMeta::writable(self.endpoint_address(&[ENDPOINT_SEED])?),
            AccountMeta::readonly(self.endpoint_address(&[EVENT_AUTHORITY_SEED])?),
            AccountMeta::readonly(self.network.endpoint_program),
        ])
    }

    /// Every account a delivery of `params` touches, program accounts
    /// first, clear accounts last.
    ///
    /// The vault pair follows the transaction: `CCTrade` pays from the
    /// trading vaults, `Withdraw` from the user-funds vaults.
    pub fn receive_accounts(&self, params: &LzReceiveParams) -> Result<Vec<AccountMeta>> {
        let payload = XferPayload::unpack(&params.message)?;
        let (native_vault, token_vault) = match payload.header.transaction {
            Tx::CCTrade => (self.deriver.sol_vault()?, self.deriver.spl_vault()?),
            Tx::Withdraw => (
                self.deriver.sol_user_funds_vault()?,
                self.deriver.spl_user_funds_vault()?,
            ),
            other => return Err(XswapError::UnsupportedTransaction { code: other as u8 }),
        };
        let mint = payload.token_mint;
        let trader = payload.trader;
        let (from, to) = if mint.is_zero() {
            (native_vault.address, trader)
        } else {
            (
                self.deriver
                    .associated_token_account(&token_vault.address, &mint)?
                    .address,
                self.deriver.associated_token_account(&trader, &mint)?.address,
            )
        };
        let portfolio = self.deriver.portfolio()?.address;
        let pending = self
            .deriver
            .pending_swap(&payload.header.order_nonce(), &trader)?;

        let mut accounts = vec![
            AccountMeta::readonly(portfolio),
            AccountMeta::readonly(token_vault.address),
            AccountMeta::writable(native_vault.address),
            AccountMeta::writable(from),
            AccountMeta::writable(to),
            AccountMeta::readonly(self.network.token_program),
            AccountMeta::readonly(self.network.associated_token_program),
            AccountMeta::readonly(self.deriver.token_list()?.address),
            AccountMeta::writable(trader),
            AccountMeta::writable(self.deriver.airdrop_vault()?.address),
            AccountMeta::readonly(SYSTEM_PROGRAM),
            AccountMeta::readonly(mint),
            AccountMeta::writable(pending.address),
        ];
        accounts.extend(self.clear_accounts(
            &portfolio,
            params.src_eid,
            &params.sender.to_bytes(),
            params.nonce,
        )?);
        tracing::debug!(
            tx = ?payload.header.transaction,
            trader = %trader.short(),
            accounts = accounts.len(),
            "receive accounts planned"
        );
        Ok(accounts)
    }
}
