//! Deposits, rebalancer funding and claims.
//!
//! Deposits land in the user-funds vaults and are relayed to the default
//! chain as a `Deposit` XFER. Funding and claims move liquidity in and out
//! of the trading vaults and never send a message.

use xswap_types::constants::NATIVE_SYMBOL;
use xswap_types::ids::CUSTOM_DATA_LEN;
use xswap_types::{
    AccountMeta, DepositNativeParams, DepositParams, Pubkey, Result, Symbol, TokenAmountParams,
    TokenDetails, Tx, XswapError,
};

use crate::access::{require_native_deposits_allowed, require_deposits_allowed, require_not_paused};
use crate::endpoint::MessagingEndpoint;
use crate::outbound::OutboundXfer;
use crate::program::{SettlementProgram, VaultKind};

fn require_amount(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(XswapError::ZeroAmount);
    }
    Ok(())
}

impl<E: MessagingEndpoint> SettlementProgram<E> {
    fn supported_token(&self, mint: &Pubkey) -> Result<TokenDetails> {
        self.token_details(mint)?
            .ok_or(XswapError::TokenNotSupported { mint: *mint })
    }

    // -----------------------------------------------------------------
    // Deposits
    // -----------------------------------------------------------------

    pub fn deposit_native(
        &mut self,
        signer: &Pubkey,
        params: &DepositNativeParams,
        accounts: &[AccountMeta],
    ) -> Result<()> {
        self.atomically("deposit_native", |p| {
            p.roles().require_not_banned(signer)?;
            let config = p.config()?;
            require_not_paused(config)?;
            require_native_deposits_allowed(config)?;
            let dst_eid = config.default_chain_id;
            require_amount(params.amount)?;

            p.collect_into_vault(VaultKind::UserFunds, &Pubkey::ZERO, signer, params.amount)?;
            let xfer = OutboundXfer {
                transaction: Tx::Deposit,
                trader: params.trader,
                symbol: Symbol::new(NATIVE_SYMBOL)?,
                token_mint: Pubkey::ZERO,
                quantity: params.amount,
                custom_data: [0u8; CUSTOM_DATA_LEN],
                timestamp: p.message_timestamp()?,
                dst_eid,
            };
            p.send_xfer(signer, &xfer, accounts)?;
            tracing::info!(depositor = %signer.short(), amount = params.amount, dst_eid, "native deposit");
            Ok(())
        })
    }

    pub fn deposit(
        &mut self,
        signer: &Pubkey,
        params: &DepositParams,
        accounts: &[AccountMeta],
    ) -> Result<()> {
        self.atomically("deposit", |p| {
            p.roles().require_not_banned(signer)?;
            let config = p.config()?;
            require_not_paused(config)?;
            require_deposits_allowed(config)?;
            let dst_eid = config.default_chain_id;
            require_amount(params.amount)?;
            let details = p.supported_token(&params.token_mint)?;

            p.collect_into_vault(
                VaultKind::UserFunds,
                &params.token_mint,
                signer,
                params.amount,
            )?;
            let xfer = OutboundXfer {
                transaction: Tx::Deposit,
                trader: params.trader,
                symbol: details.symbol,
                token_mint: params.token_mint,
                quantity: params.amount,
                custom_data: [0u8; CUSTOM_DATA_LEN],
                timestamp: p.message_timestamp()?,
                dst_eid,
            };
            p.send_xfer(signer, &xfer, accounts)?;
            tracing::info!(
                depositor = %signer.short(),
                mint = %params.token_mint.short(),
                amount = params.amount,
                units = %details.to_units(params.amount),
                dst_eid,
                "token deposit"
            );
            Ok(())
        })
    }

    /// Top up the airdrop vault, which also pays pending-entry storage.
    pub fn deposit_airdrop(&mut self, signer: &Pubkey, amount: u64) -> Result<()> {
        self.atomically("deposit_airdrop", |p| {
            p.roles().require_admin(signer)?;
            let config = p.config()?;
            require_not_paused(config)?;
            require_native_deposits_allowed(config)?;
            require_amount(amount)?;
            let vault = p.deriver.airdrop_vault()?;
            p.native_vault_in(signer, &vault, amount)?;
            tracing::info!(admin = %signer.short(), amount, "airdrop vault funded");
            Ok(())
        })
    }

    // -----------------------------------------------------------------
    // Rebalancing
    // -----------------------------------------------------------------

    pub fn fund_sol(&mut self, signer: &Pubkey, amount: u64) -> Result<()> {
        self.atomically("fund_sol", |p| {
            p.roles().require_rebalancer(signer)?;
            require_not_paused(p.config()?)?;
            require_amount(amount)?;
            p.collect_into_vault(VaultKind::Trading, &Pubkey::ZERO, signer, amount)?;
            tracing::info!(rebalancer = %signer.short(), amount, "native trading vault funded");
            Ok(())
        })
    }

    pub fn fund_spl(&mut self, signer: &Pubkey, params: &TokenAmountParams) -> Result<()> {
        self.atomically("fund_spl", |p| {
            p.roles().require_rebalancer(signer)?;
            require_not_paused(p.config()?)?;
            require_amount(params.amount)?;
            p.supported_token(&params.token_mint)?;
            p.collect_into_vault(VaultKind::Trading, &params.token_mint, signer, params.amount)?;
            tracing::info!(
                rebalancer = %signer.short(),
                mint = %params.token_mint.short(),
                amount = params.amount,
                "token trading vault funded"
            );
            Ok(())
        })
    }

    /// Withdraw native liquidity, leaving the vault's minimum balance.
    pub fn claim_native_balance(&mut self, signer: &Pubkey, amount: u64) -> Result<()> {
        self.atomically("claim_native_balance", |p| {
            p.roles().require_rebalancer(signer)?;
            require_not_paused(p.config()?)?;
            require_amount(amount)?;
            p.pay_from_vault(VaultKind::Trading, &Pubkey::ZERO, signer, amount)?;
            tracing::info!(rebalancer = %signer.short(), amount, "native balance claimed");
            Ok(())
        })
    }

    pub fn claim_spl_balance(&mut self, signer: &Pubkey, params: &TokenAmountParams) -> Result<()> {
        self.atomically("claim_spl_balance", |p| {
            p.roles().require_rebalancer(signer)?;
            require_not_paused(p.config()?)?;
            require_amount(params.amount)?;
            p.pay_from_vault(VaultKind::Trading, &params.token_mint, signer, params.amount)?;
            tracing::info!(
                rebalancer = %signer.short(),
                mint = %params.token_mint.short(),
                amount = params.amount,
                "token balance claimed"
            );
            Ok(())
        })
    }

    pub fn claim_airdrop_balance(&mut self, signer: &Pubkey, amount: u64) -> Result<()> {
        self.atomically("claim_airdrop_balance", |p| {
            p.roles().require_admin(signer)?;
            require_not_paused(p.config()?)?;
            require_amount(amount)?;
            let vault = p.deriver.airdrop_vault()?;
            p.native_vault_out(&vault, signer, amount, 0)?;
            tracing::info!(admin = %signer.short(), amount, "airdrop balance claimed");
            Ok(())
        })
    }
}
