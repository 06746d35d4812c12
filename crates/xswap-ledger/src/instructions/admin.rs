use xswap_types::{
    AddDestinationParams, AddTokenParams, AdminRecord, AllowedDestination, BanAccountParams,
    BanReason, BannedAccount, EthAddress, GlobalConfig, InitializeParams, ParameterKind,
    Portfolio, ProtocolEvent, Pubkey, RebalancerRecord, Remote, Result, SetRemoteParams,
    TokenDetails, TokenList, VaultRecord, XswapError,
};

use crate::access::{require_nonzero, require_paused};
use crate::endpoint::MessagingEndpoint;
use crate::program::SettlementProgram;

impl<E: MessagingEndpoint> SettlementProgram<E> {
    // -----------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------

    /// Create the portfolio, make `signer` the first admin and mark the
    /// vault authorities. Runs once.
    pub fn initialize(&mut self, signer: &Pubkey, params: &InitializeParams) -> Result<()> {
        self.atomically("initialize", |p| {
            let expected = p.endpoint.program_id();
            if params.endpoint != expected {
                return Err(XswapError::InvalidEndpoint {
                    expected,
                    provided: params.endpoint,
                });
            }
            require_nonzero(signer)?;
            let portfolio = p.deriver.portfolio()?;
            p.state.store.create(
                &portfolio,
                Portfolio {
                    global_config: GlobalConfig {
                        default_chain_id: params.default_chain_id,
                        swap_signer: params.swap_signer,
                        ..GlobalConfig::default()
                    },
                    endpoint: params.endpoint,
                    bump: portfolio.bump,
                },
            )?;
            p.state.store.create(&p.deriver.admin(signer)?, AdminRecord)?;
            p.state
                .store
                .create(&p.deriver.token_list()?, TokenList::default())?;
            for vault in [
                p.deriver.sol_vault()?,
                p.deriver.sol_user_funds_vault()?,
                p.deriver.airdrop_vault()?,
                p.deriver.spl_vault()?,
                p.deriver.spl_user_funds_vault()?,
            ] {
                p.state.store.create(&vault, VaultRecord)?;
            }
            p.emit(ProtocolEvent::RoleChanged {
                role: "admin".to_string(),
                account: *signer,
                granted: true,
            });
            tracing::info!(
                portfolio = %portfolio.address,
                admin = %signer.short(),
                swap_signer = %params.swap_signer,
                default_chain_id = params.default_chain_id,
                "portfolio initialized"
            );
            Ok(())
        })
    }

    pub fn set_remote(&mut self, signer: &Pubkey, params: &SetRemoteParams) -> Result<()> {
        self.atomically("set_remote", |p| {
            p.roles().require_admin(signer)?;
            require_nonzero(&params.remote)?;
            let at = p.deriver.remote(params.dst_eid)?;
            p.state.store.upsert(
                &at,
                Remote {
                    address: params.remote,
                },
            );
            p.emit(ProtocolEvent::ParameterUpdated {
                parameter: ParameterKind::Remote,
                value: format!("{}={}", params.dst_eid, params.remote),
            });
            tracing::info!(dst_eid = params.dst_eid, remote = %params.remote.short(), "remote set");
            Ok(())
        })
    }

    /// The peer registered for `eid`.
    pub fn get_remote(&self, eid: u32) -> Result<Remote> {
        let at = self.deriver.remote(eid)?;
        self.state.store.require::<Remote>(&at).copied()
    }

    pub fn get_global_config(&self) -> Result<GlobalConfig> {
        self.config().cloned()
    }

    // -----------------------------------------------------------------
    // Roles and bans
    // -----------------------------------------------------------------

    pub fn add_admin(&mut self, signer: &Pubkey, account: &Pubkey) -> Result<()> {
        self.atomically("add_admin", |p| {
            p.roles().require_admin(signer)?;
            require_nonzero(account)?;
            p.roles().require_unbanned_for_role(account)?;
            p.state.store.upsert(&p.deriver.admin(account)?, AdminRecord);
            p.role_changed("admin", account, true);
            Ok(())
        })
    }

    pub fn remove_admin(&mut self, signer: &Pubkey, account: &Pubkey) -> Result<()> {
        self.atomically("remove_admin", |p| {
            p.roles().require_admin(signer)?;
            require_nonzero(account)?;
            p.state
                .store
                .close::<AdminRecord>(&p.deriver.admin(account)?)?;
            p.role_changed("admin", account, false);
            Ok(())
        })
    }

    pub fn add_rebalancer(&mut self, signer: &Pubkey, account: &Pubkey) -> Result<()> {
        self.atomically("add_rebalancer", |p| {
            p.roles().require_admin(signer)?;
            require_nonzero(account)?;
            p.roles().require_unbanned_for_role(account)?;
            p.state
                .store
                .upsert(&p.deriver.rebalancer(account)?, RebalancerRecord);
            p.role_changed("rebalancer", account, true);
            Ok(())
        })
    }

    pub fn remove_rebalancer(&mut self, signer: &Pubkey, account: &Pubkey) -> Result<()> {
        self.atomically("remove_rebalancer", |p| {
            p.roles().require_admin(signer)?;
            require_nonzero(account)?;
            p.state
                .store
                .close::<RebalancerRecord>(&p.deriver.rebalancer(account)?)?;
            p.role_changed("rebalancer", account, false);
            Ok(())
        })
    }

    fn role_changed(&mut self, role: &str, account: &Pubkey, granted: bool) {
        tracing::info!(role, account = %account.short(), granted, "role changed");
        self.emit(ProtocolEvent::RoleChanged {
            role: role.to_string(),
            account: *account,
            granted,
        });
    }

    pub fn ban_account(&mut self, signer: &Pubkey, params: &BanAccountParams) -> Result<()> {
        self.atomically("ban_account", |p| {
            p.roles().require_admin(signer)?;
            require_nonzero(&params.account)?;
            if params.reason == BanReason::NotBanned {
                return Err(XswapError::InvalidInput {
                    reason: "ban reason must not be NotBanned".to_string(),
                });
            }
            p.roles().require_no_roles(&params.account)?;
            p.state.store.upsert(
                &p.deriver.banned(&params.account)?,
                BannedAccount {
                    reason: params.reason,
                },
            );
            p.emit(ProtocolEvent::BanStatusChanged {
                account: params.account,
                reason: params.reason,
            });
            tracing::info!(account = %params.account.short(), reason = ?params.reason, "account banned");
            Ok(())
        })
    }

    pub fn unban_account(&mut self, signer: &Pubkey, account: &Pubkey) -> Result<()> {
        self.atomically("unban_account", |p| {
            p.roles().require_admin(signer)?;
            require_nonzero(account)?;
            p.state
                .store
                .close::<BannedAccount>(&p.deriver.banned(account)?)?;
            p.emit(ProtocolEvent::BanStatusChanged {
                account: *account,
                reason: BanReason::NotBanned,
            });
            tracing::info!(account = %account.short(), "account unbanned");
            Ok(())
        })
    }

    // -----------------------------------------------------------------
    // Global switches
    // -----------------------------------------------------------------

    fn update_config(
        &mut self,
        signer: &Pubkey,
        instruction: &'static str,
        parameter: ParameterKind,
        value: String,
        apply: impl FnOnce(&mut GlobalConfig),
    ) -> Result<()> {
        self.atomically(instruction, |p| {
            p.roles().require_admin(signer)?;
            apply(p.config_mut()?);
            tracing::info!(?parameter, %value, "parameter updated");
            p.emit(ProtocolEvent::ParameterUpdated { parameter, value });
            Ok(())
        })
    }

    pub fn set_paused(&mut self, signer: &Pubkey, paused: bool) -> Result<()> {
        self.update_config(signer, "set_paused", ParameterKind::Paused, paused.to_string(), |c| {
            c.program_paused = paused;
        })
    }

    pub fn set_allow_deposit(&mut self, signer: &Pubkey, allow: bool) -> Result<()> {
        self.update_config(
            signer,
            "set_allow_deposit",
            ParameterKind::AllowDeposit,
            allow.to_string(),
            |c| c.allow_deposit = allow,
        )
    }

    pub fn set_native_deposits_restricted(&mut self, signer: &Pubkey, restricted: bool) -> Result<()> {
        self.update_config(
            signer,
            "set_native_deposits_restricted",
            ParameterKind::NativeDepositsRestricted,
            restricted.to_string(),
            |c| c.native_deposits_restricted = restricted,
        )
    }

    pub fn set_default_chain(&mut self, signer: &Pubkey, chain_id: u32) -> Result<()> {
        self.update_config(
            signer,
            "set_default_chain",
            ParameterKind::DefaultChain,
            chain_id.to_string(),
            |c| c.default_chain_id = chain_id,
        )
    }

    pub fn set_airdrop_amount(&mut self, signer: &Pubkey, amount: u64) -> Result<()> {
        self.update_config(
            signer,
            "set_airdrop_amount",
            ParameterKind::AirdropAmount,
            amount.to_string(),
            |c| c.airdrop_amount = amount,
        )
    }

    pub fn set_swap_signer(&mut self, signer: &Pubkey, swap_signer: EthAddress) -> Result<()> {
        self.update_config(
            signer,
            "set_swap_signer",
            ParameterKind::SwapSigner,
            swap_signer.to_string(),
            |c| c.swap_signer = swap_signer,
        )
    }

    // -----------------------------------------------------------------
    // Tokens and destinations
    // -----------------------------------------------------------------

    /// Register a mint and open both vault token accounts for it.
    pub fn add_token(&mut self, signer: &Pubkey, params: &AddTokenParams) -> Result<()> {
        self.atomically("add_token", |p| {
            p.roles().require_admin(signer)?;
            require_nonzero(&params.token_address)?;
            let mint = params.token_address;
            p.state.store.create(
                &p.deriver.token_details(&mint)?,
                TokenDetails {
                    token_address: mint,
                    symbol: params.symbol,
                    decimals: params.decimals,
                },
            )?;
            let list = p.deriver.token_list()?;
            let tokens = p.state.store.require_mut::<TokenList>(&list)?;
            if !tokens.contains(&mint) {
                tokens.tokens.push(mint);
            }
            for authority in [p.deriver.spl_vault()?, p.deriver.spl_user_funds_vault()?] {
                let ata = p.deriver.associated_token_account(&authority.address, &mint)?;
                p.state
                    .bank
                    .open_token_account(&ata.address, &authority.address, &mint)?;
            }
            tracing::info!(mint = %mint.short(), symbol = %params.symbol, decimals = params.decimals, "token added");
            Ok(())
        })
    }

    /// Unregister a mint. Only while paused, so no in-flight instruction
    /// can observe a half-removed token.
    pub fn remove_token(&mut self, signer: &Pubkey, token_address: &Pubkey) -> Result<()> {
        self.atomically("remove_token", |p| {
            p.roles().require_admin(signer)?;
            require_paused(p.config()?)?;
            p.state
                .store
                .close::<TokenDetails>(&p.deriver.token_details(token_address)?)?;
            let list = p.deriver.token_list()?;
            p.state
                .store
                .require_mut::<TokenList>(&list)?
                .tokens
                .retain(|t| t != token_address);
            tracing::info!(mint = %token_address.short(), "token removed");
            Ok(())
        })
    }

    /// Allow cross swaps delivering `token_address` to `eid`.
    pub fn add_destination(&mut self, signer: &Pubkey, params: &AddDestinationParams) -> Result<()> {
        self.atomically("add_destination", |p| {
            p.roles().require_admin(signer)?;
            let at = p.deriver.allowed_destination(params.eid, &params.token_address)?;
            p.state.store.upsert(
                &at,
                AllowedDestination {
                    eid: params.eid,
                    token_address: params.token_address,
                },
            );
            tracing::info!(eid = params.eid, asset = %params.token_address.short(), "destination allowed");
            Ok(())
        })
    }
}
