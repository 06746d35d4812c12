//! Role checks and state gates.
//!
//! Admin, Rebalancer and Banned are three independent keyed record sets.
//! Holding a role means a record exists at `derive(<role>, key)`; there is
//! no role enum stored anywhere.

use xswap_crypto::AddressDeriver;
use xswap_types::{
    AdminRecord, BanReason, BannedAccount, GlobalConfig, Pubkey, RebalancerRecord, Result, Role,
    XswapError,
};

use crate::store::AccountStore;

/// Read-only view answering "does this key hold that role".
pub struct Roles<'a> {
    store: &'a AccountStore,
    deriver: &'a AddressDeriver,
}

impl<'a> Roles<'a> {
    #[must_use]
    pub fn new(store: &'a AccountStore, deriver: &'a AddressDeriver) -> Self {
        Self { store, deriver }
    }

    pub fn is_admin(&self, account: &Pubkey) -> Result<bool> {
        Ok(self
            .store
            .get::<AdminRecord>(&self.deriver.admin(account)?)
            .is_some())
    }

    pub fn is_rebalancer(&self, account: &Pubkey) -> Result<bool> {
        Ok(self
            .store
            .get::<RebalancerRecord>(&self.deriver.rebalancer(account)?)
            .is_some())
    }

    pub fn ban_reason(&self, account: &Pubkey) -> Result<Option<BanReason>> {
        Ok(self
            .store
            .get::<BannedAccount>(&self.deriver.banned(account)?)
            .map(|b| b.reason))
    }

    pub fn require_admin(&self, account: &Pubkey) -> Result<()> {
        let at = self.deriver.admin(account)?;
        if self.store.get::<AdminRecord>(&at).is_none() {
            tracing::warn!(account = %account.short(), "admin check failed");
            return Err(XswapError::Unauthorized {
                role: Role::Admin,
                account: *account,
                trace: at.trace(),
            });
        }
        Ok(())
    }

    pub fn require_rebalancer(&self, account: &Pubkey) -> Result<()> {
        let at = self.deriver.rebalancer(account)?;
        if self.store.get::<RebalancerRecord>(&at).is_none() {
            tracing::warn!(account = %account.short(), "rebalancer check failed");
            return Err(XswapError::Unauthorized {
                role: Role::Rebalancer,
                account: *account,
                trace: at.trace(),
            });
        }
        Ok(())
    }

    /// Either `account == trader`, or `account` is a rebalancer.
    pub fn require_trader_or_rebalancer(&self, account: &Pubkey, trader: &Pubkey) -> Result<()> {
        if account == trader {
            return Ok(());
        }
        self.require_rebalancer(account)
    }

    pub fn require_not_banned(&self, account: &Pubkey) -> Result<()> {
        match self.ban_reason(account)? {
            Some(reason) => {
                tracing::warn!(account = %account.short(), ?reason, "banned account rejected");
                Err(XswapError::AccountBanned {
                    account: *account,
                    reason,
                })
            }
            None => Ok(()),
        }
    }

    /// Roles and bans must never coexist for one key.
    pub fn require_no_roles(&self, account: &Pubkey) -> Result<()> {
        if self.is_admin(account)? || self.is_rebalancer(account)? {
            return Err(XswapError::RoleConflict {
                account: *account,
                reason: "account holds a role; revoke it before banning".to_string(),
            });
        }
        Ok(())
    }

    pub fn require_unbanned_for_role(&self, account: &Pubkey) -> Result<()> {
        if self.ban_reason(account)?.is_some() {
            return Err(XswapError::RoleConflict {
                account: *account,
                reason: "banned account cannot hold a role".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

pub fn require_not_paused(config: &GlobalConfig) -> Result<()> {
    if config.program_paused {
        return Err(XswapError::ProgramPaused);
    }
    Ok(())
}

pub fn require_paused(config: &GlobalConfig) -> Result<()> {
    if !config.program_paused {
        return Err(XswapError::ProgramNotPaused);
    }
    Ok(())
}

pub fn require_deposits_allowed(config: &GlobalConfig) -> Result<()> {
    if !config.allow_deposit {
        return Err(XswapError::DepositsPaused);
    }
    Ok(())
}

pub fn require_native_deposits_allowed(config: &GlobalConfig) -> Result<()> {
    require_deposits_allowed(config)?;
    if config.native_deposits_restricted {
        return Err(XswapError::NativeDepositsRestricted);
    }
    Ok(())
}

pub fn require_nonzero(account: &Pubkey) -> Result<()> {
    if account.is_zero() {
        return Err(XswapError::ZeroAccount);
    }
    Ok(())
}
