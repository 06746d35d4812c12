//! The settlement program: state, atomic execution and vault movements.
//!
//! Instruction handlers live in [`crate::instructions`] as further `impl`
//! blocks on [`SettlementProgram`]. Every public handler runs inside
//! [`SettlementProgram::atomically`]: if it returns an error, the account
//! store, the bank, the flow ledger and the event log are restored to their
//! state at instruction entry. There is no partial state.

use std::sync::Arc;

use xswap_crypto::{AddressDeriver, Secp256k1Verifier, SignatureVerifier};
use xswap_types::constants::NATIVE_VAULT_MIN_THRESHOLD;
use xswap_types::{
    CompletedSwapEntry, DerivedAddress, ExpiredSwapEntry, GlobalConfig, Instruction,
    NetworkConfig, Nonce, PendingSwap, Portfolio, ProtocolEvent, Pubkey, Result, Submission,
    SwapState, TokenDetails, XswapError,
};

use crate::access::Roles;
use crate::bank::Bank;
use crate::clock::{Clock, SystemClock};
use crate::endpoint::{LoopbackEndpoint, MessagingEndpoint};
use crate::flows::FlowLedger;
use crate::store::AccountStore;

/// Everything an instruction may mutate, snapshotted at instruction entry.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    pub(crate) store: AccountStore,
    pub(crate) bank: Bank,
    pub(crate) flows: FlowLedger,
}

/// Which pair of vaults a movement touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultKind {
    /// Settles swaps and pays cross-ledger trades.
    Trading,
    /// Holds user deposits and pays withdrawals.
    UserFunds,
}

pub struct SettlementProgram<E: MessagingEndpoint = LoopbackEndpoint> {
    pub(crate) network: NetworkConfig,
    pub(crate) deriver: AddressDeriver,
    pub(crate) state: LedgerState,
    pub(crate) events: Vec<ProtocolEvent>,
    pub(crate) verifier: Box<dyn SignatureVerifier>,
    pub(crate) endpoint: E,
    pub(crate) clock: Arc<dyn Clock>,
}

impl<E: MessagingEndpoint> SettlementProgram<E> {
    #[must_use]
    pub fn new(network: NetworkConfig, endpoint: E) -> Self {
        Self {
            deriver: AddressDeriver::new(&network),
            network,
            state: LedgerState::default(),
            events: Vec::new(),
            verifier: Box::new(Secp256k1Verifier),
            endpoint,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: Box<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    #[must_use]
    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    #[must_use]
    pub fn store(&self) -> &AccountStore {
        &self.state.store
    }

    #[must_use]
    pub fn bank(&self) -> &Bank {
        &self.state.bank
    }

    #[must_use]
    pub fn events(&self) -> &[ProtocolEvent] {
        &self.events
    }

    #[must_use]
    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.unix_timestamp()
    }

    #[must_use]
    pub fn lamports(&self, account: &Pubkey) -> u64 {
        self.state.bank.lamports(account)
    }

    /// Balance of `owner`'s associated token account for `mint`.
    pub fn token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<u64> {
        let ata = self.deriver.associated_token_account(owner, mint)?;
        Ok(self.state.bank.token_balance(&ata.address))
    }

    /// Balance held by a vault for `asset` (zero for native).
    pub fn vault_balance(&self, kind: VaultKind, asset: &Pubkey) -> Result<u64> {
        let (native, authority) = self.vault_addresses(kind)?;
        if asset.is_zero() {
            Ok(self.state.bank.lamports(&native.address))
        } else {
            self.token_balance(&authority.address, asset)
        }
    }

    // -----------------------------------------------------------------
    // Genesis funding (outside any instruction)
    // -----------------------------------------------------------------

    /// Credit native balance to a user account.
    pub fn airdrop_lamports(&mut self, account: &Pubkey, amount: u64) -> Result<()> {
        self.state.bank.airdrop(account, amount)
    }

    /// Mint into `owner`'s associated token account, opening it if needed.
    pub fn mint_tokens(&mut self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Result<Pubkey> {
        let ata = self.deriver.associated_token_account(owner, mint)?;
        self.state.bank.open_token_account(&ata.address, owner, mint)?;
        self.state.bank.mint_to(&ata.address, amount)?;
        Ok(ata.address)
    }

    /// Open a token account at an arbitrary address.
    pub fn open_token_account(&mut self, address: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Result<()> {
        self.state.bank.open_token_account(address, owner, mint)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Which of {pending, completed, expired} exists for `(nonce, trader)`.
    ///
    /// Pending and completed never coexist; pending is reported first so a
    /// violation would still be visible as the non-terminal state.
    pub fn swap_state(&self, nonce: &Nonce, trader: &Pubkey) -> Result<SwapState> {
        let store = &self.state.store;
        if store
            .get::<PendingSwap>(&self.deriver.pending_swap(nonce, trader)?)
            .is_some()
        {
            return Ok(SwapState::Pending);
        }
        if store
            .get::<CompletedSwapEntry>(&self.deriver.completed_swap(nonce, trader)?)
            .is_some()
        {
            return Ok(SwapState::Completed);
        }
        if store
            .get::<ExpiredSwapEntry>(&self.deriver.expired_swap(nonce, trader)?)
            .is_some()
        {
            return Ok(SwapState::Expired);
        }
        Ok(SwapState::Absent)
    }

    pub fn pending_swap(&self, nonce: &Nonce, trader: &Pubkey) -> Result<Option<PendingSwap>> {
        Ok(self
            .state
            .store
            .get::<PendingSwap>(&self.deriver.pending_swap(nonce, trader)?)
            .cloned())
    }

    pub fn completed_swap(&self, nonce: &Nonce, trader: &Pubkey) -> Result<Option<CompletedSwapEntry>> {
        Ok(self
            .state
            .store
            .get::<CompletedSwapEntry>(&self.deriver.completed_swap(nonce, trader)?)
            .copied())
    }

    pub fn token_details(&self, mint: &Pubkey) -> Result<Option<TokenDetails>> {
        Ok(self
            .state
            .store
            .get::<TokenDetails>(&self.deriver.token_details(mint)?)
            .cloned())
    }

    /// Check every vault balance against its recorded flows.
    pub fn verify_vault_conservation(&self) -> Result<()> {
        for vault in self.state.flows.tracked_vaults() {
            let actual = match self.state.bank.token_account(&vault) {
                Some(account) => account.amount,
                None => self.state.bank.lamports(&vault),
            };
            self.state.flows.verify(&vault, actual)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------

    /// Execute one signed instruction.
    pub fn process(&mut self, submission: &Submission) -> Result<()> {
        let signer = &submission.signer;
        let accounts = submission.remaining_accounts.as_slice();
        match &submission.instruction {
            Instruction::Initialize(p) => self.initialize(signer, p),
            Instruction::SetRemote(p) => self.set_remote(signer, p),
            Instruction::AddAdmin { account } => self.add_admin(signer, account),
            Instruction::RemoveAdmin { account } => self.remove_admin(signer, account),
            Instruction::AddRebalancer { account } => self.add_rebalancer(signer, account),
            Instruction::RemoveRebalancer { account } => self.remove_rebalancer(signer, account),
            Instruction::BanAccount(p) => self.ban_account(signer, p),
            Instruction::UnbanAccount { account } => self.unban_account(signer, account),
            Instruction::SetPaused { paused } => self.set_paused(signer, *paused),
            Instruction::SetAllowDeposit { allow } => self.set_allow_deposit(signer, *allow),
            Instruction::SetNativeDepositsRestricted { restricted } => {
                self.set_native_deposits_restricted(signer, *restricted)
            }
            Instruction::SetDefaultChain { chain_id } => self.set_default_chain(signer, *chain_id),
            Instruction::SetAirdropAmount { amount } => self.set_airdrop_amount(signer, *amount),
            Instruction::SetSwapSigner { swap_signer } => {
                self.set_swap_signer(signer, *swap_signer)
            }
            Instruction::AddToken(p) => self.add_token(signer, p),
            Instruction::RemoveToken { token_address } => self.remove_token(signer, token_address),
            Instruction::DepositNative(p) => self.deposit_native(signer, p, accounts),
            Instruction::Deposit(p) => self.deposit(signer, p, accounts),
            Instruction::DepositAirdrop { amount } => self.deposit_airdrop(signer, *amount),
            Instruction::FundSol { amount } => self.fund_sol(signer, *amount),
            Instruction::FundSpl(p) => self.fund_spl(signer, p),
            Instruction::ClaimNativeBalance { amount } => self.claim_native_balance(signer, *amount),
            Instruction::ClaimSplBalance(p) => self.claim_spl_balance(signer, p),
            Instruction::ClaimAirdropBalance { amount } => {
                self.claim_airdrop_balance(signer, *amount)
            }
            Instruction::Swap(p) => self.swap(signer, p),
            Instruction::CrossSwap(p) => self.cross_swap(signer, p, accounts),
            Instruction::LzReceive(p) => self.lz_receive(signer, p, accounts),
            Instruction::FinalizePendingSwap(p) => self.finalize_pending_swap(signer, p),
            Instruction::RemoveFromSwapQueue(p) => self.remove_from_swap_queue(signer, p),
            Instruction::UpdateSwapExpiry(p) => self.update_swap_expiry(signer, p),
            Instruction::AddDestination(p) => self.add_destination(signer, p),
        }
    }

    /// Execute an instruction from its wire form (see [`crate::wire`]).
    pub fn process_data(
        &mut self,
        signer: &Pubkey,
        data: &[u8],
        remaining_accounts: &[xswap_types::AccountMeta],
    ) -> Result<()> {
        let instruction = crate::wire::decode_instruction(data)?;
        self.process(&Submission {
            signer: *signer,
            instruction,
            remaining_accounts: remaining_accounts.to_vec(),
        })
    }

    // -----------------------------------------------------------------
    // Execution helpers
    // -----------------------------------------------------------------

    /// Run `f` with all-or-nothing semantics.
    ///
    /// Rollback restores a full clone of [`LedgerState`] taken before `f`
    /// runs, so every instruction costs O(state), and the store only grows as
    /// terminal markers accumulate. Fine for the in-process ledger and its
    /// tests; a long-lived deployment would want an undo log of touched
    /// addresses instead.
    pub(crate) fn atomically<T>(
        &mut self,
        instruction: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let snapshot = self.state.clone();
        let mark = self.events.len();
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.state = snapshot;
                self.events.truncate(mark);
                tracing::warn!(instruction, code = ?e.kind(), error = %e, "instruction rejected");
                Err(e)
            }
        }
    }

    pub(crate) fn emit(&mut self, event: ProtocolEvent) {
        tracing::debug!(?event, "event");
        self.events.push(event);
    }

    /// Current time as the 32-bit timestamp carried in XFER headers.
    pub(crate) fn message_timestamp(&self) -> Result<u32> {
        u32::try_from(self.now()).map_err(|_| XswapError::ArithmeticOverflow {
            context: "message timestamp",
        })
    }

    pub(crate) fn roles(&self) -> Roles<'_> {
        Roles::new(&self.state.store, &self.deriver)
    }

    pub(crate) fn portfolio(&self) -> Result<&Portfolio> {
        let at = self.deriver.portfolio()?;
        self.state.store.require::<Portfolio>(&at)
    }

    pub(crate) fn config(&self) -> Result<&GlobalConfig> {
        Ok(&self.portfolio()?.global_config)
    }

    pub(crate) fn config_mut(&mut self) -> Result<&mut GlobalConfig> {
        let at = self.deriver.portfolio()?;
        Ok(&mut self.state.store.require_mut::<Portfolio>(&at)?.global_config)
    }

    // -----------------------------------------------------------------
    // Vault movements
    // -----------------------------------------------------------------

    /// `(native vault, token vault authority)` for a vault kind.
    pub(crate) fn vault_addresses(&self, kind: VaultKind) -> Result<(DerivedAddress, DerivedAddress)> {
        Ok(match kind {
            VaultKind::Trading => (self.deriver.sol_vault()?, self.deriver.spl_vault()?),
            VaultKind::UserFunds => (
                self.deriver.sol_user_funds_vault()?,
                self.deriver.spl_user_funds_vault()?,
            ),
        })
    }

    /// Whether a vault can release `amount` of `asset` right now.
    pub(crate) fn vault_can_cover(&self, kind: VaultKind, asset: &Pubkey, amount: u64) -> Result<bool> {
        let available = self.vault_balance(kind, asset)?;
        let reserve = if asset.is_zero() {
            NATIVE_VAULT_MIN_THRESHOLD
        } else {
            0
        };
        Ok(available >= amount.saturating_add(reserve))
    }

    /// Release `amount` of `asset` from a vault to `recipient`. Native
    /// vaults keep [`NATIVE_VAULT_MIN_THRESHOLD`] back.
    pub(crate) fn pay_from_vault(
        &mut self,
        kind: VaultKind,
        asset: &Pubkey,
        recipient: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let (native, authority) = self.vault_addresses(kind)?;
        if asset.is_zero() {
            self.native_vault_out(&native, recipient, amount, NATIVE_VAULT_MIN_THRESHOLD)
        } else {
            self.token_vault_out(&authority, asset, recipient, amount)
        }
    }

    /// Collect `amount` of `asset` from `payer` into a vault.
    pub(crate) fn collect_into_vault(
        &mut self,
        kind: VaultKind,
        asset: &Pubkey,
        payer: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let (native, authority) = self.vault_addresses(kind)?;
        if asset.is_zero() {
            self.native_vault_in(payer, &native, amount)
        } else {
            self.token_vault_in(payer, asset, &authority, amount)
        }
    }

    pub(crate) fn native_vault_out(
        &mut self,
        vault: &DerivedAddress,
        to: &Pubkey,
        amount: u64,
        reserve: u64,
    ) -> Result<()> {
        let available = self.state.bank.lamports(&vault.address);
        let needed = amount
            .checked_add(reserve)
            .ok_or(XswapError::ArithmeticOverflow {
                context: "vault reserve",
            })?;
        if available < needed {
            return Err(XswapError::InsufficientFunds {
                account: vault.trace(),
                needed,
                available,
            });
        }
        self.state.bank.transfer_lamports(&vault.address, to, amount)?;
        self.state.flows.record_outflow(&vault.address, amount);
        tracing::debug!(vault = vault.tag, to = %to.short(), amount, "native vault outflow");
        Ok(())
    }

    pub(crate) fn native_vault_in(&mut self, from: &Pubkey, vault: &DerivedAddress, amount: u64) -> Result<()> {
        self.state.bank.transfer_lamports(from, &vault.address, amount)?;
        self.state.flows.record_inflow(&vault.address, amount);
        tracing::debug!(vault = vault.tag, from = %from.short(), amount, "native vault inflow");
        Ok(())
    }

    pub(crate) fn token_vault_out(
        &mut self,
        authority: &DerivedAddress,
        mint: &Pubkey,
        recipient: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let vault_ata = self.deriver.associated_token_account(&authority.address, mint)?;
        let available = self.state.bank.token_balance(&vault_ata.address);
        if available < amount {
            return Err(XswapError::InsufficientFunds {
                account: vault_ata.trace(),
                needed: amount,
                available,
            });
        }
        let recipient_ata = self.deriver.associated_token_account(recipient, mint)?;
        self.state
            .bank
            .open_token_account(&recipient_ata.address, recipient, mint)?;
        self.state.bank.transfer_tokens(
            &vault_ata.address,
            &recipient_ata.address,
            &authority.address,
            amount,
        )?;
        self.state.flows.record_outflow(&vault_ata.address, amount);
        tracing::debug!(vault = authority.tag, mint = %mint.short(), to = %recipient.short(), amount, "token vault outflow");
        Ok(())
    }

    pub(crate) fn token_vault_in(
        &mut self,
        payer: &Pubkey,
        mint: &Pubkey,
        authority: &DerivedAddress,
        amount: u64,
    ) -> Result<()> {
        let payer_ata = self.deriver.associated_token_account(payer, mint)?;
        let available = self.state.bank.token_balance(&payer_ata.address);
        if available < amount {
            return Err(XswapError::InsufficientFunds {
                account: payer_ata.trace(),
                needed: amount,
                available,
            });
        }
        let vault_ata = self.deriver.associated_token_account(&authority.address, mint)?;
        self.state
            .bank
            .open_token_account(&vault_ata.address, &authority.address, mint)?;
        self.state
            .bank
            .transfer_tokens(&payer_ata.address, &vault_ata.address, payer, amount)?;
        self.state.flows.record_inflow(&vault_ata.address, amount);
        tracing::debug!(vault = authority.tag, mint = %mint.short(), from = %payer.short(), amount, "token vault inflow");
        Ok(())
    }
}
