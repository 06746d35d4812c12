//! Deterministic (program-derived) addresses.
//!
//! ```text
//! address = sha256(seed_0 || ... || seed_n || program_id || "ProgramDerivedAddress")
//! ```
//!
//! A valid derived address must NOT be a point on the ed25519 curve, so no
//! private key can sign for it. [`find_program_address`] appends a one-byte
//! bump, counting down from 255, until the hash lands off the curve.
//!
//! Addresses are a pure function of their inputs: there is no registry.
//! Creating a record at an address that already holds one is how the ledger
//! rejects replays.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use xswap_types::constants::{
    ADMIN_SEED, AIRDROP_VAULT_SEED, BANNED_ACCOUNT_SEED, CCTRADE_ALLOWED_DEST_SEED,
    COMPLETED_SWAPS_SEED, EXPIRED_SWAPS_SEED, MAX_SEED_LEN, MAX_SEEDS, PDA_MARKER,
    PENDING_SWAPS_SEED, PORTFOLIO_SEED, REBALANCER_SEED, REMOTE_SEED, SOL_USER_FUNDS_VAULT_SEED,
    SOL_VAULT_SEED, SPL_USER_FUNDS_VAULT_SEED, SPL_VAULT_SEED, TOKEN_DETAILS_SEED,
    TOKEN_LIST_PAGE, TOKEN_LIST_SEED,
};
use xswap_types::{DerivedAddress, NetworkConfig, Nonce, Pubkey, Result, XswapError};

use crate::codec::keccak256;

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Whether `bytes` decompress to a point on the ed25519 curve.
#[must_use]
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_ok()
}

fn hash_seeds(seeds: &[&[u8]], program_id: &Pubkey) -> Result<[u8; 32]> {
    if seeds.len() > MAX_SEEDS {
        return Err(XswapError::InvalidPda {
            reason: format!("{} seeds exceeds maximum of {MAX_SEEDS}", seeds.len()),
        });
    }
    let mut hasher = Sha256::new();
    for seed in seeds {
        if seed.len() > MAX_SEED_LEN {
            return Err(XswapError::InvalidPda {
                reason: format!("seed of {} bytes exceeds {MAX_SEED_LEN}", seed.len()),
            });
        }
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    Ok(hasher.finalize().into())
}

/// Hash `seeds` (bump included) under `program_id`.
///
/// # Errors
/// [`XswapError::InvalidPda`] if a seed is too long, there are too many
/// seeds, or the result lies on the curve.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Pubkey> {
    let hash = hash_seeds(seeds, program_id)?;
    if is_on_curve(&hash) {
        return Err(XswapError::InvalidPda {
            reason: "derived address lies on the ed25519 curve".to_string(),
        });
    }
    Ok(Pubkey(hash))
}

/// Search bumps 255..=0 for the first off-curve address.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        let hash = hash_seeds(&with_bump, program_id)?;
        if !is_on_curve(&hash) {
            return Ok((Pubkey(hash), bump));
        }
    }
    Err(XswapError::InvalidPda {
        reason: "no viable bump seed".to_string(),
    })
}

/// Key of a nonce-indexed map entry: `keccak256(nonce || counterparty)`.
#[must_use]
pub fn map_entry_key(nonce: &Nonce, counterparty: &Pubkey) -> [u8; 32] {
    let mut preimage = [0u8; 44];
    preimage[..12].copy_from_slice(nonce.as_bytes());
    preimage[12..].copy_from_slice(counterparty.as_bytes());
    keccak256(&preimage)
}

fn derive(tag: &'static str, seeds: Vec<Vec<u8>>, program_id: &Pubkey) -> Result<DerivedAddress> {
    let refs: Vec<&[u8]> = seeds.iter().map(Vec::as_slice).collect();
    let (address, bump) = find_program_address(&refs, program_id)?;
    Ok(DerivedAddress {
        address,
        bump,
        tag,
        seeds,
    })
}

// ---------------------------------------------------------------------------
// AddressDeriver
// ---------------------------------------------------------------------------

/// One method per seed tag of the settlement program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: Pubkey,
    token_program: Pubkey,
    associated_token_program: Pubkey,
}

impl AddressDeriver {
    #[must_use]
    pub fn new(network: &NetworkConfig) -> Self {
        Self {
            program_id: network.program_id,
            token_program: network.token_program,
            associated_token_program: network.associated_token_program,
        }
    }

    #[must_use]
    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn portfolio(&self) -> Result<DerivedAddress> {
        derive("Pfl", vec![PORTFOLIO_SEED.to_vec()], &self.program_id)
    }

    /// Native trading vault.
    pub fn sol_vault(&self) -> Result<DerivedAddress> {
        derive("Solv", vec![SOL_VAULT_SEED.to_vec()], &self.program_id)
    }

    /// Native user-funds vault.
    pub fn sol_user_funds_vault(&self) -> Result<DerivedAddress> {
        derive("Soufv", vec![SOL_USER_FUNDS_VAULT_SEED.to_vec()], &self.program_id)
    }

    pub fn airdrop_vault(&self) -> Result<DerivedAddress> {
        derive("Adv", vec![AIRDROP_VAULT_SEED.to_vec()], &self.program_id)
    }

    /// Authority of the token trading vault accounts.
    pub fn spl_vault(&self) -> Result<DerivedAddress> {
        derive("Splv", vec![SPL_VAULT_SEED.to_vec()], &self.program_id)
    }

    /// Authority of the token user-funds vault accounts.
    pub fn spl_user_funds_vault(&self) -> Result<DerivedAddress> {
        derive("Sufv", vec![SPL_USER_FUNDS_VAULT_SEED.to_vec()], &self.program_id)
    }

    pub fn remote(&self, eid: u32) -> Result<DerivedAddress> {
        derive(
            "Remote",
            vec![REMOTE_SEED.to_vec(), eid.to_be_bytes().to_vec()],
            &self.program_id,
        )
    }

    pub fn admin(&self, account: &Pubkey) -> Result<DerivedAddress> {
        derive(
            "Admin",
            vec![ADMIN_SEED.to_vec(), account.to_bytes().to_vec()],
            &self.program_id,
        )
    }

    pub fn rebalancer(&self, account: &Pubkey) -> Result<DerivedAddress> {
        derive(
            "Rebalancer",
            vec![REBALANCER_SEED.to_vec(), account.to_bytes().to_vec()],
            &self.program_id,
        )
    }

    pub fn banned(&self, account: &Pubkey) -> Result<DerivedAddress> {
        derive(
            "Banned",
            vec![BANNED_ACCOUNT_SEED.to_vec(), account.to_bytes().to_vec()],
            &self.program_id,
        )
    }

    pub fn token_details(&self, mint: &Pubkey) -> Result<DerivedAddress> {
        derive(
            "TokenDetails",
            vec![TOKEN_DETAILS_SEED.to_vec(), mint.to_bytes().to_vec()],
            &self.program_id,
        )
    }

    pub fn token_list(&self) -> Result<DerivedAddress> {
        derive(
            "TokenList",
            vec![TOKEN_LIST_SEED.to_vec(), TOKEN_LIST_PAGE.to_vec()],
            &self.program_id,
        )
    }

    pub fn pending_swap(&self, nonce: &Nonce, trader: &Pubkey) -> Result<DerivedAddress> {
        derive(
            "PendingSwaps",
            vec![
                PENDING_SWAPS_SEED.to_vec(),
                map_entry_key(nonce, trader).to_vec(),
            ],
            &self.program_id,
        )
    }

    pub fn completed_swap(&self, nonce: &Nonce, dest_trader: &Pubkey) -> Result<DerivedAddress> {
        derive(
            "CompletedSwaps",
            vec![
                COMPLETED_SWAPS_SEED.to_vec(),
                map_entry_key(nonce, dest_trader).to_vec(),
            ],
            &self.program_id,
        )
    }

    pub fn expired_swap(&self, nonce: &Nonce, trader: &Pubkey) -> Result<DerivedAddress> {
        derive(
            "ExpiredSwaps",
            vec![
                EXPIRED_SWAPS_SEED.to_vec(),
                map_entry_key(nonce, trader).to_vec(),
            ],
            &self.program_id,
        )
    }

    /// Marker allowing cross swaps of `asset` to endpoint `eid`.
    pub fn allowed_destination(&self, eid: u32, asset: &Pubkey) -> Result<DerivedAddress> {
        derive(
            "Cads",
            vec![
                CCTRADE_ALLOWED_DEST_SEED.to_vec(),
                eid.to_be_bytes().to_vec(),
                asset.to_bytes().to_vec(),
            ],
            &self.program_id,
        )
    }

    /// Token account of `owner` for `mint`, owned by the associated token
    /// program rather than this program.
    pub fn associated_token_account(&self, owner: &Pubkey, mint: &Pubkey) -> Result<DerivedAddress> {
        derive(
            "AssociatedToken",
            vec![
                owner.to_bytes().to_vec(),
                self.token_program.to_bytes().to_vec(),
                mint.to_bytes().to_vec(),
            ],
            &self.associated_token_program,
        )
    }
}
