//! Native and token balances.
//!
//! Native balances (lamports) are keyed by account address. Token balances
//! live in token accounts, each holding a single mint for a single owner.
//! Every debit is checked; nothing here can go negative.

use std::collections::HashMap;

use xswap_types::{AddressTrace, Pubkey, Result, XswapError};

/// A token account: `amount` of `mint` controlled by `owner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Bank {
    lamports: HashMap<Pubkey, u64>,
    token_accounts: HashMap<Pubkey, TokenAccount>,
}

impl Bank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Native
    // -----------------------------------------------------------------

    #[must_use]
    pub fn lamports(&self, account: &Pubkey) -> u64 {
        self.lamports.get(account).copied().unwrap_or(0)
    }

    /// Credit lamports out of thin air. Genesis and test funding only.
    pub fn airdrop(&mut self, account: &Pubkey, amount: u64) -> Result<()> {
        let balance = self.lamports.entry(*account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(XswapError::ArithmeticOverflow { context: "airdrop" })?;
        Ok(())
    }

    pub fn transfer_lamports(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let available = self.lamports(from);
        if available < amount {
            return Err(XswapError::InsufficientFunds {
                account: AddressTrace::plain(*from),
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .lamports(to)
            .checked_add(amount)
            .ok_or(XswapError::ArithmeticOverflow {
                context: "native transfer",
            })?;
        self.lamports.insert(*from, available - amount);
        self.lamports.insert(*to, credited);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------

    #[must_use]
    pub fn token_account(&self, address: &Pubkey) -> Option<&TokenAccount> {
        self.token_accounts.get(address)
    }

    #[must_use]
    pub fn token_balance(&self, address: &Pubkey) -> u64 {
        self.token_accounts.get(address).map_or(0, |a| a.amount)
    }

    /// Open a token account if absent. An existing account must already
    /// belong to `owner` and hold `mint`.
    pub fn open_token_account(&mut self, address: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Result<()> {
        match self.token_accounts.get(address) {
            Some(existing) => check_binding(existing, owner, mint),
            None => {
                self.token_accounts.insert(
                    *address,
                    TokenAccount {
                        mint: *mint,
                        owner: *owner,
                        amount: 0,
                    },
                );
                Ok(())
            }
        }
    }

    /// Mint into an existing token account. Genesis and test funding only.
    pub fn mint_to(&mut self, address: &Pubkey, amount: u64) -> Result<()> {
        let account = self
            .token_accounts
            .get_mut(address)
            .ok_or_else(|| XswapError::NotFound {
                what: "token account",
                trace: AddressTrace::plain(*address),
            })?;
        account.amount = account
            .amount
            .checked_add(amount)
            .ok_or(XswapError::ArithmeticOverflow { context: "mint" })?;
        Ok(())
    }

    /// Move tokens between two accounts of the same mint. `authority` must
    /// own the source account.
    pub fn transfer_tokens(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let source = self
            .token_accounts
            .get(from)
            .ok_or_else(|| XswapError::InsufficientFunds {
                account: AddressTrace::plain(*from),
                needed: amount,
                available: 0,
            })?
            .clone();
        if source.owner != *authority {
            return Err(XswapError::InvalidTokenOwner {
                expected: *authority,
                found: source.owner,
            });
        }
        if from == to {
            return if source.amount < amount {
                Err(XswapError::InsufficientFunds {
                    account: AddressTrace::plain(*from),
                    needed: amount,
                    available: source.amount,
                })
            } else {
                Ok(())
            };
        }
        let dest = self
            .token_accounts
            .get(to)
            .ok_or_else(|| XswapError::NotFound {
                what: "token account",
                trace: AddressTrace::plain(*to),
            })?;
        if dest.mint != source.mint {
            return Err(XswapError::InvalidMint {
                expected: source.mint,
                found: dest.mint,
            });
        }
        if source.amount < amount {
            return Err(XswapError::InsufficientFunds {
                account: AddressTrace::plain(*from),
                needed: amount,
                available: source.amount,
            });
        }
        let credited = dest
            .amount
            .checked_add(amount)
            .ok_or(XswapError::ArithmeticOverflow {
                context: "token transfer",
            })?;
        if let Some(src) = self.token_accounts.get_mut(from) {
            src.amount -= amount;
        }
        if let Some(dst) = self.token_accounts.get_mut(to) {
            dst.amount = credited;
        }
        Ok(())
    }
}

/// An existing token account must match the expected owner and mint.
pub fn check_binding(account: &TokenAccount, owner: &Pubkey, mint: &Pubkey) -> Result<()> {
    if account.owner != *owner {
        return Err(XswapError::InvalidTokenOwner {
            expected: *owner,
            found: account.owner,
        });
    }
    if account.mint != *mint {
        return Err(XswapError::InvalidMint {
            expected: *mint,
            found: account.mint,
        });
    }
    Ok(())
}
