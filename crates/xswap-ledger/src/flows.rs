//! Vault flow conservation.
//!
//! Invariant checked on demand:
//! ```text
//! ∀ vault: balance == Σ(inflows) - Σ(outflows)
//! ```
//!
//! Every movement into or out of a program vault goes through the
//! program's vault helpers, which record it here. Funds arriving by any
//! other path show up as a violation.

use std::collections::HashMap;

use xswap_types::{Pubkey, Result, XswapError};

#[derive(Debug, Clone, Default)]
pub struct FlowLedger {
    inflows: HashMap<Pubkey, u128>,
    outflows: HashMap<Pubkey, u128>,
}

impl FlowLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_inflow(&mut self, vault: &Pubkey, amount: u64) {
        *self.inflows.entry(*vault).or_insert(0) += u128::from(amount);
    }

    pub fn record_outflow(&mut self, vault: &Pubkey, amount: u64) {
        *self.outflows.entry(*vault).or_insert(0) += u128::from(amount);
    }

    /// Σ inflows − Σ outflows.
    #[must_use]
    pub fn expected_balance(&self, vault: &Pubkey) -> i128 {
        let inflow = self.inflows.get(vault).copied().unwrap_or(0);
        let outflow = self.outflows.get(vault).copied().unwrap_or(0);
        i128::try_from(inflow).unwrap_or(i128::MAX) - i128::try_from(outflow).unwrap_or(i128::MAX)
    }

    /// # Errors
    /// [`XswapError::Internal`] if `actual` differs from the recorded flows.
    pub fn verify(&self, vault: &Pubkey, actual: u64) -> Result<()> {
        let expected = self.expected_balance(vault);
        if i128::from(actual) != expected {
            return Err(XswapError::Internal {
                reason: format!(
                    "vault {vault} balance {actual} != expected {expected} (in={}, out={})",
                    self.inflows.get(vault).copied().unwrap_or(0),
                    self.outflows.get(vault).copied().unwrap_or(0),
                ),
            });
        }
        Ok(())
    }

    /// Every vault that has seen a movement.
    #[must_use]
    pub fn tracked_vaults(&self) -> Vec<Pubkey> {
        let mut vaults: Vec<Pubkey> = self.inflows.keys().copied().collect();
        vaults.extend(self.outflows.keys().filter(|k| !self.inflows.contains_key(k)));
        vaults.sort();
        vaults
    }
}
