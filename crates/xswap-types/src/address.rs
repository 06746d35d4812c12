//! Derived-address records.
//!
//! A [`DerivedAddress`] remembers the seed tag and seed inputs it was
//! derived from, so that any error about the account can name both the
//! address and how it was computed.

use std::fmt;

use crate::Pubkey;

/// An address computed from `(seeds, program_id)`, plus its bump and the
/// inputs that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
    /// Human-readable seed tag (`"PendingSwaps"`, `"Admin"`, ...).
    pub tag: &'static str,
    /// Seed inputs excluding the bump, in derivation order.
    pub seeds: Vec<Vec<u8>>,
}

impl DerivedAddress {
    /// Snapshot for error reporting.
    #[must_use]
    pub fn trace(&self) -> AddressTrace {
        AddressTrace {
            address: self.address,
            tag: self.tag.to_string(),
            seeds: self.seeds.iter().map(hex::encode).collect(),
        }
    }
}

/// Address plus hex-encoded seed inputs, carried by ledger errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTrace {
    pub address: Pubkey,
    pub tag: String,
    pub seeds: Vec<String>,
}

impl AddressTrace {
    /// Trace for an address that is not derived (a user-supplied account).
    #[must_use]
    pub fn plain(address: Pubkey) -> Self {
        Self {
            address,
            tag: "account".to_string(),
            seeds: Vec::new(),
        }
    }
}

impl fmt::Display for AddressTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: [{}])", self.address, self.tag, self.seeds.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_shows_address_and_seeds() {
        let derived = DerivedAddress {
            address: Pubkey([0xab; 32]),
            bump: 254,
            tag: "Remote",
            seeds: vec![b"Remote".to_vec(), vec![0, 0, 0x9d, 0x4b]],
        };
        let rendered = derived.trace().to_string();
        assert!(rendered.starts_with("abab"));
        assert!(rendered.contains("Remote: ["));
        assert!(rendered.contains("00009d4b"));
    }
}
