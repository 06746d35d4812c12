//! Content-addressed account store.
//!
//! The store maps derived addresses to records. It offers exactly the
//! primitives the protocol relies on:
//!
//! - **create**: fails if anything already lives at the address
//! - **upsert**: create-if-absent or overwrite (`init_if_needed`)
//! - **close**: remove and return the record
//!
//! There is no secondary index. "Is this swap pending?" is answered by
//! deriving the address and looking.

use std::collections::HashMap;

use xswap_types::{DerivedAddress, Pubkey, Record, Result, StoredRecord, XswapError};

#[derive(Debug, Clone, Default)]
pub struct AccountStore {
    accounts: HashMap<Pubkey, Record>,
}

impl AccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn exists(&self, at: &DerivedAddress) -> bool {
        self.accounts.contains_key(&at.address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Create a record at a fresh address.
    ///
    /// # Errors
    /// [`XswapError::ReplayRejected`] if the address is occupied.
    pub fn create<T: StoredRecord>(&mut self, at: &DerivedAddress, value: T) -> Result<()> {
        if self.exists(at) {
            return Err(XswapError::ReplayRejected { trace: at.trace() });
        }
        self.accounts.insert(at.address, value.into_record());
        Ok(())
    }

    /// Create or overwrite. Returns `true` if the record was created.
    pub fn upsert<T: StoredRecord>(&mut self, at: &DerivedAddress, value: T) -> bool {
        self.accounts
            .insert(at.address, value.into_record())
            .is_none()
    }

    #[must_use]
    pub fn get<T: StoredRecord>(&self, at: &DerivedAddress) -> Option<&T> {
        self.accounts.get(&at.address).and_then(T::from_record)
    }

    /// # Errors
    /// [`XswapError::NotFound`] naming the address and its seeds.
    pub fn require<T: StoredRecord>(&self, at: &DerivedAddress) -> Result<&T> {
        self.get(at).ok_or_else(|| XswapError::NotFound {
            what: T::NAME,
            trace: at.trace(),
        })
    }

    pub fn require_mut<T: StoredRecord>(&mut self, at: &DerivedAddress) -> Result<&mut T> {
        self.accounts
            .get_mut(&at.address)
            .and_then(T::from_record_mut)
            .ok_or_else(|| XswapError::NotFound {
                what: T::NAME,
                trace: at.trace(),
            })
    }

    /// Remove and return the record.
    pub fn close<T: StoredRecord + Clone>(&mut self, at: &DerivedAddress) -> Result<T> {
        let value = self.require::<T>(at)?.clone();
        self.accounts.remove(&at.address);
        Ok(value)
    }
}
