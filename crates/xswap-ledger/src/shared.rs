//! Thread-safe handle to one program instance.
//!
//! Concurrent submitters serialize on the mutex, so the ledger sees a
//! single total order of instructions. Two racing creates of the same
//! derived address therefore resolve to exactly one success.

use std::sync::{Arc, Mutex, MutexGuard};

use xswap_types::{Result, Submission, XswapError};

use crate::endpoint::{LoopbackEndpoint, MessagingEndpoint};
use crate::program::SettlementProgram;

pub struct SharedProgram<E: MessagingEndpoint = LoopbackEndpoint> {
    inner: Arc<Mutex<SettlementProgram<E>>>,
}

impl<E: MessagingEndpoint> Clone for SharedProgram<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: MessagingEndpoint> SharedProgram<E> {
    #[must_use]
    pub fn new(program: SettlementProgram<E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(program)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SettlementProgram<E>>> {
        self.inner.lock().map_err(|_| XswapError::Internal {
            reason: "settlement program lock poisoned".to_string(),
        })
    }

    pub fn process(&self, submission: &Submission) -> Result<()> {
        self.lock()?.process(submission)
    }

    /// Run a read-only query under the lock.
    pub fn read<T>(&self, f: impl FnOnce(&SettlementProgram<E>) -> T) -> Result<T> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    /// Run arbitrary mutation under the lock (setup and funding).
    pub fn with<T>(&self, f: impl FnOnce(&mut SettlementProgram<E>) -> T) -> Result<T> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }
}
