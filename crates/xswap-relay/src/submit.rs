//! Submission identity and the in-process submitter.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xswap_ledger::{LoopbackEndpoint, MessagingEndpoint, SharedProgram};
use xswap_types::{Result, Submission, XswapError};

use crate::retry::Submitter;

// ---------------------------------------------------------------------------
// SubmissionId
// ---------------------------------------------------------------------------

/// Correlates every attempt of one logical submission in the logs.
/// UUIDv7, so ids sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LocalSubmitter
// ---------------------------------------------------------------------------

/// Runs submissions against a shared in-process program on the blocking
/// pool, so that lock contention never stalls the async workers.
pub struct LocalSubmitter<E: MessagingEndpoint = LoopbackEndpoint> {
    program: SharedProgram<E>,
}

impl<E: MessagingEndpoint> LocalSubmitter<E> {
    #[must_use]
    pub fn new(program: SharedProgram<E>) -> Self {
        Self { program }
    }
}

#[async_trait]
impl<E: MessagingEndpoint + 'static> Submitter for LocalSubmitter<E> {
    async fn submit(&self, id: SubmissionId, submission: &Submission) -> Result<()> {
        let program = self.program.clone();
        let submission = submission.clone();
        tokio::task::spawn_blocking(move || {
            let result = program.process(&submission);
            if let Err(e) = &result {
                tracing::debug!(%id, instruction = submission.instruction.name(), error = %e, "submission rejected");
            }
            result
        })
        .await
        .map_err(|e| XswapError::Internal {
            reason: format!("submission task failed: {e}"),
        })?
    }
}
