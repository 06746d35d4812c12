//! Idempotent submission.
//!
//! Every state-changing instruction creates a nonce-keyed address, so a
//! resubmission of an instruction that already landed is rejected by the
//! ledger as a replay. That lets the relay retry blindly after a transport
//! failure:
//!
//! ```text
//! attempt 1 ── Transport ──▶ backoff ──▶ attempt 2 ── ReplayRejected ──▶ AlreadyApplied
//!     │                                      │
//!     └── ReplayRejected ──▶ error           └── Ok ──▶ Applied
//! ```
//!
//! A replay on the first attempt was never ours to begin with and is
//! surfaced unchanged.

use std::time::Duration;

use async_trait::async_trait;
use xswap_types::{ErrorKind, Result, RetryPolicy, Submission};

use crate::submit::SubmissionId;

/// Delivers one submission to a ledger.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, id: SubmissionId, submission: &Submission) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// This call's submission executed.
    Applied { attempts: u32 },
    /// An earlier attempt whose acknowledgement was lost already executed.
    AlreadyApplied { attempts: u32 },
}

impl SubmitOutcome {
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Applied { attempts } | Self::AlreadyApplied { attempts } => *attempts,
        }
    }
}

/// Submit with retries on transport failure.
///
/// # Errors
/// The first non-transport error, or the last transport error once
/// `policy.max_attempts` is exhausted.
pub async fn submit_idempotent<S: Submitter + ?Sized>(
    submitter: &S,
    submission: &Submission,
    policy: &RetryPolicy,
) -> Result<SubmitOutcome> {
    let id = SubmissionId::new();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let delay = policy.delay_ms(attempt);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        match submitter.submit(id, submission).await {
            Ok(()) => {
                tracing::info!(%id, instruction = submission.instruction.name(), attempt, "submission applied");
                return Ok(SubmitOutcome::Applied { attempts: attempt });
            }
            Err(e) if e.kind() == ErrorKind::ReplayRejected && attempt > 1 => {
                tracing::info!(
                    %id,
                    instruction = submission.instruction.name(),
                    attempt,
                    "replay after lost acknowledgement; treating as applied"
                );
                return Ok(SubmitOutcome::AlreadyApplied { attempts: attempt });
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(%id, attempt, error = %e, "transport failure, retrying");
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::warn!(%id, attempt, error = %e, "retries exhausted");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use xswap_types::{Instruction, Pubkey, XswapError};

    use super::*;

    /// Replays a scripted list of results.
    struct Scripted {
        results: Mutex<Vec<Result<()>>>,
        calls: Mutex<Vec<SubmissionId>>,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<()>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<SubmissionId> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Submitter for Scripted {
        async fn submit(&self, id: SubmissionId, _submission: &Submission) -> Result<()> {
            self.calls.lock().unwrap().push(id);
            self.results.lock().unwrap().pop().unwrap_or(Ok(()))
        }
    }

    fn transport() -> XswapError {
        XswapError::Transport {
            reason: "connection reset".to_string(),
        }
    }

    fn replay() -> XswapError {
        XswapError::ReplayRejected {
            trace: xswap_types::AddressTrace::plain(Pubkey::new_unique()),
        }
    }

    fn submission() -> Submission {
        Submission {
            signer: Pubkey::new_unique(),
            instruction: Instruction::SetPaused { paused: true },
            remaining_accounts: vec![],
        }
    }

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_ms: 1,
        }
    }

    #[tokio::test]
    async fn first_success_is_applied() {
        let s = Scripted::new(vec![Ok(())]);
        let outcome = submit_idempotent(&s, &submission(), &fast()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Applied { attempts: 1 });
    }

    #[tokio::test]
    async fn transport_failure_then_success() {
        let s = Scripted::new(vec![Err(transport()), Ok(())]);
        let outcome = submit_idempotent(&s, &submission(), &fast()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Applied { attempts: 2 });
        let calls = s.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn replay_after_retry_is_already_applied() {
        let s = Scripted::new(vec![Err(transport()), Err(replay())]);
        let outcome = submit_idempotent(&s, &submission(), &fast()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::AlreadyApplied { attempts: 2 });
    }

    #[tokio::test]
    async fn replay_on_first_attempt_surfaces() {
        let s = Scripted::new(vec![Err(replay())]);
        let err = submit_idempotent(&s, &submission(), &fast()).await.unwrap_err();
        assert!(matches!(err, XswapError::ReplayRejected { .. }));
    }

    #[tokio::test]
    async fn non_transport_errors_are_not_retried() {
        let s = Scripted::new(vec![Err(XswapError::ProgramPaused), Ok(())]);
        let err = submit_idempotent(&s, &submission(), &fast()).await.unwrap_err();
        assert!(matches!(err, XswapError::ProgramPaused));
        assert!(!err.is_retryable());
        assert_eq!(s.calls().len(), 1);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let s = Scripted::new(vec![Err(transport()), Err(transport()), Err(transport()), Ok(())]);
        let err = submit_idempotent(&s, &submission(), &fast()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(s.calls().len(), 3);
    }
}
