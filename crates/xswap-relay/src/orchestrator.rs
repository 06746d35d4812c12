//! Off-ledger preparation and submission of message-bearing instructions.
//!
//! ```text
//! per swap:  remote(dst_eid) → send library → quote accounts → send accounts
//!            (strictly in that order; the first failure stops the swap)
//!
//! batch:     JoinSet of per-swap preparations, at most max_parallel at once
//! ```
//!
//! Preparation reads only. State changes happen when the assembled
//! [`Submission`] is handed to a [`Submitter`].

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use xswap_crypto::AddressDeriver;
use xswap_types::constants::QUOTE_REMAINING_ACCOUNTS_COUNT;
use xswap_types::{
    AccountMeta, CrossSwapParams, DepositNativeParams, DepositParams, Instruction,
    LzReceiveParams, Nonce, PendingSwap, Pubkey, RelayConfig, Result, RetryPolicy, Submission,
    XswapError,
};

use crate::accounts::AccountPlanner;
use crate::client::EndpointReader;
use crate::library::{MessageLib, resolve_send_library};
use crate::path::PacketPath;
use crate::retry::{SubmitOutcome, Submitter, submit_idempotent};
use crate::submit::SubmissionId;

/// Everything needed to attach a message send to an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRelay {
    pub id: SubmissionId,
    pub path: PacketPath,
    pub library: MessageLib,
    pub quote_accounts: Vec<AccountMeta>,
    pub send_accounts: Vec<AccountMeta>,
}

impl PreparedRelay {
    /// Quote list followed by send list, as the program splits them.
    #[must_use]
    pub fn remaining_accounts(&self) -> Vec<AccountMeta> {
        let mut accounts = Vec::with_capacity(self.quote_accounts.len() + self.send_accounts.len());
        accounts.extend_from_slice(&self.quote_accounts);
        accounts.extend_from_slice(&self.send_accounts);
        accounts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayRequest {
    pub payer: Pubkey,
    pub dst_eid: u32,
}

/// Per-orchestrator constants every preparation needs.
#[derive(Debug, Clone)]
struct PathContext {
    local_eid: u32,
    /// Portfolio root; the sender of every outbound packet.
    sender: Pubkey,
    deriver: AddressDeriver,
}

async fn prepare_path<R: EndpointReader + ?Sized>(
    reader: &R,
    ctx: &PathContext,
    payer: &Pubkey,
    dst_eid: u32,
) -> Result<PreparedRelay> {
    let Some(remote) = reader.remote(dst_eid).await? else {
        return Err(XswapError::NotFound {
            what: "remote",
            trace: ctx.deriver.remote(dst_eid)?.trace(),
        });
    };
    let path = PacketPath::new(ctx.local_eid, dst_eid, ctx.sender, remote.address);
    let library = resolve_send_library(reader, &ctx.sender, dst_eid).await?;

    let quote_accounts = reader.quote_accounts(payer, &path, &library).await?;
    if quote_accounts.len() != QUOTE_REMAINING_ACCOUNTS_COUNT {
        return Err(XswapError::AccountsNotProvided {
            expected: QUOTE_REMAINING_ACCOUNTS_COUNT,
            provided: quote_accounts.len(),
        });
    }
    let send_accounts = reader.send_accounts(payer, &path, &library).await?;
    if send_accounts.is_empty() {
        return Err(XswapError::AccountsNotProvided {
            expected: 1,
            provided: 0,
        });
    }

    let prepared = PreparedRelay {
        id: SubmissionId::new(),
        path,
        library,
        quote_accounts,
        send_accounts,
    };
    tracing::debug!(id = %prepared.id, %path, %library, "relay prepared");
    Ok(prepared)
}

pub struct RelayOrchestrator<R: EndpointReader> {
    reader: Arc<R>,
    planner: AccountPlanner,
    ctx: PathContext,
    limiter: Arc<Semaphore>,
}

impl<R: EndpointReader + 'static> RelayOrchestrator<R> {
    pub fn new(reader: Arc<R>, config: &RelayConfig) -> Result<Self> {
        config.validate()?;
        let planner = AccountPlanner::new(&config.network);
        let sender = planner.deriver().portfolio()?.address;
        Ok(Self {
            reader,
            ctx: PathContext {
                local_eid: config.network.local_eid,
                sender,
                deriver: planner.deriver().clone(),
            },
            planner,
            limiter: Arc::new(Semaphore::new(config.max_parallel)),
        })
    }

    #[must_use]
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    /// Portfolio root that sends every packet.
    #[must_use]
    pub fn sender(&self) -> Pubkey {
        self.ctx.sender
    }

    pub async fn prepare(&self, payer: &Pubkey, dst_eid: u32) -> Result<PreparedRelay> {
        prepare_path(self.reader.as_ref(), &self.ctx, payer, dst_eid).await
    }

    /// Prepare independent requests concurrently. Results come back in
    /// request order.
    pub async fn prepare_all(&self, requests: &[RelayRequest]) -> Vec<Result<PreparedRelay>> {
        let mut tasks = JoinSet::new();
        for (index, request) in requests.iter().copied().enumerate() {
            let reader = Arc::clone(&self.reader);
            let ctx = self.ctx.clone();
            let limiter = Arc::clone(&self.limiter);
            tasks.spawn(async move {
                let result = match limiter.acquire_owned().await {
                    Ok(_permit) => {
                        prepare_path(reader.as_ref(), &ctx, &request.payer, request.dst_eid).await
                    }
                    Err(e) => Err(XswapError::Internal {
                        reason: format!("preparation limiter closed: {e}"),
                    }),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<PreparedRelay>>> =
            (0..requests.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "relay preparation task failed"),
            }
        }
        let failed = results.iter().filter(|r| !matches!(r, Some(Ok(_)))).count();
        tracing::info!(requests = requests.len(), failed, "relay batch prepared");
        results
            .into_iter()
            .map(|r| {
                r.unwrap_or_else(|| {
                    Err(XswapError::Internal {
                        reason: "relay preparation task aborted".to_string(),
                    })
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------
    // Submission assembly
    // -----------------------------------------------------------------

    pub async fn cross_swap(&self, signer: Pubkey, params: CrossSwapParams) -> Result<Submission> {
        let prepared = self.prepare(&signer, params.order.dest_chain_id).await?;
        Ok(Submission {
            signer,
            remaining_accounts: prepared.remaining_accounts(),
            instruction: Instruction::CrossSwap(params),
        })
    }

    /// Native deposit relayed to `dst_eid`, the program's default chain.
    pub async fn deposit_native(
        &self,
        signer: Pubkey,
        params: DepositNativeParams,
        dst_eid: u32,
    ) -> Result<Submission> {
        let prepared = self.prepare(&signer, dst_eid).await?;
        Ok(Submission {
            signer,
            remaining_accounts: prepared.remaining_accounts(),
            instruction: Instruction::DepositNative(params),
        })
    }

    pub async fn deposit(&self, signer: Pubkey, params: DepositParams, dst_eid: u32) -> Result<Submission> {
        let prepared = self.prepare(&signer, dst_eid).await?;
        Ok(Submission {
            signer,
            remaining_accounts: prepared.remaining_accounts(),
            instruction: Instruction::Deposit(params),
        })
    }

    /// An inbound delivery with its account list planned.
    pub fn delivery(&self, executor: Pubkey, params: LzReceiveParams) -> Result<Submission> {
        let remaining_accounts = self.planner.receive_accounts(&params)?;
        Ok(Submission {
            signer: executor,
            instruction: Instruction::LzReceive(params),
            remaining_accounts,
        })
    }

    pub async fn pending_swap(&self, nonce: &Nonce, trader: &Pubkey) -> Result<Option<PendingSwap>> {
        self.reader.pending_swap(nonce, trader).await
    }
}

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

/// Orchestrator plus submitter: prepare, then submit idempotently.
pub struct Relay<R: EndpointReader, S: Submitter> {
    orchestrator: RelayOrchestrator<R>,
    submitter: S,
    retry: RetryPolicy,
}

impl<R: EndpointReader + 'static, S: Submitter> Relay<R, S> {
    #[must_use]
    pub fn new(orchestrator: RelayOrchestrator<R>, submitter: S, retry: RetryPolicy) -> Self {
        Self {
            orchestrator,
            submitter,
            retry,
        }
    }

    #[must_use]
    pub fn orchestrator(&self) -> &RelayOrchestrator<R> {
        &self.orchestrator
    }

    pub async fn submit(&self, submission: &Submission) -> Result<SubmitOutcome> {
        submit_idempotent(&self.submitter, submission, &self.retry).await
    }

    pub async fn cross_swap(&self, signer: Pubkey, params: CrossSwapParams) -> Result<SubmitOutcome> {
        let nonce = params.order.nonce;
        let submission = self.orchestrator.cross_swap(signer, params).await?;
        let outcome = self.submit(&submission).await?;
        tracing::info!(%nonce, taker = %signer.short(), ?outcome, "cross swap submitted");
        Ok(outcome)
    }

    pub async fn deliver(&self, executor: Pubkey, params: LzReceiveParams) -> Result<SubmitOutcome> {
        let (src_eid, nonce) = (params.src_eid, params.nonce);
        let submission = self.orchestrator.delivery(executor, params)?;
        let outcome = self.submit(&submission).await?;
        tracing::info!(src_eid, nonce, ?outcome, "delivery submitted");
        Ok(outcome)
    }
}
