//! Two initialized ledgers wired to each other, plus relay plumbing.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use xswap_crypto::OrderSigner;
use xswap_ledger::{LoopbackEndpoint, ManualClock, SettlementProgram, SharedProgram};
use xswap_relay::{
    LibraryRegistry, LocalEndpointReader, LocalSubmitter, Relay, RelayOrchestrator, SubmissionId,
    Submitter, ULN_VERSION,
};
use xswap_types::{
    AddDestinationParams, AddTokenParams, InitializeParams, LoggingConfig, NetworkConfig, Pubkey,
    RelayConfig, Result, RetryPolicy, SetRemoteParams, Submission, Symbol, TokenAmountParams,
    XswapError,
};

pub const EID_A: u32 = 40168;
pub const EID_B: u32 = 40161;
pub const NOW: i64 = 1_750_000_000;
pub const RELAY_FEE: u64 = 5_000;

pub struct Ledger {
    pub network: NetworkConfig,
    pub program: SharedProgram,
    pub admin: Pubkey,
    pub rebalancer: Pubkey,
    pub portfolio: Pubkey,
    pub mint: Pubkey,
    pub symbol: Symbol,
}

fn network(local_eid: u32) -> NetworkConfig {
    NetworkConfig {
        program_id: Pubkey::new_unique(),
        endpoint_program: Pubkey::new_unique(),
        local_eid,
        ..NetworkConfig::default()
    }
}

fn portfolio_of(network: &NetworkConfig) -> Pubkey {
    xswap_crypto::AddressDeriver::new(network)
        .portfolio()
        .unwrap()
        .address
}

/// Initialize a ledger at `local_eid` that trusts `peer` at `peer_eid` and
/// lists one token.
fn ledger(
    network: NetworkConfig,
    signer: &OrderSigner,
    peer_eid: u32,
    peer: Pubkey,
    symbol: &str,
) -> Ledger {
    let endpoint = LoopbackEndpoint::new(network.endpoint_program, network.local_eid, RELAY_FEE);
    let mut program = SettlementProgram::new(network.clone(), endpoint)
        .with_clock(Arc::new(ManualClock::new(NOW)));
    let (admin, rebalancer, mint) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
    let symbol = Symbol::new(symbol).unwrap();

    program
        .initialize(
            &admin,
            &InitializeParams {
                swap_signer: signer.address(),
                default_chain_id: peer_eid,
                endpoint: network.endpoint_program,
            },
        )
        .unwrap();
    program
        .set_remote(
            &admin,
            &SetRemoteParams {
                dst_eid: peer_eid,
                remote: peer,
            },
        )
        .unwrap();
    program.add_rebalancer(&admin, &rebalancer).unwrap();
    program
        .add_token(
            &admin,
            &AddTokenParams {
                symbol,
                token_address: mint,
                decimals: 3,
            },
        )
        .unwrap();
    program.airdrop_lamports(&admin, 100_000_000).unwrap();
    program.deposit_airdrop(&admin, 10_000_000).unwrap();

    Ledger {
        portfolio: portfolio_of(&network),
        network,
        program: SharedProgram::new(program),
        admin,
        rebalancer,
        mint,
        symbol,
    }
}

/// Ledger A lists "TKA" and may cross-swap into B's "ALOT".
pub struct TwoLedgers {
    pub a: Ledger,
    pub b: Ledger,
    pub signer: OrderSigner,
    pub uln: Pubkey,
}

impl TwoLedgers {
    pub fn new() -> Self {
        let signer = OrderSigner::random();
        let (net_a, net_b) = (network(EID_A), network(EID_B));
        let (portfolio_a, portfolio_b) = (portfolio_of(&net_a), portfolio_of(&net_b));
        let a = ledger(net_a, &signer, EID_B, portfolio_b, "TKA");
        let b = ledger(net_b, &signer, EID_A, portfolio_a, "ALOT");

        let (admin, maker_asset) = (a.admin, b.mint);
        a.program
            .with(|p| {
                p.add_destination(
                    &admin,
                    &AddDestinationParams {
                        eid: EID_B,
                        token_address: maker_asset,
                    },
                )
            })
            .unwrap()
            .unwrap();

        Self {
            a,
            b,
            signer,
            uln: Pubkey::new_unique(),
        }
    }

    /// Put `amount` of B's token into B's trading vault.
    pub fn fund_b(&self, amount: u64) {
        let (rebalancer, mint) = (self.b.rebalancer, self.b.mint);
        self.b
            .program
            .with(|p| {
                p.mint_tokens(&rebalancer, &mint, amount)?;
                p.fund_spl(
                    &rebalancer,
                    &TokenAmountParams {
                        token_mint: mint,
                        amount,
                    },
                )
            })
            .unwrap()
            .unwrap();
    }

    /// A's send library to B is a ULN.
    pub fn libraries_a(&self) -> LibraryRegistry {
        let mut libraries = LibraryRegistry::new();
        libraries.register(self.uln, ULN_VERSION);
        libraries.set_send_library(self.a.portfolio, EID_B, self.uln);
        libraries
    }

    pub fn reader(ledger: &Ledger, libraries: LibraryRegistry) -> LocalEndpointReader {
        LocalEndpointReader::new(ledger.program.clone(), &ledger.network, libraries)
    }

    pub fn orchestrator<R: xswap_relay::EndpointReader + 'static>(
        ledger: &Ledger,
        reader: R,
    ) -> RelayOrchestrator<R> {
        RelayOrchestrator::new(Arc::new(reader), &config(&ledger.network)).unwrap()
    }

    pub fn relay_a(&self) -> Relay<LocalEndpointReader, LocalSubmitter> {
        let orchestrator = Self::orchestrator(&self.a, Self::reader(&self.a, self.libraries_a()));
        Relay::new(orchestrator, LocalSubmitter::new(self.a.program.clone()), fast_retry())
    }

    pub fn relay_b(&self) -> Relay<LocalEndpointReader, LocalSubmitter> {
        let orchestrator = Self::orchestrator(&self.b, Self::reader(&self.b, LibraryRegistry::new()));
        Relay::new(orchestrator, LocalSubmitter::new(self.b.program.clone()), fast_retry())
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff_ms: 1,
    }
}

pub fn config(network: &NetworkConfig) -> RelayConfig {
    RelayConfig {
        network: network.clone(),
        max_parallel: 2,
        retry: fast_retry(),
        logging: LoggingConfig::default(),
    }
}

/// Applies the first submission, then reports a transport failure as if
/// the acknowledgement was lost.
pub struct LostAck<S> {
    pub inner: S,
    dropped: AtomicBool,
}

impl<S> LostAck<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            dropped: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<S: Submitter> Submitter for LostAck<S> {
    async fn submit(&self, id: SubmissionId, submission: &Submission) -> Result<()> {
        let result = self.inner.submit(id, submission).await;
        if result.is_ok() && !self.dropped.swap(true, Ordering::SeqCst) {
            return Err(XswapError::Transport {
                reason: "acknowledgement lost".to_string(),
            });
        }
        result
    }
}
