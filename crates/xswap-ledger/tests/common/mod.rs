//! Shared fixture: an initialized program with one remote, one token and a
//! funded airdrop vault.

#![allow(dead_code)]

use std::sync::Arc;

use xswap_crypto::OrderSigner;
use xswap_ledger::{LoopbackEndpoint, ManualClock, SettlementProgram, VaultKind};
use xswap_types::constants::QUOTE_REMAINING_ACCOUNTS_COUNT;
use xswap_types::{
    AccountMeta, AddTokenParams, InitializeParams, LzReceiveParams, NetworkConfig, Nonce, Pubkey,
    Result, SetRemoteParams, Symbol, TokenAmountParams, Tx, XChainMsgType, XferHeader, XferPayload,
};

pub const REMOTE_EID: u32 = 40161;
pub const NOW: i64 = 1_750_000_000;
pub const RELAY_FEE: u64 = 5_000;
pub const AIRDROP_FUNDING: u64 = 10_000_000;

pub struct Harness {
    pub program: SettlementProgram,
    pub clock: Arc<ManualClock>,
    pub admin: Pubkey,
    pub rebalancer: Pubkey,
    pub remote: Pubkey,
    pub signer: OrderSigner,
    /// Token "TKA", 3 decimals.
    pub mint: Pubkey,
    next_endpoint_nonce: u64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_endpoint(|program_id| LoopbackEndpoint::new(program_id, 40168, RELAY_FEE))
    }

    pub fn with_endpoint(make: impl FnOnce(Pubkey) -> LoopbackEndpoint) -> Self {
        let network = NetworkConfig {
            program_id: Pubkey::new_unique(),
            endpoint_program: Pubkey::new_unique(),
            ..NetworkConfig::default()
        };
        let endpoint = make(network.endpoint_program);
        let clock = Arc::new(ManualClock::new(NOW));
        let mut program = SettlementProgram::new(network.clone(), endpoint).with_clock(clock.clone());

        let admin = Pubkey::new_unique();
        let rebalancer = Pubkey::new_unique();
        let remote = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let signer = OrderSigner::random();

        program
            .initialize(
                &admin,
                &InitializeParams {
                    swap_signer: signer.address(),
                    default_chain_id: REMOTE_EID,
                    endpoint: network.endpoint_program,
                },
            )
            .unwrap();
        program.add_rebalancer(&admin, &rebalancer).unwrap();
        program
            .set_remote(
                &admin,
                &SetRemoteParams {
                    dst_eid: REMOTE_EID,
                    remote,
                },
            )
            .unwrap();
        program
            .add_token(
                &admin,
                &AddTokenParams {
                    symbol: Symbol::new("TKA").unwrap(),
                    token_address: mint,
                    decimals: 3,
                },
            )
            .unwrap();
        program.airdrop_lamports(&admin, 100_000_000).unwrap();
        program.airdrop_lamports(&rebalancer, 100_000_000).unwrap();
        program.deposit_airdrop(&admin, AIRDROP_FUNDING).unwrap();

        Self {
            program,
            clock,
            admin,
            rebalancer,
            remote,
            signer,
            mint,
            next_endpoint_nonce: 1,
        }
    }

    /// Quote list plus a short send list.
    pub fn relay_accounts() -> Vec<AccountMeta> {
        (0..QUOTE_REMAINING_ACCOUNTS_COUNT + 4)
            .map(|_| AccountMeta::writable(Pubkey::new_unique()))
            .collect()
    }

    /// Put `amount` of the test token into the trading vault.
    pub fn fund_token_vault(&mut self, amount: u64) {
        let rebalancer = self.rebalancer;
        let mint = self.mint;
        self.program.mint_tokens(&rebalancer, &mint, amount).unwrap();
        self.program
            .fund_spl(
                &rebalancer,
                &TokenAmountParams {
                    token_mint: mint,
                    amount,
                },
            )
            .unwrap();
    }

    pub fn token_vault(&self) -> u64 {
        self.program
            .vault_balance(VaultKind::Trading, &self.mint)
            .unwrap()
    }

    pub fn payload(tx: Tx, trader: Pubkey, token_mint: Pubkey, quantity: u64, nonce: Nonce) -> Vec<u8> {
        XferPayload {
            header: XferHeader {
                custom_data: nonce.to_custom_data(),
                timestamp: u32::try_from(NOW).unwrap(),
                nonce: 1,
                transaction: tx,
                msg_type: XChainMsgType::Xfer,
            },
            trader,
            token_mint,
            quantity,
        }
        .pack()
        .to_vec()
    }

    /// Wrap `message` as the next delivery from the registered remote.
    pub fn delivery(&mut self, message: Vec<u8>) -> LzReceiveParams {
        let nonce = self.next_endpoint_nonce;
        self.next_endpoint_nonce += 1;
        LzReceiveParams {
            src_eid: REMOTE_EID,
            sender: self.remote,
            nonce,
            guid: [u8::try_from(nonce % 256).unwrap(); 32],
            message,
            extra_data: vec![],
        }
    }

    pub fn receive(&mut self, params: &LzReceiveParams) -> Result<()> {
        let executor = Pubkey::new_unique();
        self.program.lz_receive(&executor, params, &[])
    }

    /// Deliver a `CCTrade` of the test token to `trader`.
    pub fn receive_trade(&mut self, trader: Pubkey, quantity: u64, nonce: Nonce) -> Result<()> {
        let message = Self::payload(Tx::CCTrade, trader, self.mint, quantity, nonce);
        let params = self.delivery(message);
        self.receive(&params)
    }
}
