//! Messaging endpoint seam.
//!
//! The settlement program talks to the cross-ledger messaging endpoint
//! through three calls: `quote`, `send` and `clear`. Relay accounts are
//! forwarded verbatim; the program never interprets them.
//!
//! The endpoint sits outside the ledger snapshot, so handlers make their
//! endpoint call the last fallible step of the instruction.

use std::collections::{HashMap, HashSet};

use xswap_crypto::keccak256;
use xswap_types::{
    AccountMeta, ClearParams, MessagingFee, MessagingReceipt, Pubkey, QuoteParams, Result,
    SendParams, XswapError,
};

pub trait MessagingEndpoint: Send {
    /// Program id of the endpoint.
    fn program_id(&self) -> Pubkey;

    fn quote(&self, params: &QuoteParams, accounts: &[AccountMeta]) -> Result<MessagingFee>;

    fn send(&mut self, params: &SendParams, accounts: &[AccountMeta]) -> Result<MessagingReceipt>;

    /// Mark an inbound message consumed. Must fail on a second clear of the
    /// same `(src_eid, sender, nonce)`.
    fn clear(&mut self, params: &ClearParams, accounts: &[AccountMeta]) -> Result<()>;
}

/// A packet accepted by [`LoopbackEndpoint::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub guid: [u8; 32],
    pub nonce: u64,
    pub dst_eid: u32,
    pub receiver: Pubkey,
    pub message: Vec<u8>,
    pub options: Vec<u8>,
    pub fee: MessagingFee,
    /// Number of accounts forwarded with the send.
    pub accounts: usize,
}

/// In-memory endpoint: fixed fee, records outbound packets, enforces
/// exactly-once clearing of inbound ones.
#[derive(Debug, Clone)]
pub struct LoopbackEndpoint {
    program_id: Pubkey,
    local_eid: u32,
    fee: MessagingFee,
    outbound_nonces: HashMap<u32, u64>,
    sent: Vec<SentPacket>,
    cleared: HashSet<(u32, Pubkey, u64)>,
}

impl LoopbackEndpoint {
    #[must_use]
    pub fn new(program_id: Pubkey, local_eid: u32, native_fee: u64) -> Self {
        Self {
            program_id,
            local_eid,
            fee: MessagingFee {
                native_fee,
                lz_token_fee: 0,
            },
            outbound_nonces: HashMap::new(),
            sent: Vec::new(),
            cleared: HashSet::new(),
        }
    }

    /// Quote a non-zero lz-token fee, which the program must refuse.
    #[must_use]
    pub fn with_lz_token_fee(mut self, lz_token_fee: u64) -> Self {
        self.fee.lz_token_fee = lz_token_fee;
        self
    }

    #[must_use]
    pub fn sent(&self) -> &[SentPacket] {
        &self.sent
    }

    #[must_use]
    pub fn is_cleared(&self, src_eid: u32, sender: &Pubkey, nonce: u64) -> bool {
        self.cleared.contains(&(src_eid, *sender, nonce))
    }

    fn guid(&self, nonce: u64, dst_eid: u32, receiver: &Pubkey) -> [u8; 32] {
        let mut preimage = Vec::with_capacity(8 + 4 + 32 + 4 + 32);
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(&self.local_eid.to_be_bytes());
        preimage.extend_from_slice(self.program_id.as_bytes());
        preimage.extend_from_slice(&dst_eid.to_be_bytes());
        preimage.extend_from_slice(receiver.as_bytes());
        keccak256(&preimage)
    }
}

impl MessagingEndpoint for LoopbackEndpoint {
    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn quote(&self, _params: &QuoteParams, accounts: &[AccountMeta]) -> Result<MessagingFee> {
        if accounts.is_empty() {
            return Err(XswapError::AccountsNotProvided {
                expected: 1,
                provided: 0,
            });
        }
        Ok(self.fee)
    }

    fn send(&mut self, params: &SendParams, accounts: &[AccountMeta]) -> Result<MessagingReceipt> {
        if params.native_fee < self.fee.native_fee {
            return Err(XswapError::InsufficientFunds {
                account: xswap_types::AddressTrace::plain(self.program_id),
                needed: self.fee.native_fee,
                available: params.native_fee,
            });
        }
        let next = self.outbound_nonces.entry(params.dst_eid).or_insert(0);
        *next += 1;
        let nonce = *next;
        let guid = self.guid(nonce, params.dst_eid, &params.receiver);
        self.sent.push(SentPacket {
            guid,
            nonce,
            dst_eid: params.dst_eid,
            receiver: params.receiver,
            message: params.message.clone(),
            options: params.options.clone(),
            fee: MessagingFee {
                native_fee: params.native_fee,
                lz_token_fee: params.lz_token_fee,
            },
            accounts: accounts.len(),
        });
        tracing::debug!(dst_eid = params.dst_eid, nonce, "loopback packet sent");
        Ok(MessagingReceipt {
            guid,
            nonce,
            fee: self.fee,
        })
    }

    fn clear(&mut self, params: &ClearParams, _accounts: &[AccountMeta]) -> Result<()> {
        if !self
            .cleared
            .insert((params.src_eid, params.sender, params.nonce))
        {
            return Err(XswapError::MessageAlreadyCleared {
                src_eid: params.src_eid,
                nonce: params.nonce,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_params(nonce: u64) -> ClearParams {
        ClearParams {
            receiver: Pubkey([1; 32]),
            src_eid: 40161,
            sender: Pubkey([2; 32]),
            nonce,
            guid: [0; 32],
            message: vec![],
        }
    }

    #[test]
    fn clear_is_exactly_once() {
        let mut endpoint = LoopbackEndpoint::new(Pubkey([9; 32]), 40168, 100);
        endpoint.clear(&clear_params(1), &[]).unwrap();
        assert!(endpoint.is_cleared(40161, &Pubkey([2; 32]), 1));
        let err = endpoint.clear(&clear_params(1), &[]).unwrap_err();
        assert!(matches!(err, XswapError::MessageAlreadyCleared { nonce: 1, .. }));
        endpoint.clear(&clear_params(2), &[]).unwrap();
    }

    #[test]
    fn send_assigns_sequential_nonces_and_distinct_guids() {
        let mut endpoint = LoopbackEndpoint::new(Pubkey([9; 32]), 40168, 100);
        let params = SendParams {
            dst_eid: 40161,
            receiver: Pubkey([3; 32]),
            message: vec![1, 2, 3],
            options: vec![],
            native_fee: 100,
            lz_token_fee: 0,
        };
        let a = endpoint.send(&params, &[]).unwrap();
        let b = endpoint.send(&params, &[]).unwrap();
        assert_eq!((a.nonce, b.nonce), (1, 2));
        assert_ne!(a.guid, b.guid);
        assert_eq!(endpoint.sent().len(), 2);
    }

    #[test]
    fn underpaid_send_rejected() {
        let mut endpoint = LoopbackEndpoint::new(Pubkey([9; 32]), 40168, 100);
        let params = SendParams {
            dst_eid: 1,
            receiver: Pubkey([3; 32]),
            message: vec![],
            options: vec![],
            native_fee: 99,
            lz_token_fee: 0,
        };
        assert!(endpoint.send(&params, &[]).is_err());
        assert!(endpoint.sent().is_empty());
    }
}
