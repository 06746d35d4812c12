//! Messaging endpoint vocabulary shared by the ledger and the relay.

use serde::{Deserialize, Serialize};

use crate::Pubkey;

/// One account passed through to the messaging endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    #[must_use]
    pub fn writable(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: false,
            is_writable: true,
        }
    }

    #[must_use]
    pub fn readonly(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: false,
            is_writable: false,
        }
    }
}

/// Fee quoted for one outbound message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingFee {
    pub native_fee: u64,
    pub lz_token_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteParams {
    pub sender: Pubkey,
    pub dst_eid: u32,
    pub receiver: Pubkey,
    pub message: Vec<u8>,
    pub options: Vec<u8>,
    pub pay_in_lz_token: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendParams {
    pub dst_eid: u32,
    pub receiver: Pubkey,
    pub message: Vec<u8>,
    pub options: Vec<u8>,
    pub native_fee: u64,
    pub lz_token_fee: u64,
}

/// Endpoint acknowledgement of a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingReceipt {
    pub guid: [u8; 32],
    /// Endpoint-assigned outbound nonce.
    pub nonce: u64,
    pub fee: MessagingFee,
}

/// Marks an inbound message as consumed at the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearParams {
    pub receiver: Pubkey,
    pub src_eid: u32,
    pub sender: Pubkey,
    pub nonce: u64,
    pub guid: [u8; 32],
    pub message: Vec<u8>,
}

/// Version triple reported by a message library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageLibVersion {
    pub major: u64,
    pub minor: u8,
    pub endpoint_version: u8,
}

impl MessageLibVersion {
    #[must_use]
    pub fn as_tuple(&self) -> (u64, u8, u8) {
        (self.major, self.minor, self.endpoint_version)
    }
}

impl std::fmt::Display for MessageLibVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.endpoint_version)
    }
}
