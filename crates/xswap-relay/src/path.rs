//! Packet paths.
//!
//! A path names one direction of one conversation: this ledger's portfolio
//! root talking to the remote registered for `dst_eid`. Every endpoint
//! account that the quote and send lists contain is keyed by some part of
//! the path.

use std::fmt;

use serde::{Deserialize, Serialize};
use xswap_types::Pubkey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketPath {
    pub src_eid: u32,
    pub dst_eid: u32,
    /// Portfolio root of the sending program.
    pub sender: [u8; 32],
    /// `Remote.address` registered for `dst_eid`.
    pub receiver: [u8; 32],
}

impl PacketPath {
    #[must_use]
    pub fn new(src_eid: u32, dst_eid: u32, sender: Pubkey, receiver: Pubkey) -> Self {
        Self {
            src_eid,
            dst_eid,
            sender: sender.to_bytes(),
            receiver: receiver.to_bytes(),
        }
    }

    #[must_use]
    pub fn sender_key(&self) -> Pubkey {
        Pubkey(self.sender)
    }

    #[must_use]
    pub fn receiver_key(&self) -> Pubkey {
        Pubkey(self.receiver)
    }

    /// The same conversation seen from the destination.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            src_eid: self.dst_eid,
            dst_eid: self.src_eid,
            sender: self.receiver,
            receiver: self.sender,
        }
    }
}

impl fmt::Display for PacketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:0x{} -> {}:0x{}",
            self.src_eid,
            hex::encode(&self.sender[..4]),
            self.dst_eid,
            hex::encode(&self.receiver[..4])
        )
    }
}
