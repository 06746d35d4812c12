//! XFER: the fixed-layout cross-ledger transfer payload.
//!
//! ```text
//! slot0  [0..18)  custom_data     (order nonce in [6..18), flags in [0])
//!        [18..22) timestamp u32 BE
//!        [22..30) nonce u64 BE    (outbound message sequence)
//!        [30]     transaction
//!        [31]     message type
//! slot1  trader[32]
//! slot2  outbound: symbol[32]    inbound: token_mint[32]
//! slot3  outbound: quantity as 32-byte BE    inbound: quantity u64 BE
//! ```
//!
//! Outbound messages are 128 bytes, inbound messages 104 bytes.

use serde::{Deserialize, Serialize};

use crate::ids::CUSTOM_DATA_LEN;
use crate::{Nonce, Pubkey, Result, Symbol, XswapError, constants};

/// Length of an inbound payload.
pub const XFER_INBOUND_LEN: usize = 104;

/// Length of an outbound payload.
pub const XFER_OUTBOUND_LEN: usize = 128;

/// Portfolio transaction codes carried in slot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tx {
    Withdraw = 0,
    Deposit = 1,
    Execution = 2,
    IncreaseAvail = 3,
    DecreaseAvail = 4,
    IxferSent = 5,
    IxferRec = 6,
    RecoverFunds = 7,
    AddGas = 8,
    RemoveGas = 9,
    AutoFill = 10,
    CCTrade = 11,
    ConvertFrom = 12,
    ConvertTo = 13,
}

impl TryFrom<u8> for Tx {
    type Error = XswapError;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0 => Self::Withdraw,
            1 => Self::Deposit,
            2 => Self::Execution,
            3 => Self::IncreaseAvail,
            4 => Self::DecreaseAvail,
            5 => Self::IxferSent,
            6 => Self::IxferRec,
            7 => Self::RecoverFunds,
            8 => Self::AddGas,
            9 => Self::RemoveGas,
            10 => Self::AutoFill,
            11 => Self::CCTrade,
            12 => Self::ConvertFrom,
            13 => Self::ConvertTo,
            _ => return Err(XswapError::UnsupportedTransaction { code }),
        })
    }
}

/// Message type carried in slot 0. Only `Xfer` exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum XChainMsgType {
    Xfer = 0,
}

impl TryFrom<u8> for XChainMsgType {
    type Error = XswapError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Xfer),
            _ => Err(XswapError::MalformedPayload {
                reason: format!("unknown message type {code}"),
            }),
        }
    }
}

/// Slot 0, shared by both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XferHeader {
    pub custom_data: [u8; CUSTOM_DATA_LEN],
    pub timestamp: u32,
    pub nonce: u64,
    pub transaction: Tx,
    pub msg_type: XChainMsgType,
}

impl XferHeader {
    fn write(&self, out: &mut [u8]) {
        out[..18].copy_from_slice(&self.custom_data);
        out[18..22].copy_from_slice(&self.timestamp.to_be_bytes());
        out[22..30].copy_from_slice(&self.nonce.to_be_bytes());
        out[30] = self.transaction as u8;
        out[31] = self.msg_type as u8;
    }

    fn read(slot: &[u8]) -> Result<Self> {
        let mut custom_data = [0u8; CUSTOM_DATA_LEN];
        custom_data.copy_from_slice(&slot[..18]);
        Ok(Self {
            custom_data,
            timestamp: u32::from_be_bytes(fixed(&slot[18..22])?),
            nonce: u64::from_be_bytes(fixed(&slot[22..30])?),
            transaction: Tx::try_from(slot[30])?,
            msg_type: XChainMsgType::try_from(slot[31])?,
        })
    }

    /// Order nonce embedded in the custom data.
    #[must_use]
    pub fn order_nonce(&self) -> Nonce {
        Nonce::from_custom_data(&self.custom_data)
    }

    /// Whether the sender asked for a native airdrop to the trader.
    #[must_use]
    pub fn wants_airdrop(&self) -> bool {
        self.custom_data[0] & constants::AIRDROP_FLAG != 0
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| XswapError::MalformedPayload {
        reason: format!("expected {N} bytes, got {}", bytes.len()),
    })
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Message sent to another ledger: identifies the asset by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XferMessage {
    pub header: XferHeader,
    pub trader: [u8; 32],
    pub symbol: Symbol,
    pub quantity: u64,
}

impl XferMessage {
    #[must_use]
    pub fn pack(&self) -> [u8; XFER_OUTBOUND_LEN] {
        let mut out = [0u8; XFER_OUTBOUND_LEN];
        self.header.write(&mut out[..32]);
        out[32..64].copy_from_slice(&self.trader);
        out[64..96].copy_from_slice(&self.symbol.0);
        out[120..128].copy_from_slice(&self.quantity.to_be_bytes());
        out
    }

    /// Decode an outbound message. Quantities above `u64::MAX` are rejected.
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != XFER_OUTBOUND_LEN {
            return Err(XswapError::MalformedPayload {
                reason: format!("outbound xfer must be {XFER_OUTBOUND_LEN} bytes, got {}", bytes.len()),
            });
        }
        if bytes[96..120].iter().any(|b| *b != 0) {
            return Err(XswapError::MalformedPayload {
                reason: "quantity exceeds u64".to_string(),
            });
        }
        Ok(Self {
            header: XferHeader::read(&bytes[..32])?,
            trader: fixed(&bytes[32..64])?,
            symbol: Symbol(fixed(&bytes[64..96])?),
            quantity: u64::from_be_bytes(fixed(&bytes[120..128])?),
        })
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Message received from another ledger: identifies the asset by local mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XferPayload {
    pub header: XferHeader,
    pub trader: Pubkey,
    /// Zero for the native asset.
    pub token_mint: Pubkey,
    pub quantity: u64,
}

impl XferPayload {
    #[must_use]
    pub fn pack(&self) -> [u8; XFER_INBOUND_LEN] {
        let mut out = [0u8; XFER_INBOUND_LEN];
        self.header.write(&mut out[..32]);
        out[32..64].copy_from_slice(self.trader.as_bytes());
        out[64..96].copy_from_slice(self.token_mint.as_bytes());
        out[96..104].copy_from_slice(&self.quantity.to_be_bytes());
        out
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != XFER_INBOUND_LEN {
            return Err(XswapError::MalformedPayload {
                reason: format!("inbound xfer must be {XFER_INBOUND_LEN} bytes, got {}", bytes.len()),
            });
        }
        Ok(Self {
            header: XferHeader::read(&bytes[..32])?,
            trader: Pubkey(fixed(&bytes[32..64])?),
            token_mint: Pubkey(fixed(&bytes[64..96])?),
            quantity: u64::from_be_bytes(fixed(&bytes[96..104])?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(tx: Tx) -> XferHeader {
        XferHeader {
            custom_data: Nonce([3u8; 12]).to_custom_data(),
            timestamp: 1_700_000_000,
            nonce: 42,
            transaction: tx,
            msg_type: XChainMsgType::Xfer,
        }
    }

    #[test]
    fn outbound_layout() {
        let msg = XferMessage {
            header: header(Tx::CCTrade),
            trader: [5u8; 32],
            symbol: Symbol::new("USDC").unwrap(),
            quantity: 0x0102,
        };
        let packed = msg.pack();
        assert_eq!(&packed[18..22], &1_700_000_000u32.to_be_bytes());
        assert_eq!(&packed[22..30], &42u64.to_be_bytes());
        assert_eq!(packed[30], 11);
        assert_eq!(packed[31], 0);
        assert_eq!(&packed[64..68], b"USDC");
        assert_eq!(&packed[126..128], &[1, 2]);
        assert!(packed[96..126].iter().all(|b| *b == 0));
        assert_eq!(XferMessage::unpack(&packed).unwrap(), msg);
    }

    #[test]
    fn inbound_layout() {
        let payload = XferPayload {
            header: header(Tx::Withdraw),
            trader: Pubkey([8u8; 32]),
            token_mint: Pubkey([9u8; 32]),
            quantity: 5000,
        };
        let packed = payload.pack();
        assert_eq!(packed.len(), XFER_INBOUND_LEN);
        assert_eq!(&packed[96..104], &5000u64.to_be_bytes());
        let decoded = XferPayload::unpack(&packed).unwrap();
        assert_eq!(decoded.header.order_nonce(), Nonce([3u8; 12]));
        assert!(!decoded.header.wants_airdrop());
    }

    #[test]
    fn airdrop_flag_is_high_bit_of_first_byte() {
        let mut h = header(Tx::CCTrade);
        h.custom_data[0] = 0x80;
        assert!(h.wants_airdrop());
        h.custom_data[0] = 0x7f;
        assert!(!h.wants_airdrop());
    }

    #[test]
    fn rejects_bad_lengths_and_codes() {
        assert!(XferPayload::unpack(&[0u8; 103]).is_err());
        let mut packed = XferPayload {
            header: header(Tx::CCTrade),
            trader: Pubkey([1; 32]),
            token_mint: Pubkey::ZERO,
            quantity: 1,
        }
        .pack();
        packed[30] = 99;
        assert!(matches!(
            XferPayload::unpack(&packed),
            Err(XswapError::UnsupportedTransaction { code: 99 })
        ));
    }

    #[test]
    fn oversized_outbound_quantity_rejected() {
        let mut packed = XferMessage {
            header: header(Tx::Deposit),
            trader: [0; 32],
            symbol: Symbol::new("SOL").unwrap(),
            quantity: 1,
        }
        .pack();
        packed[100] = 1;
        assert!(XferMessage::unpack(&packed).is_err());
    }
}
