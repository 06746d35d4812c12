//! secp256k1 order signatures.
//!
//! Orders are signed off-ledger with a recoverable ECDSA signature over the
//! order hash (`r || s || v`, 65 bytes). The ledger never stores a public
//! key: it recovers one from the signature and compares its 20-byte address
//! with the configured swap signer.
//!
//! The curve is isolated behind [`SignatureVerifier`] so the settlement
//! program can be pointed at a different scheme without touching the swap
//! logic.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use xswap_types::constants::SIGNATURE_LEN;
use xswap_types::{EthAddress, Result, XswapError};

use crate::codec::{SignableOrder, keccak256};

/// 65-byte recoverable signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature(pub [u8; SIGNATURE_LEN]);

impl RecoverableSignature {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; SIGNATURE_LEN] =
            bytes
                .try_into()
                .map_err(|_| XswapError::MalformedSignature {
                    reason: format!("expected {SIGNATURE_LEN} bytes, got {}", bytes.len()),
                })?;
        Ok(Self(arr))
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Recovery id, accepting both raw (0/1) and Ethereum-offset (27/28) forms.
    fn recovery_id(&self) -> Result<RecoveryId> {
        let v = self.0[64];
        let raw = if v >= 27 { v - 27 } else { v };
        RecoveryId::from_byte(raw).ok_or_else(|| XswapError::MalformedSignature {
            reason: format!("invalid recovery id {v}"),
        })
    }
}

/// Address of a secp256k1 public key: last 20 bytes of
/// `keccak256(uncompressed_point[1..])`.
#[must_use]
pub fn eth_address(key: &VerifyingKey) -> EthAddress {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    EthAddress(out)
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Recovers the signer address of a 32-byte digest.
pub trait SignatureVerifier: Send + Sync {
    fn recover(&self, digest: &[u8; 32], signature: &[u8]) -> Result<EthAddress>;

    /// Recover and compare with `expected`.
    ///
    /// # Errors
    /// [`XswapError::MalformedSignature`] if nothing can be recovered,
    /// [`XswapError::InvalidSigner`] on mismatch.
    fn verify(&self, digest: &[u8; 32], signature: &[u8], expected: &EthAddress) -> Result<()> {
        let recovered = self.recover(digest, signature)?;
        if recovered != *expected {
            return Err(XswapError::InvalidSigner {
                expected: *expected,
                recovered,
            });
        }
        Ok(())
    }
}

/// The production verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Verifier;

impl SignatureVerifier for Secp256k1Verifier {
    fn recover(&self, digest: &[u8; 32], signature: &[u8]) -> Result<EthAddress> {
        let sig = RecoverableSignature::from_slice(signature)?;
        let recovery_id = sig.recovery_id()?;
        let parsed = Signature::from_slice(&sig.0[..64]).map_err(|e| {
            XswapError::MalformedSignature {
                reason: e.to_string(),
            }
        })?;
        let key = VerifyingKey::recover_from_prehash(digest, &parsed, recovery_id).map_err(
            |e| XswapError::MalformedSignature {
                reason: format!("recovery failed: {e}"),
            },
        )?;
        Ok(eth_address(&key))
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Off-ledger order signer holding a secp256k1 secret key.
#[derive(Clone)]
pub struct OrderSigner {
    key: SigningKey,
}

impl OrderSigner {
    /// Fresh random key.
    #[must_use]
    pub fn random() -> Self {
        Self {
            key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Key from a 32-byte secret scalar.
    pub fn from_secret(secret: &[u8; 32]) -> Result<Self> {
        let key = SigningKey::from_slice(secret).map_err(|e| XswapError::InvalidInput {
            reason: format!("secp256k1 secret: {e}"),
        })?;
        Ok(Self { key })
    }

    /// Key from a hex-encoded secret, with or without a `0x` prefix.
    pub fn from_hex(secret: &str) -> Result<Self> {
        let bytes = hex::decode(secret.trim_start_matches("0x")).map_err(|e| {
            XswapError::InvalidInput {
                reason: format!("secret hex: {e}"),
            }
        })?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| XswapError::InvalidInput {
            reason: "secret must be 32 bytes".to_string(),
        })?;
        Self::from_secret(&arr)
    }

    #[must_use]
    pub fn address(&self) -> EthAddress {
        eth_address(self.key.verifying_key())
    }

    /// Sign a 32-byte digest.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature> {
        let (sig, recovery_id) =
            self.key
                .sign_prehash_recoverable(digest)
                .map_err(|e| XswapError::Internal {
                    reason: format!("signing failed: {e}"),
                })?;
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = recovery_id.to_byte();
        Ok(RecoverableSignature(out))
    }

    /// Sign the canonical hash of an order.
    pub fn sign_order(&self, order: &impl SignableOrder) -> Result<RecoverableSignature> {
        self.sign_digest(&order.order_hash())
    }
}

impl std::fmt::Debug for OrderSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSigner")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use xswap_types::{Nonce, Order, Pubkey};

    use super::*;

    fn order() -> Order {
        Order {
            maker_asset: Pubkey::new_unique(),
            taker_asset: Pubkey::ZERO,
            taker: Pubkey::new_unique(),
            maker_amount: 10,
            taker_amount: 20,
            expiry: 2_000_000_000,
            dest_trader: Pubkey::new_unique(),
            nonce: Nonce([9; 12]),
        }
    }

    #[test]
    fn signature_round_trip_recovers_signer() {
        let signer = OrderSigner::random();
        let order = order();
        let sig = signer.sign_order(&order).unwrap();
        let recovered = Secp256k1Verifier
            .recover(&order.order_hash(), &sig.0)
            .unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn verify_rejects_other_signer() {
        let signer = OrderSigner::random();
        let other = OrderSigner::random();
        let order = order();
        let sig = signer.sign_order(&order).unwrap();
        let err = Secp256k1Verifier
            .verify(&order.order_hash(), &sig.0, &other.address())
            .unwrap_err();
        assert!(matches!(err, XswapError::InvalidSigner { .. }));
    }

    #[test]
    fn tampered_order_does_not_verify() {
        let signer = OrderSigner::random();
        let order = order();
        let sig = signer.sign_order(&order).unwrap();
        let mut tampered = order.clone();
        tampered.maker_amount += 1;
        assert!(
            Secp256k1Verifier
                .verify(&tampered.order_hash(), &sig.0, &signer.address())
                .is_err()
        );
    }

    #[test]
    fn ethereum_style_recovery_byte_accepted() {
        let signer = OrderSigner::random();
        let digest = keccak256(b"digest");
        let mut sig = signer.sign_digest(&digest).unwrap();
        sig.0[64] += 27;
        assert_eq!(
            Secp256k1Verifier.recover(&digest, &sig.0).unwrap(),
            signer.address()
        );
    }

    #[test]
    fn short_signature_is_malformed() {
        let err = Secp256k1Verifier
            .recover(&[0u8; 32], &[0u8; 64])
            .unwrap_err();
        assert!(matches!(err, XswapError::MalformedSignature { .. }));
    }

    #[test]
    fn known_key_address() {
        // secret = 1: the generator point's well-known address.
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let signer = OrderSigner::from_secret(&secret).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }
}
