//! Order nonce generation.
//!
//! A nonce is the low-order 12 bytes of `keccak256` of the current unix
//! time in milliseconds, rendered as a decimal string. Collisions are not
//! prevented here: the ledger rejects a second record at the same
//! `(nonce, trader)` address.

use chrono::{DateTime, Utc};
use xswap_types::{NONCE_LEN, Nonce};

use crate::codec::keccak256;

/// Nonce for a given instant.
#[must_use]
pub fn nonce_at(time: DateTime<Utc>) -> Nonce {
    let hash = keccak256(time.timestamp_millis().to_string().as_bytes());
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&hash[32 - NONCE_LEN..]);
    Nonce(nonce)
}

/// Nonce for now.
#[must_use]
pub fn generate_nonce() -> Nonce {
    nonce_at(Utc::now())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn same_millisecond_same_nonce() {
        let t = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(nonce_at(t), nonce_at(t));
    }

    #[test]
    fn next_millisecond_differs() {
        let a = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let b = Utc.timestamp_millis_opt(1_700_000_000_124).unwrap();
        assert_ne!(nonce_at(a), nonce_at(b));
    }

    #[test]
    fn nonce_is_hash_tail() {
        let t = Utc.timestamp_millis_opt(42).unwrap();
        let hash = keccak256(b"42");
        assert_eq!(nonce_at(t).as_bytes(), &hash[20..]);
    }
}
