//! # xswap-crypto
//!
//! Pure cryptographic building blocks for xswap settlement.
//!
//! ## Modules
//!
//! - [`address`]: deterministic program-derived addresses and the
//!   [`AddressDeriver`] with one method per seed tag
//! - [`codec`]: canonical order encoding, keccak order hashes, partial fills
//! - [`signer`]: secp256k1 recoverable signatures, [`SignatureVerifier`]
//! - [`nonce`]: time-derived 12-byte order nonces
//!
//! Nothing in this crate touches ledger state. Every function is a pure
//! function of its inputs, which is what makes derived addresses usable as
//! idempotency keys.

pub mod address;
pub mod codec;
pub mod nonce;
pub mod signer;

pub use address::{AddressDeriver, create_program_address, find_program_address, map_entry_key};
pub use codec::{Fill, SignableOrder, fill, instruction_discriminator, keccak256};
pub use nonce::generate_nonce;
pub use signer::{OrderSigner, RecoverableSignature, Secp256k1Verifier, SignatureVerifier};
