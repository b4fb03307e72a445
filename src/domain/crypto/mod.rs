//! Foundational cryptographic domain types.
//!
//! Provides:
//! - Hash algorithms, digest values and the threaded block hash stream
//! - Public keys unpacked from certificates and ECDSA signature repacking
//! - The `SignatureVerifier` seam implemented by platform adapters

pub mod block_hash;
mod digest_bytes;
mod hash;
mod public_key;
mod verifier;

pub use block_hash::BlockHashStream;
pub use digest_bytes::{DigestBytes, DigestBytesError};
pub use hash::HashAlgorithm;
pub use public_key::{
    repack_ecdsa_signature, EcCurve, EcPublicKey, PublicKey, RsaPublicKey, SignatureFamily,
};
pub use verifier::SignatureVerifier;
