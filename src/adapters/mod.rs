//! Adapter layer modules for external system integration.
//!
//! Provides adapters for:
//! - OpenSSL signature primitives behind the `SignatureVerifier` seam

pub mod openssl;
