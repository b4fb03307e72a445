//! Service layer module root.
//! Contains the signature verification engine and the PE verification service.

pub mod signature;
pub mod verification;

pub use signature::{SignatureWalk, SignerContext, VerifiableSignature, VerificationEngine};
pub use verification::VerificationService;
