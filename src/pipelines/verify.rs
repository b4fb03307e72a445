//! `VerifyWorkflow`: high-level facade for verifying signed PE files.
//!
//! Delegates to `VerificationService`.

use crate::{
    domain::verification::VerificationReport, infra::config::VerifierConfiguration,
    services::verification::VerificationService, VerifyResult,
};
use std::sync::Arc;

/// Orchestrates verification steps for a signed PE file.
pub struct VerifyWorkflow {
    svc: VerificationService,
}

impl Default for VerifyWorkflow {
    fn default() -> Self {
        Self::new(VerifierConfiguration::default())
    }
}

impl VerifyWorkflow {
    #[must_use]
    pub fn new(config: VerifierConfiguration) -> Self {
        Self {
            svc: VerificationService::new(config),
        }
    }

    #[must_use]
    pub fn with_service(svc: VerificationService) -> Self {
        Self { svc }
    }

    /// Run verification over provided signed PE bytes.
    pub fn run(&self, signed_pe: impl Into<Arc<[u8]>>) -> VerifyResult<VerificationReport> {
        self.svc.verify(signed_pe)
    }

    /// Run verification over a detached PKCS#7 signature.
    pub fn run_blob(&self, der: impl Into<Arc<[u8]>>) -> VerifyResult<VerificationReport> {
        self.svc.verify_blob(der)
    }

    #[must_use]
    pub fn config(&self) -> &VerifierConfiguration {
        self.svc.config()
    }
}
