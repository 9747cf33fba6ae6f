//! The host-key verifier contract.
//!
//! Trust-store management (known_hosts parsing, TOFU prompts, CA
//! certificate validation) is out of scope for this crate; callers
//! must supply their own [`HostKeyVerifier`]. The two implementations
//! below are test doubles, not a default policy — there is no `Default`
//! impl for this trait, so a caller cannot end up trusting every host
//! by omission.

use crate::error::{Error, Result};

/// Decides whether a server-presented host key blob should be trusted.
pub trait HostKeyVerifier: Send + Sync {
    /// Validate `host_key_blob`, the server's public key in SSH wire
    /// format, as presented during key exchange.
    fn verify(&self, host_key_blob: &[u8]) -> Result<()>;
}

/// Accepts any host key unconditionally.
///
/// Intended for tests and quick scripts against a known-trusted
/// endpoint; using this against an untrusted network defeats the
/// purpose of host-key verification.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl HostKeyVerifier for AcceptAll {
    fn verify(&self, _host_key_blob: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Accepts only host keys present in a fixed, caller-supplied set.
#[derive(Debug, Default, Clone)]
pub struct FixedSet {
    trusted: Vec<Vec<u8>>,
}

impl FixedSet {
    /// Build a verifier trusting exactly the key blobs in `trusted`.
    pub fn new(trusted: Vec<Vec<u8>>) -> Self {
        Self { trusted }
    }
}

impl HostKeyVerifier for FixedSet {
    fn verify(&self, host_key_blob: &[u8]) -> Result<()> {
        if self.trusted.iter().any(|k| k == host_key_blob) {
            Ok(())
        } else {
            Err(Error::UntrustedHost)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_trusts_anything() {
        assert!(AcceptAll.verify(b"anything").is_ok());
    }

    #[test]
    fn fixed_set_rejects_unknown_key() {
        let verifier = FixedSet::new(vec![b"known".to_vec()]);
        assert!(verifier.verify(b"known").is_ok());
        assert!(matches!(
            verifier.verify(b"unknown"),
            Err(Error::UntrustedHost)
        ));
    }
}
