//! HMAC-SHA256 payload signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{MetricaError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Shared-secret signer. Holds only the key; a fresh MAC is built per call.
#[derive(Clone)]
pub struct Signer {
    key: Vec<u8>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| MetricaError::Internal(format!("hmac key rejected: {e}")))
    }

    /// Hex-encoded HMAC-SHA256 of `data`.
    pub fn sign(&self, data: &[u8]) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check `signature` (hex) against `data` in constant time.
    pub fn verify(&self, data: &[u8], signature: &str) -> Result<()> {
        let expected = hex::decode(signature.trim()).map_err(|e| {
            tracing::warn!(error = %e, "signature header is not valid hex");
            MetricaError::BadDataHash
        })?;
        let mut mac = self.mac()?;
        mac.update(data);
        mac.verify_slice(&expected)
            .map_err(|_| MetricaError::BadDataHash)
    }
}
