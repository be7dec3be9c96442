//! RSA-OAEP (SHA-512) block encryption of update bodies.
//!
//! Framing: plaintext is cut into blocks of `k - 2*64 - 2` bytes (the OAEP
//! limit for a `k`-byte modulus); every block encrypts to exactly `k` bytes
//! and blocks are concatenated. Decryption therefore walks the ciphertext in
//! `k`-byte steps and rejects any length that is not a multiple of `k`.

use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha512;

use crate::error::{MetricaError, Result};

const HASH_SIZE: usize = 64;

fn plaintext_block_len(key_size: usize) -> Result<usize> {
    match key_size.checked_sub(2 * HASH_SIZE + 2) {
        Some(n) if n > 0 => Ok(n),
        _ => Err(MetricaError::Config(format!(
            "rsa key of {key_size} bytes is too small for OAEP/SHA-512"
        ))),
    }
}

fn read_pem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| MetricaError::Config(format!("read key {} failed: {e}", path.display())))
}

/// Sending side: PKCS#1 public key.
#[derive(Debug, Clone)]
pub struct Encryptor {
    key: RsaPublicKey,
    block_len: usize,
}

impl Encryptor {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = RsaPublicKey::from_pkcs1_pem(pem)
            .map_err(|e| MetricaError::Config(format!("invalid rsa public key: {e}")))?;
        let block_len = plaintext_block_len(key.size())?;
        Ok(Self { key, block_len })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_pem(&read_pem(path.as_ref())?)
    }

    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut rng = rand::thread_rng();
        let blocks = data.len().div_ceil(self.block_len);
        let mut out = Vec::with_capacity(blocks * self.key.size());

        for chunk in data.chunks(self.block_len) {
            let block = self
                .key
                .encrypt(&mut rng, Oaep::new::<Sha512>(), chunk)
                .map_err(|e| MetricaError::Crypto(format!("encrypt failed: {e}")))?;
            out.extend_from_slice(&block);
        }

        Ok(out)
    }
}

/// Receiving side: PKCS#1 private key.
#[derive(Debug, Clone)]
pub struct Decryptor {
    key: RsaPrivateKey,
}

impl Decryptor {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|e| MetricaError::Config(format!("invalid rsa private key: {e}")))?;
        plaintext_block_len(key.size())?;
        Ok(Self { key })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_pem(&read_pem(path.as_ref())?)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let step = self.key.size();
        if data.is_empty() || data.len() % step != 0 {
            return Err(MetricaError::BadRequest(format!(
                "ciphertext length {} is not a multiple of {step}",
                data.len()
            )));
        }

        let mut out = Vec::with_capacity(data.len());
        for chunk in data.chunks(step) {
            let block = self
                .key
                .decrypt(Oaep::new::<Sha512>(), chunk)
                .map_err(|e| MetricaError::BadRequest(format!("decrypt failed: {e}")))?;
            out.extend_from_slice(&block);
        }

        Ok(out)
    }
}
