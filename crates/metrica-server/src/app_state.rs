//! Shared application state for the collector.
//!
//! Startup errors are explicit (`Result` instead of panic): a bad key file or
//! an unreachable database stops the process before it binds.

use std::sync::Arc;

use metrica_core::error::Result;
use metrica_core::protocol::crypto::Decryptor;
use metrica_core::protocol::envelope::EnvelopeDecoder;
use metrica_core::protocol::sign::Signer;

use crate::config::ServerConfig;
use crate::storage::StorageBackend;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    storage: Arc<StorageBackend>,
}

struct AppStateInner {
    cfg: ServerConfig,
    decoder: EnvelopeDecoder,
    // signs response bodies; same secret as the request check
    signer: Option<Signer>,
}

impl AppState {
    /// Open the configured backend and build the decoder.
    pub async fn new(cfg: ServerConfig) -> Result<Self> {
        let storage = StorageBackend::open(&cfg.storage).await?;
        Self::with_storage(cfg, storage)
    }

    /// Build around an already opened backend.
    pub fn with_storage(cfg: ServerConfig, storage: StorageBackend) -> Result<Self> {
        let signer = cfg.server.signature_key.as_deref().map(Signer::new);
        let decryptor = match &cfg.server.crypto_key {
            Some(path) => Some(Decryptor::from_file(path)?),
            None => None,
        };

        tracing::info!(
            backend = storage.name(),
            signed = signer.is_some(),
            encrypted = decryptor.is_some(),
            "collector state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                decoder: EnvelopeDecoder::new(signer.clone(), decryptor),
                signer,
            }),
            storage: Arc::new(storage),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn decoder(&self) -> &EnvelopeDecoder {
        &self.inner.decoder
    }

    pub fn signer(&self) -> Option<&Signer> {
        self.inner.signer.as_ref()
    }

    pub fn storage(&self) -> Arc<StorageBackend> {
        Arc::clone(&self.storage)
    }
}
