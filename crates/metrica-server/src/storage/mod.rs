//! Metric storage contract and its three backends.
//!
//! - `memory`: two whole-map `RwLock`ed maps, one per kind
//! - `file`: memory + full-snapshot JSON persistence
//! - `db`: SQL tables with upserts and transactional batches
//!
//! Atomicity differs by backend: `batch_update` on the relational backend is
//! all-or-nothing, while the in-process backends apply items one by one and
//! cannot roll back. Callers must not assume the same guarantee everywhere.

pub mod db;
pub mod file;
pub mod memory;
mod sql;

use async_trait::async_trait;

use metrica_core::error::Result;
use metrica_core::{Kind, Metric};

use crate::config::StorageConfig;

pub use db::DbStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage operations shared by every backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Apply one metric: gauges overwrite, counters accumulate.
    async fn update(&self, metric: &Metric) -> Result<()>;

    /// Apply a list of metrics in order.
    async fn batch_update(&self, metrics: &[Metric]) -> Result<()>;

    /// Current value of `(kind, name)`; `UnknownMetric` if absent.
    async fn get(&self, kind: Kind, name: &str) -> Result<Metric>;

    /// Point-in-time copy of every stored metric.
    async fn list(&self) -> Result<Vec<Metric>>;

    /// Release resources. Idempotent.
    async fn stop(&self) -> Result<()>;
}

/// The configured backend, chosen once at startup.
pub enum StorageBackend {
    Memory(MemoryStorage),
    File(FileStorage),
    Relational(DbStorage),
}

impl StorageBackend {
    /// Database DSN wins, then file path, then memory.
    pub async fn open(cfg: &StorageConfig) -> Result<Self> {
        if let Some(dsn) = &cfg.database_dsn {
            tracing::info!("storage backend: relational");
            return Ok(Self::Relational(DbStorage::open(dsn).await?));
        }
        if let Some(file_cfg) = cfg.file() {
            tracing::info!(path = %file_cfg.path.display(), "storage backend: file");
            return Ok(Self::File(FileStorage::open(file_cfg).await?));
        }
        tracing::info!("storage backend: memory");
        Ok(Self::Memory(MemoryStorage::new()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Memory(_) => "memory",
            StorageBackend::File(_) => "file",
            StorageBackend::Relational(_) => "relational",
        }
    }

    /// Database health check. Non-database backends report unhealthy.
    pub async fn check_connection(&self) -> bool {
        match self {
            StorageBackend::Relational(db) => db.check_connection().await,
            _ => false,
        }
    }

    fn inner(&self) -> &dyn Storage {
        match self {
            StorageBackend::Memory(s) => s,
            StorageBackend::File(s) => s,
            StorageBackend::Relational(s) => s,
        }
    }
}

#[async_trait]
impl Storage for StorageBackend {
    async fn update(&self, metric: &Metric) -> Result<()> {
        self.inner().update(metric).await
    }

    async fn batch_update(&self, metrics: &[Metric]) -> Result<()> {
        self.inner().batch_update(metrics).await
    }

    async fn get(&self, kind: Kind, name: &str) -> Result<Metric> {
        self.inner().get(kind, name).await
    }

    async fn list(&self) -> Result<Vec<Metric>> {
        self.inner().list().await
    }

    async fn stop(&self) -> Result<()> {
        self.inner().stop().await
    }
}
