use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use metrica_core::error::{MetricaError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricaError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.storage.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Shared secret for `HashSHA256` verification.
    #[serde(default)]
    pub signature_key: Option<String>,

    /// Path to the PKCS#1 PEM private key used to decrypt bodies.
    #[serde(default)]
    pub crypto_key: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            signature_key: None,
            crypto_key: None,
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.trim().is_empty() {
            return Err(MetricaError::Config("server.listen must not be empty".into()));
        }
        if matches!(self.signature_key.as_deref(), Some("")) {
            return Err(MetricaError::Config(
                "server.signature_key must not be empty when set".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "127.0.0.1:8080".into()
}

/// Backend selection: `database_dsn` wins over `file_path`; neither means memory.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Seconds between snapshots; 0 means write-through.
    #[serde(default = "default_store_interval_secs")]
    pub store_interval_secs: u64,

    #[serde(default = "default_restore")]
    pub restore: bool,

    #[serde(default)]
    pub database_dsn: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            store_interval_secs: default_store_interval_secs(),
            restore: default_restore(),
            database_dsn: None,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if matches!(self.database_dsn.as_deref(), Some(d) if d.trim().is_empty()) {
            return Err(MetricaError::Config(
                "storage.database_dsn must not be empty when set".into(),
            ));
        }
        if matches!(&self.file_path, Some(p) if p.as_os_str().is_empty()) {
            return Err(MetricaError::Config(
                "storage.file_path must not be empty when set".into(),
            ));
        }
        Ok(())
    }

    /// File backend settings, if a file path is configured.
    pub fn file(&self) -> Option<FileStorageConfig> {
        self.file_path.as_ref().map(|path| FileStorageConfig {
            path: path.clone(),
            store_interval: Duration::from_secs(self.store_interval_secs),
            restore: self.restore,
        })
    }
}

fn default_store_interval_secs() -> u64 {
    300
}
fn default_restore() -> bool {
    true
}

/// Resolved file backend settings.
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    pub path: PathBuf,
    pub store_interval: Duration,
    pub restore: bool,
}
