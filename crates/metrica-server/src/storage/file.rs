//! File-backed backend: memory plus full-snapshot persistence.
//!
//! The snapshot file holds a JSON array of wire records (the batch update
//! shape), rewritten wholesale on every sync via a temp file + rename.
//! With `store_interval == 0` each update writes through before returning;
//! otherwise a background task syncs on a timer and updates never wait on
//! disk.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use metrica_core::error::{MetricaError, Result};
use metrica_core::protocol::record::{decode_records, encode_records};
use metrica_core::{Kind, Metric, Value};

use super::memory::MemoryStorage;
use super::Storage;
use crate::config::FileStorageConfig;

const FILE_IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Writes consistent snapshots of a `MemoryStorage` to one file.
struct Snapshotter {
    memory: Arc<MemoryStorage>,
    path: PathBuf,
    tmp_path: PathBuf,
    // Serializes copy+write so an older copy never lands after a newer one.
    io: tokio::sync::Mutex<()>,
}

impl Snapshotter {
    async fn sync(&self) -> Result<()> {
        let _io = self.io.lock().await;

        // copy first: memory locks are released before any disk I/O
        let metrics = self.memory.snapshot();
        let data = encode_records(&metrics)?;

        let write = async {
            tokio::fs::write(&self.tmp_path, &data).await?;
            tokio::fs::rename(&self.tmp_path, &self.path).await
        };

        tokio::time::timeout(FILE_IO_TIMEOUT, write)
            .await
            .map_err(|_| {
                MetricaError::Timeout(format!("write snapshot {}", self.path.display()))
            })?
            .map_err(|e| {
                MetricaError::Storage(format!("write snapshot {} failed: {e}", self.path.display()))
            })?;

        tracing::debug!(path = %self.path.display(), metrics = metrics.len(), "snapshot written");
        Ok(())
    }
}

struct Syncer {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct FileStorage {
    memory: Arc<MemoryStorage>,
    snapshotter: Arc<Snapshotter>,
    write_through: bool,
    syncer: Mutex<Option<Syncer>>,
}

impl FileStorage {
    pub async fn open(cfg: FileStorageConfig) -> Result<Self> {
        if let Some(parent) = cfg.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MetricaError::Config(format!("create dir {} failed: {e}", parent.display()))
            })?;
        }

        let memory = Arc::new(MemoryStorage::new());

        if cfg.restore {
            match restore(&cfg.path).await {
                Ok(Some((gauges, counters))) => {
                    tracing::info!(
                        path = %cfg.path.display(),
                        gauges = gauges.len(),
                        counters = counters.len(),
                        "metrics restored"
                    );
                    memory.replace_all(gauges, counters);
                }
                Ok(None) => {
                    tracing::info!(path = %cfg.path.display(), "no snapshot to restore");
                }
                Err(e) => {
                    tracing::warn!(path = %cfg.path.display(), error = %e, "restore failed, starting empty");
                }
            }
        }

        let mut tmp = cfg.path.clone().into_os_string();
        tmp.push(".tmp");

        let snapshotter = Arc::new(Snapshotter {
            memory: Arc::clone(&memory),
            path: cfg.path.clone(),
            tmp_path: PathBuf::from(tmp),
            io: tokio::sync::Mutex::new(()),
        });

        let write_through = cfg.store_interval.is_zero();
        let syncer = if write_through {
            None
        } else {
            Some(start_syncer(Arc::clone(&snapshotter), cfg.store_interval))
        };

        Ok(Self {
            memory,
            snapshotter,
            write_through,
            syncer: Mutex::new(syncer),
        })
    }

    /// Write the full current snapshot to disk now.
    pub async fn sync(&self) -> Result<()> {
        self.snapshotter.sync().await
    }

    pub fn path(&self) -> &Path {
        &self.snapshotter.path
    }

    async fn after_write(&self) -> Result<()> {
        if self.write_through {
            self.sync().await
        } else {
            Ok(())
        }
    }
}

fn start_syncer(snapshotter: Arc<Snapshotter>, every: Duration) -> Syncer {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // first tick fires immediately
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = snapshotter.sync().await {
                        tracing::error!(error = %e, "periodic snapshot failed");
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }
    });

    Syncer { shutdown, handle }
}

type Restored = (HashMap<String, f64>, HashMap<String, i64>);

/// `Ok(None)` when there is no file yet.
async fn restore(path: &Path) -> Result<Option<Restored>> {
    let data = match tokio::time::timeout(FILE_IO_TIMEOUT, tokio::fs::read(path)).await {
        Err(_) => return Err(MetricaError::Timeout(format!("read {}", path.display()))),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Ok(Err(e)) => {
            return Err(MetricaError::Storage(format!("read {} failed: {e}", path.display())))
        }
        Ok(Ok(data)) => data,
    };

    let mut gauges = HashMap::new();
    let mut counters = HashMap::new();
    for m in decode_records(&data)? {
        match m.value() {
            Value::Gauge(v) => {
                gauges.insert(m.name().to_string(), v);
            }
            Value::Counter(v) => {
                counters.insert(m.name().to_string(), v);
            }
        }
    }

    Ok(Some((gauges, counters)))
}

#[async_trait]
impl Storage for FileStorage {
    async fn update(&self, metric: &Metric) -> Result<()> {
        self.memory.apply(metric);
        self.after_write().await
    }

    /// Best effort, item by item; no rollback. One sync for the whole batch.
    async fn batch_update(&self, metrics: &[Metric]) -> Result<()> {
        for m in metrics {
            self.memory.apply(m);
        }
        self.after_write().await
    }

    async fn get(&self, kind: Kind, name: &str) -> Result<Metric> {
        self.memory.lookup(kind, name)
    }

    async fn list(&self) -> Result<Vec<Metric>> {
        Ok(self.memory.snapshot())
    }

    async fn stop(&self) -> Result<()> {
        let syncer = self
            .syncer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        let Some(syncer) = syncer else { return Ok(()) };

        let _ = syncer.shutdown.send(true);
        if let Err(e) = syncer.handle.await {
            tracing::error!(error = %e, "snapshot task ended abnormally");
        }

        // last interval's changes
        self.sync().await
    }
}
