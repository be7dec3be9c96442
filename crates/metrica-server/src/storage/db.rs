//! Relational backend (`sqlx`, SQLite driver).
//!
//! Upserts push the gauge/counter rules into the database, so several
//! collector processes sharing one database stay consistent. Every call goes
//! through the fixed backoff schedule and a per-operation deadline; only
//! connection-level failures and integrity-constraint violations are retried.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use thiserror::Error;

use metrica_core::error::{MetricaError, Result};
use metrica_core::retry::{Backoff, RetryError};
use metrica_core::{Kind, Metric, Value};

use super::{sql, Storage};

const PING_TIMEOUT: Duration = Duration::from_secs(10);
const CREATE_TABLES_TIMEOUT: Duration = Duration::from_secs(10);
const GET_TIMEOUT: Duration = Duration::from_secs(5);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(10);
const BATCH_UPDATE_TIMEOUT: Duration = Duration::from_secs(60);
// full-table scans get the largest budget
const LIST_TIMEOUT: Duration = Duration::from_secs(90);

const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),
}

/// Connection-level failures and integrity violations.
fn is_retriable(e: &DbError) -> bool {
    match e {
        DbError::Sqlx(sqlx::Error::Io(_)) | DbError::Sqlx(sqlx::Error::PoolTimedOut) => true,
        DbError::Sqlx(sqlx::Error::Database(db)) => {
            let integrity = matches!(
                db.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            );
            // SQLITE_BUSY / SQLITE_LOCKED, including extended codes
            let busy = db
                .code()
                .and_then(|c| c.parse::<i32>().ok())
                .map(|c| matches!(c & 0xff, 5 | 6))
                .unwrap_or(false);
            integrity || busy
        }
        _ => false,
    }
}

fn into_metrica(what: &str, e: RetryError<DbError>) -> MetricaError {
    match e.last() {
        Some(DbError::Timeout(..)) => MetricaError::Timeout(format!("{what}: {e}")),
        _ => MetricaError::Storage(format!("{what}: {e}")),
    }
}

fn bind_metric<'q>(sql: &'q str, m: &'q Metric) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    let q = sqlx::query(sql).bind(m.name());
    match m.value() {
        Value::Gauge(v) => q.bind(v),
        Value::Counter(d) => q.bind(d),
    }
}

fn decode_row(kind: Kind, row: &SqliteRow) -> Result<Metric> {
    let decode_err = |e: sqlx::Error| MetricaError::Storage(format!("decode {kind} row: {e}"));
    let id: String = row.try_get(0).map_err(decode_err)?;
    let value = match kind {
        Kind::Gauge => Value::Gauge(row.try_get::<f64, _>(1).map_err(decode_err)?),
        Kind::Counter => Value::Counter(row.try_get::<i64, _>(1).map_err(decode_err)?),
    };
    Metric::new(id, kind, value)
}

/// Group by kind in first-seen order, keeping list order within a kind.
fn group_by_kind(metrics: &[Metric]) -> Vec<(Kind, Vec<&Metric>)> {
    let mut groups: Vec<(Kind, Vec<&Metric>)> = Vec::with_capacity(Kind::ALL.len());
    for m in metrics {
        match groups.iter_mut().find(|(k, _)| *k == m.kind()) {
            Some((_, group)) => group.push(m),
            None => groups.push((m.kind(), vec![m])),
        }
    }
    groups
}

#[derive(Debug)]
pub struct DbStorage {
    pool: SqlitePool,
    backoff: Backoff,
}

impl DbStorage {
    /// Connect and create tables. Failure here is fatal for startup.
    pub async fn open(dsn: &str) -> Result<Self> {
        Self::open_with_backoff(dsn, Backoff::default()).await
    }

    pub async fn open_with_backoff(dsn: &str, backoff: Backoff) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(dsn)
            .map_err(|e| MetricaError::Config(format!("invalid database dsn: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(PING_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| MetricaError::Config(format!("database connection failed: {e}")))?;

        let storage = Self { pool, backoff };
        storage.create_tables().await?;

        tracing::info!("relational storage ready");
        Ok(storage)
    }

    async fn create_tables(&self) -> Result<()> {
        for kind in Kind::ALL {
            let pool = &self.pool;
            self.call("create tables", CREATE_TABLES_TIMEOUT, move || async move {
                sqlx::query(sql::create_table(kind)).execute(pool).await.map(|_| ())
            })
            .await
            .map_err(|e| MetricaError::Config(e.to_string()))?;
        }
        Ok(())
    }

    /// Health check with its own short deadline.
    pub async fn check_connection(&self) -> bool {
        let ping = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(PING_TIMEOUT, ping).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "database ping failed");
                false
            }
            Err(_) => {
                tracing::error!("database ping timed out");
                false
            }
        }
    }

    /// Run `op` under `deadline` per attempt, retrying per the backoff schedule.
    async fn call<T, F, Fut>(&self, what: &'static str, deadline: Duration, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        let op = &op;
        self.backoff
            .run(
                move || async move {
                    tokio::time::timeout(deadline, op())
                        .await
                        .map_err(|_| DbError::Timeout(what, deadline))?
                        .map_err(DbError::from)
                },
                is_retriable,
            )
            .await
            .map_err(|e| into_metrica(what, e))
    }

    /// One transaction for the whole batch. An error or a dropped (timed out)
    /// transaction rolls back.
    async fn apply_batch(
        &self,
        groups: &[(Kind, Vec<&Metric>)],
    ) -> std::result::Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for (kind, group) in groups {
            // statement is prepared once per connection and reused per row
            let stmt = sql::upsert(*kind);
            for m in group {
                if let Err(e) = bind_metric(stmt, m).execute(&mut *tx).await {
                    if let Err(rb) = tx.rollback().await {
                        tracing::error!(error = %rb, "rollback failed");
                    }
                    return Err(e);
                }
            }
        }

        tx.commit().await
    }
}

#[async_trait]
impl Storage for DbStorage {
    async fn update(&self, metric: &Metric) -> Result<()> {
        let pool = &self.pool;
        let stmt = sql::upsert(metric.kind());
        self.call("update", UPDATE_TIMEOUT, move || async move {
            bind_metric(stmt, metric).execute(pool).await.map(|_| ())
        })
        .await
    }

    /// All-or-nothing: one transaction, rolled back on any failure.
    async fn batch_update(&self, metrics: &[Metric]) -> Result<()> {
        if metrics.is_empty() {
            return Ok(());
        }
        let groups = group_by_kind(metrics);
        let groups = groups.as_slice();
        self.call("batch update", BATCH_UPDATE_TIMEOUT, move || self.apply_batch(groups))
            .await
    }

    async fn get(&self, kind: Kind, name: &str) -> Result<Metric> {
        let pool = &self.pool;
        let row = self
            .call("get", GET_TIMEOUT, move || async move {
                sqlx::query(sql::get(kind)).bind(name).fetch_optional(pool).await
            })
            .await?;

        match row {
            Some(row) => decode_row(kind, &row),
            None => Err(MetricaError::UnknownMetric {
                kind: kind.to_string(),
                name: name.to_string(),
            }),
        }
    }

    async fn list(&self) -> Result<Vec<Metric>> {
        let mut out = Vec::new();
        for kind in Kind::ALL {
            let pool = &self.pool;
            let rows = self
                .call("list", LIST_TIMEOUT, move || async move {
                    sqlx::query(sql::list(kind)).fetch_all(pool).await
                })
                .await?;
            for row in &rows {
                out.push(decode_row(kind, row)?);
            }
        }
        Ok(out)
    }

    async fn stop(&self) -> Result<()> {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("relational storage closed");
        }
        Ok(())
    }
}
