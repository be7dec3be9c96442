//! Delivery of metric snapshots to the collector.
//!
//! `Reporter` is the seam the collection loop depends on; `HttpTransport`
//! is the production implementation.

pub mod client;

use async_trait::async_trait;

use metrica_core::error::Result;
use metrica_core::MetricBatch;

pub use client::HttpTransport;

#[async_trait]
pub trait Reporter: Send + Sync {
    /// Deliver one snapshot. An error means it was not accepted.
    async fn report(&self, batch: MetricBatch) -> Result<()>;
}
