//! metrica core: metric model, error taxonomy, and the update wire protocol.
//!
//! This crate defines the contracts shared by the collector (`metrica-server`)
//! and the agent (`metrica-agent`): the metric value model, the JSON record
//! format, the envelope pipeline (gzip, HMAC-SHA256 signature, RSA-OAEP
//! encryption) and the fixed backoff schedule used for bounded retries.
//! It carries no HTTP or storage dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed payloads surface as `MetricaError` instead of crashing the
//! collector.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metric;
pub mod protocol;
pub mod retry;

pub use error::{MetricaError, Result};
pub use metric::{Kind, Metric, MetricBatch, Value};
