//! metrica agent library entry.
//!
//! Samples host metrics on a poll interval and ships snapshots to the
//! collector on a report interval. Consumed by the binary (`main.rs`) and by
//! integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod controller;
pub mod sampler;
pub mod samples;
pub mod transport;
