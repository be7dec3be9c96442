//! metrica collector library entry.
//!
//! Wires the storage backends, the update envelope decoder and the HTTP
//! receive surface. Consumed by the binary (`main.rs`) and by integration
//! tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod router;
pub mod storage;
pub mod transport;
