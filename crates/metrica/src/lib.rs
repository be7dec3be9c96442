//! Top-level facade crate for metrica.
//!
//! Re-exports the core model, the collector and the agent so users can depend
//! on a single crate.

pub mod core {
    pub use metrica_core::*;
}

pub mod server {
    pub use metrica_server::*;
}

pub mod agent {
    pub use metrica_agent::*;
}
