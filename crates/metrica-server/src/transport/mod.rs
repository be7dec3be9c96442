//! Transport layer (HTTP).
//!
//! `codec` maps request headers onto the envelope decoder's view and errors
//! onto responses; `http` holds the handlers; `sign` adds the `HashSHA256`
//! header to responses when a secret is configured.

pub mod codec;
pub mod http;
pub mod sign;
