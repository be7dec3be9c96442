//! Update wire protocol.
//!
//! Sending side, in order:
//! - `record`: metrics -> JSON array of `{id, type, delta?, value?}`
//! - `compress`: gzip, unconditional
//! - `sign`: optional HMAC-SHA256 over the compressed bytes, hex header
//! - `crypto`: optional RSA-OAEP/SHA-512 over the compressed bytes
//!
//! `envelope` runs the pipeline in both directions. All decoders are
//! panic-free: malformed input is reported as `MetricaError`.

pub mod compress;
pub mod crypto;
pub mod envelope;
pub mod record;
pub mod sign;

/// `Content-Type` of every update body.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// `Content-Encoding` of every update body.
pub const CONTENT_ENCODING_GZIP: &str = "gzip";
/// Header carrying the hex-encoded HMAC-SHA256 signature.
pub const HEADER_SIGNATURE: &str = "HashSHA256";
