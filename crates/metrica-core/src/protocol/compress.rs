//! gzip helpers.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{MetricaError, Result};

pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| MetricaError::Internal(format!("gzip write failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| MetricaError::Internal(format!("gzip finish failed: {e}")))
}

pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 4);
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| MetricaError::BadRequest(format!("invalid gzip body: {e}")))?;
    Ok(out)
}
