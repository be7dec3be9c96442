//! Envelope pipeline (both directions).
//!
//! Encode: records -> gzip -> sign(compressed) -> encrypt(compressed).
//! Decode: decrypt -> verify(compressed) -> gunzip -> records.
//!
//! The signature always covers the compressed bytes, so with encryption off
//! the receiver checks exactly the body it received.

use bytes::Bytes;

use crate::error::{MetricaError, Result};
use crate::metric::Metric;

use super::compress::{gunzip, gzip};
use super::crypto::{Decryptor, Encryptor};
use super::record::{decode_record, decode_records, encode_record, encode_records};
use super::sign::Signer;

/// Encoded update, ready to be sent.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Request body.
    pub body: Bytes,
    /// Hex HMAC-SHA256, when a secret is configured.
    pub signature: Option<String>,
}

/// Transport headers relevant to decoding.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeHeaders<'a> {
    /// `Content-Encoding` value, if any.
    pub content_encoding: Option<&'a str>,
    /// `HashSHA256` value, if any.
    pub signature: Option<&'a str>,
}

impl EnvelopeHeaders<'_> {
    fn gzipped(&self) -> bool {
        self.content_encoding
            .map(|v| v.contains(super::CONTENT_ENCODING_GZIP))
            .unwrap_or(false)
    }
}

/// Sending side of the pipeline.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeEncoder {
    signer: Option<Signer>,
    encryptor: Option<Encryptor>,
}

impl EnvelopeEncoder {
    pub fn new(signer: Option<Signer>, encryptor: Option<Encryptor>) -> Self {
        Self { signer, encryptor }
    }

    /// Encode a batch. Returns `None` for an empty batch: nothing is sent.
    pub fn encode_batch(&self, metrics: &[Metric]) -> Result<Option<Envelope>> {
        if metrics.is_empty() {
            return Ok(None);
        }
        self.seal(&encode_records(metrics)?).map(Some)
    }

    /// Encode a single-metric update.
    pub fn encode_one(&self, metric: &Metric) -> Result<Envelope> {
        self.seal(&encode_record(metric)?)
    }

    fn seal(&self, json: &[u8]) -> Result<Envelope> {
        let compressed = gzip(json)?;

        let signature = match &self.signer {
            Some(s) => Some(s.sign(&compressed)?),
            None => None,
        };

        let body = match &self.encryptor {
            Some(e) => e.encrypt(&compressed)?,
            None => compressed,
        };

        Ok(Envelope {
            body: Bytes::from(body),
            signature,
        })
    }
}

/// Receiving side of the pipeline.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeDecoder {
    signer: Option<Signer>,
    decryptor: Option<Decryptor>,
}

impl EnvelopeDecoder {
    pub fn new(signer: Option<Signer>, decryptor: Option<Decryptor>) -> Self {
        Self { signer, decryptor }
    }

    /// Decode a batch body (JSON array of records).
    pub fn decode_batch(&self, body: &[u8], headers: &EnvelopeHeaders<'_>) -> Result<Vec<Metric>> {
        let json = self.open(body, headers)?;
        decode_records(&json)
    }

    /// Decode a single-record body.
    pub fn decode_one(&self, body: &[u8], headers: &EnvelopeHeaders<'_>) -> Result<Metric> {
        let json = self.open(body, headers)?;
        decode_record(&json)
    }

    fn open(&self, body: &[u8], headers: &EnvelopeHeaders<'_>) -> Result<Vec<u8>> {
        let payload = match &self.decryptor {
            Some(d) => d.decrypt(body)?,
            None => body.to_vec(),
        };

        if let Some(signer) = &self.signer {
            let signature = headers.signature.ok_or(MetricaError::BadDataHash)?;
            signer.verify(&payload, signature)?;
        }

        if headers.gzipped() {
            gunzip(&payload)
        } else {
            Ok(payload)
        }
    }
}
