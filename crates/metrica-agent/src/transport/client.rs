//! HTTP delivery with bounded retries.
//!
//! One POST per snapshot to `<base>/updates/`. Network-level failures are
//! retried on the fixed backoff schedule; a non-success status is the
//! collector's answer and ends delivery at once.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::StatusCode;

use metrica_core::error::{MetricaError, Result};
use metrica_core::protocol::crypto::Encryptor;
use metrica_core::protocol::envelope::{Envelope, EnvelopeEncoder};
use metrica_core::protocol::sign::Signer;
use metrica_core::protocol::{CONTENT_ENCODING_GZIP, CONTENT_TYPE_JSON, HEADER_SIGNATURE};
use metrica_core::retry::Backoff;
use metrica_core::MetricBatch;

use super::Reporter;
use crate::config::AgentSection;

const UPDATES_PATH: &str = "/updates/";
const HEADER_REAL_IP: &str = "X-Real-IP";

#[derive(Debug)]
enum SendError {
    Network(reqwest::Error),
    Status(StatusCode),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Network(e) => write!(f, "network: {e}"),
            SendError::Status(s) => write!(f, "collector answered {s}"),
        }
    }
}

fn is_retriable(e: &SendError) -> bool {
    matches!(e, SendError::Network(_))
}

fn updates_url(base: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}{UPDATES_PATH}")
    } else {
        format!("http://{base}{UPDATES_PATH}")
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    encoder: EnvelopeEncoder,
    backoff: Backoff,
    real_ip: Option<String>,
}

impl HttpTransport {
    /// Build from agent config, loading the public key if one is set.
    pub fn from_config(cfg: &AgentSection) -> Result<Self> {
        let signer = cfg.signature_key.as_deref().map(Signer::new);
        let encryptor = match &cfg.crypto_key {
            Some(path) => Some(Encryptor::from_file(path)?),
            None => None,
        };

        let transport = Self::new(
            &cfg.server,
            cfg.request_timeout(),
            EnvelopeEncoder::new(signer, encryptor),
            cfg.backoff(),
        )?;

        Ok(match &cfg.real_ip {
            Some(ip) => transport.with_real_ip(ip.clone()),
            None => transport,
        })
    }

    pub fn new(
        base: &str,
        timeout: Duration,
        encoder: EnvelopeEncoder,
        backoff: Backoff,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetricaError::Config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url: updates_url(base),
            encoder,
            backoff,
            real_ip: None,
        })
    }

    /// Announce `ip` in `X-Real-IP` on every request.
    pub fn with_real_ip(mut self, ip: impl Into<String>) -> Self {
        self.real_ip = Some(ip.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver one encoded envelope.
    pub async fn send(&self, envelope: &Envelope) -> Result<()> {
        self.backoff
            .run(|| self.attempt(envelope), is_retriable)
            .await
            .map_err(|e| MetricaError::Transport(e.to_string()))
    }

    async fn attempt(&self, envelope: &Envelope) -> std::result::Result<(), SendError> {
        let mut req = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(CONTENT_ENCODING, CONTENT_ENCODING_GZIP)
            .body(envelope.body.clone());
        if let Some(sig) = &envelope.signature {
            req = req.header(HEADER_SIGNATURE, sig.as_str());
        }
        if let Some(ip) = &self.real_ip {
            req = req.header(HEADER_REAL_IP, ip.as_str());
        }

        let resp = req.send().await.map_err(SendError::Network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SendError::Status(status));
        }
        Ok(())
    }
}

#[async_trait]
impl Reporter for HttpTransport {
    async fn report(&self, batch: MetricBatch) -> Result<()> {
        let Some(envelope) = self.encoder.encode_batch(batch.as_slice())? else {
            tracing::debug!("empty snapshot, nothing to send");
            return Ok(());
        };

        self.send(&envelope).await?;
        tracing::debug!(count = batch.len(), url = %self.url, "snapshot delivered");
        Ok(())
    }
}

