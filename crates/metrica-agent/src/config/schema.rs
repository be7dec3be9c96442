use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use metrica_core::error::{MetricaError, Result};
use metrica_core::retry::{Backoff, DEFAULT_INTERVALS};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    #[serde(default)]
    pub agent: AgentSection,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricaError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.agent.validate()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    /// Collector base URL; a bare `host:port` gets `http://`.
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    /// Deadline for one delivery attempt.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub signature_key: Option<String>,

    /// Path to the collector's PKCS#1 PEM public key.
    #[serde(default)]
    pub crypto_key: Option<PathBuf>,

    /// Sent as `X-Real-IP` so the collector can see the agent's address.
    #[serde(default)]
    pub real_ip: Option<String>,

    /// Sleeps between delivery attempts.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: Vec<u64>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            server: default_server(),
            poll_interval_ms: default_poll_interval_ms(),
            report_interval_ms: default_report_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            signature_key: None,
            crypto_key: None,
            real_ip: None,
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl AgentSection {
    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(MetricaError::Config("agent.server must not be empty".into()));
        }
        if self.poll_interval_ms == 0 || self.report_interval_ms == 0 {
            return Err(MetricaError::Config("agent intervals must be > 0".into()));
        }
        if self.report_interval_ms < self.poll_interval_ms {
            return Err(MetricaError::Config(format!(
                "agent.report_interval_ms ({}) must be >= poll_interval_ms ({})",
                self.report_interval_ms, self.poll_interval_ms
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(MetricaError::Config("agent.request_timeout_ms must be > 0".into()));
        }
        if matches!(self.real_ip.as_deref(), Some(ip) if ip.parse::<IpAddr>().is_err()) {
            return Err(MetricaError::Config(
                "agent.real_ip must be an IP address".into(),
            ));
        }
        if matches!(self.signature_key.as_deref(), Some("")) {
            return Err(MetricaError::Config(
                "agent.signature_key must not be empty when set".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::from_millis(&self.backoff_ms)
    }
}

fn default_server() -> String {
    "http://127.0.0.1:8080".into()
}
fn default_poll_interval_ms() -> u64 {
    2_000
}
fn default_report_interval_ms() -> u64 {
    10_000
}
fn default_request_timeout_ms() -> u64 {
    5_000
}
fn default_backoff_ms() -> Vec<u64> {
    DEFAULT_INTERVALS.iter().map(|d| d.as_millis() as u64).collect()
}
