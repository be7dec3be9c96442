#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use metrica_agent::config;

#[test]
fn defaults_applied() {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let a = &cfg.agent;
    assert_eq!(a.server, "http://127.0.0.1:8080");
    assert_eq!(a.poll_interval(), Duration::from_secs(2));
    assert_eq!(a.report_interval(), Duration::from_secs(10));
    assert_eq!(a.request_timeout(), Duration::from_secs(5));
    assert_eq!(
        a.backoff().intervals(),
        &[Duration::from_secs(1), Duration::from_secs(3), Duration::from_secs(5)]
    );
}

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
agent:
  poll_intervall_ms: 100 # typo should fail
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("poll_intervall_ms"), "{err}");
}

#[test]
fn report_must_not_be_faster_than_poll() {
    let bad = r#"
version: 1
agent:
  poll_interval_ms: 5000
  report_interval_ms: 1000
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn zero_interval_rejected() {
    assert!(config::load_from_str("version: 1\nagent:\n  poll_interval_ms: 0\n").is_err());
}

#[test]
fn custom_backoff() {
    let cfg = config::load_from_str(
        r#"
version: 1
agent:
  server: "collector:9000"
  signature_key: "s3cr3t"
  backoff_ms: [10, 20]
"#,
    )
    .unwrap();
    assert_eq!(cfg.agent.backoff().max_attempts(), 3);
    assert_eq!(cfg.agent.signature_key.as_deref(), Some("s3cr3t"));
}

#[test]
fn real_ip_must_parse() {
    let cfg = config::load_from_str("version: 1\nagent:\n  real_ip: \"192.168.1.10\"\n").unwrap();
    assert_eq!(cfg.agent.real_ip.as_deref(), Some("192.168.1.10"));

    assert!(config::load_from_str("version: 1\nagent:\n  real_ip: \"not-an-ip\"\n").is_err());
}
