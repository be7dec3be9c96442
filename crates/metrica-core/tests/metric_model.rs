#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metrica_core::{Kind, Metric, MetricaError, Value};

#[test]
fn kind_tags() {
    assert_eq!("gauge".parse::<Kind>().unwrap(), Kind::Gauge);
    assert_eq!("counter".parse::<Kind>().unwrap(), Kind::Counter);

    let err = "histogram".parse::<Kind>().expect_err("must fail");
    assert!(matches!(err, MetricaError::UnknownKind(ref k) if k == "histogram"));
    assert_eq!(err.code().as_str(), "UNKNOWN_KIND");
}

#[test]
fn empty_name_rejected() {
    let err = Metric::gauge("", 1.0).expect_err("must fail");
    assert!(matches!(err, MetricaError::EmptyName));
}

#[test]
fn dual_accessors_never_panic() {
    // gauge read as counter truncates
    assert_eq!(Value::Gauge(3.99).counter(), 3);
    assert_eq!(Value::Gauge(-3.99).counter(), -3);
    assert_eq!(Value::Gauge(f64::NAN).counter(), 0);
    assert_eq!(Value::Gauge(f64::INFINITY).counter(), i64::MAX);

    // counter read as gauge widens
    assert_eq!(Value::Counter(42).gauge(), 42.0);
}

#[test]
fn new_coerces_to_kind() {
    let m = Metric::new("m", Kind::Counter, Value::Gauge(7.6)).unwrap();
    assert_eq!(m.kind(), Kind::Counter);
    assert_eq!(m.value(), Value::Counter(7));

    let m = Metric::new("m", Kind::Gauge, Value::Counter(5)).unwrap();
    assert_eq!(m.value(), Value::Gauge(5.0));
}

#[test]
fn parse_text_form() {
    let m = Metric::parse("Alloc", "gauge", "12.5").unwrap();
    assert_eq!(m.value(), Value::Gauge(12.5));

    let m = Metric::parse("PollCount", "counter", "3").unwrap();
    assert_eq!(m.value(), Value::Counter(3));

    let err = Metric::parse("PollCount", "counter", "3.5").expect_err("must fail");
    assert!(matches!(err, MetricaError::BadValue(_)));

    let err = Metric::parse("x", "summary", "1").expect_err("must fail");
    assert!(matches!(err, MetricaError::UnknownKind(_)));
}
