#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use metrica_core::retry::Backoff;

fn fast() -> Backoff {
    Backoff::from_millis(&[1, 1, 1])
}

#[test]
fn default_schedule() {
    let b = Backoff::default();
    assert_eq!(
        b.intervals(),
        &[Duration::from_secs(1), Duration::from_secs(3), Duration::from_secs(5)]
    );
    assert_eq!(b.max_attempts(), 4);
}

#[tokio::test]
async fn succeeds_after_transient_failures() {
    let counter = AtomicUsize::new(0);
    let calls = &counter;
    let res: Result<&str, _> = fast()
        .run(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(format!("transient {n}"))
                } else {
                    Ok("done")
                }
            },
            |_| true,
        )
        .await;
    assert_eq!(res.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausts_schedule_and_joins_errors() {
    let counter = AtomicUsize::new(0);
    let calls = &counter;
    let err = fast()
        .run(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(format!("e{n}"))
            },
            |_| true,
        )
        .await
        .expect_err("must exhaust");
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(err.attempts(), 4);
    assert_eq!(err.to_string(), "failed after 4 attempt(s): e0; e1; e2; e3");
}

#[tokio::test]
async fn non_retriable_stops_immediately() {
    let counter = AtomicUsize::new(0);
    let calls = &counter;
    let err = fast()
        .run(
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("fatal")
            },
            |_| false,
        )
        .await
        .expect_err("must fail");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.into_last(), Some("fatal"));
}
