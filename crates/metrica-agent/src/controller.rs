//! Poll / report loops.
//!
//! Two tasks share one `Samples` buffer:
//! - poll: every `poll_interval`, sample gauges and bump `PollCount`
//! - report: every `report_interval`, snapshot and hand it to the reporter;
//!   on failure the drained counter deltas go back into the buffer
//!
//! Both select on a `watch` shutdown signal. A report in flight is awaited in
//! the task body, so `stop` returns only after it has finished or failed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::sampler::GaugeSource;
use crate::samples::Samples;
use crate::transport::Reporter;

pub const POLL_COUNT: &str = "PollCount";

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub report_interval: Duration,
}

pub struct Controller;

impl Controller {
    pub fn start<S>(
        cfg: ControllerConfig,
        source: S,
        reporter: Arc<dyn Reporter>,
    ) -> ControllerHandle
    where
        S: GaugeSource,
    {
        let samples = Arc::new(Samples::new());
        let (shutdown, shutdown_rx) = watch::channel(false);

        let poll = tokio::spawn(poll_loop(
            cfg.poll_interval,
            source,
            Arc::clone(&samples),
            shutdown_rx.clone(),
        ));
        let report = tokio::spawn(report_loop(
            cfg.report_interval,
            reporter,
            Arc::clone(&samples),
            shutdown_rx,
        ));

        tracing::info!(
            poll_ms = cfg.poll_interval.as_millis() as u64,
            report_ms = cfg.report_interval.as_millis() as u64,
            "controller started"
        );

        ControllerHandle {
            samples,
            shutdown,
            poll,
            report,
        }
    }
}

pub struct ControllerHandle {
    samples: Arc<Samples>,
    shutdown: watch::Sender<bool>,
    poll: JoinHandle<()>,
    report: JoinHandle<()>,
}

impl ControllerHandle {
    pub fn samples(&self) -> &Arc<Samples> {
        &self.samples
    }

    /// Signal both loops and wait for them to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);

        for (name, task) in [("poll", self.poll), ("report", self.report)] {
            if let Err(e) = task.await {
                tracing::error!(task = name, error = %e, "controller task ended abnormally");
            }
        }
        tracing::info!("controller stopped");
    }
}

async fn poll_loop<S: GaugeSource>(
    every: Duration,
    mut source: S,
    samples: Arc<Samples>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick fires immediately
    tick.tick().await;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                samples.set_gauges(source.sample());
                samples.add_counter(POLL_COUNT, 1);
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn report_loop(
    every: Duration,
    reporter: Arc<dyn Reporter>,
    samples: Arc<Samples>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick.tick().await;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let batch = samples.take_snapshot();
                if batch.is_empty() {
                    continue;
                }
                if let Err(e) = reporter.report(batch.clone()).await {
                    tracing::error!(error = %e, "report failed, counters kept for next cycle");
                    samples.restore_counters(&batch);
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}
