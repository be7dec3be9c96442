//! Host and process sampling.

use rand::Rng;
use sysinfo::{
    CpuRefreshKind, MemoryRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind,
    System,
};

/// Produces one poll's worth of gauges.
pub trait GaugeSource: Send + 'static {
    fn sample(&mut self) -> Vec<(String, f64)>;
}

/// `sysinfo`-backed source: host memory, per-CPU utilization, this
/// process's memory, and `RandomValue`.
///
/// CPU utilization needs two refreshes; the first poll reports 0.
pub struct Sampler {
    system: System,
    pid: Option<Pid>,
}

impl Sampler {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_memory(MemoryRefreshKind::everything())
                .with_cpu(CpuRefreshKind::everything())
                .with_processes(ProcessRefreshKind::everything()),
        );

        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = %e, "current pid unavailable, process gauges disabled");
                None
            }
        };

        Self { system, pid }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl GaugeSource for Sampler {
    fn sample(&mut self) -> Vec<(String, f64)> {
        self.system.refresh_memory();
        self.system.refresh_cpu_usage();

        let mut out = vec![
            ("TotalMemory".to_string(), self.system.total_memory() as f64),
            ("FreeMemory".to_string(), self.system.free_memory() as f64),
            ("UsedMemory".to_string(), self.system.used_memory() as f64),
        ];

        for (i, cpu) in self.system.cpus().iter().enumerate() {
            out.push((format!("CPUutilization{i}"), f64::from(cpu.cpu_usage())));
        }

        if let Some(pid) = self.pid {
            self.system
                .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            if let Some(process) = self.system.process(pid) {
                out.push(("ProcessResidentMemory".to_string(), process.memory() as f64));
                out.push(("ProcessVirtualMemory".to_string(), process.virtual_memory() as f64));
            }
        }

        out.push(("RandomValue".to_string(), rand::thread_rng().gen::<f64>()));
        out
    }
}
