pub mod logger;
pub mod analyzer;
pub mod reporter;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Locality counts and summed latency for one worker's pass over its blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub local_access: usize,
    pub remote_access: usize,
    pub total_time: u64,
}

impl Metrics {
    pub fn accesses(&self) -> usize {
        self.local_access + self.remote_access
    }

    pub fn local_ratio(&self) -> f64 {
        match self.accesses() {
            0 => 0.0,
            n => self.local_access as f64 / n as f64,
        }
    }

    pub fn avg_latency_ns(&self) -> f64 {
        match self.accesses() {
            0 => 0.0,
            n => self.total_time as f64 / n as f64,
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Local Access  : {}", self.local_access)?;
        writeln!(f, "Remote Access : {}", self.remote_access)?;
        write!(f, "Total Time    : {} ns", self.total_time)
    }
}

/// What a worker hands back once it has emitted its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub node: usize,
    pub metrics: Metrics,
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Worker {}] node {}", self.worker_id, self.node)?;
        writeln!(f, "{}", self.metrics)?;
        write!(f, "-------------------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_handle_zero_accesses() {
        let m = Metrics::default();
        assert_eq!(m.local_ratio(), 0.0);
        assert_eq!(m.avg_latency_ns(), 0.0);
    }

    #[test]
    fn ratios() {
        let m = Metrics { local_access: 3, remote_access: 1, total_time: 75 };
        assert_eq!(m.accesses(), 4);
        assert!((m.local_ratio() - 0.75).abs() < f64::EPSILON);
        assert!((m.avg_latency_ns() - 18.75).abs() < f64::EPSILON);
    }

    #[test]
    fn console_block() {
        let report = WorkerReport {
            worker_id: 2,
            node: 1,
            metrics: Metrics { local_access: 4, remote_access: 0, total_time: 40 },
        };
        let text = report.to_string();
        assert!(text.starts_with("[Worker 2] node 1\n"));
        assert!(text.contains("Local Access  : 4\n"));
        assert!(text.contains("Remote Access : 0\n"));
        assert!(text.contains("Total Time    : 40 ns\n"));
        assert!(text.ends_with("-------------------------"));
    }
}
