use super::WorkerReport;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Aggregate view over every worker in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub workers: usize,
    pub local_access: usize,
    pub remote_access: usize,
    pub total_time: u64,
    pub local_access_ratio: f64,
    pub avg_latency_ns: f64,
    pub avg_time_per_worker: f64,
}

pub fn summarize(reports: &[WorkerReport]) -> RunSummary {
    let workers = reports.len();
    let local_access: usize = reports.iter().map(|r| r.metrics.local_access).sum();
    let remote_access: usize = reports.iter().map(|r| r.metrics.remote_access).sum();
    let total_time: u64 = reports.iter().map(|r| r.metrics.total_time).sum();
    let accesses = local_access + remote_access;

    let (local_access_ratio, avg_latency_ns) = if accesses > 0 {
        (
            local_access as f64 / accesses as f64,
            total_time as f64 / accesses as f64,
        )
    } else {
        (0.0, 0.0)
    };

    let avg_time_per_worker = if workers > 0 {
        total_time as f64 / workers as f64
    } else {
        0.0
    };

    RunSummary {
        workers,
        local_access,
        remote_access,
        total_time,
        local_access_ratio,
        avg_latency_ns,
        avg_time_per_worker,
    }
}

/// One row of a benchmark sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub experiment: String,
    pub config: crate::simulation::SimConfig,
    pub summary: RunSummary,
    pub duration_ms: f64,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

pub fn export_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
