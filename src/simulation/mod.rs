pub mod config;
pub use config::{LogPolicy, Pinning, SimConfig};

use crate::access::simulate_access;
use crate::error::{Result, SimError};
use crate::metrics::analyzer::{self, RunSummary};
use crate::metrics::reporter::Reporter;
use crate::metrics::WorkerReport;
use crate::policies::AllocationPolicy;
use crate::topology::Topology;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::io::{self, Write};
use tracing::{debug, error, info, warn};

// Keeps the unpinned node draw on a different stream from worker 0's generator.
const ASSIGNMENT_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    BuildingTopology,
    Running,
    Draining,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub config: SimConfig,
    pub seed: u64,
    pub topology: Topology,
    /// Observing node per worker, in worker order.
    pub assignments: Vec<usize>,
    /// Per-worker results, in worker order regardless of emission order.
    pub workers: Vec<WorkerReport>,
    pub summary: RunSummary,
    pub emitted: usize,
}

#[derive(Debug, Clone, Copy)]
struct WorkerTask {
    worker_id: usize,
    node: usize,
    blocks: usize,
    seed: u64,
}

pub struct Simulation {
    config: SimConfig,
    phase: Phase,
    console: Option<Box<dyn Write + Send>>,
    #[cfg(test)]
    refuse_spawn_from: Option<usize>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            console: None,
            #[cfg(test)]
            refuse_spawn_from: None,
        }
    }

    /// Sends the per-worker console blocks to `writer` instead of stdout.
    pub fn with_console_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.console = Some(Box::new(writer));
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn transition(&mut self, next: Phase) {
        debug!("Simulation {}: {:?} -> {:?}", self.config.name, self.phase, next);
        self.phase = next;
    }

    pub fn run(&mut self) -> Result<SimReport> {
        let result = self.execute();
        if result.is_err() {
            self.transition(Phase::Failed);
        }
        result
    }

    fn execute(&mut self) -> Result<SimReport> {
        info!("Starting simulation: {}", self.config.name);
        info!("Policy: {}, Pinning: {:?}", self.config.policy, self.config.pinning);
        info!(
            "Nodes: {}, Workers: {}, Blocks: {}",
            self.config.node_count, self.config.worker_count, self.config.block_count
        );

        self.transition(Phase::BuildingTopology);
        let topology = Topology::build(self.config.node_count)?;
        debug!("\n{}", topology);

        let seed = self.config.seed.unwrap_or_else(rand::random);
        info!("Seed: {}", seed);

        let assignments = assign_nodes(
            self.config.pinning,
            self.config.worker_count,
            topology.num_nodes(),
            seed,
        );
        let policy = self.config.policy.build();

        // Released below on every path, including worker failure.
        let console = self
            .console
            .take()
            .unwrap_or_else(|| Box::new(io::stdout()));
        let reporter = Mutex::new(Reporter::open(&self.config, console)?);

        self.transition(Phase::Running);
        let (workers, failure) =
            self.launch(&topology, policy.as_ref(), &assignments, seed, &reporter);

        let finished = reporter.into_inner().finish();
        if let Some(e) = failure {
            if let Err(close_err) = &finished {
                warn!("Closing result sinks after failure: {}", close_err);
            }
            error!("Simulation {} aborted: {}", self.config.name, e);
            return Err(e);
        }
        let emitted = finished?;

        let summary = analyzer::summarize(&workers);
        self.transition(Phase::Completed);

        info!("Local access ratio: {:.2}%", summary.local_access_ratio * 100.0);
        info!("Avg latency: {:.2} ns/access", summary.avg_latency_ns);
        info!("Total time: {} ns", summary.total_time);

        Ok(SimReport {
            config: self.config.clone(),
            seed,
            topology,
            assignments,
            workers,
            summary,
            emitted,
        })
    }

    /// Spawns one scoped thread per worker, then joins every thread that
    /// started. Returns the successful reports in worker order and the first
    /// failure, if any.
    fn launch(
        &mut self,
        topology: &Topology,
        policy: &dyn AllocationPolicy,
        assignments: &[usize],
        seed: u64,
        reporter: &Mutex<Reporter>,
    ) -> (Vec<WorkerReport>, Option<SimError>) {
        let blocks = self.config.block_count;

        let scoped = crossbeam::scope(|scope| {
            let mut handles = Vec::with_capacity(assignments.len());
            let mut failure = None;

            for (worker_id, &node) in assignments.iter().enumerate() {
                let task = WorkerTask {
                    worker_id,
                    node,
                    blocks,
                    seed: seed.wrapping_add(worker_id as u64),
                };

                let spawned = if self.refuses_spawn(worker_id) {
                    Err(io::Error::other("worker spawn refused"))
                } else {
                    scope
                        .builder()
                        .name(format!("numa-worker-{}", worker_id))
                        .spawn(move |_| run_worker(task, topology, policy, reporter))
                };

                match spawned {
                    Ok(handle) => handles.push((worker_id, handle)),
                    Err(source) => {
                        error!("Failed to spawn worker {}: {}", worker_id, source);
                        failure = Some(SimError::WorkerSpawnFailure { worker: worker_id, source });
                        break;
                    }
                }
            }

            self.transition(Phase::Draining);

            let mut reports = Vec::with_capacity(handles.len());
            for (worker_id, handle) in handles {
                match handle.join() {
                    Ok(Ok(report)) => reports.push(report),
                    Ok(Err(e)) => {
                        error!("Worker {} failed: {}", worker_id, e);
                        failure.get_or_insert(e);
                    }
                    Err(_) => {
                        error!("Worker {} panicked", worker_id);
                        failure.get_or_insert(SimError::WorkerPanicked { worker: worker_id });
                    }
                }
            }

            (reports, failure)
        });

        // Every handle is joined inside the scope, so this only trips if the
        // scope closure itself unwound.
        scoped.unwrap_or_else(|_| (Vec::new(), Some(SimError::ScopeAborted)))
    }

    #[cfg(test)]
    fn refuses_spawn(&self, worker_id: usize) -> bool {
        self.refuse_spawn_from.is_some_and(|first| worker_id >= first)
    }

    #[cfg(not(test))]
    fn refuses_spawn(&self, _worker_id: usize) -> bool {
        false
    }
}

fn run_worker(
    task: WorkerTask,
    topology: &Topology,
    policy: &dyn AllocationPolicy,
    reporter: &Mutex<Reporter>,
) -> Result<WorkerReport> {
    let mut rng = StdRng::seed_from_u64(task.seed);

    let allocation = policy.allocate(topology, task.blocks, task.node, &mut rng)?;
    debug!("Worker {} ({}): {}", task.worker_id, policy.name(), allocation);

    let metrics = simulate_access(topology, &allocation, task.node)?;
    let report = WorkerReport {
        worker_id: task.worker_id,
        node: task.node,
        metrics,
    };

    reporter.lock().emit(&report)?;
    Ok(report)
}

/// Observing node for each worker. Pinned is `i mod num_nodes`; unpinned
/// draws each node from a generator seeded off `seed`.
pub fn assign_nodes(pinning: Pinning, workers: usize, num_nodes: usize, seed: u64) -> Vec<usize> {
    match pinning {
        Pinning::Pinned => (0..workers).map(|i| i % num_nodes).collect(),
        Pinning::Unpinned => {
            let mut rng = StdRng::seed_from_u64(seed ^ ASSIGNMENT_STREAM);
            (0..workers).map(|_| rng.gen_range(0..num_nodes)).collect()
        }
    }
}
