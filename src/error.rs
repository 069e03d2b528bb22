use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid topology: {nodes} nodes requested, supported range is 1..={max}")]
    InvalidTopology { nodes: usize, max: usize },

    #[error("capacity exceeded: {requested} blocks requested, capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("node {node} out of range for a {num_nodes}-node topology")]
    NodeOutOfRange { node: usize, num_nodes: usize },

    #[error("result log {} unavailable: {source}", .path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to spawn worker {worker}: {source}")]
    WorkerSpawnFailure {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("worker scope aborted")]
    ScopeAborted,

    #[error("unknown allocation policy: {0}")]
    UnknownPolicy(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
