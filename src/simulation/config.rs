use crate::error::{Result, SimError};
use crate::policies::PolicyKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How workers get their observing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pinning {
    /// Worker `i` observes from node `i mod node_count`.
    Pinned,
    /// Each worker observes from a node drawn at random.
    Unpinned,
}

impl Pinning {
    /// CLI flag: 0 is unpinned, anything else pinned.
    pub fn from_flag(flag: u8) -> Self {
        if flag == 0 { Self::Unpinned } else { Self::Pinned }
    }
}

/// What to do when the result log cannot be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogPolicy {
    /// Warn and keep going with console output.
    #[default]
    Warn,
    /// Abort the run before any worker starts.
    Strict,
}

pub const PRESETS: [&str; 3] = ["ideal", "stress", "worst"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub name: String,
    pub node_count: usize,
    pub worker_count: usize,
    pub block_count: usize,
    pub policy: PolicyKind,
    pub pinning: Pinning,
    pub seed: Option<u64>,
    pub log_path: Option<PathBuf>,
    pub log_policy: LogPolicy,
    pub console: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "default_sim".to_string(),
            node_count: 4,
            worker_count: 4,
            block_count: 20,
            policy: PolicyKind::Random,
            pinning: Pinning::Pinned,
            seed: None,
            log_path: Some(PathBuf::from("results.csv")),
            log_policy: LogPolicy::Warn,
            console: true,
        }
    }
}

impl SimConfig {
    /// Canned scenarios: `ideal` keeps everything local, `stress` spreads
    /// memory over eight nodes, `worst` scatters it randomly.
    pub fn preset(name: &str) -> Result<Self> {
        let base = Self {
            name: name.to_lowercase(),
            ..Self::default()
        };
        let config = match name.to_lowercase().as_str() {
            "ideal" => base
                .with_shape(4, 4, 20)
                .with_policy(PolicyKind::FirstTouch)
                .with_pinning(Pinning::Pinned),
            "stress" => base
                .with_shape(8, 16, 100)
                .with_policy(PolicyKind::Interleaved)
                .with_pinning(Pinning::Unpinned),
            "worst" => base
                .with_shape(4, 8, 50)
                .with_policy(PolicyKind::Random)
                .with_pinning(Pinning::Unpinned),
            _ => return Err(SimError::UnknownPreset(name.to_string())),
        };
        Ok(config)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_shape(mut self, nodes: usize, workers: usize, blocks: usize) -> Self {
        self.node_count = nodes;
        self.worker_count = workers;
        self.block_count = blocks;
        self
    }

    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_pinning(mut self, pinning: Pinning) -> Self {
        self.pinning = pinning;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn without_log(mut self) -> Self {
        self.log_path = None;
        self
    }

    pub fn with_log_policy(mut self, policy: LogPolicy) -> Self {
        self.log_policy = policy;
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }
}
