// Distance here is index distance, not physical distance. Good enough to rank nodes.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_NODES: usize = 8;
pub const LOCAL_LATENCY_NS: u32 = 10;
pub const REMOTE_BASE_NS: u32 = 30;
pub const HOP_PENALTY_NS: u32 = 15;

/// Nodes plus a symmetric latency table. Never mutated after `build`, so it
/// can be shared across workers by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    num_nodes: usize,
    latency: Vec<Vec<u32>>,
}

impl Topology {
    pub fn build(num_nodes: usize) -> Result<Self> {
        if num_nodes == 0 || num_nodes > MAX_NODES {
            return Err(SimError::InvalidTopology {
                nodes: num_nodes,
                max: MAX_NODES,
            });
        }

        let latency = (0..num_nodes)
            .map(|from| (0..num_nodes).map(|to| Self::cost(from, to)).collect())
            .collect();

        Ok(Self { num_nodes, latency })
    }

    fn cost(from: usize, to: usize) -> u32 {
        if from == to {
            LOCAL_LATENCY_NS
        } else {
            REMOTE_BASE_NS + from.abs_diff(to) as u32 * HOP_PENALTY_NS
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn contains(&self, node: usize) -> bool {
        node < self.num_nodes()
    }

    pub fn latency(&self, from: usize, to: usize) -> Result<u32> {
        for node in [from, to] {
            if !self.contains(node) {
                return Err(SimError::NodeOutOfRange {
                    node,
                    num_nodes: self.num_nodes(),
                });
            }
        }
        Ok(self.latency[from][to])
    }

    pub fn matrix(&self) -> &[Vec<u32>] {
        &self.latency
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Latency Matrix:")?;
        for row in &self.latency {
            for cost in row {
                write!(f, "{:4} ", cost)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
