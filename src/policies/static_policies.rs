// The two deterministic policies. Neither touches the generator.

use super::{Allocation, AllocationPolicy};
use crate::error::{Result, SimError};
use crate::topology::Topology;
use rand::RngCore;

/// Every block lands on the node that touched it first, i.e. the home node.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstTouch;

impl AllocationPolicy for FirstTouch {
    fn allocate(
        &self,
        topology: &Topology,
        blocks: usize,
        home_node: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<Allocation> {
        if !topology.contains(home_node) {
            return Err(SimError::NodeOutOfRange {
                node: home_node,
                num_nodes: topology.num_nodes(),
            });
        }
        Allocation::from_fn(blocks, |_| home_node)
    }

    fn name(&self) -> &str {"first-touch"}
}

/// Block `i` goes to node `i mod num_nodes`. The home node is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interleaved;

impl AllocationPolicy for Interleaved {
    fn allocate(
        &self,
        topology: &Topology,
        blocks: usize,
        _home_node: usize,
        _rng: &mut dyn RngCore,
    ) -> Result<Allocation> {
        let nodes = topology.num_nodes();
        Allocation::from_fn(blocks, |i| i % nodes)
    }

    fn name(&self) -> &str {"interleaved"}
}
