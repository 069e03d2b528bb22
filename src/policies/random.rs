use super::{Allocation, AllocationPolicy};
use crate::error::Result;
use crate::topology::Topology;
use rand::{Rng, RngCore};

/// Each block's owner is drawn uniformly from all nodes.
///
/// The generator belongs to the calling worker; this type never owns one,
/// so concurrent workers cannot contend on shared random state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPlacement;

impl AllocationPolicy for RandomPlacement {
    fn allocate(
        &self,
        topology: &Topology,
        blocks: usize,
        _home_node: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Allocation> {
        let nodes = topology.num_nodes();
        Allocation::from_fn(blocks, |_| rng.gen_range(0..nodes))
    }

    fn name(&self) -> &str {"random"}
}
