use crate::error::Result;
use crate::metrics::Metrics;
use crate::policies::Allocation;
use crate::topology::Topology;

/// Walks every block once from `observing_node`, classifying each access as
/// local or remote and summing its latency.
pub fn simulate_access(
    topology: &Topology,
    allocation: &Allocation,
    observing_node: usize,
) -> Result<Metrics> {
    let mut metrics = Metrics::default();

    for &owner in allocation.owners() {
        let latency = topology.latency(observing_node, owner)?;

        if owner == observing_node {
            metrics.local_access += 1;
        } else {
            metrics.remote_access += 1;
        }
        metrics.total_time += u64::from(latency);
    }

    Ok(metrics)
}
