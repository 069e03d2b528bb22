pub mod error;
pub mod topology;
pub mod policies;
pub mod access;
pub mod metrics;
pub mod simulation;

pub use error::{Result, SimError};
pub use topology::Topology;
pub use policies::{Allocation, AllocationPolicy, PolicyKind};
pub use simulation::{Simulation, SimConfig, SimReport};
pub use metrics::Metrics;

pub mod prelude {
    pub use crate::access::simulate_access;
    pub use crate::error::{Result, SimError};
    pub use crate::metrics::{Metrics, WorkerReport};
    pub use crate::policies::{Allocation, AllocationPolicy, PolicyKind, PolicyRegistry};
    pub use crate::simulation::{LogPolicy, Pinning, SimConfig, SimReport, Simulation};
    pub use crate::topology::Topology;
}
