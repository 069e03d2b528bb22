pub mod static_policies;
pub mod random;

use crate::error::{Result, SimError};
use crate::topology::Topology;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub use random::RandomPlacement;
pub use static_policies::{FirstTouch, Interleaved};

pub const MAX_BLOCKS: usize = 256;

/// Owner node for each block, indexed by block number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    owners: Vec<usize>,
}

impl Allocation {
    /// Builds an allocation of `blocks` blocks, asking `owner_of` for each index.
    /// Fails before allocating anything if `blocks` is over `MAX_BLOCKS`.
    pub fn from_fn<F>(blocks: usize, owner_of: F) -> Result<Self>
    where
        F: FnMut(usize) -> usize,
    {
        if blocks > MAX_BLOCKS {
            return Err(SimError::CapacityExceeded {
                requested: blocks,
                capacity: MAX_BLOCKS,
            });
        }

        let owners = (0..blocks).map(owner_of).collect();
        Ok(Self { owners })
    }

    pub fn count(&self) -> usize {
        self.owners.len()
    }

    pub fn owners(&self) -> &[usize] {
        &self.owners
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block Allocation:")?;
        for owner in &self.owners {
            write!(f, " {}", owner)?;
        }
        Ok(())
    }
}

/// A placement rule for memory blocks. Implementations hold no mutable state;
/// any randomness comes from the generator the calling worker passes in.
pub trait AllocationPolicy: Send + Sync + fmt::Debug {
    fn allocate(
        &self,
        topology: &Topology,
        blocks: usize,
        home_node: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Allocation>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    Random,
    FirstTouch,
    Interleaved,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [Self::Random, Self::FirstTouch, Self::Interleaved];

    /// CLI codes: 0 = random, 1 = first-touch, 2 = interleaved.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Random),
            1 => Some(Self::FirstTouch),
            2 => Some(Self::Interleaved),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Random => 0,
            Self::FirstTouch => 1,
            Self::Interleaved => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::FirstTouch => "first-touch",
            Self::Interleaved => "interleaved",
        }
    }

    pub fn build(self) -> Box<dyn AllocationPolicy> {
        match self {
            Self::Random => Box::new(RandomPlacement),
            Self::FirstTouch => Box::new(FirstTouch),
            Self::Interleaved => Box::new(Interleaved),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = SimError;

    /// Accepts a numeric CLI code or any registered name.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(code) = s.trim().parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| SimError::UnknownPolicy(s.to_string()));
        }
        PolicyRegistry::global()
            .resolve(s)
            .ok_or_else(|| SimError::UnknownPolicy(s.to_string()))
    }
}

pub struct PolicyRegistry {
    policies: HashMap<String, PolicyKind>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            policies: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register("random", PolicyKind::Random);
        self.register("first-touch", PolicyKind::FirstTouch);
        self.register("first_touch", PolicyKind::FirstTouch);
        self.register("interleaved", PolicyKind::Interleaved);
        self.register("round-robin", PolicyKind::Interleaved);
    }

    pub fn register(&mut self, name: &str, kind: PolicyKind) {
        self.policies.insert(name.to_lowercase(), kind);
    }

    pub fn resolve(&self, name: &str) -> Option<PolicyKind> {
        self.policies.get(&name.trim().to_lowercase()).copied()
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn AllocationPolicy>> {
        self.resolve(name).map(PolicyKind::build)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.policies.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn global() -> &'static PolicyRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<PolicyRegistry> = OnceLock::new();
        REGISTRY.get_or_init(PolicyRegistry::new)
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
