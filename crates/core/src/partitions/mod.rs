//! Partitions module - partition identity, storage keys and aggregation topology.

mod partitions_memory;
mod partitions_model;
mod partitions_topology;
mod partitions_traits;

pub use partitions_memory::InMemoryPartitionRepository;
pub use partitions_model::{
    normalize_tab_name, storage_key, LedgerFamily, PartitionInfo, PartitionKey,
};
pub use partitions_topology::{PartitionTopology, TopologyRegistry};
pub use partitions_traits::PartitionRepositoryTrait;
