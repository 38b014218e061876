//! Store implementations for the cache library.

pub mod memory;
pub mod metrics;

pub use memory::{HashMapStore, HashMapStoreConfig};
pub use metrics::{CacheMetric, MetricsSink, MetricsStore};
