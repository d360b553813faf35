//! Snapshot aggregation and ordering of utilization records

pub mod snapshot_service;
pub mod sort_service;
