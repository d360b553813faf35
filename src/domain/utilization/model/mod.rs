//! Utilization records built from one poll of the control plane.

use chrono::{DateTime, Utc};

use crate::domain::utilization::service::sort_service::percent;

/// CPU in cores, memory in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceAmounts {
    pub cpu: f64,
    pub memory: f64,
}

impl ResourceAmounts {
    pub const ZERO: ResourceAmounts = ResourceAmounts { cpu: 0.0, memory: 0.0 };

    pub fn new(cpu: f64, memory: f64) -> Self {
        Self { cpu, memory }
    }
}

impl std::ops::Add for ResourceAmounts {
    type Output = ResourceAmounts;

    fn add(self, rhs: Self) -> Self::Output {
        ResourceAmounts {
            cpu: self.cpu + rhs.cpu,
            memory: self.memory + rhs.memory,
        }
    }
}

impl std::ops::AddAssign for ResourceAmounts {
    fn add_assign(&mut self, rhs: Self) {
        self.cpu += rhs.cpu;
        self.memory += rhs.memory;
    }
}

impl std::iter::Sum for ResourceAmounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ResourceAmounts::ZERO, |acc, x| acc + x)
    }
}

/// Placement metadata resolved from well-known node labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePlacement {
    pub zone: Option<String>,
    pub node_group: Option<String>,
    pub instance_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub name: String,
    pub ready: bool,
    /// `Ready` or `NotReady`
    pub status: String,
    pub roles: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub age: String,
    /// Kubelet version, or `Unknown`
    pub version: String,
    pub placement: NodePlacement,

    pub capacity: ResourceAmounts,
    pub allocatable: ResourceAmounts,
    /// Summed over every pod bound to this node
    pub requests: ResourceAmounts,
    pub limits: ResourceAmounts,
    /// Present only when the metrics source answered for this node
    pub usage: Option<ResourceAmounts>,

    pub pod_count: usize,
    pub pod_capacity: u32,
}

impl NodeRecord {
    pub fn cpu_request_percent(&self) -> f64 {
        percent(self.requests.cpu, self.allocatable.cpu)
    }

    pub fn memory_request_percent(&self) -> f64 {
        percent(self.requests.memory, self.allocatable.memory)
    }

    pub fn cpu_limit_percent(&self) -> f64 {
        percent(self.limits.cpu, self.allocatable.cpu)
    }

    pub fn memory_limit_percent(&self) -> f64 {
        percent(self.limits.memory, self.allocatable.memory)
    }

    pub fn cpu_usage_percent(&self) -> Option<f64> {
        self.usage.map(|u| percent(u.cpu, self.allocatable.cpu))
    }

    pub fn memory_usage_percent(&self) -> Option<f64> {
        self.usage.map(|u| percent(u.memory, self.allocatable.memory))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    /// `ready/total` over the pod's containers
    pub ready: String,
    pub status: String,
    pub restarts: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub age: String,
    pub ip: Option<String>,
    pub node: Option<String>,
    pub requests: ResourceAmounts,
    pub limits: ResourceAmounts,
    pub usage: Option<ResourceAmounts>,
}

impl PodRecord {
    /// Metrics lookup key.
    #[cfg(test)]
    pub fn key(&self) -> String {
        pod_key(&self.namespace, &self.name)
    }
}

pub fn pod_key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}
