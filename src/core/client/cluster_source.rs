use anyhow::Result;
use async_trait::async_trait;
use kube::Client;

use crate::core::client::kube_resources::{Node, Pod};
use crate::core::client::metrics::{
    fetch_node_metrics, fetch_pod_metrics, node_usage_map, pod_usage_map, NodeUsageMap, PodUsageMap,
};
use crate::core::client::nodes::fetch_nodes;
use crate::core::client::pods::{fetch_pods, fetch_pods_by_node};

/// Read-only view of the control plane and its optional metrics source.
#[async_trait]
pub trait ClusterSource: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    async fn list_pods(&self) -> Result<Vec<Pod>>;

    async fn list_pods_on_node(&self, node_name: &str) -> Result<Vec<Pod>>;

    /// Errors here are expected when metrics-server is not deployed.
    async fn node_metrics(&self) -> Result<NodeUsageMap>;

    async fn pod_metrics(&self) -> Result<PodUsageMap>;
}

/// `ClusterSource` backed by the kube-rs client.
#[derive(Clone)]
pub struct KubeClusterSource {
    client: Client,
}

impl KubeClusterSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterSource for KubeClusterSource {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        fetch_nodes(&self.client).await
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        fetch_pods(&self.client).await
    }

    async fn list_pods_on_node(&self, node_name: &str) -> Result<Vec<Pod>> {
        fetch_pods_by_node(&self.client, node_name).await
    }

    async fn node_metrics(&self) -> Result<NodeUsageMap> {
        let items = fetch_node_metrics(&self.client).await?;
        Ok(node_usage_map(&items))
    }

    async fn pod_metrics(&self) -> Result<PodUsageMap> {
        let items = fetch_pod_metrics(&self.client).await?;
        Ok(pod_usage_map(&items))
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::ClusterSource;
    use crate::core::client::kube_resources::{Node, Pod};
    use crate::core::client::mappers::pod_node_name;
    use crate::core::client::metrics::{NodeUsageMap, PodUsageMap};

    /// In-memory cluster with optional gates to hold a fetch open.
    #[derive(Default)]
    pub struct MockClusterSource {
        pub nodes: Mutex<Vec<Node>>,
        pub pods: Mutex<Vec<Pod>>,
        /// `None` simulates metrics-server missing
        pub node_metrics: Mutex<Option<NodeUsageMap>>,
        pub pod_metrics: Mutex<Option<PodUsageMap>>,
        pub fail_listing: AtomicBool,
        pub cluster_gate: Mutex<Option<Arc<Notify>>>,
        pub pod_gates: Mutex<HashMap<String, Arc<Notify>>>,
        pub list_nodes_calls: AtomicUsize,
    }

    impl MockClusterSource {
        pub fn gate_cluster(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.cluster_gate.lock().unwrap() = Some(gate.clone());
            gate
        }

        pub fn gate_pods(&self, node: &str) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.pod_gates.lock().unwrap().insert(node.to_string(), gate.clone());
            gate
        }
    }

    #[async_trait]
    impl ClusterSource for MockClusterSource {
        async fn list_nodes(&self) -> Result<Vec<Node>> {
            self.list_nodes_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.cluster_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if self.fail_listing.load(Ordering::SeqCst) {
                return Err(anyhow!("connection refused").context("failed to list nodes"));
            }
            Ok(self.nodes.lock().unwrap().clone())
        }

        async fn list_pods(&self) -> Result<Vec<Pod>> {
            Ok(self.pods.lock().unwrap().clone())
        }

        async fn list_pods_on_node(&self, node_name: &str) -> Result<Vec<Pod>> {
            let gate = self.pod_gates.lock().unwrap().get(node_name).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            Ok(self
                .pods
                .lock()
                .unwrap()
                .iter()
                .filter(|p| pod_node_name(p) == Some(node_name))
                .cloned()
                .collect())
        }

        async fn node_metrics(&self) -> Result<NodeUsageMap> {
            self.node_metrics
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| anyhow!("the server could not find the requested resource"))
        }

        async fn pod_metrics(&self) -> Result<PodUsageMap> {
            self.pod_metrics
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| anyhow!("the server could not find the requested resource"))
        }
    }
}
