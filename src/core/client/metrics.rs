//! `metrics.k8s.io/v1beta1` resources served by metrics-server.
//!
//! kube-rs ships no types for the metrics API, so the two list endpoints the
//! dashboard needs are declared here as custom k8s-openapi resources.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use kube::api::ListParams;
use kube::{Api, Client};
use serde::Deserialize;
use tracing::debug;

use crate::core::client::kube_resources::{ObjectMeta, Quantity};
use crate::core::util::quantity_util::parse_optional_quantity;
use crate::domain::utilization::model::{pod_key, ResourceAmounts};

/// Live usage keyed by node name.
pub type NodeUsageMap = HashMap<String, ResourceAmounts>;

/// Live usage keyed by `namespace/name`.
pub type PodUsageMap = HashMap<String, ResourceAmounts>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeMetrics {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub usage: BTreeMap<String, Quantity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerMetrics {
    pub name: String,
    #[serde(default)]
    pub usage: BTreeMap<String, Quantity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodMetrics {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub containers: Vec<ContainerMetrics>,
}

impl k8s_openapi::Resource for NodeMetrics {
    const API_VERSION: &'static str = "metrics.k8s.io/v1beta1";
    const GROUP: &'static str = "metrics.k8s.io";
    const KIND: &'static str = "NodeMetrics";
    const VERSION: &'static str = "v1beta1";
    const URL_PATH_SEGMENT: &'static str = "nodes";
    type Scope = k8s_openapi::ClusterResourceScope;
}

impl k8s_openapi::Metadata for NodeMetrics {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &Self::Ty {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Self::Ty {
        &mut self.metadata
    }
}

impl k8s_openapi::Resource for PodMetrics {
    const API_VERSION: &'static str = "metrics.k8s.io/v1beta1";
    const GROUP: &'static str = "metrics.k8s.io";
    const KIND: &'static str = "PodMetrics";
    const VERSION: &'static str = "v1beta1";
    const URL_PATH_SEGMENT: &'static str = "pods";
    type Scope = k8s_openapi::NamespaceResourceScope;
}

impl k8s_openapi::Metadata for PodMetrics {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &Self::Ty {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Self::Ty {
        &mut self.metadata
    }
}

fn usage_amounts(usage: &BTreeMap<String, Quantity>) -> ResourceAmounts {
    ResourceAmounts::new(
        parse_optional_quantity(usage.get("cpu").map(|q| q.0.as_str())),
        parse_optional_quantity(usage.get("memory").map(|q| q.0.as_str())),
    )
}

/// Index node metrics by node name.
pub fn node_usage_map(items: &[NodeMetrics]) -> NodeUsageMap {
    items
        .iter()
        .filter_map(|m| {
            let name = m.metadata.name.clone()?;
            Some((name, usage_amounts(&m.usage)))
        })
        .collect()
}

/// Index pod metrics by `namespace/name`, summing container usage.
pub fn pod_usage_map(items: &[PodMetrics]) -> PodUsageMap {
    items
        .iter()
        .filter_map(|m| {
            let name = m.metadata.name.as_deref()?;
            let namespace = m.metadata.namespace.as_deref().unwrap_or_default();
            let total = m.containers.iter().map(|c| usage_amounts(&c.usage)).sum();
            Some((pod_key(namespace, name), total))
        })
        .collect()
}

/// Fetch live usage for every node from metrics-server
pub async fn fetch_node_metrics(client: &Client) -> Result<Vec<NodeMetrics>> {
    let api: Api<NodeMetrics> = Api::all(client.clone());
    let list = api.list(&ListParams::default()).await?;

    debug!("Fetched metrics for {} node(s)", list.items.len());
    Ok(list.items)
}

/// Fetch live usage for every pod in every namespace
pub async fn fetch_pod_metrics(client: &Client) -> Result<Vec<PodMetrics>> {
    let api: Api<PodMetrics> = Api::all(client.clone());
    let list = api.list(&ListParams::default()).await?;

    debug!("Fetched metrics for {} pod(s)", list.items.len());
    Ok(list.items)
}
