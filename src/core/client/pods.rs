use anyhow::{Context, Result};
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::debug;

use crate::core::client::kube_resources::Pod;

/// Fetch all pods in the cluster
pub async fn fetch_pods(client: &Client) -> Result<Vec<Pod>> {
    let pods: Api<Pod> = Api::all(client.clone());
    let pod_list = pods
        .list(&ListParams::default())
        .await
        .context("failed to list pods")?;

    debug!("Discovered {} pod(s)", pod_list.items.len());
    Ok(pod_list.items)
}

/// Fetch pods scheduled on a specific node
pub async fn fetch_pods_by_node(client: &Client, node_name: &str) -> Result<Vec<Pod>> {
    let pods: Api<Pod> = Api::all(client.clone());
    let field_selector = format!("spec.nodeName={}", node_name);
    let lp = ListParams::default().fields(&field_selector);
    let pod_list = pods
        .list(&lp)
        .await
        .with_context(|| format!("failed to list pods on node '{node_name}'"))?;

    debug!("Found {} pod(s) on node '{}'", pod_list.items.len(), node_name);
    Ok(pod_list.items)
}
