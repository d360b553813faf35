use anyhow::{Context, Result};
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::debug;

use crate::core::client::kube_resources::Node;

/// Fetch all nodes in the cluster
pub async fn fetch_nodes(client: &Client) -> Result<Vec<Node>> {
    let nodes: Api<Node> = Api::all(client.clone());
    let node_list = nodes
        .list(&ListParams::default())
        .await
        .context("failed to list nodes")?;

    debug!("Discovered {} node(s)", node_list.items.len());
    Ok(node_list.items)
}
