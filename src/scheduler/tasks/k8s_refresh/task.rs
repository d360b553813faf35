use std::time::Duration;

use chrono::Utc;
use futures::future::try_join;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::core::client::cluster_source::ClusterSource;
use crate::domain::utilization::model::{NodeRecord, PodRecord};
use crate::domain::utilization::service::snapshot_service::{build_node_snapshot, build_pod_snapshot};
use crate::errors::{k8s_error, AppError};

/// Full discovery cycle: list nodes and pods, read node metrics best-effort,
/// and build a fresh node snapshot.
///
/// Listing errors (or a listing that outlives `limit`) fail the cycle.
/// Metrics errors never do.
pub async fn refresh_cluster<S>(source: &S, limit: Duration) -> Result<Vec<NodeRecord>, AppError>
where
    S: ClusterSource + ?Sized,
{
    info!("Refreshing Kubernetes node utilization...");

    // ---------------------------
    // 1. LOAD NODES + PODS, METRICS ALONGSIDE
    // ---------------------------
    let listing = timeout(limit, try_join(source.list_nodes(), source.list_pods()));
    let metrics = timeout(limit, source.node_metrics());
    let (listing, metrics) = tokio::join!(listing, metrics);

    let (nodes, pods) = listing
        .map_err(|_| AppError::Timeout(limit))?
        .map_err(k8s_error)?;

    let node_metrics = match metrics {
        Ok(Ok(m)) => Some(m),
        Ok(Err(e)) => {
            debug!("Node metrics unavailable: {:#}", e);
            None
        }
        Err(_) => {
            warn!("Node metrics timed out after {}s", limit.as_secs());
            None
        }
    };

    // ---------------------------
    // 2. BUILD SNAPSHOT
    // ---------------------------
    let records = build_node_snapshot(&nodes, &pods, node_metrics.as_ref(), Utc::now());

    info!(
        "K8s refresh complete: {} nodes, {} pods, metrics {}",
        records.len(),
        pods.len(),
        if node_metrics.is_some() { "on" } else { "off" }
    );
    Ok(records)
}

/// Pods bound to one node, with pod metrics best-effort.
pub async fn refresh_pods<S>(source: &S, node_name: &str, limit: Duration) -> Result<Vec<PodRecord>, AppError>
where
    S: ClusterSource + ?Sized,
{
    debug!("Loading pods for node '{}'", node_name);

    let listing = timeout(limit, source.list_pods_on_node(node_name));
    let metrics = timeout(limit, source.pod_metrics());
    let (listing, metrics) = tokio::join!(listing, metrics);

    let pods = listing
        .map_err(|_| AppError::Timeout(limit))?
        .map_err(k8s_error)?;

    let pod_metrics = match metrics {
        Ok(Ok(m)) => Some(m),
        Ok(Err(e)) => {
            debug!("Pod metrics unavailable: {:#}", e);
            None
        }
        Err(_) => None,
    };

    let records = build_pod_snapshot(&pods, pod_metrics.as_ref(), node_name, Utc::now());
    debug!("Loaded {} pod(s) for node '{}'", records.len(), node_name);
    Ok(records)
}
