use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::client::kube_resources::{Node, Pod};
use crate::core::client::mappers::{map_node_to_record, map_pod_to_record, pod_node_name, PodTotals};
use crate::core::client::metrics::{NodeUsageMap, PodUsageMap};
use crate::domain::utilization::model::{pod_key, NodeRecord, PodRecord};

/// Build one record per node from a full listing of nodes and pods.
///
/// `node_metrics` is `None` when the metrics source was unavailable; every
/// record is still produced, with usage left absent.
pub fn build_node_snapshot(
    nodes: &[Node],
    pods: &[Pod],
    node_metrics: Option<&NodeUsageMap>,
    now: DateTime<Utc>,
) -> Vec<NodeRecord> {
    let mut totals_by_node: HashMap<&str, PodTotals> = HashMap::new();
    for pod in pods {
        if let Some(node_name) = pod_node_name(pod) {
            totals_by_node.entry(node_name).or_default().add_pod(pod);
        }
    }

    let records: Vec<NodeRecord> = nodes
        .iter()
        .map(|node| {
            let name = node.metadata.name.as_deref().unwrap_or_default();
            let totals = totals_by_node.get(name).copied().unwrap_or_default();
            let usage = node_metrics.and_then(|m| m.get(name)).copied();
            map_node_to_record(node, totals, usage, now)
        })
        .collect();

    debug!(
        "Built node snapshot: {} node(s), {} pod(s), metrics {}",
        records.len(),
        pods.len(),
        if node_metrics.is_some() { "available" } else { "unavailable" }
    );
    records
}

/// Build pod records for the pods bound to `node_name`, ordered by namespace then name.
pub fn build_pod_snapshot(
    pods: &[Pod],
    pod_metrics: Option<&PodUsageMap>,
    node_name: &str,
    now: DateTime<Utc>,
) -> Vec<PodRecord> {
    let mut records: Vec<PodRecord> = pods
        .iter()
        .filter(|pod| pod_node_name(pod) == Some(node_name))
        .map(|pod| {
            let key = pod_key(
                pod.metadata.namespace.as_deref().unwrap_or_default(),
                pod.metadata.name.as_deref().unwrap_or_default(),
            );
            let usage = pod_metrics.and_then(|m| m.get(&key)).copied();
            map_pod_to_record(pod, usage, now)
        })
        .collect();

    records.sort_by(|a, b| a.namespace.cmp(&b.namespace).then_with(|| a.name.cmp(&b.name)));
    records
}
