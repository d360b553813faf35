/// Maps k8s-openapi objects → utilization records
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::core::client::kube_resources::{Node, ObjectMeta, Pod, PodSpec, Quantity};
use crate::core::util::format_util::FormatUtil;
use crate::core::util::quantity_util::{parse_optional_quantity, parse_quantity};
use crate::domain::utilization::model::{NodePlacement, NodeRecord, PodRecord, ResourceAmounts};

const ROLE_LABEL_PREFIX: &str = "node-role.kubernetes.io/";
const LEGACY_ROLE_LABEL: &str = "kubernetes.io/role";
const DEFAULT_ROLE: &str = "worker";
const UNKNOWN: &str = "Unknown";

/// Label keys per placement field, first match wins.
const ZONE_LABELS: &[&str] = &[
    "topology.kubernetes.io/zone",
    "failure-domain.beta.kubernetes.io/zone",
];
const NODE_GROUP_LABELS: &[&str] = &[
    "eks.amazonaws.com/nodegroup",
    "cloud.google.com/gke-nodepool",
    "kubernetes.azure.com/agentpool",
    "karpenter.sh/nodepool",
];
const INSTANCE_TYPE_LABELS: &[&str] = &[
    "node.kubernetes.io/instance-type",
    "beta.kubernetes.io/instance-type",
];

/// Per-node totals gathered from the pods bound to it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PodTotals {
    pub requests: ResourceAmounts,
    pub limits: ResourceAmounts,
    pub pod_count: usize,
}

impl PodTotals {
    pub fn add_pod(&mut self, pod: &Pod) {
        let (requests, limits) = pod_resources(pod.spec.as_ref());
        self.requests += requests;
        self.limits += limits;
        self.pod_count += 1;
    }
}

/// Parse the creation timestamp.
///
/// k8s `Time` serializes as RFC 3339, which keeps this independent of the
/// date library k8s-openapi wraps.
pub fn creation_time(meta: &ObjectMeta) -> Option<DateTime<Utc>> {
    let ts = meta.creation_timestamp.as_ref()?;
    let value = serde_json::to_value(ts).ok()?;
    DateTime::parse_from_rfc3339(value.as_str()?)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn amounts_from(map: Option<&BTreeMap<String, Quantity>>) -> ResourceAmounts {
    let get = |key: &str| parse_optional_quantity(map.and_then(|m| m.get(key)).map(|q| q.0.as_str()));

    ResourceAmounts::new(get("cpu"), get("memory"))
}

/// Sum container requests and limits; any missing level counts as zero.
pub fn pod_resources(spec: Option<&PodSpec>) -> (ResourceAmounts, ResourceAmounts) {
    let Some(spec) = spec else {
        return (ResourceAmounts::ZERO, ResourceAmounts::ZERO);
    };

    spec.containers
        .iter()
        .filter_map(|c| c.resources.as_ref())
        .fold(
            (ResourceAmounts::ZERO, ResourceAmounts::ZERO),
            |(requests, limits), res| {
                (
                    requests + amounts_from(res.requests.as_ref()),
                    limits + amounts_from(res.limits.as_ref()),
                )
            },
        )
}

/// Node name a pod is bound to, if scheduled.
pub fn pod_node_name(pod: &Pod) -> Option<&str> {
    pod.spec
        .as_ref()
        .and_then(|s| s.node_name.as_deref())
        .filter(|n| !n.is_empty())
}

pub fn node_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false)
}

pub fn node_roles(labels: Option<&BTreeMap<String, String>>) -> Vec<String> {
    let mut roles: Vec<String> = Vec::new();

    if let Some(labels) = labels {
        for (key, value) in labels {
            let role = if let Some(role) = key.strip_prefix(ROLE_LABEL_PREFIX) {
                role
            } else if key == LEGACY_ROLE_LABEL {
                value.as_str()
            } else {
                continue;
            };

            if !role.is_empty() && !roles.iter().any(|r| r == role) {
                roles.push(role.to_string());
            }
        }
    }

    if roles.is_empty() {
        roles.push(DEFAULT_ROLE.to_string());
    }
    roles
}

fn first_label(labels: Option<&BTreeMap<String, String>>, keys: &[&str]) -> Option<String> {
    let labels = labels?;
    keys.iter()
        .find_map(|k| labels.get(*k).filter(|v| !v.is_empty()))
        .cloned()
}

pub fn node_placement(labels: Option<&BTreeMap<String, String>>) -> NodePlacement {
    NodePlacement {
        zone: first_label(labels, ZONE_LABELS),
        node_group: first_label(labels, NODE_GROUP_LABELS),
        instance_type: first_label(labels, INSTANCE_TYPE_LABELS),
    }
}

/// Converts a Node plus the totals of its pods into a NodeRecord
pub fn map_node_to_record(
    node: &Node,
    totals: PodTotals,
    usage: Option<ResourceAmounts>,
    now: DateTime<Utc>,
) -> NodeRecord {
    let metadata = &node.metadata;
    let status = node.status.as_ref();
    let labels = metadata.labels.as_ref();

    let ready = node_ready(node);
    let created_at = creation_time(metadata);

    let version = status
        .and_then(|s| s.node_info.as_ref())
        .map(|info| info.kubelet_version.clone())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let capacity = status.and_then(|s| s.capacity.as_ref());
    let allocatable = status.and_then(|s| s.allocatable.as_ref());

    let pod_capacity = allocatable
        .or(capacity)
        .and_then(|m| m.get("pods"))
        .map(|q| parse_quantity(&q.0) as u32)
        .unwrap_or(0);

    NodeRecord {
        name: metadata.name.clone().unwrap_or_default(),
        ready,
        status: if ready { "Ready" } else { "NotReady" }.to_string(),
        roles: node_roles(labels),
        created_at,
        age: FormatUtil::age(created_at, now),
        version,
        placement: node_placement(labels),
        capacity: amounts_from(capacity),
        allocatable: amounts_from(allocatable),
        requests: totals.requests,
        limits: totals.limits,
        usage,
        pod_count: totals.pod_count,
        pod_capacity,
    }
}

/// Converts a Pod into a PodRecord
pub fn map_pod_to_record(pod: &Pod, usage: Option<ResourceAmounts>, now: DateTime<Utc>) -> PodRecord {
    let metadata = &pod.metadata;
    let status = pod.status.as_ref();
    let (requests, limits) = pod_resources(pod.spec.as_ref());

    let total_containers = pod.spec.as_ref().map(|s| s.containers.len()).unwrap_or(0);
    let statuses = status
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default();
    let ready_containers = statuses.iter().filter(|cs| cs.ready).count();
    let restarts = statuses
        .iter()
        .map(|cs| cs.restart_count.max(0) as u32)
        .fold(0u32, |acc, n| acc.saturating_add(n));

    let created_at = creation_time(metadata);

    PodRecord {
        name: metadata.name.clone().unwrap_or_default(),
        namespace: metadata.namespace.clone().unwrap_or_default(),
        ready: format!("{}/{}", ready_containers, total_containers),
        status: status
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        restarts,
        created_at,
        age: FormatUtil::age(created_at, now),
        ip: status.and_then(|s| s.pod_ip.clone()),
        node: pod_node_name(pod).map(str::to_string),
        requests,
        limits,
        usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn roles_come_from_role_labels() {
        let l = labels(&[
            ("node-role.kubernetes.io/control-plane", ""),
            ("node-role.kubernetes.io/master", ""),
            ("kubernetes.io/hostname", "n1"),
        ]);
        assert_eq!(node_roles(Some(&l)), vec!["control-plane", "master"]);
    }

    #[test]
    fn roles_default_to_worker() {
        assert_eq!(node_roles(None), vec!["worker"]);
        let l = labels(&[("node-role.kubernetes.io/", "")]);
        assert_eq!(node_roles(Some(&l)), vec!["worker"]);
    }

    #[test]
    fn legacy_role_label_is_read_from_value() {
        let l = labels(&[("kubernetes.io/role", "infra")]);
        assert_eq!(node_roles(Some(&l)), vec!["infra"]);
    }

    #[test]
    fn placement_fields_resolve_independently() {
        let l = labels(&[
            ("topology.kubernetes.io/zone", "eu-west-1a"),
            ("beta.kubernetes.io/instance-type", "m5.large"),
            ("unrelated/key", "ignored"),
        ]);
        let placement = node_placement(Some(&l));
        assert_eq!(placement.zone.as_deref(), Some("eu-west-1a"));
        assert_eq!(placement.node_group, None);
        assert_eq!(placement.instance_type.as_deref(), Some("m5.large"));
        assert_eq!(node_placement(None), NodePlacement::default());
    }

    #[test]
    fn empty_placement_label_falls_through() {
        let l = labels(&[
            ("topology.kubernetes.io/zone", ""),
            ("failure-domain.beta.kubernetes.io/zone", "zone-b"),
            ("eks.amazonaws.com/nodegroup", ""),
        ]);
        let placement = node_placement(Some(&l));
        assert_eq!(placement.zone.as_deref(), Some("zone-b"));
        assert_eq!(placement.node_group, None);
    }

    #[test]
    fn pod_resources_tolerate_missing_sections() {
        let pod: Pod = serde_json::from_value(json!({
            "metadata": { "name": "p", "namespace": "default" },
            "spec": {
                "containers": [
                    { "name": "no-resources" },
                    { "name": "requests-only", "resources": { "requests": { "cpu": "250m" } } },
                    { "name": "both", "resources": {
                        "requests": { "cpu": "1", "memory": "128Mi" },
                        "limits": { "memory": "256Mi" }
                    } },
                    { "name": "bad", "resources": { "requests": { "cpu": "lots" } } }
                ]
            }
        }))
        .unwrap();

        let (requests, limits) = pod_resources(pod.spec.as_ref());
        assert_eq!(requests.cpu, 1.25);
        assert_eq!(requests.memory, 128.0 * 1024.0 * 1024.0);
        assert_eq!(limits.cpu, 0.0);
        assert_eq!(limits.memory, 256.0 * 1024.0 * 1024.0);
        assert_eq!(pod_resources(None), (ResourceAmounts::ZERO, ResourceAmounts::ZERO));
    }

    #[test]
    fn maps_node_fields() {
        let node: Node = serde_json::from_value(json!({
            "metadata": {
                "name": "node-a",
                "creationTimestamp": "2024-01-01T00:00:00Z",
                "labels": { "topology.kubernetes.io/zone": "us-east-1b" }
            },
            "status": {
                "conditions": [
                    { "type": "MemoryPressure", "status": "False" },
                    { "type": "Ready", "status": "True" }
                ],
                "capacity": { "cpu": "4", "memory": "16Gi", "pods": "110" },
                "allocatable": { "cpu": "3800m", "memory": "15Gi", "pods": "110" },
                "nodeInfo": {
                    "architecture": "amd64", "bootID": "", "containerRuntimeVersion": "containerd://1.7",
                    "kernelVersion": "6.1", "kubeProxyVersion": "", "kubeletVersion": "v1.31.2",
                    "machineID": "", "operatingSystem": "linux", "osImage": "", "systemUUID": ""
                }
            }
        }))
        .unwrap();

        let now = DateTime::parse_from_rfc3339("2024-01-11T06:00:00Z").unwrap().with_timezone(&Utc);
        let record = map_node_to_record(&node, PodTotals::default(), None, now);

        assert_eq!(record.name, "node-a");
        assert!(record.ready);
        assert_eq!(record.status, "Ready");
        assert_eq!(record.roles, vec!["worker"]);
        assert_eq!(record.age, "10d");
        assert_eq!(record.version, "v1.31.2");
        assert_eq!(record.placement.zone.as_deref(), Some("us-east-1b"));
        assert_eq!(record.capacity.cpu, 4.0);
        assert!((record.allocatable.cpu - 3.8).abs() < 1e-9);
        assert_eq!(record.allocatable.memory, 15.0 * 1024.0 * 1024.0 * 1024.0);
        assert_eq!(record.pod_capacity, 110);
        assert_eq!(record.usage, None);
    }

    #[test]
    fn node_without_status_is_not_ready() {
        let node: Node = serde_json::from_value(json!({ "metadata": { "name": "bare" } })).unwrap();
        let record = map_node_to_record(&node, PodTotals::default(), None, Utc::now());
        assert!(!record.ready);
        assert_eq!(record.status, "NotReady");
        assert_eq!(record.version, "Unknown");
        assert_eq!(record.age, "Unknown");
        assert_eq!(record.allocatable, ResourceAmounts::ZERO);
    }

    #[test]
    fn maps_pod_readiness_and_restarts() {
        let pod: Pod = serde_json::from_value(json!({
            "metadata": { "name": "api-0", "namespace": "prod" },
            "spec": {
                "nodeName": "node-a",
                "containers": [ { "name": "api" }, { "name": "proxy" } ]
            },
            "status": {
                "phase": "Running",
                "podIP": "10.0.0.7",
                "containerStatuses": [
                    { "name": "api", "ready": true, "restartCount": 3, "image": "api", "imageID": "" },
                    { "name": "proxy", "ready": false, "restartCount": 1, "image": "proxy", "imageID": "" }
                ]
            }
        }))
        .unwrap();

        let record = map_pod_to_record(&pod, None, Utc::now());
        assert_eq!(record.ready, "1/2");
        assert_eq!(record.restarts, 4);
        assert_eq!(record.status, "Running");
        assert_eq!(record.ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(record.node.as_deref(), Some("node-a"));
        assert_eq!(record.key(), "prod/api-0");
    }

    #[test]
    fn pod_without_status_defaults() {
        let pod: Pod = serde_json::from_value(json!({
            "metadata": { "name": "pending", "namespace": "default" },
            "spec": { "containers": [ { "name": "c" } ] }
        }))
        .unwrap();

        let record = map_pod_to_record(&pod, None, Utc::now());
        assert_eq!(record.ready, "0/1");
        assert_eq!(record.status, "Unknown");
        assert_eq!(record.restarts, 0);
        assert_eq!(record.ip, None);
        assert_eq!(record.node, None);
    }

    #[test]
    fn restart_total_saturates() {
        let pod: Pod = serde_json::from_value(json!({
            "metadata": { "name": "crashy", "namespace": "default" },
            "spec": { "containers": [ { "name": "a" }, { "name": "b" }, { "name": "c" } ] },
            "status": {
                "containerStatuses": [
                    { "name": "a", "ready": true, "restartCount": 2147483647, "image": "x", "imageID": "" },
                    { "name": "b", "ready": true, "restartCount": 2147483647, "image": "x", "imageID": "" },
                    { "name": "c", "ready": true, "restartCount": 2147483647, "image": "x", "imageID": "" }
                ]
            }
        }))
        .unwrap();

        let record = map_pod_to_record(&pod, None, Utc::now());
        assert_eq!(record.restarts, u32::MAX);
        assert_eq!(record.ready, "3/3");
    }
}
