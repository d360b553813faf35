// Kube-rs based Kubernetes client
pub mod cluster_source;
pub mod kube_client;
pub mod kube_resources;
pub mod mappers;
pub mod metrics;
pub mod nodes;
pub mod pods;
