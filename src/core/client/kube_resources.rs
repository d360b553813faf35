/// Re-export the Kubernetes resource types the dashboard reads from k8s-openapi

pub use k8s_openapi::api::core::v1::{Node, Pod, PodSpec};

pub use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
