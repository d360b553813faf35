pub mod k8s_runtime_state;
pub mod k8s_runtime_state_manager;
pub mod k8s_runtime_state_repository;
pub mod k8s_runtime_state_repository_trait;
