use std::sync::Arc;
use async_trait::async_trait;

use crate::core::state::runtime::k8s::k8s_runtime_state::K8sRuntimeState;

#[async_trait]
pub trait K8sRuntimeStateRepositoryTrait: Send + Sync {
    /// Return the current snapshot as an Arc; readers never see a partial update.
    async fn get(&self) -> Arc<K8sRuntimeState>;

    /// Derive the next state from the current one and swap it in.
    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&K8sRuntimeState) -> K8sRuntimeState + Send;
}
