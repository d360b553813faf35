use std::sync::Arc;

use crate::core::state::runtime::k8s::k8s_runtime_state::{K8sRuntimeState, StateEvent};
use crate::core::state::runtime::k8s::k8s_runtime_state_repository_trait::K8sRuntimeStateRepositoryTrait;

pub struct K8sRuntimeStateManager<R: K8sRuntimeStateRepositoryTrait> {
    pub(crate) repo: Arc<R>,
}

impl<R: K8sRuntimeStateRepositoryTrait> K8sRuntimeStateManager<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Current snapshot for rendering.
    pub async fn snapshot(&self) -> Arc<K8sRuntimeState> {
        self.repo.get().await
    }

    /// Run an event through the reducer and publish the result.
    pub async fn apply(&self, event: StateEvent) {
        self.repo.update(move |state| state.reduce(event)).await;
    }
}
