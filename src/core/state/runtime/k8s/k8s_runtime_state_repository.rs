use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::state::runtime::k8s::k8s_runtime_state::K8sRuntimeState;
use crate::core::state::runtime::k8s::k8s_runtime_state_repository_trait::K8sRuntimeStateRepositoryTrait;

pub struct K8sRuntimeStateRepository {
    state: Arc<RwLock<Arc<K8sRuntimeState>>>,
}

impl K8sRuntimeStateRepository {
    pub fn new(initial: K8sRuntimeState) -> Self {
        Self {
            state: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for K8sRuntimeStateRepository {
    fn default() -> Self {
        Self::new(K8sRuntimeState::default())
    }
}

#[async_trait::async_trait]
impl K8sRuntimeStateRepositoryTrait for K8sRuntimeStateRepository {
    /// Return the shared Arc snapshot (zero cost).
    async fn get(&self) -> Arc<K8sRuntimeState> {
        self.state.read().await.clone()
    }

    async fn update<F>(&self, f: F)
    where
        F: FnOnce(&K8sRuntimeState) -> K8sRuntimeState + Send,
    {
        let mut guard = self.state.write().await;
        let next = f(&**guard);
        *guard = Arc::new(next);
    }
}
