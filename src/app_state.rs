use std::sync::Arc;
use std::time::Instant;

use kube::Client;

use crate::config::AppConfig;
use crate::core::client::cluster_source::{ClusterSource, KubeClusterSource};
use crate::core::state::runtime::k8s::k8s_runtime_state::K8sRuntimeState;
use crate::core::state::runtime::k8s::k8s_runtime_state_manager::K8sRuntimeStateManager;
use crate::core::state::runtime::k8s::k8s_runtime_state_repository::K8sRuntimeStateRepository;
use crate::scheduler::refresh_controller::RefreshController;
use crate::scheduler::refresh_scheduler::RefreshScheduler;

/// Long-lived handles shared by the dashboard loop.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub source: Arc<dyn ClusterSource>,
    pub runtime_state: Arc<K8sRuntimeStateRepository>,
}

pub fn build_app_state(config: AppConfig, client: Client) -> AppState {
    build_app_state_with_source(config, Arc::new(KubeClusterSource::new(client)))
}

pub fn build_app_state_with_source(config: AppConfig, source: Arc<dyn ClusterSource>) -> AppState {
    let initial = K8sRuntimeState::new(config.auto_refresh);
    AppState {
        runtime_state: K8sRuntimeStateRepository::new(initial).shared(),
        source,
        config,
    }
}

impl AppState {
    /// Wire a refresh controller over the shared state; the auto-refresh clock starts at `now`.
    pub fn refresh_controller(&self, now: Instant) -> RefreshController<K8sRuntimeStateRepository> {
        let scheduler = RefreshScheduler::new(self.config.refresh_interval, self.config.auto_refresh, now);
        RefreshController::new(
            self.source.clone(),
            scheduler,
            K8sRuntimeStateManager::new(self.runtime_state.clone()),
            self.config.fetch_timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::cluster_source::mock::MockClusterSource;
    use crate::core::state::runtime::k8s::k8s_runtime_state_repository_trait::K8sRuntimeStateRepositoryTrait;

    #[tokio::test]
    async fn initial_state_follows_config() {
        let config = AppConfig {
            auto_refresh: false,
            ..AppConfig::default()
        };
        let state = build_app_state_with_source(config, Arc::new(MockClusterSource::default()));

        assert!(!state.runtime_state.get().await.auto_refresh);

        let controller = state.refresh_controller(Instant::now());
        assert!(!controller.scheduler().auto_refresh());
        assert_eq!(controller.scheduler().pending_tick(), None);
    }
}
