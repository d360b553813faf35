use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info};

use crate::core::client::cluster_source::ClusterSource;
use crate::core::state::runtime::k8s::k8s_runtime_state::{K8sRuntimeState, StateEvent};
use crate::core::state::runtime::k8s::k8s_runtime_state_manager::K8sRuntimeStateManager;
use crate::core::state::runtime::k8s::k8s_runtime_state_repository_trait::K8sRuntimeStateRepositoryTrait;
use crate::domain::utilization::model::{NodeRecord, PodRecord};
use crate::domain::utilization::service::sort_service::SortKey;
use crate::errors::AppError;
use crate::scheduler::refresh_scheduler::{RefreshCommand, RefreshScheduler, RefreshTrigger, SchedulerPhase};
use crate::scheduler::status_line::status_line;
use crate::scheduler::tasks::k8s_refresh::task::{refresh_cluster, refresh_pods};

/// Result of a background fetch, applied only by the controlling loop.
#[derive(Debug)]
pub enum RefreshMessage {
    ClusterDone(Result<Vec<NodeRecord>, AppError>),
    PodsDone {
        node: String,
        generation: u64,
        result: Result<Vec<PodRecord>, AppError>,
    },
}

/// Owns the scheduler and the snapshot; spawns fetches and applies their results.
pub struct RefreshController<R: K8sRuntimeStateRepositoryTrait> {
    source: Arc<dyn ClusterSource>,
    scheduler: RefreshScheduler,
    state: K8sRuntimeStateManager<R>,
    fetch_timeout: Duration,
    tx: UnboundedSender<RefreshMessage>,
    rx: UnboundedReceiver<RefreshMessage>,
}

impl<R: K8sRuntimeStateRepositoryTrait> RefreshController<R> {
    pub fn new(
        source: Arc<dyn ClusterSource>,
        scheduler: RefreshScheduler,
        state: K8sRuntimeStateManager<R>,
        fetch_timeout: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            scheduler,
            state,
            fetch_timeout,
            tx,
            rx,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.scheduler.phase()
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub async fn snapshot(&self) -> Arc<K8sRuntimeState> {
        self.state.snapshot().await
    }

    pub async fn status_line(&self, cursor: Option<usize>) -> String {
        let snapshot = self.state.snapshot().await;
        status_line(&snapshot, self.phase(), cursor)
    }

    // ===============================================
    // Inputs
    // ===============================================

    pub fn trigger_refresh(&mut self, trigger: RefreshTrigger) {
        if let Some(cmd) = self.scheduler.request_refresh(trigger) {
            self.dispatch(cmd);
        }
    }

    /// Fire the automatic refresh if its tick is due.
    pub fn tick(&mut self, now: Instant) {
        if let Some(cmd) = self.scheduler.poll_timer(now) {
            self.dispatch(cmd);
        }
    }

    pub async fn select_node(&mut self, node: String) {
        info!("Selected node '{}'", node);
        self.state.apply(StateEvent::NodeSelected(node.clone())).await;
        let cmd = self.scheduler.select_node(node);
        self.dispatch(cmd);
    }

    pub async fn clear_selection(&mut self) {
        self.scheduler.clear_selection();
        self.state.apply(StateEvent::SelectionCleared).await;
    }

    pub async fn select_sort(&mut self, key: SortKey) {
        self.state.apply(StateEvent::SortSelected(key)).await;
    }

    pub async fn cycle_sort(&mut self) {
        self.state.apply(StateEvent::SortCycled).await;
    }

    pub async fn toggle_auto_refresh(&mut self, now: Instant) {
        let enabled = !self.scheduler.auto_refresh();
        self.scheduler.set_auto_refresh(enabled, now);
        self.state.apply(StateEvent::AutoRefreshToggled(enabled)).await;
        info!("Auto-refresh {}", if enabled { "enabled" } else { "disabled" });
    }

    // ===============================================
    // Results
    // ===============================================

    /// Apply every finished fetch without blocking. Returns how many were handled.
    pub async fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.handle(msg).await;
            handled += 1;
        }
        handled
    }

    /// Wait for the next finished fetch and apply it.
    #[cfg(test)]
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(msg) => {
                self.handle(msg).await;
                true
            }
            None => false,
        }
    }

    async fn handle(&mut self, msg: RefreshMessage) {
        match msg {
            RefreshMessage::ClusterDone(Ok(nodes)) => {
                self.state
                    .apply(StateEvent::ClusterRefreshed { nodes, at: Utc::now() })
                    .await;
                if let Some(cmd) = self.scheduler.complete_refresh(true) {
                    self.dispatch(cmd);
                }
            }
            RefreshMessage::ClusterDone(Err(e)) => {
                error!("Cluster refresh failed: {}", e);
                self.state
                    .apply(StateEvent::ClusterRefreshFailed {
                        error: e.to_string(),
                        at: Utc::now(),
                    })
                    .await;
                self.scheduler.complete_refresh(false);
            }
            RefreshMessage::PodsDone { node, generation, result } => {
                if !self.scheduler.accepts_pods(generation) {
                    debug!(
                        "Discarding pods for '{}' (generation {} superseded by {})",
                        node,
                        generation,
                        self.scheduler.pod_generation()
                    );
                    return;
                }

                let event = match result {
                    Ok(pods) => StateEvent::PodsLoaded { node, pods },
                    Err(e) => {
                        error!("Pod refresh for '{}' failed: {}", node, e);
                        StateEvent::PodsFailed { node, error: e.to_string() }
                    }
                };
                self.state.apply(event).await;
            }
        }
    }

    fn dispatch(&self, cmd: RefreshCommand) {
        let source = self.source.clone();
        let tx = self.tx.clone();
        let limit = self.fetch_timeout;

        match cmd {
            RefreshCommand::FetchCluster { trigger } => {
                debug!("Dispatching cluster refresh ({:?})", trigger);
                tokio::spawn(async move {
                    let result = refresh_cluster(source.as_ref(), limit).await;
                    // receiver gone means the app is shutting down
                    let _ = tx.send(RefreshMessage::ClusterDone(result));
                });
            }
            RefreshCommand::FetchPods { node, generation } => {
                debug!("Dispatching pod refresh for '{}' (generation {})", node, generation);
                tokio::spawn(async move {
                    let result = refresh_pods(source.as_ref(), &node, limit).await;
                    let _ = tx.send(RefreshMessage::PodsDone { node, generation, result });
                });
            }
        }
    }
}
