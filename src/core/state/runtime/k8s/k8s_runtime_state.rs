use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::utilization::model::{NodeRecord, PodRecord};
use crate::domain::utilization::service::sort_service::{sort_nodes, SortKey, SortState};

/// Everything that can change the dashboard state.
#[derive(Debug, Clone)]
pub enum StateEvent {
    ClusterRefreshed {
        nodes: Vec<NodeRecord>,
        at: DateTime<Utc>,
    },
    ClusterRefreshFailed {
        error: String,
        at: DateTime<Utc>,
    },
    NodeSelected(String),
    SelectionCleared,
    PodsLoaded {
        node: String,
        pods: Vec<PodRecord>,
    },
    PodsFailed {
        node: String,
        error: String,
    },
    SortSelected(SortKey),
    SortCycled,
    AutoRefreshToggled(bool),
}

/// In-memory snapshot the dashboard renders from.
///
/// This state:
/// - lives only in memory (NOT persisted)
/// - is never edited in place: every event yields a new value
/// - shares record collections through `Arc`, so swaps are cheap
#[derive(Debug, Clone)]
pub struct K8sRuntimeState {
    // ===== Records =====
    pub nodes: Arc<Vec<NodeRecord>>,
    /// Pods of `selected_node` only
    pub pods: Arc<Vec<PodRecord>>,

    // ===== View =====
    pub selected_node: Option<String>,
    pub pods_loading: bool,
    pub sort: SortState,
    pub auto_refresh: bool,

    // ===== Timestamps / errors =====
    pub last_updated_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub pods_error: Option<String>,
}

impl Default for K8sRuntimeState {
    fn default() -> Self {
        Self {
            nodes: Arc::new(Vec::new()),
            pods: Arc::new(Vec::new()),

            selected_node: None,
            pods_loading: false,
            sort: SortState::default(),
            auto_refresh: true,

            last_updated_at: None,
            last_error: None,
            last_error_at: None,
            pods_error: None,
        }
    }
}

impl K8sRuntimeState {
    pub fn new(auto_refresh: bool) -> Self {
        Self {
            auto_refresh,
            ..Default::default()
        }
    }

    /// Pure transition: old state + event → new state.
    pub fn reduce(&self, event: StateEvent) -> K8sRuntimeState {
        let mut next = self.clone();

        match event {
            StateEvent::ClusterRefreshed { nodes, at } => {
                next.nodes = Arc::new(nodes);
                next.last_updated_at = Some(at);
                next.last_error = None;
                next.last_error_at = None;
            }
            StateEvent::ClusterRefreshFailed { error, at } => {
                // previous records stay visible
                next.last_error = Some(error);
                next.last_error_at = Some(at);
            }
            StateEvent::NodeSelected(node) => {
                if next.selected_node.as_deref() != Some(node.as_str()) {
                    next.pods = Arc::new(Vec::new());
                }
                next.selected_node = Some(node);
                next.pods_loading = true;
                next.pods_error = None;
            }
            StateEvent::SelectionCleared => {
                next.selected_node = None;
                next.pods = Arc::new(Vec::new());
                next.pods_loading = false;
                next.pods_error = None;
            }
            StateEvent::PodsLoaded { node, pods } => {
                if next.selected_node.as_deref() == Some(node.as_str()) {
                    next.pods = Arc::new(pods);
                    next.pods_loading = false;
                    next.pods_error = None;
                }
            }
            StateEvent::PodsFailed { node, error } => {
                if next.selected_node.as_deref() == Some(node.as_str()) {
                    next.pods_loading = false;
                    next.pods_error = Some(error);
                }
            }
            StateEvent::SortSelected(key) => {
                next.sort = next.sort.select(key);
            }
            StateEvent::SortCycled => {
                next.sort = next.sort.cycle();
            }
            StateEvent::AutoRefreshToggled(enabled) => {
                next.auto_refresh = enabled;
            }
        }

        next
    }

    /// True when the last cluster refresh failed and the records are from an older cycle.
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    /// Nodes in current display order.
    pub fn sorted_nodes(&self) -> Vec<&NodeRecord> {
        sort_nodes(&self.nodes, self.sort)
    }

    /// Node name at a display row, resolved against the sorted view.
    pub fn node_at_row(&self, row: usize) -> Option<String> {
        self.sorted_nodes().get(row).map(|n| n.name.clone())
    }
}
