use chrono::{DateTime, Local, Utc};

use crate::core::state::runtime::k8s::k8s_runtime_state::K8sRuntimeState;
use crate::scheduler::refresh_scheduler::{RefreshTrigger, SchedulerPhase};

fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Human-readable status for the bottom bar.
///
/// `cursor` is the highlighted node row, if any.
pub fn status_line(state: &K8sRuntimeState, phase: SchedulerPhase, cursor: Option<usize>) -> String {
    if let SchedulerPhase::Polling { trigger } = phase {
        return match trigger {
            RefreshTrigger::Auto => "Auto-refreshing data...".to_string(),
            RefreshTrigger::Manual => "Refreshing data...".to_string(),
        };
    }

    if let Some(error) = &state.last_error {
        let since = state
            .last_updated_at
            .map(clock)
            .unwrap_or_else(|| "never".to_string());
        return format!("Error: {} | showing data from {} (stale)", error, since);
    }

    if let Some(node) = &state.selected_node {
        if state.pods_loading {
            return format!("Loading pods for {}...", node);
        }
        if let Some(error) = &state.pods_error {
            return format!("Error fetching pods for {}: {}", node, error);
        }
    }

    let Some(updated) = state.last_updated_at else {
        return "Initializing...".to_string();
    };

    let row = cursor
        .filter(|c| *c < state.nodes.len())
        .map(|c| c + 1)
        .unwrap_or(0);
    let auto = if state.auto_refresh { " [AUTO]" } else { "" };

    format!(
        "Updated: {} | Nodes: {}/{} | Pods: {} | Sort: {}{}",
        clock(updated),
        row,
        state.nodes.len(),
        state.pods.len(),
        state.sort.label(),
        auto
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::k8s::k8s_runtime_state::StateEvent;
    use crate::domain::utilization::service::sort_service::SortKey;

    fn refreshed(at: DateTime<Utc>) -> K8sRuntimeState {
        K8sRuntimeState::default().reduce(StateEvent::ClusterRefreshed { nodes: Vec::new(), at })
    }

    #[test]
    fn polling_phase_wins() {
        let state = refreshed(Utc::now());
        let manual = SchedulerPhase::Polling { trigger: RefreshTrigger::Manual };
        let auto = SchedulerPhase::Polling { trigger: RefreshTrigger::Auto };
        assert_eq!(status_line(&state, manual, None), "Refreshing data...");
        assert_eq!(status_line(&state, auto, None), "Auto-refreshing data...");
    }

    #[test]
    fn idle_line_reports_time_counts_sort_and_auto() {
        let at = Utc::now();
        let state = refreshed(at).reduce(StateEvent::SortSelected(SortKey::CpuPercent));
        let line = status_line(&state, SchedulerPhase::Idle, Some(0));
        assert_eq!(
            line,
            format!("Updated: {} | Nodes: 0/0 | Pods: 0 | Sort: CPU % (Desc) [AUTO]", clock(at))
        );

        let manual_only = state.reduce(StateEvent::AutoRefreshToggled(false));
        assert!(!status_line(&manual_only, SchedulerPhase::Idle, None).contains("[AUTO]"));
    }

    #[test]
    fn failure_names_error_and_staleness() {
        let at = Utc::now();
        let state = refreshed(at).reduce(StateEvent::ClusterRefreshFailed {
            error: "K8s API error: boom".to_string(),
            at: Utc::now(),
        });
        assert_eq!(
            status_line(&state, SchedulerPhase::Idle, None),
            format!("Error: K8s API error: boom | showing data from {} (stale)", clock(at))
        );
    }

    #[test]
    fn before_first_refresh() {
        let state = K8sRuntimeState::default();
        assert_eq!(status_line(&state, SchedulerPhase::Idle, None), "Initializing...");

        let failed = state.reduce(StateEvent::ClusterRefreshFailed {
            error: "no route".to_string(),
            at: Utc::now(),
        });
        assert_eq!(
            status_line(&failed, SchedulerPhase::Idle, None),
            "Error: no route | showing data from never (stale)"
        );
    }

    #[test]
    fn pod_loading_and_pod_errors() {
        let state = refreshed(Utc::now()).reduce(StateEvent::NodeSelected("node-a".to_string()));
        assert_eq!(status_line(&state, SchedulerPhase::Idle, None), "Loading pods for node-a...");

        let failed = state.reduce(StateEvent::PodsFailed {
            node: "node-a".to_string(),
            error: "forbidden".to_string(),
        });
        assert_eq!(
            status_line(&failed, SchedulerPhase::Idle, None),
            "Error fetching pods for node-a: forbidden"
        );
    }
}
