//! Refresh state machine: `Idle → Polling → Idle`.
//!
//! Pure bookkeeping only. It decides *whether* a fetch should start and
//! *whether* a finished fetch may be applied; the controller does the I/O.

use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Manual,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Polling { trigger: RefreshTrigger },
}

/// Deadline of the next automatic refresh.
///
/// Dropping it cancels that tick only; a refresh already in flight is
/// tracked by the phase and is never cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTick {
    pub due: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshCommand {
    FetchCluster { trigger: RefreshTrigger },
    FetchPods { node: String, generation: u64 },
}

#[derive(Debug)]
pub struct RefreshScheduler {
    phase: SchedulerPhase,
    interval: Duration,
    auto_refresh: bool,
    pending_tick: Option<PendingTick>,
    selected_node: Option<String>,
    pod_generation: u64,
}

impl RefreshScheduler {
    pub fn new(interval: Duration, auto_refresh: bool, now: Instant) -> Self {
        Self {
            phase: SchedulerPhase::Idle,
            interval,
            auto_refresh,
            pending_tick: auto_refresh.then(|| PendingTick { due: now + interval }),
            selected_node: None,
            pod_generation: 0,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.phase, SchedulerPhase::Polling { .. })
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    #[cfg(test)]
    pub fn pending_tick(&self) -> Option<PendingTick> {
        self.pending_tick
    }

    #[cfg(test)]
    pub fn selected_node(&self) -> Option<&str> {
        self.selected_node.as_deref()
    }

    pub fn pod_generation(&self) -> u64 {
        self.pod_generation
    }

    /// Start a full refresh unless one is already in flight.
    pub fn request_refresh(&mut self, trigger: RefreshTrigger) -> Option<RefreshCommand> {
        if self.is_polling() {
            debug!("Refresh ({:?}) ignored: a refresh is already in flight", trigger);
            return None;
        }

        self.phase = SchedulerPhase::Polling { trigger };
        Some(RefreshCommand::FetchCluster { trigger })
    }

    /// Fire the automatic refresh once its tick is due; re-arms from `now`.
    pub fn poll_timer(&mut self, now: Instant) -> Option<RefreshCommand> {
        let tick = self.pending_tick?;
        if now < tick.due {
            return None;
        }

        self.pending_tick = Some(PendingTick { due: now + self.interval });
        self.request_refresh(RefreshTrigger::Auto)
    }

    /// A full refresh finished. On success with an active selection the
    /// selected node's pods are refreshed too.
    pub fn complete_refresh(&mut self, succeeded: bool) -> Option<RefreshCommand> {
        if !self.is_polling() {
            return None;
        }
        self.phase = SchedulerPhase::Idle;

        if !succeeded {
            return None;
        }
        let node = self.selected_node.clone()?;
        Some(self.stamp_pod_fetch(node))
    }

    /// Every selection gets a new generation; only its result may land.
    pub fn select_node(&mut self, node: String) -> RefreshCommand {
        self.selected_node = Some(node.clone());
        self.stamp_pod_fetch(node)
    }

    /// Drop the selection; pod fetches still in flight become stale.
    pub fn clear_selection(&mut self) {
        self.selected_node = None;
        self.pod_generation += 1;
    }

    pub fn accepts_pods(&self, generation: u64) -> bool {
        generation == self.pod_generation && self.selected_node.is_some()
    }

    /// Off cancels the pending tick only; on re-arms it from `now`.
    pub fn set_auto_refresh(&mut self, enabled: bool, now: Instant) {
        self.auto_refresh = enabled;
        self.pending_tick = if enabled {
            Some(PendingTick { due: now + self.interval })
        } else {
            None
        };
    }

    fn stamp_pod_fetch(&mut self, node: String) -> RefreshCommand {
        self.pod_generation += 1;
        RefreshCommand::FetchPods {
            node,
            generation: self.pod_generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(8);

    #[test]
    fn back_to_back_triggers_start_one_refresh() {
        let mut scheduler = RefreshScheduler::new(INTERVAL, true, Instant::now());

        let first = scheduler.request_refresh(RefreshTrigger::Manual);
        let second = scheduler.request_refresh(RefreshTrigger::Manual);

        assert_eq!(first, Some(RefreshCommand::FetchCluster { trigger: RefreshTrigger::Manual }));
        assert_eq!(second, None);
        assert!(scheduler.is_polling());

        scheduler.complete_refresh(true);
        assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
        assert!(scheduler.request_refresh(RefreshTrigger::Manual).is_some());
    }

    #[test]
    fn timer_fires_only_when_due_and_rearms_from_now() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(INTERVAL, true, start);

        assert_eq!(scheduler.poll_timer(start + Duration::from_secs(3)), None);

        let fired_at = start + Duration::from_secs(9);
        assert_eq!(
            scheduler.poll_timer(fired_at),
            Some(RefreshCommand::FetchCluster { trigger: RefreshTrigger::Auto })
        );
        assert_eq!(scheduler.pending_tick(), Some(PendingTick { due: fired_at + INTERVAL }));
    }

    #[test]
    fn timer_tick_while_polling_is_a_no_op() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(INTERVAL, true, start);
        scheduler.request_refresh(RefreshTrigger::Manual);

        assert_eq!(scheduler.poll_timer(start + INTERVAL), None);
        assert_eq!(scheduler.phase(), SchedulerPhase::Polling { trigger: RefreshTrigger::Manual });
    }

    #[test]
    fn disabling_auto_refresh_cancels_tick_but_not_in_flight_refresh() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(INTERVAL, true, start);
        scheduler.poll_timer(start + INTERVAL);
        assert!(scheduler.is_polling());

        scheduler.set_auto_refresh(false, start + INTERVAL);
        assert_eq!(scheduler.pending_tick(), None);
        assert!(scheduler.is_polling());
        assert_eq!(scheduler.poll_timer(start + INTERVAL * 10), None);

        scheduler.complete_refresh(true);
        let resumed_at = start + INTERVAL * 20;
        scheduler.set_auto_refresh(true, resumed_at);
        assert_eq!(scheduler.poll_timer(resumed_at + Duration::from_secs(1)), None);
        assert!(scheduler.poll_timer(resumed_at + INTERVAL).is_some());
    }

    #[test]
    fn manual_refresh_works_with_auto_refresh_off() {
        let mut scheduler = RefreshScheduler::new(INTERVAL, false, Instant::now());
        assert_eq!(scheduler.pending_tick(), None);
        assert!(scheduler.request_refresh(RefreshTrigger::Manual).is_some());
    }

    #[test]
    fn only_latest_selection_is_accepted() {
        let mut scheduler = RefreshScheduler::new(INTERVAL, true, Instant::now());

        let RefreshCommand::FetchPods { generation: gen_a, .. } = scheduler.select_node("a".into()) else {
            panic!("expected pod fetch");
        };
        let RefreshCommand::FetchPods { node, generation: gen_b } = scheduler.select_node("b".into()) else {
            panic!("expected pod fetch");
        };

        assert_eq!(node, "b");
        assert!(gen_b > gen_a);
        assert!(!scheduler.accepts_pods(gen_a));
        assert!(scheduler.accepts_pods(gen_b));
    }

    #[test]
    fn completed_refresh_reissues_pod_fetch_for_selection() {
        let mut scheduler = RefreshScheduler::new(INTERVAL, true, Instant::now());
        assert_eq!(scheduler.complete_refresh(true), None);

        let selection = scheduler.select_node("a".into());
        scheduler.request_refresh(RefreshTrigger::Auto);
        let follow_up = scheduler.complete_refresh(true);

        match (selection, follow_up) {
            (
                RefreshCommand::FetchPods { generation: old, .. },
                Some(RefreshCommand::FetchPods { node, generation }),
            ) => {
                assert_eq!(node, "a");
                assert!(generation > old);
                assert!(!scheduler.accepts_pods(old));
            }
            other => panic!("unexpected commands: {:?}", other),
        }
    }

    #[test]
    fn failed_refresh_returns_to_idle_without_pod_fetch() {
        let mut scheduler = RefreshScheduler::new(INTERVAL, true, Instant::now());
        scheduler.select_node("a".into());
        scheduler.request_refresh(RefreshTrigger::Manual);

        assert_eq!(scheduler.complete_refresh(false), None);
        assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn clearing_selection_discards_in_flight_pods() {
        let mut scheduler = RefreshScheduler::new(INTERVAL, true, Instant::now());
        let RefreshCommand::FetchPods { generation, .. } = scheduler.select_node("a".into()) else {
            panic!("expected pod fetch");
        };
        scheduler.clear_selection();
        assert!(!scheduler.accepts_pods(generation));
        assert_eq!(scheduler.selected_node(), None);
    }
}
