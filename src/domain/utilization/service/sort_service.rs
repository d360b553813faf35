use std::cmp::Ordering;

use crate::domain::utilization::model::NodeRecord;

/// `allocated / allocatable * 100`, or 0 when nothing is allocatable or the
/// ratio overflows.
#[inline]
pub fn percent(allocated: f64, allocatable: f64) -> f64 {
    if !(allocatable > 0.0 && allocated.is_finite() && allocated > 0.0) {
        return 0.0;
    }
    let p = allocated / allocatable * 100.0;
    if p.is_finite() { p } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    CpuPercent,
    MemoryPercent,
    CpuRequests,
    MemoryRequests,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "Asc",
            SortDirection::Descending => "Desc",
        }
    }
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Name,
        SortKey::CpuPercent,
        SortKey::MemoryPercent,
        SortKey::CpuRequests,
        SortKey::MemoryRequests,
    ];

    /// Operators scan utilization "worst first"; names read alphabetically.
    pub fn default_direction(self) -> SortDirection {
        match self {
            SortKey::Name => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::CpuPercent => "CPU %",
            SortKey::MemoryPercent => "Memory %",
            SortKey::CpuRequests => "CPU Requests",
            SortKey::MemoryRequests => "Memory Requests",
        }
    }

    fn next(self) -> SortKey {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn metric(self, node: &NodeRecord) -> f64 {
        match self {
            SortKey::Name => 0.0,
            SortKey::CpuPercent => node.cpu_request_percent(),
            SortKey::MemoryPercent => node.memory_request_percent(),
            SortKey::CpuRequests => node.requests.cpu,
            SortKey::MemoryRequests => node.requests.memory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            direction: SortKey::Name.default_direction(),
        }
    }
}

impl SortState {
    /// Same key toggles direction; a different key starts at its default.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.toggled(),
            }
        } else {
            Self {
                key,
                direction: key.default_direction(),
            }
        }
    }

    /// Advance to the next key at its default direction.
    pub fn cycle(self) -> Self {
        let key = self.key.next();
        Self {
            key,
            direction: key.default_direction(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.key.label(), self.direction.label())
    }
}

/// Ordered view over `nodes`; the source slice is left untouched.
///
/// Equal metric values always fall back to name ascending, whatever the
/// chosen direction, so the order is total and stable across polls.
pub fn sort_nodes(nodes: &[NodeRecord], sort: SortState) -> Vec<&NodeRecord> {
    let mut view: Vec<&NodeRecord> = nodes.iter().collect();
    view.sort_by(|a, b| compare_nodes(a, b, sort));
    view
}

fn compare_nodes(a: &NodeRecord, b: &NodeRecord, sort: SortState) -> Ordering {
    let primary = match sort.key {
        SortKey::Name => a.name.cmp(&b.name),
        key => key.metric(a).total_cmp(&key.metric(b)),
    };

    let primary = match sort.direction {
        SortDirection::Ascending => primary,
        SortDirection::Descending => primary.reverse(),
    };

    primary.then_with(|| a.name.cmp(&b.name))
}
