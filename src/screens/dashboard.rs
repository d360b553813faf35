/// Node / pod utilization dashboard

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::core::state::runtime::k8s::k8s_runtime_state::K8sRuntimeState;
use crate::core::util::format_util::FormatUtil;
use crate::domain::utilization::model::{NodeRecord, PodRecord};
use crate::domain::utilization::service::sort_service::{SortDirection, SortKey};

const NODE_HEADERS: [&str; 12] = [
    "Name", "Status", "Roles", "Age", "Version", "CPU Req", "CPU %", "Mem Req", "Mem %", "CPU Use",
    "Mem Use", "Zone",
];

const POD_HEADERS: [&str; 11] = [
    "Name", "Namespace", "Ready", "Status", "Restarts", "Age", "CPU Req", "Mem Req", "CPU Use",
    "Mem Use", "IP",
];

/// Everything one frame needs; borrowed from the current snapshot.
pub struct DashboardView<'a> {
    pub state: &'a K8sRuntimeState,
    pub status: &'a str,
    pub show_help: bool,
}

/// Green below 50 %, yellow below 80 %, red from there on.
pub fn utilization_color(percent: f64) -> Color {
    if percent < 50.0 {
        Color::Green
    } else if percent < 80.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn phase_color(phase: &str) -> Color {
    match phase {
        "Running" => Color::Green,
        "Pending" => Color::Yellow,
        "Failed" => Color::Red,
        "Succeeded" => Color::Blue,
        _ => Color::Gray,
    }
}

/// Column that reflects the active sort key.
fn sort_column(key: SortKey) -> usize {
    match key {
        SortKey::Name => 0,
        SortKey::CpuRequests => 5,
        SortKey::CpuPercent => 6,
        SortKey::MemoryRequests => 7,
        SortKey::MemoryPercent => 8,
    }
}

pub fn render(frame: &mut Frame, view: &DashboardView, node_table: &mut TableState) {
    let area = frame.size();
    let show_pods = view.state.selected_node.is_some();

    let constraints = if show_pods {
        vec![
            Constraint::Length(1),
            Constraint::Percentage(50),
            Constraint::Min(6),
            Constraint::Length(3),
        ]
    } else {
        vec![Constraint::Length(1), Constraint::Min(6), Constraint::Length(3)]
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_title(frame, chunks[0], view.state);
    render_nodes(frame, chunks[1], view.state, node_table);

    if show_pods {
        render_pods(frame, chunks[2], view.state);
        render_status(frame, chunks[3], view.status, view.state.is_stale());
    } else {
        render_status(frame, chunks[2], view.status, view.state.is_stale());
    }

    if view.show_help {
        render_help(frame);
    }
}

fn render_title(frame: &mut Frame, area: Rect, state: &K8sRuntimeState) {
    let mut spans = vec![Span::styled(
        " kuv - Kubernetes Usage Viewer",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if !state.auto_refresh {
        spans.push(Span::styled("  [manual refresh]", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled("   ? for help", Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_nodes(frame: &mut Frame, area: Rect, state: &K8sRuntimeState, table_state: &mut TableState) {
    let sorted_col = sort_column(state.sort.key);
    let arrow = match state.sort.direction {
        SortDirection::Ascending => " ▲",
        SortDirection::Descending => " ▼",
    };

    let header = Row::new(NODE_HEADERS.iter().enumerate().map(|(idx, title)| {
        if idx == sorted_col {
            Cell::from(format!("{}{}", title, arrow))
        } else {
            Cell::from(*title)
        }
    }))
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let selected = state.selected_node.as_deref();
    let rows: Vec<Row> = state
        .sorted_nodes()
        .into_iter()
        .map(|node| {
            let row = node_row(node);
            if Some(node.name.as_str()) == selected {
                row.style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                row
            }
        })
        .collect();

    let mut title = format!("Nodes ({})", state.nodes.len());
    if state.is_stale() {
        title.push_str(" [stale]");
    }

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),    // Name
            Constraint::Length(9),  // Status
            Constraint::Length(14), // Roles
            Constraint::Length(6),  // Age
            Constraint::Length(14), // Version
            Constraint::Length(9),  // CPU Req
            Constraint::Length(8),  // CPU %
            Constraint::Length(10), // Mem Req
            Constraint::Length(8),  // Mem %
            Constraint::Length(9),  // CPU Use
            Constraint::Length(10), // Mem Use
            Constraint::Length(14), // Zone
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, table_state);
}

fn node_row(node: &NodeRecord) -> Row<'static> {
    let status_color = if node.ready { Color::Green } else { Color::Red };
    let cpu_pct = node.cpu_request_percent();
    let mem_pct = node.memory_request_percent();

    let cpu_use = match node.usage {
        Some(usage) => Cell::from(Span::styled(
            FormatUtil::cpu(usage.cpu),
            Style::default().fg(utilization_color(node.cpu_usage_percent().unwrap_or(0.0))),
        )),
        None => Cell::from(Span::styled("N/A", Style::default().fg(Color::Gray))),
    };
    let mem_use = match node.usage {
        Some(usage) => Cell::from(Span::styled(
            FormatUtil::bytes(usage.memory),
            Style::default().fg(utilization_color(node.memory_usage_percent().unwrap_or(0.0))),
        )),
        None => Cell::from(Span::styled("N/A", Style::default().fg(Color::Gray))),
    };

    Row::new(vec![
        Cell::from(node.name.clone()),
        Cell::from(Span::styled(node.status.clone(), Style::default().fg(status_color))),
        Cell::from(node.roles.join(",")),
        Cell::from(node.age.clone()),
        Cell::from(node.version.clone()),
        Cell::from(FormatUtil::cpu(node.requests.cpu)),
        Cell::from(Span::styled(
            FormatUtil::percent(cpu_pct),
            Style::default().fg(utilization_color(cpu_pct)),
        )),
        Cell::from(FormatUtil::bytes(node.requests.memory)),
        Cell::from(Span::styled(
            FormatUtil::percent(mem_pct),
            Style::default().fg(utilization_color(mem_pct)),
        )),
        cpu_use,
        mem_use,
        Cell::from(node.placement.zone.clone().unwrap_or_else(|| "-".to_string())),
    ])
}

fn render_pods(frame: &mut Frame, area: Rect, state: &K8sRuntimeState) {
    let node = state.selected_node.as_deref().unwrap_or_default();
    let title = if state.pods_loading && state.pods.is_empty() {
        format!("Pods on {} (loading...)", node)
    } else {
        format!("Pods on {} ({})", node, state.pods.len())
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let summary = state
        .nodes
        .iter()
        .find(|n| n.name == node)
        .map(node_summary)
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Span::styled(summary, Style::default().fg(Color::Cyan))),
        chunks[0],
    );

    let header = Row::new(POD_HEADERS.to_vec())
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows: Vec<Row> = state.pods.iter().map(pod_row).collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(24),    // Name
            Constraint::Length(16), // Namespace
            Constraint::Length(6),  // Ready
            Constraint::Length(10), // Status
            Constraint::Length(8),  // Restarts
            Constraint::Length(6),  // Age
            Constraint::Length(9),  // CPU Req
            Constraint::Length(10), // Mem Req
            Constraint::Length(9),  // CPU Use
            Constraint::Length(10), // Mem Use
            Constraint::Length(15), // IP
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, chunks[1]);
}

/// One-line capacity summary shown above the pod table.
pub fn node_summary(node: &NodeRecord) -> String {
    let mut parts = vec![
        format!(" {}", node.name),
        format!("Pods {}/{}", node.pod_count, node.pod_capacity),
        format!("CPU lim {}", FormatUtil::percent(node.cpu_limit_percent())),
        format!("Mem lim {}", FormatUtil::percent(node.memory_limit_percent())),
    ];
    if let Some(group) = &node.placement.node_group {
        parts.push(format!("Group {}", group));
    }
    if let Some(instance_type) = &node.placement.instance_type {
        parts.push(format!("Type {}", instance_type));
    }
    parts.join(" | ")
}

fn pod_row(pod: &PodRecord) -> Row<'static> {
    let restarts_style = if pod.restarts > 0 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let usage = |value: Option<String>| match value {
        Some(text) => Cell::from(text),
        None => Cell::from(Span::styled("N/A", Style::default().fg(Color::Gray))),
    };

    Row::new(vec![
        Cell::from(pod.name.clone()),
        Cell::from(pod.namespace.clone()),
        Cell::from(pod.ready.clone()),
        Cell::from(Span::styled(pod.status.clone(), Style::default().fg(phase_color(&pod.status)))),
        Cell::from(Span::styled(pod.restarts.to_string(), restarts_style)),
        Cell::from(pod.age.clone()),
        Cell::from(FormatUtil::cpu(pod.requests.cpu)),
        Cell::from(FormatUtil::bytes(pod.requests.memory)),
        usage(pod.usage.map(|u| FormatUtil::cpu(u.cpu))),
        usage(pod.usage.map(|u| FormatUtil::bytes(u.memory))),
        Cell::from(pod.ip.clone().unwrap_or_else(|| "-".to_string())),
    ])
}

fn render_status(frame: &mut Frame, area: Rect, status: &str, stale: bool) {
    let color = if status.starts_with("Error") {
        Color::Red
    } else if stale {
        Color::Yellow
    } else {
        Color::White
    };

    let paragraph = Paragraph::new(Line::from(Span::styled(status.to_string(), Style::default().fg(color))))
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame) {
    let area = frame.size();
    let popup_width = area.width.min(60);
    let popup_height = area.height.min(20);
    let popup_area = Rect {
        x: area.width.saturating_sub(popup_width) / 2,
        y: area.height.saturating_sub(popup_height) / 2,
        width: popup_width,
        height: popup_height,
    };

    let section = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let mut help_text = vec![
        Line::from(Span::styled(
            "kuv - Keyboard Shortcuts",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Navigation:", section)),
        Line::from("  [↑ ↓]          Move node cursor"),
        Line::from("  [PgUp PgDn]    Move one page"),
        Line::from("  [Home End]     First / last node"),
        Line::from("  [Enter] [d]    Show pods of highlighted node"),
        Line::from("  [Esc]          Close pod view"),
        Line::from(""),
        Line::from(Span::styled("Sorting:", section)),
    ];
    for (idx, key) in SortKey::ALL.iter().enumerate() {
        help_text.push(Line::from(format!("  [{}]            {}", idx + 1, key.label())));
    }
    help_text.extend([
        Line::from("  [s]            Next sort key"),
        Line::from(""),
        Line::from(Span::styled("Refresh:", section)),
        Line::from("  [r]            Refresh now"),
        Line::from("  [a]            Toggle auto-refresh"),
        Line::from("  [?]            Toggle this help"),
        Line::from("  [q]            Quit"),
    ]);

    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .alignment(Alignment::Left);

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help, popup_area);
}
