/// Main TUI application

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::TableState, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::app_state::AppState;
use crate::core::state::runtime::k8s::k8s_runtime_state_repository::K8sRuntimeStateRepository;
use crate::domain::utilization::service::sort_service::SortKey;
use crate::scheduler::refresh_controller::RefreshController;
use crate::scheduler::refresh_scheduler::RefreshTrigger;
use crate::screens::dashboard::{self, DashboardView};

const INPUT_POLL: Duration = Duration::from_millis(100);
const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Refresh,
    CycleSort,
    Sort(SortKey),
    SelectNode,
    ClearSelection,
    ToggleAutoRefresh,
    ToggleHelp,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Key binding table.
pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Refresh,
        KeyCode::Char('s') | KeyCode::Char('S') => Action::CycleSort,
        KeyCode::Char('a') | KeyCode::Char('A') => Action::ToggleAutoRefresh,
        KeyCode::Char('?') | KeyCode::F(1) => Action::ToggleHelp,
        KeyCode::Char(c @ '1'..='5') => {
            let idx = (c as usize) - ('1' as usize);
            Action::Sort(SortKey::ALL[idx])
        }
        KeyCode::Enter | KeyCode::Char('d') | KeyCode::Char('D') => Action::SelectNode,
        KeyCode::Esc => Action::ClearSelection,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        _ => return None,
    };
    Some(action)
}

/// New cursor position after a navigation action over `len` rows.
pub fn move_cursor(cursor: usize, action: Action, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    let next = match action {
        Action::Up => cursor.saturating_sub(1),
        Action::Down => cursor.saturating_add(1),
        Action::PageUp => cursor.saturating_sub(PAGE_SIZE),
        Action::PageDown => cursor.saturating_add(PAGE_SIZE),
        Action::Home => 0,
        Action::End => last,
        _ => cursor,
    };
    next.min(last)
}

pub struct App {
    controller: RefreshController<K8sRuntimeStateRepository>,
    cursor: usize,
    node_table: TableState,
    show_help: bool,
    should_quit: bool,
}

impl App {
    pub fn new(state: &AppState) -> Self {
        Self {
            controller: state.refresh_controller(Instant::now()),
            cursor: 0,
            node_table: TableState::default(),
            show_help: false,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e).context("failed to enter alternate screen");
        }
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                return Err(e).context("failed to initialise terminal");
            }
        };

        // Initial data load
        self.controller.trigger_refresh(RefreshTrigger::Manual);

        let result = self.run_loop(&mut terminal).await;

        // Restore terminal, whatever the loop returned
        let restored = restore_terminal(&mut terminal);
        result.and(restored)
    }

    async fn run_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.should_quit {
            self.controller.tick(Instant::now());
            self.controller.drain().await;

            let snapshot = self.controller.snapshot().await;
            self.cursor = self.cursor.min(snapshot.nodes.len().saturating_sub(1));
            self.node_table
                .select((!snapshot.nodes.is_empty()).then_some(self.cursor));

            let status = self.controller.status_line(Some(self.cursor)).await;
            let view = DashboardView {
                state: &snapshot,
                status: &status,
                show_help: self.show_help,
            };
            let node_table = &mut self.node_table;
            terminal.draw(|frame| dashboard::render(frame, &view, node_table))?;

            if event::poll(INPUT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key).await;
                    }
                }
            }
        }

        info!("Quit requested");
        Ok(())
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        let Some(action) = action_for(key) else {
            return;
        };

        // Help overlay swallows everything except closing it and quitting
        if self.show_help && !matches!(action, Action::ToggleHelp | Action::ClearSelection | Action::Quit) {
            return;
        }

        debug!("Key action {:?}", action);
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::ClearSelection if self.show_help => self.show_help = false,
            Action::ClearSelection => self.controller.clear_selection().await,
            Action::Refresh => self.controller.trigger_refresh(RefreshTrigger::Manual),
            Action::CycleSort => self.controller.cycle_sort().await,
            Action::Sort(key) => self.controller.select_sort(key).await,
            Action::ToggleAutoRefresh => self.controller.toggle_auto_refresh(Instant::now()).await,
            Action::SelectNode => {
                let snapshot = self.controller.snapshot().await;
                if let Some(node) = snapshot.node_at_row(self.cursor) {
                    self.controller.select_node(node).await;
                }
            }
            Action::Up | Action::Down | Action::PageUp | Action::PageDown | Action::Home | Action::End => {
                let len = self.controller.snapshot().await.nodes.len();
                self.cursor = move_cursor(self.cursor, action, len);
            }
        }
    }
}

fn restore_terminal<B: ratatui::backend::Backend + io::Write>(terminal: &mut Terminal<B>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
