// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tabula_app::{FilterSpec, GridView, MatchMode, SortDirection, SortSpec};

/// The surface the terminal loop drives. Each tab is one grid view; the
/// runtime owns them and decides what saving means.
pub trait AppRuntime {
    fn title(&self) -> &str;
    fn tab_count(&self) -> usize;
    fn tab(&self, index: usize) -> Option<&dyn GridView>;
    fn tab_mut(&mut self, index: usize) -> Option<&mut dyn GridView>;

    /// Extra text shown next to the title, e.g. running totals.
    fn summary_line(&self) -> Option<String> {
        None
    }

    /// Called after the user switches to `index`.
    fn activate_tab(&mut self, _index: usize) -> Result<()> {
        Ok(())
    }

    /// Persists pending changes and returns a status message.
    fn save(&mut self) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMode {
    Nav,
    Edit { buffer: String },
    Filter,
    Help,
}

impl UiMode {
    const fn badge(&self) -> &'static str {
        match self {
            Self::Nav => "NAV",
            Self::Edit { .. } => "EDIT",
            Self::Filter => "FILTER",
            Self::Help => "HELP",
        }
    }
}

/// Filter controls shown beside the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSidebar {
    pub pattern: String,
    pub mode: MatchMode,
    pub column: usize,
    pub case_sensitive: bool,
}

impl FilterSidebar {
    fn new(preferences: UiPreferences) -> Self {
        Self {
            pattern: String::new(),
            mode: preferences.match_mode,
            column: 0,
            case_sensitive: preferences.case_sensitive,
        }
    }

    fn spec(&self) -> FilterSpec {
        let spec = FilterSpec::new(self.pattern.clone(), self.mode, self.column);
        if self.case_sensitive {
            spec
        } else {
            spec.case_insensitive()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub active_tab: usize,
    pub selected_row: usize,
    pub selected_col: usize,
    pub mode: UiMode,
    pub status: Option<String>,
    pub status_token: u64,
    pub sidebar: FilterSidebar,
    preferences: UiPreferences,
}

/// Filter defaults a session starts from. The match syntax last picked in
/// the sidebar is handed back when the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiPreferences {
    pub case_sensitive: bool,
    pub match_mode: MatchMode,
}

impl UiPreferences {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            match_mode: MatchMode::default(),
        }
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }
}

impl UiState {
    pub fn new(case_sensitive_default: bool) -> Self {
        Self::with_preferences(UiPreferences::new(case_sensitive_default))
    }

    pub fn with_preferences(preferences: UiPreferences) -> Self {
        Self {
            active_tab: 0,
            selected_row: 0,
            selected_col: 0,
            mode: UiMode::Nav,
            status: None,
            status_token: 0,
            sidebar: FilterSidebar::new(preferences),
            preferences,
        }
    }

    pub fn preferences(&self) -> UiPreferences {
        self.preferences
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.status_token = self.status_token.saturating_add(1);
    }

    fn clear_status(&mut self, token: u64) {
        if token == self.status_token {
            self.status = None;
        }
    }

    fn clamp_cursor(&mut self, grid: &dyn GridView) {
        let rows = grid.row_count();
        let columns = grid.columns().len();
        self.selected_row = self.selected_row.min(rows.saturating_sub(1));
        self.selected_col = self.selected_col.min(columns.saturating_sub(1));
    }

    fn load_sidebar(&mut self, grid: &dyn GridView) {
        self.sidebar = match grid.state().filter_spec() {
            Some(spec) => FilterSidebar {
                pattern: spec.pattern.clone(),
                mode: spec.mode,
                column: spec.column,
                case_sensitive: spec.case_sensitive,
            },
            None => FilterSidebar {
                column: self.selected_col,
                ..FilterSidebar::new(self.preferences)
            },
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavCommand {
    MoveRow(isize),
    MoveColumn(isize),
    FirstRow,
    LastRow,
    FirstColumn,
    LastColumn,
    NextTab,
    PrevTab,
    StartEdit,
    InsertRow,
    DeleteRow,
    ClearRows,
    CycleSort,
    OpenFilter,
    ClearFilter,
    Refresh,
    Save,
    Help,
    Quit,
}

pub fn run_app<R: AppRuntime>(runtime: &mut R, preferences: &mut UiPreferences) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut ui = UiState::with_preferences(*preferences);
    if let Some(grid) = runtime.tab(0) {
        ui.load_sidebar(grid);
    }
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(&mut ui, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, &ui, &*runtime)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                let token = ui.status_token;
                let outcome = handle_key(&mut ui, runtime, key);
                if ui.status_token != token {
                    schedule_status_clear(&internal_tx, ui.status_token);
                }
                if outcome == KeyOutcome::Quit {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    *preferences = ui.preferences();
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(ui: &mut UiState, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } => ui.clear_status(token),
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

/// Applies one key press to the UI state and the active grid.
pub fn handle_key<R: AppRuntime + ?Sized>(
    ui: &mut UiState,
    runtime: &mut R,
    key: KeyEvent,
) -> KeyOutcome {
    match ui.mode.clone() {
        UiMode::Nav => match nav_command_for_key(key) {
            Some(command) => apply_nav_command(ui, runtime, command),
            None => KeyOutcome::Continue,
        },
        UiMode::Edit { buffer } => {
            handle_edit_key(ui, runtime, buffer, key);
            KeyOutcome::Continue
        }
        UiMode::Filter => {
            handle_filter_key(ui, runtime, key);
            KeyOutcome::Continue
        }
        UiMode::Help => {
            ui.mode = UiMode::Nav;
            KeyOutcome::Continue
        }
    }
}

fn nav_command_for_key(key: KeyEvent) -> Option<NavCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::CONTROL) => Some(NavCommand::Quit),
        (KeyCode::Char('s'), KeyModifiers::CONTROL) => Some(NavCommand::Save),
        (KeyCode::Char('q'), _) => Some(NavCommand::Quit),
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(NavCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(NavCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(NavCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(NavCommand::MoveColumn(1)),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(NavCommand::FirstRow),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(NavCommand::LastRow),
        (KeyCode::Char('^'), _) => Some(NavCommand::FirstColumn),
        (KeyCode::Char('$'), _) => Some(NavCommand::LastColumn),
        (KeyCode::Tab, _) | (KeyCode::Char('f'), _) => Some(NavCommand::NextTab),
        (KeyCode::BackTab, _) | (KeyCode::Char('b'), _) => Some(NavCommand::PrevTab),
        (KeyCode::Enter, _) | (KeyCode::Char('e'), _) => Some(NavCommand::StartEdit),
        (KeyCode::Char('o'), _) => Some(NavCommand::InsertRow),
        (KeyCode::Char('d'), _) | (KeyCode::Delete, _) => Some(NavCommand::DeleteRow),
        (KeyCode::Char('X'), _) => Some(NavCommand::ClearRows),
        (KeyCode::Char('s'), _) => Some(NavCommand::CycleSort),
        (KeyCode::Char('/'), _) => Some(NavCommand::OpenFilter),
        (KeyCode::Char('F'), _) => Some(NavCommand::ClearFilter),
        (KeyCode::Char('r'), _) => Some(NavCommand::Refresh),
        (KeyCode::Char('?'), _) => Some(NavCommand::Help),
        _ => None,
    }
}

fn apply_nav_command<R: AppRuntime + ?Sized>(
    ui: &mut UiState,
    runtime: &mut R,
    command: NavCommand,
) -> KeyOutcome {
    match command {
        NavCommand::Quit => return KeyOutcome::Quit,
        NavCommand::Help => ui.mode = UiMode::Help,
        NavCommand::Save => match runtime.save() {
            Ok(message) => ui.set_status(message),
            Err(error) => ui.set_status(format!("save failed: {error:#}")),
        },
        NavCommand::NextTab | NavCommand::PrevTab => {
            let count = runtime.tab_count();
            if count == 0 {
                return KeyOutcome::Continue;
            }
            ui.active_tab = if command == NavCommand::NextTab {
                (ui.active_tab + 1) % count
            } else {
                (ui.active_tab + count - 1) % count
            };
            if let Err(error) = runtime.activate_tab(ui.active_tab) {
                ui.set_status(format!("reload failed: {error:#}"));
            }
            if let Some(grid) = runtime.tab(ui.active_tab) {
                ui.clamp_cursor(grid);
                ui.load_sidebar(grid);
            }
        }
        _ => {
            let Some(grid) = runtime.tab_mut(ui.active_tab) else {
                return KeyOutcome::Continue;
            };
            apply_grid_command(ui, grid, command);
        }
    }
    KeyOutcome::Continue
}

fn apply_grid_command(ui: &mut UiState, grid: &mut dyn GridView, command: NavCommand) {
    let rows = grid.row_count();
    let columns = grid.columns().len();
    match command {
        NavCommand::MoveRow(delta) => {
            ui.selected_row = step(ui.selected_row, delta, rows);
        }
        NavCommand::MoveColumn(delta) => {
            ui.selected_col = step(ui.selected_col, delta, columns);
        }
        NavCommand::FirstRow => ui.selected_row = 0,
        NavCommand::LastRow => ui.selected_row = rows.saturating_sub(1),
        NavCommand::FirstColumn => ui.selected_col = 0,
        NavCommand::LastColumn => ui.selected_col = columns.saturating_sub(1),
        NavCommand::StartEdit => {
            if !grid.is_editable(ui.selected_row, ui.selected_col) {
                ui.set_status("cell is read-only");
                return;
            }
            match grid.edit_text(ui.selected_row, ui.selected_col) {
                Ok(buffer) => ui.mode = UiMode::Edit { buffer },
                Err(error) => ui.set_status(error.to_string()),
            }
        }
        NavCommand::InsertRow => match grid.insert_row() {
            Ok(Some(position)) => {
                ui.selected_row = position;
                ui.set_status("row added");
            }
            Ok(None) => ui.set_status("row added; hidden by the current filter"),
            Err(error) => ui.set_status(error.to_string()),
        },
        NavCommand::DeleteRow => {
            let selection = (rows > 0).then_some(ui.selected_row);
            match grid.delete_row(selection) {
                Ok(()) => {
                    ui.clamp_cursor(grid);
                    ui.set_status("row deleted");
                }
                Err(error) => ui.set_status(error.to_string()),
            }
        }
        NavCommand::ClearRows => match grid.clear() {
            Ok(()) => {
                ui.selected_row = 0;
                ui.set_status(format!("{} cleared", grid.title()));
            }
            Err(error) => ui.set_status(error.to_string()),
        },
        NavCommand::CycleSort => cycle_sort(ui, grid),
        NavCommand::OpenFilter => {
            if !grid.state().is_filtered() {
                ui.sidebar.column = ui.selected_col;
            }
            ui.mode = UiMode::Filter;
        }
        NavCommand::ClearFilter => {
            grid.clear_filter();
            ui.sidebar.pattern.clear();
            ui.clamp_cursor(grid);
            ui.set_status("filter cleared");
        }
        NavCommand::Refresh => match grid.refresh() {
            Ok(()) => {
                ui.clamp_cursor(grid);
                ui.set_status("refreshed");
            }
            Err(error) => {
                tracing::warn!(grid = grid.title(), %error, "refresh failed");
                ui.set_status(format!("refresh failed: {error}"));
            }
        },
        NavCommand::NextTab
        | NavCommand::PrevTab
        | NavCommand::Save
        | NavCommand::Help
        | NavCommand::Quit => {}
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn cycle_sort(ui: &mut UiState, grid: &mut dyn GridView) {
    let column = ui.selected_col;
    let next = match grid.state().sort_spec() {
        Some(spec) if spec.column == column && spec.direction == SortDirection::Asc => {
            Some(SortSpec::desc(column))
        }
        Some(spec) if spec.column == column => None,
        _ => Some(SortSpec::asc(column)),
    };
    match next {
        Some(spec) => match grid.apply_sort(spec) {
            Ok(()) => ui.set_status(format!(
                "sorted by {} {}",
                column_label(grid, column),
                spec.direction.label()
            )),
            Err(error) => ui.set_status(error.to_string()),
        },
        None => {
            grid.clear_sort();
            ui.set_status("sort cleared");
        }
    }
}

fn handle_edit_key<R: AppRuntime + ?Sized>(
    ui: &mut UiState,
    runtime: &mut R,
    mut buffer: String,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            ui.mode = UiMode::Nav;
            ui.set_status("edit cancelled");
            return;
        }
        (KeyCode::Enter, _) => {
            let Some(grid) = runtime.tab_mut(ui.active_tab) else {
                ui.mode = UiMode::Nav;
                return;
            };
            match grid.set_value_at(ui.selected_row, ui.selected_col, &buffer) {
                Ok(()) => {
                    ui.mode = UiMode::Nav;
                    ui.clamp_cursor(grid);
                    ui.set_status(format!("{} updated", column_label(grid, ui.selected_col)));
                }
                Err(error) => ui.set_status(error.to_string()),
            }
            return;
        }
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => buffer.clear(),
        (KeyCode::Backspace, _) => {
            buffer.pop();
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            buffer.push(ch);
        }
        _ => {}
    }
    ui.mode = UiMode::Edit { buffer };
}

fn handle_filter_key<R: AppRuntime + ?Sized>(ui: &mut UiState, runtime: &mut R, key: KeyEvent) {
    let Some(grid) = runtime.tab_mut(ui.active_tab) else {
        ui.mode = UiMode::Nav;
        return;
    };
    let columns = grid.columns().len();
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) | (KeyCode::Enter, _) => {
            ui.mode = UiMode::Nav;
            return;
        }
        (KeyCode::Tab, _) => {
            ui.sidebar.mode = ui.sidebar.mode.next();
            ui.preferences.match_mode = ui.sidebar.mode;
        }
        (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
            ui.sidebar.case_sensitive = !ui.sidebar.case_sensitive;
        }
        (KeyCode::Left, _) => {
            ui.sidebar.column = (ui.sidebar.column + columns.max(1) - 1) % columns.max(1);
        }
        (KeyCode::Right, _) => ui.sidebar.column = (ui.sidebar.column + 1) % columns.max(1),
        (KeyCode::Backspace, _) => {
            ui.sidebar.pattern.pop();
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            ui.sidebar.pattern.push(ch);
        }
        _ => return,
    }
    apply_sidebar_filter(ui, grid);
}

fn apply_sidebar_filter(ui: &mut UiState, grid: &mut dyn GridView) {
    if ui.sidebar.pattern.is_empty() {
        grid.clear_filter();
    } else if let Err(error) = grid.apply_filter(ui.sidebar.spec()) {
        ui.set_status(format!("filter: {error}"));
    }
    ui.clamp_cursor(grid);
}

fn column_label(grid: &dyn GridView, column: usize) -> String {
    grid.columns()
        .get(column)
        .map(|spec| spec.label.clone())
        .unwrap_or_default()
}

fn render<R: AppRuntime + ?Sized>(frame: &mut ratatui::Frame<'_>, ui: &UiState, runtime: &R) {
    let outer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(30)])
        .split(frame.area());
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(outer[0]);

    let tab_titles = (0..runtime.tab_count())
        .filter_map(|index| runtime.tab(index).map(|grid| tab_title(grid)))
        .collect::<Vec<String>>();
    let block_title = match runtime.summary_line() {
        Some(summary) => format!("{} | {summary}", runtime.title()),
        None => runtime.title().to_owned(),
    };
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title(block_title).borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(ui.active_tab);
    frame.render_widget(tabs, layout[0]);

    match runtime.tab(ui.active_tab) {
        Some(grid) => render_table(frame, layout[1], ui, grid),
        None => frame.render_widget(
            Paragraph::new(String::new()).block(Block::default().borders(Borders::ALL)),
            layout[1],
        ),
    }

    let status_widget = Paragraph::new(status_text(ui))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    let sidebar_columns = runtime
        .tab(ui.active_tab)
        .map(|grid| column_label(grid, ui.sidebar.column))
        .unwrap_or_default();
    let border = if ui.mode == UiMode::Filter {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let sidebar = Paragraph::new(sidebar_text(&ui.sidebar, &sidebar_columns)).block(
        Block::default()
            .title("filter")
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(sidebar, outer[1]);

    if ui.mode == UiMode::Help {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn tab_title(grid: &dyn GridView) -> String {
    if grid.state().is_filtered() {
        format!("{} *", grid.title())
    } else {
        grid.title().to_owned()
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, ui: &UiState, grid: &dyn GridView) {
    let columns = grid.columns().len();
    let widths = vec![Constraint::Min(8); columns.max(1)];

    let header_cells = (0..columns).map(|column| {
        Cell::from(header_label(grid, column)).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells);

    // borders plus the header line
    let body_height = usize::from(area.height.saturating_sub(3)).max(1);
    let offset = ui.selected_row.saturating_sub(body_height - 1);
    let last = grid.row_count().min(offset + body_height);

    let rows = (offset..last).map(|row| {
        let selected_row = row == ui.selected_row;
        let cells = (0..columns)
            .map(|column| {
                let selected = selected_row && column == ui.selected_col;
                let text = match (&ui.mode, selected) {
                    (UiMode::Edit { buffer }, true) => format!("{buffer}_"),
                    _ => grid.display_at(row, column).unwrap_or_default(),
                };
                let mut style = Style::default();
                if !grid.is_editable(row, column) {
                    style = style.fg(Color::Gray);
                }
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(text).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(grid.title()).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn header_label(grid: &dyn GridView, column: usize) -> String {
    let mut label = column_label(grid, column);
    if let Some(sort) = grid.state().sort_spec()
        && sort.column == column
    {
        label.push_str(match sort.direction {
            SortDirection::Asc => " ^",
            SortDirection::Desc => " v",
        });
    }
    label
}

fn sidebar_text(sidebar: &FilterSidebar, column: &str) -> String {
    let case = if sidebar.case_sensitive { "on" } else { "off" };
    format!(
        "pattern: {}\nsyntax:  {}\ncolumn:  {column}\ncase:    {case}\n\ntab syntax | </> column\nctrl+a case | enter done",
        sidebar.pattern,
        sidebar.mode.label(),
    )
}

fn status_text(ui: &UiState) -> String {
    let hints = match ui.mode {
        UiMode::Edit { .. } => "enter save | esc cancel | ctrl+u clear",
        UiMode::Filter => "type to filter | tab syntax | esc done",
        UiMode::Nav | UiMode::Help => {
            "j/k/h/l g/G | enter edit | o add d del | s sort / filter F | b/f tabs | ? | ctrl+s ctrl+q"
        }
    };
    let mode = ui.mode.badge();
    match &ui.status {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_text() -> &'static str {
    "nav: j/k/h/l arrows | g/G first/last row | ^/$ first/last column\n\
tabs: b/f or shift+tab/tab\n\
edit: enter or e | esc cancel | ctrl+u clear buffer\n\
rows: o add | d delete | X clear all\n\
sort: s cycles asc, desc, off on the current column\n\
filter: / open sidebar | F clear | tab cycles syntax | ctrl+a case\n\
other: r refresh | ctrl+s save | q quit\n\
\n\
press any key to close"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
