// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use artable_app::{
    AppCommand, AppEvent, AppState, ArtworkColumn, BulkOutcome, BulkSelection, Page,
    PopoverVisibility,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);
const CHECKED: &str = "[x]";
const UNCHECKED: &str = "[ ]";
const PARTIAL: &str = "[-]";
const POPOVER_MARK: &str = "▾";

/// Result of a page fetch started through [`AppRuntime::spawn_page_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoadEvent {
    Loaded {
        request_id: u64,
        page: Page,
    },
    Failed {
        request_id: u64,
        page: u32,
        error: String,
    },
}

impl PageLoadEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::Loaded { request_id, .. } | Self::Failed { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    PageLoad(PageLoadEvent),
    BulkSelect { request_id: u64, outcome: BulkOutcome },
}

/// Fetch side of the view. Implementations may run the work on another
/// thread; the only contract is one message on `tx` per call.
pub trait AppRuntime {
    fn load_page(&mut self, page: u32) -> Result<Page>;

    fn spawn_page_load(
        &mut self,
        request_id: u64,
        page: u32,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let event = match self.load_page(page) {
            Ok(page) => PageLoadEvent::Loaded { request_id, page },
            Err(error) => PageLoadEvent::Failed {
                request_id,
                page,
                error: format!("{error:#}"),
            },
        };
        tx.send(InternalEvent::PageLoad(event))
            .map_err(|_| anyhow::anyhow!("page event channel closed"))?;
        Ok(())
    }

    fn spawn_bulk_select(
        &mut self,
        request_id: u64,
        walk: BulkSelection,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let outcome = walk.run(&mut |page: u32| self.load_page(page));
        tx.send(InternalEvent::BulkSelect {
            request_id,
            outcome,
        })
        .map_err(|_| anyhow::anyhow!("bulk select channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableCommand {
    MoveRow(isize),
    JumpFirstRow,
    JumpLastRow,
    ToggleRow,
    TogglePage,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    OpenPopover,
    ToggleHelp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PopoverUiState {
    input: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ViewData {
    selected_row: usize,
    popover: PopoverUiState,
    help_visible: bool,
    status_token: u64,
    next_request_id: u64,
    page_request: Option<u64>,
    bulk_request: Option<u64>,
}

impl ViewData {
    fn next_request_id(&mut self) -> u64 {
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.next_request_id
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    start_view(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
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
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
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
    }

    info!(
        selected = state.selection.selected_count(),
        "closing artwork table"
    );
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn start_view<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let page = state.cursor.page;
    dispatch_and_apply(state, runtime, view_data, internal_tx, AppCommand::ChangePage(page));
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::PageLoad(event) => handle_page_load_event(state, view_data, tx, event),
            InternalEvent::BulkSelect {
                request_id,
                outcome,
            } => {
                if view_data.bulk_request != Some(request_id) {
                    debug!(request_id, "discarding stale bulk selection");
                    continue;
                }
                view_data.bulk_request = None;
                info!(
                    picked = outcome.picked.len(),
                    requested = outcome.requested,
                    pages = ?outcome.pages_fetched,
                    "bulk selection finished"
                );
                let events = state.dispatch(AppCommand::CommitBulkSelect(outcome));
                after_dispatch(view_data, tx, &events);
            }
        }
    }
}

fn handle_page_load_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: PageLoadEvent,
) {
    if view_data.page_request != Some(event.request_id()) {
        debug!(request_id = event.request_id(), "discarding stale page load");
        return;
    }
    view_data.page_request = None;

    let command = match event {
        PageLoadEvent::Loaded { page, .. } => {
            info!(
                page = page.number,
                rows = page.records.len(),
                total = page.total,
                "loaded artworks page"
            );
            AppCommand::PageLoaded(page)
        }
        PageLoadEvent::Failed { page, error, .. } => {
            warn!(page, %error, "error fetching artworks");
            AppCommand::PageLoadFailed(error)
        }
    };
    let events = state.dispatch(command);
    after_dispatch(view_data, tx, &events);
    clamp_row_cursor(state, view_data);
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    let events = state.dispatch(AppCommand::SetStatus(message.into()));
    after_dispatch(view_data, internal_tx, &events);
}

/// Dispatches `command` and starts whatever fetches the resulting events
/// ask for.
fn dispatch_and_apply<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    after_dispatch(view_data, internal_tx, &events);

    for event in events {
        match event {
            AppEvent::PageChanged { .. } => view_data.page_request = None,
            AppEvent::FetchRequested { page } => {
                let request_id = view_data.next_request_id();
                view_data.page_request = Some(request_id);
                debug!(request_id, page, "requesting artworks page");
                if let Err(error) = runtime.spawn_page_load(request_id, page, internal_tx.clone())
                {
                    view_data.page_request = None;
                    let events = state.dispatch(AppCommand::PageLoadFailed(format!("{error:#}")));
                    after_dispatch(view_data, internal_tx, &events);
                }
            }
            AppEvent::BulkStarted(walk) => {
                let request_id = view_data.next_request_id();
                view_data.bulk_request = Some(request_id);
                info!(
                    request_id,
                    requested = walk.requested(),
                    remaining = walk.remaining(),
                    "bulk selection continues on later pages"
                );
                if let Err(error) = runtime.spawn_bulk_select(request_id, walk, internal_tx.clone())
                {
                    warn!(%error, "bulk selection could not start");
                    view_data.bulk_request = None;
                    state.bulk_in_flight = false;
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("bulk select failed: {error:#}"),
                    );
                }
            }
            _ => {}
        }
    }
    clamp_row_cursor(state, view_data);
}

fn after_dispatch(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>, events: &[AppEvent]) {
    for event in events {
        match event {
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(internal_tx, view_data.status_token);
            }
            AppEvent::PopoverChanged(PopoverVisibility::Hidden) => {
                view_data.popover = PopoverUiState::default();
            }
            _ => {}
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.popover == PopoverVisibility::Visible {
        handle_popover_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::NONE {
        return true;
    }

    let Some(command) = table_command_for_key(key) else {
        return false;
    };
    apply_table_command(state, runtime, view_data, internal_tx, command);
    false
}

fn handle_popover_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if state.bulk_in_flight {
        if key.code == KeyCode::Esc {
            emit_status(
                state,
                view_data,
                internal_tx,
                "bulk selection still running; it will close this when done",
            );
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            dispatch_and_apply(state, runtime, view_data, internal_tx, AppCommand::ClosePopover);
        }
        KeyCode::Enter => {
            let rows = parse_rows_input(&view_data.popover.input);
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::SetRowsWanted(rows),
            );
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::SubmitBulkSelect,
            );
        }
        KeyCode::Backspace => {
            view_data.popover.input.pop();
            let rows = parse_rows_input(&view_data.popover.input);
            state.dispatch(AppCommand::SetRowsWanted(rows));
        }
        KeyCode::Char(ch) if ch.is_ascii_digit() => {
            let mut candidate = view_data.popover.input.clone();
            candidate.push(ch);
            let Ok(rows) = candidate.parse::<u32>() else {
                return;
            };
            view_data.popover.input = if rows == 0 {
                "0".to_owned()
            } else {
                rows.to_string()
            };
            state.dispatch(AppCommand::SetRowsWanted(rows));
        }
        _ => {}
    }
}

fn parse_rows_input(input: &str) -> u32 {
    input.trim().parse().unwrap_or(0)
}

fn table_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(TableCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(TableCommand::MoveRow(-1)),
        (KeyCode::Home, _) => Some(TableCommand::JumpFirstRow),
        (KeyCode::End, _) => Some(TableCommand::JumpLastRow),
        (KeyCode::Char(' '), _) => Some(TableCommand::ToggleRow),
        (KeyCode::Char('a'), KeyModifiers::NONE) => Some(TableCommand::TogglePage),
        (KeyCode::Char('n'), KeyModifiers::NONE) | (KeyCode::Right, _) | (KeyCode::PageDown, _) => {
            Some(TableCommand::NextPage)
        }
        (KeyCode::Char('p'), KeyModifiers::NONE) | (KeyCode::Left, _) | (KeyCode::PageUp, _) => {
            Some(TableCommand::PrevPage)
        }
        (KeyCode::Char('g'), _) => Some(TableCommand::FirstPage),
        (KeyCode::Char('G'), _) => Some(TableCommand::LastPage),
        (KeyCode::Char('s'), KeyModifiers::NONE) => Some(TableCommand::OpenPopover),
        (KeyCode::Char('?'), _) => Some(TableCommand::ToggleHelp),
        _ => None,
    }
}

fn apply_table_command<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: TableCommand,
) {
    match command {
        TableCommand::MoveRow(delta) => move_row(state, view_data, delta),
        TableCommand::JumpFirstRow => view_data.selected_row = 0,
        TableCommand::JumpLastRow => {
            view_data.selected_row = state.records.len().saturating_sub(1);
        }
        TableCommand::ToggleRow => {
            let Some(artwork) = state.records.get(view_data.selected_row) else {
                return;
            };
            let id = artwork.id;
            let selected = !state.selection.is_selected(id);
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::ToggleRow { id, selected },
            );
        }
        TableCommand::TogglePage => {
            let changes = state.page_toggle_changes();
            if changes.is_empty() {
                return;
            }
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::ApplySelectionChange(changes),
            );
        }
        TableCommand::NextPage => {
            let page = state.cursor.page.saturating_add(1);
            if state.total_pages > 0 && page > state.total_pages {
                emit_status(state, view_data, internal_tx, "already on the last page");
                return;
            }
            change_page(state, runtime, view_data, internal_tx, page);
        }
        TableCommand::PrevPage => {
            if state.cursor.page <= 1 {
                emit_status(state, view_data, internal_tx, "already on the first page");
                return;
            }
            let page = state.cursor.page - 1;
            change_page(state, runtime, view_data, internal_tx, page);
        }
        TableCommand::FirstPage => change_page(state, runtime, view_data, internal_tx, 1),
        TableCommand::LastPage => {
            if state.total_pages == 0 {
                return;
            }
            let page = state.total_pages;
            change_page(state, runtime, view_data, internal_tx, page);
        }
        TableCommand::OpenPopover => {
            view_data.popover.input = if state.rows_wanted > 0 {
                state.rows_wanted.to_string()
            } else {
                String::new()
            };
            dispatch_and_apply(state, runtime, view_data, internal_tx, AppCommand::OpenPopover);
        }
        TableCommand::ToggleHelp => view_data.help_visible = !view_data.help_visible,
    }
}

fn change_page<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    page: u32,
) {
    view_data.selected_row = 0;
    dispatch_and_apply(state, runtime, view_data, internal_tx, AppCommand::ChangePage(page));
}

fn move_row(state: &AppState, view_data: &mut ViewData, delta: isize) {
    if state.records.is_empty() {
        view_data.selected_row = 0;
        return;
    }
    let last = state.records.len() - 1;
    let next = view_data.selected_row.saturating_add_signed(delta);
    view_data.selected_row = next.min(last);
}

fn clamp_row_cursor(state: &AppState, view_data: &mut ViewData) {
    view_data.selected_row = view_data
        .selected_row
        .min(state.records.len().saturating_sub(1));
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    render_table(frame, layout[0], state, view_data);

    let footer = Paragraph::new(footer_text(state))
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, layout[1]);

    let status = Paragraph::new(status_text(state)).style(Style::default().fg(Color::Yellow));
    frame.render_widget(status, layout[2]);

    if state.popover == PopoverVisibility::Visible {
        let area = centered_rect(40, 30, frame.area());
        frame.render_widget(Clear, area);
        let popover = Paragraph::new(render_popover_text(state, &view_data.popover)).block(
            Block::default()
                .title("select rows")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(popover, area);
    }

    if view_data.help_visible {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view_data: &ViewData) {
    let mut widths = vec![Constraint::Length(7), Constraint::Length(6)];
    widths.extend(ArtworkColumn::ALL.iter().map(|column| match column {
        ArtworkColumn::Title | ArtworkColumn::ArtistDisplay => Constraint::Min(18),
        ArtworkColumn::PlaceOfOrigin => Constraint::Length(16),
        ArtworkColumn::Inscriptions => Constraint::Min(12),
        ArtworkColumn::DateStart | ArtworkColumn::DateEnd => Constraint::Length(10),
    }));

    let bold = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let mut header_cells = vec![
        Cell::from(format!("{POPOVER_MARK} {}", page_checkbox_marker(state))).style(bold),
        Cell::from("#").style(bold),
    ];
    header_cells.extend(
        ArtworkColumn::ALL
            .iter()
            .map(|column| Cell::from(column.label()).style(bold)),
    );
    let header = Row::new(header_cells);

    let offset = state.first_row_offset();
    let rows = state.records.iter().enumerate().map(|(index, artwork)| {
        let checked = state.selection.is_selected(artwork.id);
        let mut style = Style::default();
        if checked {
            style = style.fg(Color::Green);
        }
        if index == view_data.selected_row {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }

        let mut cells = vec![
            Cell::from(if checked { CHECKED } else { UNCHECKED }),
            Cell::from((offset + index as u64 + 1).to_string()),
        ];
        cells.extend(
            ArtworkColumn::ALL
                .iter()
                .map(|column| Cell::from(column.display(artwork))),
        );
        Row::new(cells).style(style)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(table_title(state)).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn table_title(state: &AppState) -> String {
    if state.loading {
        format!("artworks · loading page {}…", state.cursor.page)
    } else if state.records.is_empty() {
        "artworks · no rows".to_owned()
    } else {
        "artworks".to_owned()
    }
}

fn page_checkbox_marker(state: &AppState) -> &'static str {
    let checked = state.visible_selection().len();
    if checked == 0 {
        UNCHECKED
    } else if checked == state.records.len() {
        CHECKED
    } else {
        PARTIAL
    }
}

fn footer_text(state: &AppState) -> String {
    let offset = state.first_row_offset();
    let rows = if state.records.is_empty() {
        format!("rows 0 of {}", state.total_records)
    } else {
        format!(
            "rows {}–{} of {}",
            offset + 1,
            offset + state.records.len() as u64,
            state.total_records
        )
    };
    let pages = if state.total_pages > 0 {
        format!("page {}/{}", state.cursor.page, state.total_pages)
    } else {
        format!("page {}", state.cursor.page)
    };
    let mut footer = format!(
        "{pages} · {rows} · {} selected",
        state.selection.selected_count()
    );
    if state.loading {
        footer.push_str(" · loading…");
    }
    footer
}

fn status_text(state: &AppState) -> String {
    let default = "j/k move | space toggle | a page | n/p g/G pages | s select rows | ? help | q";
    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default.to_owned(),
    }
}

fn render_popover_text(state: &AppState, popover: &PopoverUiState) -> String {
    if state.bulk_in_flight {
        return format!(
            "Selecting {} rows across pages…\n\nthis closes when the selection is committed",
            state.rows_wanted
        );
    }
    format!(
        "Enter the number of rows to select:\n\n> {}▏\n\nenter submit · esc cancel",
        popover.input
    )
}

fn help_overlay_text() -> &'static str {
    "j/k, ↑/↓      move row cursor\n\
     home/end      first/last row\n\
     space         toggle the row under the cursor\n\
     a             select or clear every row on this page\n\
     n/p, →/←      next/previous page\n\
     g/G           first/last page\n\
     s             select the first N unselected rows, across pages\n\
     ?             toggle this help\n\
     q, ctrl+c     quit"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
