// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::{Artwork, ArtworkId, BulkOutcome, BulkSelection, Page, PagingCursor, SelectionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverVisibility {
    Hidden,
    Visible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub cursor: PagingCursor,
    pub selection: SelectionSet,
    pub records: Vec<Artwork>,
    pub loaded_page: Option<u32>,
    pub total_records: u64,
    pub total_pages: u32,
    pub loading: bool,
    pub rows_wanted: u32,
    pub popover: PopoverVisibility,
    pub bulk_in_flight: bool,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            cursor: PagingCursor::default(),
            selection: SelectionSet::new(),
            records: Vec::new(),
            loaded_page: None,
            total_records: 0,
            total_pages: 0,
            loading: false,
            rows_wanted: 0,
            popover: PopoverVisibility::Hidden,
            bulk_in_flight: false,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ToggleRow { id: ArtworkId, selected: bool },
    ChangePage(u32),
    PageLoaded(Page),
    PageLoadFailed(String),
    ApplySelectionChange(BTreeMap<ArtworkId, bool>),
    OpenPopover,
    ClosePopover,
    SetRowsWanted(u32),
    SubmitBulkSelect,
    CommitBulkSelect(BulkOutcome),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SelectionChanged { selected: usize },
    PageChanged { page: u32, first_row_offset: u64 },
    FetchRequested { page: u32 },
    PageReady { page: u32, rows: usize },
    BulkStarted(BulkSelection),
    BulkCommitted { picked: usize, partial: bool },
    PopoverChanged(PopoverVisibility),
    RowsWantedChanged(u32),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn with_start_page(page: u32, page_size: u32) -> Self {
        Self {
            cursor: PagingCursor::new(page, page_size),
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ToggleRow { id, selected } => {
                self.selection.set(id, selected);
                vec![self.selection_changed()]
            }
            AppCommand::ChangePage(page) => self.change_page(page),
            AppCommand::PageLoaded(page) => self.page_loaded(page),
            AppCommand::PageLoadFailed(message) => self.page_load_failed(&message),
            AppCommand::ApplySelectionChange(changes) => {
                self.selection.merge(&changes);
                vec![self.selection_changed()]
            }
            AppCommand::OpenPopover => {
                self.popover = PopoverVisibility::Visible;
                vec![AppEvent::PopoverChanged(self.popover)]
            }
            AppCommand::ClosePopover => {
                self.popover = PopoverVisibility::Hidden;
                vec![AppEvent::PopoverChanged(self.popover)]
            }
            AppCommand::SetRowsWanted(rows) => {
                self.rows_wanted = rows;
                vec![AppEvent::RowsWantedChanged(rows)]
            }
            AppCommand::SubmitBulkSelect => self.submit_bulk_select(),
            AppCommand::CommitBulkSelect(outcome) => self.commit_bulk_select(outcome),
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn first_row_offset(&self) -> u64 {
        self.cursor.first_row_offset()
    }

    pub fn visible_selection(&self) -> Vec<&Artwork> {
        self.selection.visible_selection(&self.records)
    }

    /// Checked state flipped for every loaded row: all false when the whole
    /// page is already selected, all true otherwise.
    pub fn page_toggle_changes(&self) -> BTreeMap<ArtworkId, bool> {
        let all_selected = !self.records.is_empty()
            && self
                .records
                .iter()
                .all(|artwork| self.selection.is_selected(artwork.id));
        self.records
            .iter()
            .map(|artwork| (artwork.id, !all_selected))
            .collect()
    }

    fn change_page(&mut self, page: u32) -> Vec<AppEvent> {
        let mut page = page.max(1);
        if self.total_pages > 0 {
            page = page.min(self.total_pages);
        }
        let already_loaded = self.loaded_page == Some(page);
        if page == self.cursor.page && (self.loading || already_loaded) {
            return Vec::new();
        }

        self.cursor.page = page;
        let changed = AppEvent::PageChanged {
            page,
            first_row_offset: self.cursor.first_row_offset(),
        };
        // Back on the rows already held; the fetch still in flight is dropped
        // by the page number check in `page_loaded`.
        if already_loaded {
            self.loading = false;
            return vec![changed];
        }

        self.loading = true;
        vec![changed, AppEvent::FetchRequested { page }]
    }

    fn page_load_failed(&mut self, message: &str) -> Vec<AppEvent> {
        self.loading = false;
        if let Some(loaded) = self.loaded_page {
            self.cursor.page = loaded;
        }
        vec![self.set_status(&format!("load failed: {message}"))]
    }

    fn page_loaded(&mut self, page: Page) -> Vec<AppEvent> {
        if page.number != self.cursor.page {
            return Vec::new();
        }
        self.loading = false;
        if page.page_size > 0 {
            self.cursor.page_size = page.page_size;
        }
        self.total_records = page.total;
        self.total_pages = if page.total_pages > 0 {
            page.total_pages
        } else {
            self.cursor.total_pages(page.total)
        };
        let rows = page.records.len();
        self.records = page.records;
        self.loaded_page = Some(page.number);
        vec![AppEvent::PageReady {
            page: page.number,
            rows,
        }]
    }

    fn submit_bulk_select(&mut self) -> Vec<AppEvent> {
        if self.bulk_in_flight {
            return vec![self.set_status("bulk selection already running")];
        }

        let walk = BulkSelection::begin(
            self.rows_wanted,
            &self.selection,
            self.loaded_page.unwrap_or(self.cursor.page),
            &self.records,
            self.total_pages,
        );
        if walk.next_page().is_none() {
            return self.commit_bulk_select(walk.finish());
        }

        self.bulk_in_flight = true;
        vec![
            AppEvent::BulkStarted(walk),
            self.set_status("selecting rows across pages"),
        ]
    }

    fn commit_bulk_select(&mut self, outcome: BulkOutcome) -> Vec<AppEvent> {
        self.bulk_in_flight = false;
        for id in &outcome.picked {
            self.selection.set(*id, true);
        }
        self.popover = PopoverVisibility::Hidden;

        let mut events = vec![
            AppEvent::BulkCommitted {
                picked: outcome.picked.len(),
                partial: outcome.is_partial(),
            },
            self.selection_changed(),
            AppEvent::PopoverChanged(self.popover),
        ];
        if outcome.requested > 0 {
            events.push(self.set_status(&outcome.summary()));
        }
        events
    }

    fn selection_changed(&self) -> AppEvent {
        AppEvent::SelectionChanged {
            selected: self.selection.selected_count(),
        }
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, PopoverVisibility};
    use crate::{Artwork, ArtworkId, BulkStop, Page};
    use std::collections::BTreeMap;

    fn records(ids: std::ops::RangeInclusive<i64>) -> Vec<Artwork> {
        ids.map(|id| Artwork {
            id: ArtworkId::new(id),
            title: format!("Artwork {id}"),
            place_of_origin: Some("France".to_owned()),
            artist_display: "Anonymous".to_owned(),
            inscriptions: None,
            date_start: Some(1800),
            date_end: Some(1810),
        })
        .collect()
    }

    fn loaded_state(page: u32, ids: std::ops::RangeInclusive<i64>) -> AppState {
        let mut state = AppState::with_start_page(page, 10);
        state.dispatch(AppCommand::PageLoaded(Page {
            number: page,
            records: records(ids),
            total: 100,
            page_size: 10,
            total_pages: 10,
        }));
        state
    }

    #[test]
    fn change_page_requests_exactly_one_fetch() {
        let mut state = loaded_state(1, 1..=10);

        let events = state.dispatch(AppCommand::ChangePage(3));
        assert!(state.loading);
        assert_eq!(state.first_row_offset(), 20);
        assert_eq!(
            events,
            vec![
                AppEvent::PageChanged {
                    page: 3,
                    first_row_offset: 20,
                },
                AppEvent::FetchRequested { page: 3 },
            ]
        );
        assert!(state.selection.entries().is_empty());
    }

    #[test]
    fn change_page_clamps_to_known_range() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::ChangePage(99));
        assert_eq!(state.cursor.page, 10);
        assert!(state.dispatch(AppCommand::ChangePage(10)).is_empty());

        state.dispatch(AppCommand::PageLoadFailed("offline".to_owned()));
        assert_eq!(state.dispatch(AppCommand::ChangePage(10)).len(), 2);

        state.dispatch(AppCommand::PageLoaded(Page {
            number: 10,
            records: records(91..=100),
            total: 100,
            page_size: 10,
            total_pages: 10,
        }));
        assert!(state.dispatch(AppCommand::ChangePage(10)).is_empty());
    }

    #[test]
    fn page_loaded_adopts_server_page_size() {
        let mut state = AppState::with_start_page(2, 10);
        state.dispatch(AppCommand::PageLoaded(Page {
            number: 2,
            records: records(13..=24),
            total: 120,
            page_size: 12,
            total_pages: 10,
        }));
        assert_eq!(state.cursor.page_size, 12);
        assert_eq!(state.first_row_offset(), 12);
        assert!(!state.loading);
    }

    #[test]
    fn result_for_a_page_no_longer_wanted_is_ignored() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::ChangePage(2));
        state.dispatch(AppCommand::ChangePage(3));

        let events = state.dispatch(AppCommand::PageLoaded(Page {
            number: 2,
            records: records(11..=20),
            total: 100,
            page_size: 10,
            total_pages: 10,
        }));
        assert!(events.is_empty());
        assert!(state.loading);
        assert_eq!(state.loaded_page, Some(1));
    }

    #[test]
    fn load_failure_keeps_stale_rows() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::ChangePage(2));

        state.dispatch(AppCommand::PageLoadFailed("offline".to_owned()));
        assert!(!state.loading);
        assert_eq!(state.records.len(), 10);
        assert_eq!(state.status_line.as_deref(), Some("load failed: offline"));
        assert_eq!(state.cursor.page, 1);
        assert_eq!(state.first_row_offset(), 0);
    }

    #[test]
    fn returning_to_loaded_page_mid_fetch_drops_the_fetch() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::ChangePage(2));

        let events = state.dispatch(AppCommand::ChangePage(1));
        assert_eq!(
            events,
            vec![AppEvent::PageChanged {
                page: 1,
                first_row_offset: 0,
            }]
        );
        assert_eq!(state.cursor.page, 1);
        assert!(!state.loading);

        let late = state.dispatch(AppCommand::PageLoaded(Page {
            number: 2,
            records: records(11..=20),
            total: 100,
            page_size: 10,
            total_pages: 10,
        }));
        assert!(late.is_empty());
        assert_eq!(state.cursor.page, 1);
        assert_eq!(state.records[0].id, ArtworkId::new(1));
    }

    #[test]
    fn failed_load_leaves_cursor_on_the_rows_shown() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::ChangePage(2));
        state.dispatch(AppCommand::PageLoadFailed("offline".to_owned()));
        assert_eq!(state.cursor.page, 1);
        assert_eq!(state.records[0].id, ArtworkId::new(1));

        assert!(state.dispatch(AppCommand::ChangePage(1)).is_empty());
        let retry = state.dispatch(AppCommand::ChangePage(2));
        assert_eq!(retry.last(), Some(&AppEvent::FetchRequested { page: 2 }));
        assert_eq!(state.first_row_offset(), 10);
    }

    #[test]
    fn toggle_row_after_bulk_removes_only_that_id() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::SetRowsWanted(5));
        state.dispatch(AppCommand::SubmitBulkSelect);
        assert_eq!(state.selection.selected_count(), 5);

        state.dispatch(AppCommand::ToggleRow {
            id: ArtworkId::new(3),
            selected: false,
        });
        assert_eq!(
            state.selection.selected_ids(),
            vec![
                ArtworkId::new(1),
                ArtworkId::new(2),
                ArtworkId::new(4),
                ArtworkId::new(5),
            ]
        );
    }

    #[test]
    fn bulk_select_zero_is_a_no_op() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::ToggleRow {
            id: ArtworkId::new(4),
            selected: true,
        });
        let before = state.selection.clone();

        state.dispatch(AppCommand::SetRowsWanted(0));
        state.dispatch(AppCommand::SubmitBulkSelect);
        assert_eq!(state.selection, before);
        assert!(!state.bulk_in_flight);
    }

    #[test]
    fn bulk_select_spilling_over_emits_walk_and_closes_popover_on_commit() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::OpenPopover);
        state.dispatch(AppCommand::SetRowsWanted(15));

        let events = state.dispatch(AppCommand::SubmitBulkSelect);
        let Some(AppEvent::BulkStarted(walk)) = events.into_iter().next() else {
            panic!("expected bulk walk to start");
        };
        assert!(state.bulk_in_flight);
        assert_eq!(state.selection.selected_count(), 0);
        assert_eq!(walk.remaining(), 5);

        let outcome = walk.finish();
        assert!(matches!(outcome.stop, BulkStop::Exhausted { .. }));
        state.dispatch(AppCommand::CommitBulkSelect(outcome));
        assert_eq!(state.selection.selected_count(), 10);
        assert_eq!(state.popover, PopoverVisibility::Hidden);
        assert!(!state.bulk_in_flight);
    }

    #[test]
    fn second_submit_while_running_is_refused() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::SetRowsWanted(25));
        state.dispatch(AppCommand::SubmitBulkSelect);

        let events = state.dispatch(AppCommand::SubmitBulkSelect);
        assert_eq!(
            events,
            vec![AppEvent::StatusUpdated(
                "bulk selection already running".to_owned()
            )]
        );
    }

    #[test]
    fn table_selection_change_merges_additively() {
        let mut state = loaded_state(1, 1..=10);
        state.dispatch(AppCommand::ToggleRow {
            id: ArtworkId::new(3),
            selected: true,
        });

        state.dispatch(AppCommand::ApplySelectionChange(BTreeMap::from([(
            ArtworkId::new(5),
            true,
        )])));
        assert_eq!(
            state.selection.entries(),
            &BTreeMap::from([(ArtworkId::new(3), true), (ArtworkId::new(5), true)])
        );
    }

    #[test]
    fn page_toggle_flips_between_all_and_none() {
        let mut state = loaded_state(2, 11..=20);
        state.dispatch(AppCommand::ToggleRow {
            id: ArtworkId::new(1),
            selected: true,
        });

        let select_all = state.page_toggle_changes();
        assert!(select_all.values().all(|selected| *selected));
        state.dispatch(AppCommand::ApplySelectionChange(select_all));
        assert_eq!(state.visible_selection().len(), 10);

        let clear_all = state.page_toggle_changes();
        assert!(clear_all.values().all(|selected| !*selected));
        state.dispatch(AppCommand::ApplySelectionChange(clear_all));
        assert!(state.visible_selection().is_empty());
        assert!(state.selection.is_selected(ArtworkId::new(1)));
    }
}
