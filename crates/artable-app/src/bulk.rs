// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::{Artwork, ArtworkId, Page, SelectionSet};

/// Anything that can hand out pages of the remote collection by number.
pub trait PageSource {
    fn fetch_page(&mut self, page: u32) -> Result<Page>;
}

impl<F> PageSource for F
where
    F: FnMut(u32) -> Result<Page>,
{
    fn fetch_page(&mut self, page: u32) -> Result<Page> {
        self(page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkPhase {
    Scanning { page: u32 },
    FetchingNext { page: u32 },
    FetchFailed { page: u32 },
    Committing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkStop {
    Satisfied,
    Exhausted { last_page: u32 },
    FetchFailed { page: u32, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub requested: u32,
    pub picked: Vec<ArtworkId>,
    pub pages_fetched: Vec<u32>,
    pub stop: BulkStop,
}

impl BulkOutcome {
    pub fn is_partial(&self) -> bool {
        !matches!(self.stop, BulkStop::Satisfied)
    }

    pub fn summary(&self) -> String {
        let picked = self.picked.len();
        match &self.stop {
            BulkStop::Satisfied => format!("selected {picked} rows"),
            BulkStop::Exhausted { last_page } => format!(
                "selected {picked} of {} rows; no rows left after page {last_page}",
                self.requested
            ),
            BulkStop::FetchFailed { page, error } => format!(
                "selected {picked} of {} rows; page {page} failed: {error}",
                self.requested
            ),
        }
    }
}

/// Walks pages in ascending order picking the first `requested` ids that are
/// not selected yet.
///
/// The walk works on a snapshot of the selection taken at `begin`; nothing
/// is written back until the caller commits the finished outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSelection {
    requested: u32,
    remaining: u32,
    snapshot: SelectionSet,
    picked: Vec<ArtworkId>,
    seen: BTreeSet<ArtworkId>,
    page: u32,
    total_pages: u32,
    pages_fetched: Vec<u32>,
    exhausted: bool,
    failure: Option<(u32, String)>,
    phase: BulkPhase,
}

impl BulkSelection {
    /// Starts a walk on the page the user is looking at and scans its rows.
    pub fn begin(
        requested: u32,
        selection: &SelectionSet,
        current_page: u32,
        current_records: &[Artwork],
        total_pages: u32,
    ) -> Self {
        let mut walk = Self {
            requested,
            remaining: requested,
            snapshot: selection.clone(),
            picked: Vec::new(),
            seen: BTreeSet::new(),
            page: current_page.max(1),
            total_pages,
            pages_fetched: Vec::new(),
            exhausted: false,
            failure: None,
            phase: BulkPhase::Scanning {
                page: current_page.max(1),
            },
        };
        walk.scan(current_records);
        if walk.total_pages > 0 && walk.page >= walk.total_pages {
            walk.exhausted = true;
        }
        walk
    }

    pub fn requested(&self) -> u32 {
        self.requested
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn picked(&self) -> &[ArtworkId] {
        &self.picked
    }

    pub fn phase(&self) -> BulkPhase {
        self.phase
    }

    pub fn is_satisfied(&self) -> bool {
        self.remaining == 0
    }

    /// Next page to request, or `None` once the walk is over.
    pub fn next_page(&self) -> Option<u32> {
        if self.is_satisfied() || self.exhausted || self.failure.is_some() {
            return None;
        }
        self.page.checked_add(1)
    }

    /// Feeds a freshly fetched page into the walk.
    pub fn absorb(&mut self, page: &Page) {
        self.page = page.number;
        self.pages_fetched.push(page.number);
        if page.total_pages > 0 {
            self.total_pages = page.total_pages;
        }
        self.phase = BulkPhase::Scanning { page: page.number };
        if page.is_empty() {
            self.exhausted = true;
            return;
        }
        self.scan(&page.records);
        if page.is_last() {
            self.exhausted = true;
        }
    }

    pub fn fail(&mut self, page: u32, error: String) {
        self.phase = BulkPhase::FetchFailed { page };
        self.failure = Some((page, error));
    }

    /// Drives the walk to completion, one fetch at a time.
    pub fn run<S: PageSource + ?Sized>(mut self, source: &mut S) -> BulkOutcome {
        while let Some(page) = self.next_page() {
            self.phase = BulkPhase::FetchingNext { page };
            debug!(phase = ?self.phase(), remaining = self.remaining, "bulk select fetching");
            match source.fetch_page(page) {
                Ok(fetched) => {
                    self.absorb(&fetched);
                    debug!(
                        phase = ?self.phase(),
                        rows = fetched.records.len(),
                        remaining = self.remaining,
                        "bulk select scanned page"
                    );
                }
                Err(error) => {
                    let error = format!("{error:#}");
                    self.fail(page, error.clone());
                    warn!(phase = ?self.phase(), %error, "bulk select fetch failed");
                }
            }
        }
        let outcome = self.finish();
        debug!(
            picked = outcome.picked.len(),
            stop = ?outcome.stop,
            "bulk select committing"
        );
        outcome
    }

    pub fn finish(mut self) -> BulkOutcome {
        self.phase = BulkPhase::Committing;
        let stop = if let Some((page, error)) = self.failure.take() {
            BulkStop::FetchFailed { page, error }
        } else if self.is_satisfied() {
            BulkStop::Satisfied
        } else {
            BulkStop::Exhausted {
                last_page: self.page,
            }
        };
        BulkOutcome {
            requested: self.requested,
            picked: self.picked,
            pages_fetched: self.pages_fetched,
            stop,
        }
    }

    fn scan(&mut self, records: &[Artwork]) {
        for artwork in records {
            if self.remaining == 0 {
                break;
            }
            if self.snapshot.is_selected(artwork.id) || !self.seen.insert(artwork.id) {
                continue;
            }
            self.picked.push(artwork.id);
            self.remaining -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BulkPhase, BulkSelection, BulkStop};
    use crate::{Artwork, ArtworkId, Page, SelectionSet};

    fn records(ids: std::ops::RangeInclusive<i64>) -> Vec<Artwork> {
        ids.map(|id| Artwork {
            id: ArtworkId::new(id),
            title: format!("Artwork {id}"),
            place_of_origin: None,
            artist_display: String::new(),
            inscriptions: None,
            date_start: None,
            date_end: None,
        })
        .collect()
    }

    fn page(number: u32, ids: std::ops::RangeInclusive<i64>) -> Page {
        Page {
            number,
            records: records(ids),
            total: 30,
            page_size: 10,
            total_pages: 3,
        }
    }

    #[test]
    fn satisfied_on_current_page_needs_no_fetch() {
        let walk = BulkSelection::begin(3, &SelectionSet::new(), 1, &records(1..=10), 3);
        assert!(walk.is_satisfied());
        assert_eq!(walk.next_page(), None);
        assert_eq!(
            walk.picked(),
            &[ArtworkId::new(1), ArtworkId::new(2), ArtworkId::new(3)]
        );
    }

    #[test]
    fn already_selected_rows_are_skipped_not_counted() {
        let selection: SelectionSet = [ArtworkId::new(1), ArtworkId::new(3)]
            .into_iter()
            .collect();
        let walk = BulkSelection::begin(2, &selection, 1, &records(1..=5), 3);
        assert_eq!(walk.picked(), &[ArtworkId::new(2), ArtworkId::new(4)]);
    }

    #[test]
    fn phases_follow_the_walk() {
        let mut walk = BulkSelection::begin(15, &SelectionSet::new(), 1, &records(1..=10), 3);
        assert_eq!(walk.phase(), BulkPhase::Scanning { page: 1 });
        assert_eq!(walk.next_page(), Some(2));

        walk.absorb(&page(2, 11..=20));
        assert_eq!(walk.phase(), BulkPhase::Scanning { page: 2 });
        assert_eq!(walk.next_page(), None);

        let outcome = walk.finish();
        assert_eq!(outcome.stop, BulkStop::Satisfied);
        assert_eq!(outcome.picked.len(), 15);
    }

    #[test]
    fn failure_stops_the_walk_and_keeps_picks() {
        let mut walk = BulkSelection::begin(15, &SelectionSet::new(), 1, &records(1..=10), 3);
        walk.fail(2, "timed out".to_owned());
        assert_eq!(walk.phase(), BulkPhase::FetchFailed { page: 2 });
        assert_eq!(walk.next_page(), None);

        let outcome = walk.finish();
        assert!(outcome.is_partial());
        assert_eq!(outcome.picked.len(), 10);
        assert_eq!(
            outcome.summary(),
            "selected 10 of 15 rows; page 2 failed: timed out"
        );
    }

    #[test]
    fn walk_on_last_page_does_not_fetch_further() {
        let walk = BulkSelection::begin(50, &SelectionSet::new(), 3, &records(21..=30), 3);
        assert_eq!(walk.next_page(), None);
        assert_eq!(walk.finish().stop, BulkStop::Exhausted { last_page: 3 });
    }

    #[test]
    fn empty_page_ends_the_walk_when_page_count_is_unknown() {
        let mut walk = BulkSelection::begin(50, &SelectionSet::new(), 1, &records(1..=10), 0);
        walk.absorb(&Page {
            number: 2,
            records: Vec::new(),
            total: 10,
            page_size: 10,
            total_pages: 0,
        });
        assert_eq!(walk.next_page(), None);
    }

    #[test]
    fn duplicate_ids_across_pages_are_counted_once() {
        let mut walk = BulkSelection::begin(12, &SelectionSet::new(), 1, &records(1..=10), 3);
        walk.absorb(&page(2, 9..=18));
        assert_eq!(
            walk.picked()[10..],
            [ArtworkId::new(11), ArtworkId::new(12)]
        );
    }
}
