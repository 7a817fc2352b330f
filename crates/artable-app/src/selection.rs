// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::{Artwork, ArtworkId, DEFAULT_PAGE_SIZE};

/// Checked state per record id, kept across page changes.
///
/// An id may be present with `false` after the user unchecks it; only `true`
/// entries count as selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: BTreeMap<ArtworkId, bool>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: ArtworkId, selected: bool) {
        self.entries.insert(id, selected);
    }

    pub fn is_selected(&self, id: ArtworkId) -> bool {
        self.entries.get(&id).copied().unwrap_or(false)
    }

    /// Folds `changes` in by key. Ids not mentioned keep their state.
    pub fn merge(&mut self, changes: &BTreeMap<ArtworkId, bool>) {
        for (id, selected) in changes {
            self.entries.insert(*id, *selected);
        }
    }

    pub fn selected_count(&self) -> usize {
        self.entries.values().filter(|selected| **selected).count()
    }

    pub fn selected_ids(&self) -> Vec<ArtworkId> {
        self.entries
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn entries(&self) -> &BTreeMap<ArtworkId, bool> {
        &self.entries
    }

    /// Records of `loaded` whose ids are selected, in page order.
    pub fn visible_selection<'a>(&self, loaded: &'a [Artwork]) -> Vec<&'a Artwork> {
        loaded
            .iter()
            .filter(|artwork| self.is_selected(artwork.id))
            .collect()
    }
}

impl FromIterator<ArtworkId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = ArtworkId>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|id| (id, true)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingCursor {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PagingCursor {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PagingCursor {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Zero-based index of the first row on the current page.
    pub fn first_row_offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn total_pages(&self, total_records: u64) -> u32 {
        let size = u64::from(self.page_size.max(1));
        u32::try_from(total_records.div_ceil(size)).unwrap_or(u32::MAX)
    }
}
