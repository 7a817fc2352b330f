// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: ArtworkId,
    pub title: String,
    pub place_of_origin: Option<String>,
    pub artist_display: String,
    pub inscriptions: Option<String>,
    pub date_start: Option<i64>,
    pub date_end: Option<i64>,
}

/// One batch of records as served by the remote collection.
///
/// `page_size` and `total_pages` are whatever the server reported, which may
/// differ from the size the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub records: Vec<Artwork>,
    pub total: u64,
    pub page_size: u32,
    pub total_pages: u32,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ArtworkId> + '_ {
        self.records.iter().map(|artwork| artwork.id)
    }

    pub fn is_last(&self) -> bool {
        self.total_pages > 0 && self.number >= self.total_pages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtworkColumn {
    Title,
    PlaceOfOrigin,
    ArtistDisplay,
    Inscriptions,
    DateStart,
    DateEnd,
}

impl ArtworkColumn {
    pub const ALL: [Self; 6] = [
        Self::Title,
        Self::PlaceOfOrigin,
        Self::ArtistDisplay,
        Self::Inscriptions,
        Self::DateStart,
        Self::DateEnd,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::PlaceOfOrigin => "Place of Origin",
            Self::ArtistDisplay => "Artist Display",
            Self::Inscriptions => "Inscriptions",
            Self::DateStart => "Start Date",
            Self::DateEnd => "End Date",
        }
    }

    pub fn display(self, artwork: &Artwork) -> String {
        match self {
            Self::Title => artwork.title.clone(),
            Self::PlaceOfOrigin => artwork.place_of_origin.clone().unwrap_or_default(),
            Self::ArtistDisplay => artwork.artist_display.clone(),
            Self::Inscriptions => artwork.inscriptions.clone().unwrap_or_default(),
            Self::DateStart => artwork
                .date_start
                .map(|year| year.to_string())
                .unwrap_or_default(),
            Self::DateEnd => artwork
                .date_end
                .map(|year| year.to_string())
                .unwrap_or_default(),
        }
    }
}
