// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Generated artwork collection behind `--demo`.

use anyhow::{Result, bail};

use crate::{Artwork, ArtworkId, Page, PageSource};

const SUBJECTS: [&str; 16] = [
    "Harbor",
    "Orchard",
    "Cathedral",
    "Lotus",
    "Horseman",
    "Mountain",
    "Garden",
    "Bather",
    "Cypress",
    "Lantern",
    "Dancer",
    "Pheasant",
    "River",
    "Market",
    "Crane",
    "Vase",
];

const FORMS: [&str; 10] = [
    "Study of a",
    "View of the",
    "Portrait with",
    "Fragment of a",
    "The",
    "Evening",
    "Morning",
    "Sketch for a",
    "Panel with",
    "Little",
];

const PLACES: [&str; 12] = [
    "France",
    "Japan",
    "United States",
    "Italy",
    "China",
    "Netherlands",
    "Egypt",
    "Mexico",
    "England",
    "Persia",
    "Germany",
    "Peru",
];

const ARTISTS: [&str; 12] = [
    "Claude Marchand",
    "Hana Okabe",
    "Winslow Carter",
    "Lucia Ferrante",
    "Wen Zhao",
    "Pieter van Loon",
    "Unknown maker",
    "Rosa Aguilar",
    "Edmund Hale",
    "Reza Tabrizi",
    "Greta Vogel",
    "Workshop of the Nazca",
];

const INSCRIPTIONS: [&str; 5] = [
    "Signed lower right",
    "Dated on reverse",
    "Stamped with collector's seal",
    "Inscribed in ink along the margin",
    "Monogram lower left",
];

/// Ids are spaced out so they never look like row numbers.
const ID_BASE: i64 = 10_000;
const ID_STRIDE: i64 = 7;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: usize) -> bool {
        self.int_n(100) < percent
    }

    fn pick<'a>(&mut self, values: &[&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }
}

/// Stable id of the row at zero-based `position` in a generated collection.
pub fn artwork_id_at(position: u64) -> ArtworkId {
    ArtworkId::new(ID_BASE + (position as i64) * ID_STRIDE)
}

/// Generated artwork for a zero-based collection position. Same position,
/// same record.
pub fn sample_artwork(position: u64) -> Artwork {
    let mut rng = DeterministicRng::new(position);
    let title = format!("{} {}", rng.pick(&FORMS), rng.pick(&SUBJECTS));
    let place_of_origin = if rng.chance(85) {
        Some(rng.pick(&PLACES).to_owned())
    } else {
        None
    };
    let artist_display = rng.pick(&ARTISTS).to_owned();
    let inscriptions = if rng.chance(40) {
        Some(rng.pick(&INSCRIPTIONS).to_owned())
    } else {
        None
    };
    let (date_start, date_end) = if rng.chance(90) {
        let start = 1400 + rng.int_n(520) as i64;
        let span = rng.int_n(12) as i64;
        (Some(start), Some(start + span))
    } else {
        (None, None)
    };

    Artwork {
        id: artwork_id_at(position),
        title,
        place_of_origin,
        artist_display,
        inscriptions,
        date_start,
        date_end,
    }
}

/// A finite generated collection served in fixed-size pages, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoCatalog {
    pub total: u64,
    pub page_size: u32,
}

impl DemoCatalog {
    pub const fn new(total: u64, page_size: u32) -> Self {
        Self { total, page_size }
    }

    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        u32::try_from(self.total.div_ceil(size)).unwrap_or(u32::MAX)
    }

    /// Pages past the end come back empty, like the remote API does.
    pub fn page(&self, number: u32) -> Page {
        let size = u64::from(self.page_size.max(1));
        let start = u64::from(number.saturating_sub(1)) * size;
        let end = (start + size).min(self.total);
        let records = (start..end.max(start)).map(sample_artwork).collect();
        Page {
            number,
            records,
            total: self.total,
            page_size: self.page_size,
            total_pages: self.total_pages(),
        }
    }

    pub fn ids_on_page(&self, number: u32) -> Vec<ArtworkId> {
        self.page(number).ids().collect()
    }
}

impl PageSource for DemoCatalog {
    fn fetch_page(&mut self, page: u32) -> Result<Page> {
        if page == 0 {
            bail!("page numbers start at 1");
        }
        Ok(self.page(page))
    }
}
