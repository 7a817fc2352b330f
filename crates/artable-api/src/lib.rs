// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use artable_app::{Artwork, ArtworkId, MAX_PAGE_SIZE, Page, PageSource};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.artic.edu/api/v1";

/// Columns the table shows; everything else is left out of the response.
pub const ARTWORK_FIELDS: &str =
    "id,title,place_of_origin,artist_display,inscriptions,date_start,date_end";

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    page_size: u32,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, page_size: u32, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        validate_base_url(&base_url)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            bail!("api.page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("artable/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            page_size,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/artworks", self.base_url))
            .with_context(|| format!("build artworks URL from {}", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("fields", ARTWORK_FIELDS);
        Ok(url)
    }

    pub fn fetch_page(&self, page: u32) -> Result<Page> {
        if page == 0 {
            bail!("page numbers start at 1");
        }

        let url = self.page_url(page)?;
        debug!(%url, "fetching artworks page");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: ArtworksResponse = response
            .json()
            .with_context(|| format!("decode artworks page {page}"))?;
        Ok(parsed.into_page(page, self.page_size))
    }
}

impl PageSource for Client {
    fn fetch_page(&mut self, page: u32) -> Result<Page> {
        Client::fetch_page(self, page)
    }
}

pub fn validate_base_url(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        bail!("api.base_url must not be empty");
    }
    let parsed = Url::parse(raw).with_context(|| format!("api.base_url {raw:?} is not a URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "api.base_url {raw:?} uses scheme {:?}; expected http or https",
            parsed.scheme()
        );
    }
    if parsed.query().is_some() {
        bail!("api.base_url {raw:?} must not carry a query string");
    }
    Ok(())
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {base_url} timed out -- raise [api].timeout or retry");
    }
    anyhow!(
        "cannot reach {} -- check network access or [api].base_url ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        let detail = parsed
            .detail
            .filter(|detail| !detail.is_empty())
            .or(parsed.error.filter(|error| !error.is_empty()));
        if let Some(detail) = detail {
            return anyhow!("server error ({}): {}", status.as_u16(), detail);
        }
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ArtworksResponse {
    data: Vec<ArtworkRow>,
    pagination: Pagination,
}

impl ArtworksResponse {
    fn into_page(self, number: u32, requested_size: u32) -> Page {
        Page {
            number,
            records: self.data.into_iter().map(ArtworkRow::into_artwork).collect(),
            total: self.pagination.total,
            page_size: self.pagination.limit.unwrap_or(requested_size),
            total_pages: self.pagination.total_pages.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: u64,
    limit: Option<u32>,
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ArtworkRow {
    id: i64,
    title: Option<String>,
    place_of_origin: Option<String>,
    artist_display: Option<String>,
    inscriptions: Option<String>,
    date_start: Option<i64>,
    date_end: Option<i64>,
}

impl ArtworkRow {
    fn into_artwork(self) -> Artwork {
        Artwork {
            id: ArtworkId::new(self.id),
            title: self.title.unwrap_or_default(),
            place_of_origin: self.place_of_origin,
            artist_display: self.artist_display.unwrap_or_default(),
            inscriptions: self.inscriptions,
            date_start: self.date_start,
            date_end: self.date_end,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<String>,
    detail: Option<String>,
}
