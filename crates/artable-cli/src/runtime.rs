// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use artable_api::Client;
use artable_app::{BulkSelection, DemoCatalog, Page, PageSource};
use artable_tui::{AppRuntime, InternalEvent, PageLoadEvent};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

/// Talks to the remote API. Every fetch runs on its own worker thread so the
/// table keeps redrawing while a request is in flight.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for ApiRuntime {
    fn load_page(&mut self, page: u32) -> Result<Page> {
        self.client.fetch_page(page)
    }

    fn spawn_page_load(
        &mut self,
        request_id: u64,
        page: u32,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("page-load-{page}"))
            .spawn(move || {
                let event = match client.fetch_page(page) {
                    Ok(page) => PageLoadEvent::Loaded { request_id, page },
                    Err(error) => PageLoadEvent::Failed {
                        request_id,
                        page,
                        error: format!("{error:#}"),
                    },
                };
                if tx.send(InternalEvent::PageLoad(event)).is_err() {
                    debug!(request_id, page, "table closed before page arrived");
                }
            })?;
        Ok(())
    }

    fn spawn_bulk_select(
        &mut self,
        request_id: u64,
        walk: BulkSelection,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let mut client = self.client.clone();
        thread::Builder::new()
            .name("bulk-select".to_owned())
            .spawn(move || {
                let outcome = walk.run(&mut client);
                if tx
                    .send(InternalEvent::BulkSelect {
                        request_id,
                        outcome,
                    })
                    .is_err()
                {
                    debug!(request_id, "table closed before bulk selection finished");
                }
            })?;
        Ok(())
    }
}

/// Offline catalog for `--demo`; pages are generated in place, so the
/// default synchronous spawns are enough.
pub struct DemoRuntime {
    catalog: DemoCatalog,
}

impl DemoRuntime {
    pub const DEMO_ROWS: u64 = 487;

    pub fn new(page_size: u32) -> Self {
        Self {
            catalog: DemoCatalog::new(Self::DEMO_ROWS, page_size),
        }
    }
}

impl AppRuntime for DemoRuntime {
    fn load_page(&mut self, page: u32) -> Result<Page> {
        self.catalog.fetch_page(page)
    }
}
