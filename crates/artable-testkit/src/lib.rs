// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use artable_app::{DemoCatalog, Page, PageSource};
use std::collections::BTreeSet;

/// In-memory page source that records every request and fails on demand.
#[derive(Debug, Clone)]
pub struct ScriptedPages {
    catalog: DemoCatalog,
    failing: BTreeSet<u32>,
    fetched: Vec<u32>,
}

impl ScriptedPages {
    pub fn new(catalog: DemoCatalog) -> Self {
        Self {
            catalog,
            failing: BTreeSet::new(),
            fetched: Vec::new(),
        }
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    pub fn fetched(&self) -> &[u32] {
        &self.fetched
    }
}

impl PageSource for ScriptedPages {
    fn fetch_page(&mut self, page: u32) -> Result<Page> {
        self.fetched.push(page);
        if self.failing.contains(&page) {
            bail!("server returned 503 for page {page}");
        }
        self.catalog.fetch_page(page)
    }
}

#[cfg(test)]
mod tests {
    use super::ScriptedPages;
    use anyhow::Result;
    use artable_app::{DemoCatalog, PageSource};

    #[test]
    fn scripted_pages_log_requests_and_inject_failures() -> Result<()> {
        let mut pages = ScriptedPages::new(DemoCatalog::new(30, 10)).failing_on(2);
        pages.fetch_page(1)?;
        let error = pages.fetch_page(2).expect_err("page 2 should fail");
        assert!(error.to_string().contains("503"));
        assert_eq!(pages.fetched(), &[1, 2]);
        Ok(())
    }
}
