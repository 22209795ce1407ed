//! Catalog screen state: query, results and pagination
//!
//! Every change to the query schedules a fetch. Fetches are identified by a
//! monotonically increasing token and only the response to the latest token
//! is applied, so a slow response can never overwrite newer results.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::types::*;

/// The tuple (page, sort field, sort order, search text) driving fetches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub page: usize,
    pub sort: SortField,
    pub order: SortOrder,
    pub search: String,
}

impl CatalogQuery {
    pub fn skip(&self) -> usize {
        self.page * PAGE_SIZE
    }

    /// Query-string parameters in the order the server expects them
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("limit", PAGE_SIZE.to_string()),
            ("skip", self.skip().to_string()),
            ("sort", self.sort.as_param().to_string()),
            ("order", self.order.as_param().to_string()),
            ("search", self.search.clone()),
        ]
    }

    pub fn sort_option(&self) -> SortOption {
        SortOption::new(self.sort, self.order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    /// Last fetch failed; previous results are still shown
    Failed(String),
}

/// A fetch the UI wants performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub token: u64,
    pub query: CatalogQuery,
}

/// One control in the pagination bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    Prev,
    Page { index: usize, current: bool },
    Next,
}

#[derive(Debug)]
pub struct CatalogState {
    query: CatalogQuery,
    apps: Vec<AppRecord>,
    total: usize,
    total_pages: usize,
    status: LoadStatus,
    latest_token: u64,
    /// Page of the latest request handed out, and of the rows on screen
    requested_page: usize,
    loaded_page: usize,
    /// When the next fetch becomes due, if one is scheduled
    fetch_due: Option<Instant>,
    search_debounce: Duration,
}

impl CatalogState {
    /// Fresh state with default query; the initial fetch is due immediately.
    pub fn new(search_debounce: Duration) -> Self {
        Self {
            query: CatalogQuery::default(),
            apps: Vec::new(),
            total: 0,
            total_pages: 0,
            status: LoadStatus::Idle,
            latest_token: 0,
            requested_page: 0,
            loaded_page: 0,
            fetch_due: Some(Instant::now()),
            search_debounce,
        }
    }

    // === Accessors ===

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    pub fn apps(&self) -> &[AppRecord] {
        &self.apps
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Page whose rows are on screen. After a failed fetch this is the last
    /// page that loaded, not the one that was asked for.
    pub fn shown_page(&self) -> usize {
        match self.status {
            LoadStatus::Failed(_) => self.loaded_page,
            _ => self.query.page,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn has_pending_fetch(&self) -> bool {
        self.fetch_due.is_some()
    }

    // === Query changes ===

    fn schedule(&mut self, delay: Duration) {
        self.fetch_due = Some(Instant::now() + delay);
    }

    /// Apply a compound sort choice; always returns to the first page.
    pub fn select_sort(&mut self, option: SortOption) {
        self.query.sort = option.field;
        self.query.order = option.order;
        self.query.page = 0;
        self.schedule(Duration::ZERO);
    }

    /// Step through the selector options. Starts at the first option when the
    /// current sort is not one of them (the server-default order).
    pub fn cycle_sort(&mut self, forward: bool) {
        let all = SortOption::all();
        let next = match all.iter().position(|o| *o == self.query.sort_option()) {
            Some(idx) if forward => (idx + 1) % all.len(),
            Some(idx) => (idx + all.len() - 1) % all.len(),
            None => 0,
        };
        self.select_sort(all[next]);
    }

    pub fn set_search(&mut self, text: &str) {
        if self.query.search == text {
            return;
        }
        self.query.search = text.to_string();
        self.query.page = 0;
        self.schedule(self.search_debounce);
    }

    pub fn push_search_char(&mut self, c: char) {
        let mut text = self.query.search.clone();
        text.push(c);
        self.set_search(&text);
    }

    pub fn pop_search_char(&mut self) {
        let mut text = self.query.search.clone();
        if text.pop().is_some() {
            self.set_search(&text);
        }
    }

    /// Jump to a page. Out-of-range indexes are ignored.
    pub fn go_to_page(&mut self, index: usize) {
        let failed = matches!(self.status, LoadStatus::Failed(_));
        if index >= self.total_pages || (index == self.query.page && !failed) {
            return;
        }
        self.query.page = index;
        self.schedule(Duration::ZERO);
    }

    pub fn next_page(&mut self) {
        let next = self.shown_page() + 1;
        if next < self.total_pages {
            self.go_to_page(next);
        }
    }

    pub fn prev_page(&mut self) {
        if let Some(prev) = self.shown_page().checked_sub(1) {
            self.go_to_page(prev);
        }
    }

    pub fn first_page(&mut self) {
        self.go_to_page(0);
    }

    pub fn last_page(&mut self) {
        if let Some(last) = self.total_pages.checked_sub(1) {
            self.go_to_page(last);
        }
    }

    /// Re-issue the current query (after a failure, or to refresh)
    pub fn retry(&mut self) {
        self.schedule(Duration::ZERO);
    }

    // === Fetch sequencing ===

    /// Hand out the scheduled fetch once it is due
    pub fn take_due_request(&mut self, now: Instant) -> Option<FetchRequest> {
        match self.fetch_due {
            Some(due) if due <= now => {
                self.fetch_due = None;
                self.latest_token += 1;
                self.requested_page = self.query.page;
                self.status = LoadStatus::Loading;
                Some(FetchRequest {
                    token: self.latest_token,
                    query: self.query.clone(),
                })
            }
            _ => None,
        }
    }

    /// Apply a fetch result. Returns false if the response was stale.
    pub fn apply_response(&mut self, token: u64, result: Result<AppsPage, String>) -> bool {
        if token != self.latest_token {
            debug!(token, latest = self.latest_token, "dropping stale catalog response");
            return false;
        }
        match result {
            Ok(page) => {
                self.total = page.total;
                self.total_pages = page.total.div_ceil(PAGE_SIZE);
                self.apps = page.apps;
                self.loaded_page = self.requested_page;
                self.status = LoadStatus::Loaded;
            }
            Err(e) => {
                warn!(error = %e, page = self.requested_page, "loading apps failed");
                self.status = LoadStatus::Failed(e);
            }
        }
        true
    }

    // === Pagination ===

    pub fn page_controls(&self) -> Vec<PageControl> {
        let page = self.shown_page();
        let mut controls = Vec::with_capacity(self.total_pages + 2);
        if page > 0 {
            controls.push(PageControl::Prev);
        }
        controls.extend((0..self.total_pages).map(|index| PageControl::Page {
            index,
            current: index == page,
        }));
        if page + 1 < self.total_pages {
            controls.push(PageControl::Next);
        }
        controls
    }
}
