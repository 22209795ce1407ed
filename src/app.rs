//! TUI application state and logic
//!
//! This module holds TUI-specific state and acts as an adapter between the
//! screen state in the library (catalog, details, installed) and the ratatui UI.

use std::time::{Duration, Instant};

use ratatui::widgets::TableState;
use tracing::warn;

use heroapps::catalog::{CatalogState, LoadStatus};
use heroapps::client::CatalogApi;
use heroapps::details::{DetailState, InstallOutcome};
use heroapps::installed::InstalledState;
use heroapps::store::InstalledStore;
use heroapps::types::*;
use heroapps::worker::FetchWorker;

/// How long the install sparkle plays in the title bar
const CELEBRATION: Duration = Duration::from_millis(1500);

/// A blocking loader call queued until the next frame has been drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingLoad {
    Installed,
    Detail(String),
}

/// TUI Application - wraps the screen states with UI state
pub struct App {
    loader: Box<dyn CatalogApi>,
    store: Box<dyn InstalledStore>,
    worker: FetchWorker,

    pub screen: Screen,
    pub state: AppState,
    pub catalog: CatalogState,
    pub catalog_table: TableState,
    pub detail: Option<DetailState>,
    pub installed: Option<InstalledState>,
    pub installed_table: TableState,

    pub status_message: String,
    pub toast: Option<Toast>,
    pub celebration_started: Option<Instant>,
    /// Screen to return to when leaving the detail screen
    detail_return: Screen,
    pub pending_uninstall: Option<AppRecord>,
    pub pending_load: Option<PendingLoad>,
}

impl App {
    pub fn new(
        loader: Box<dyn CatalogApi>,
        store: Box<dyn InstalledStore>,
        worker: FetchWorker,
        search_debounce: Duration,
    ) -> Self {
        Self {
            loader,
            store,
            worker,
            screen: Screen::Catalog,
            state: AppState::Browsing,
            catalog: CatalogState::new(search_debounce),
            catalog_table: TableState::default(),
            detail: None,
            installed: None,
            installed_table: TableState::default(),
            status_message: String::from("Loading..."),
            toast: None,
            celebration_started: None,
            detail_return: Screen::Catalog,
            pending_uninstall: None,
            pending_load: None,
        }
    }

    // === Tick ===

    /// Dispatch due fetches, apply arrived responses, expire the toast
    pub fn tick(&mut self, now: Instant) {
        if let Some(request) = self.catalog.take_due_request(now) {
            self.worker.submit(request);
            self.update_status_message();
        }

        let mut applied = false;
        for response in self.worker.drain() {
            applied |= self.catalog.apply_response(response.token, response.result);
        }
        if applied {
            self.restore_catalog_selection();
            self.update_status_message();
        }

        if self.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.toast = None;
        }
        if self
            .celebration_started
            .is_some_and(|start| now.duration_since(start) >= CELEBRATION)
        {
            self.celebration_started = None;
        }
    }

    /// Frame index of the install sparkle, if it is playing
    pub fn celebration_frame(&self, now: Instant) -> Option<usize> {
        self.celebration_started
            .map(|start| (now.duration_since(start).as_millis() / 100) as usize)
    }

    fn notify(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toast = Some(Toast::new(message, kind));
    }

    // === Accessors ===

    pub fn selected_catalog_app(&self) -> Option<&AppRecord> {
        self.catalog_table
            .selected()
            .and_then(|i| self.catalog.apps().get(i))
    }

    fn restore_catalog_selection(&mut self) {
        let count = self.catalog.apps().len();
        let selected = self.catalog_table.selected().unwrap_or(0);
        self.catalog_table.select(if count > 0 {
            Some(selected.min(count - 1))
        } else {
            None
        });
    }

    // === Navigation ===

    pub fn move_selection(&mut self, delta: i32) {
        match self.screen {
            Screen::Catalog => {
                let count = self.catalog.apps().len();
                if count == 0 {
                    return;
                }
                let current = self.catalog_table.selected().unwrap_or(0) as i64;
                let new_idx = (current + delta as i64).clamp(0, count as i64 - 1) as usize;
                self.catalog_table.select(Some(new_idx));
            }
            Screen::Installed => {
                if let Some(installed) = &mut self.installed {
                    installed.move_selection(delta);
                    self.installed_table.select(installed.selected_app().map(|_| installed.selected));
                }
            }
            Screen::Detail => {
                if let Some(detail) = &mut self.detail {
                    detail.scroll = if delta < 0 {
                        detail.scroll.saturating_sub(delta.unsigned_abs() as u16)
                    } else {
                        detail.scroll.saturating_add(delta as u16)
                    };
                }
            }
        }
    }

    /// Toggle between the catalog and installed screens
    pub fn switch_screen(&mut self) {
        match self.screen {
            Screen::Catalog => self.show_installed(),
            Screen::Installed | Screen::Detail => self.show_catalog(),
        }
    }

    pub fn show_catalog(&mut self) {
        self.screen = Screen::Catalog;
        self.update_status_message();
    }

    /// Queue loading the full collection; the installed screen mounts once
    /// `run_pending_load` has fetched it.
    pub fn show_installed(&mut self) {
        self.status_message = "Loading installed apps...".to_string();
        self.pending_load = Some(PendingLoad::Installed);
    }

    /// Run the queued loader, if any. Called after a frame is drawn so the
    /// loading message is on screen while the request blocks.
    pub fn run_pending_load(&mut self) {
        match self.pending_load.take() {
            Some(PendingLoad::Installed) => self.load_installed(),
            Some(PendingLoad::Detail(id)) => self.load_detail(&id),
            None => {}
        }
    }

    fn load_installed(&mut self) {
        match self.loader.fetch_all() {
            Ok(all_apps) => {
                let installed = InstalledState::open(all_apps, self.store.as_ref());
                self.installed_table
                    .select(if installed.apps().is_empty() { None } else { Some(0) });
                self.installed = Some(installed);
                self.screen = Screen::Installed;
                self.update_status_message();
            }
            Err(e) => {
                warn!(error = %e, "loading installed apps failed");
                self.status_message = format!("Could not load apps: {e}");
            }
        }
    }

    /// Load the selected app, then mount the detail screen on it
    pub fn open_selected_detail(&mut self) {
        let id = match self.screen {
            Screen::Catalog => self.selected_catalog_app().map(|a| a.id.clone()),
            Screen::Installed => self
                .installed
                .as_ref()
                .and_then(InstalledState::selected_app)
                .map(|a| a.id.clone()),
            Screen::Detail => None,
        };
        let Some(id) = id else {
            self.status_message = "No app selected".to_string();
            return;
        };
        self.open_detail(&id);
    }

    pub fn open_detail(&mut self, id: &str) {
        self.status_message = "Loading app details...".to_string();
        self.pending_load = Some(PendingLoad::Detail(id.to_string()));
    }

    fn load_detail(&mut self, id: &str) {
        match self.loader.fetch_app(id) {
            Ok(record) => {
                self.detail = Some(DetailState::open(id, record, self.store.as_ref()));
                if self.screen != Screen::Detail {
                    self.detail_return = self.screen;
                }
                self.screen = Screen::Detail;
                self.update_status_message();
            }
            Err(e) => {
                warn!(id, error = %e, "loading app details failed");
                self.status_message = format!("Could not load app: {e}");
            }
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
        self.screen = self.detail_return;
        self.update_status_message();
    }

    // === Search ===

    pub fn start_search(&mut self) {
        self.screen = Screen::Catalog;
        self.state = AppState::Searching;
    }

    pub fn search_push(&mut self, c: char) {
        self.catalog.push_search_char(c);
        self.catalog_table.select(Some(0));
    }

    pub fn search_pop(&mut self) {
        self.catalog.pop_search_char();
        self.catalog_table.select(Some(0));
    }

    pub fn cancel_search(&mut self) {
        self.catalog.set_search("");
        self.state = AppState::Browsing;
        self.update_status_message();
    }

    pub fn confirm_search(&mut self) {
        self.state = AppState::Browsing;
        self.update_status_message();
    }

    // === Catalog query ===

    pub fn cycle_sort(&mut self, forward: bool) {
        self.catalog.cycle_sort(forward);
        self.catalog_table.select(Some(0));
        self.status_message = format!("Sort: {}", self.catalog.query().sort_option().label());
    }

    pub fn next_page(&mut self) {
        self.catalog.next_page();
        self.catalog_table.select(Some(0));
    }

    pub fn prev_page(&mut self) {
        self.catalog.prev_page();
        self.catalog_table.select(Some(0));
    }

    pub fn first_page(&mut self) {
        self.catalog.first_page();
        self.catalog_table.select(Some(0));
    }

    pub fn last_page(&mut self) {
        self.catalog.last_page();
        self.catalog_table.select(Some(0));
    }

    /// Retry the catalog fetch, or reload the installed screen
    pub fn reload(&mut self) {
        match self.screen {
            Screen::Catalog => self.catalog.retry(),
            Screen::Installed => self.show_installed(),
            Screen::Detail => {
                if let Some(id) = self.detail.as_ref().map(|d| d.id().to_string()) {
                    self.open_detail(&id);
                }
            }
        }
    }

    // === Install / uninstall ===

    pub fn install_current(&mut self) {
        let Some(detail) = &mut self.detail else {
            return;
        };
        match detail.install(self.store.as_ref()) {
            Ok(InstallOutcome::Installed { message }) => {
                self.notify(message, ToastKind::Success);
                self.celebration_started = Some(Instant::now());
            }
            Ok(InstallOutcome::AlreadyInstalled) => {
                self.status_message = "Already installed".to_string();
            }
            Ok(InstallOutcome::NotFound) => {}
            Err(e) => {
                warn!(error = %e, "install failed");
                self.notify(format!("Install failed: {e}"), ToastKind::Error);
            }
        }
    }

    pub fn sort_installed(&mut self, order: SortOrder) {
        if let Some(installed) = &mut self.installed {
            installed.sort_by_size(order);
        }
    }

    /// Ask for confirmation before uninstalling the selected app
    pub fn request_uninstall(&mut self) {
        let Some(app) = self
            .installed
            .as_ref()
            .and_then(InstalledState::selected_app)
        else {
            self.status_message = "No app selected".to_string();
            return;
        };
        self.pending_uninstall = Some(app.clone());
        self.state = AppState::ConfirmUninstall;
    }

    pub fn cancel_uninstall(&mut self) {
        self.pending_uninstall = None;
        self.state = AppState::Browsing;
    }

    pub fn confirm_uninstall(&mut self) {
        self.state = AppState::Browsing;
        let Some(app) = self.pending_uninstall.take() else {
            return;
        };
        let Some(installed) = &mut self.installed else {
            return;
        };
        match installed.uninstall(&app.id, self.store.as_ref()) {
            Ok(Some(message)) => {
                self.installed_table
                    .select(installed.selected_app().map(|_| installed.selected));
                self.notify(message, ToastKind::Info);
                self.update_status_message();
            }
            Ok(None) => {}
            Err(e) => {
                warn!(id = %app.id, error = %e, "uninstall failed");
                self.notify(format!("Uninstall failed: {e}"), ToastKind::Error);
            }
        }
    }

    // === Status message ===

    pub fn update_status_message(&mut self) {
        self.status_message = match self.screen {
            Screen::Catalog => match self.catalog.status() {
                LoadStatus::Idle | LoadStatus::Loading => "Loading...".to_string(),
                LoadStatus::Loaded => format!(
                    "({}) Apps Found │ page {}/{} │ {}",
                    self.catalog.total(),
                    self.catalog.query().page + 1,
                    self.catalog.total_pages().max(1),
                    self.catalog.query().sort_option().label()
                ),
                LoadStatus::Failed(e) => format!(
                    "Loading page {} failed: {e} │ showing page {} │ press 'r' to retry",
                    self.catalog.query().page + 1,
                    self.catalog.shown_page() + 1
                ),
            },
            Screen::Installed => {
                let count = self.installed.as_ref().map_or(0, |i| i.apps().len());
                format!("{count} apps installed")
            }
            Screen::Detail => match self.detail.as_ref().and_then(DetailState::app) {
                Some(app) => format!("{} by {}", app.title, app.company_name),
                None => "App is not found".to_string(),
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use color_eyre::eyre::eyre;
    use color_eyre::Result;

    use heroapps::catalog::CatalogQuery;
    use heroapps::store::MemoryStore;

    use super::*;

    fn record(id: &str, size: f64) -> AppRecord {
        AppRecord {
            id: id.to_string(),
            image: None,
            title: format!("App {id}"),
            company_name: "Acme".into(),
            description: String::new(),
            size,
            downloads: 0,
            rating_avg: 0.0,
            reviews: 0,
            ratings: Vec::new(),
        }
    }

    #[derive(Clone, Default)]
    struct FakeApi {
        fail_all: Rc<Cell<bool>>,
    }

    /// Served by the fetch worker, which needs a `Send` api
    struct PageApi;

    impl CatalogApi for PageApi {
        fn fetch_page(&self, _query: &CatalogQuery) -> Result<AppsPage> {
            Ok(AppsPage { apps: vec![record("A", 10.0), record("B", 20.0)], total: 2 })
        }
        fn fetch_app(&self, _id: &str) -> Result<Option<AppRecord>> {
            Ok(None)
        }
        fn fetch_all(&self) -> Result<Vec<AppRecord>> {
            Ok(Vec::new())
        }
    }

    impl CatalogApi for FakeApi {
        fn fetch_page(&self, _query: &CatalogQuery) -> Result<AppsPage> {
            Ok(AppsPage::default())
        }
        fn fetch_app(&self, id: &str) -> Result<Option<AppRecord>> {
            Ok(["A", "B"].contains(&id).then(|| record(id, 10.0)))
        }
        fn fetch_all(&self) -> Result<Vec<AppRecord>> {
            if self.fail_all.get() {
                return Err(eyre!("offline"));
            }
            Ok(vec![record("A", 10.0), record("B", 20.0)])
        }
    }

    fn app_with(api: FakeApi) -> App {
        let worker = FetchWorker::spawn(PageApi).unwrap();
        App::new(Box::new(api), Box::new(MemoryStore::new()), worker, Duration::ZERO)
    }

    fn wait_loaded(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while *app.catalog.status() != LoadStatus::Loaded && Instant::now() < deadline {
            app.tick(Instant::now());
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn first_tick_loads_catalog_and_selects_first_row() {
        let mut app = app_with(FakeApi::default());
        wait_loaded(&mut app);
        assert_eq!(app.catalog.total(), 2);
        assert_eq!(app.selected_catalog_app().map(|a| a.id.as_str()), Some("A"));
        assert!(app.status_message.starts_with("(2) Apps Found"));
    }

    #[test]
    fn install_from_detail_shows_up_on_installed_screen() {
        let mut app = app_with(FakeApi::default());
        app.open_detail("B");
        app.run_pending_load();
        assert_eq!(app.screen, Screen::Detail);
        app.install_current();
        assert!(app.toast.as_ref().is_some_and(|t| t.kind == ToastKind::Success));
        assert!(app.celebration_frame(Instant::now()).is_some());

        app.close_detail();
        assert_eq!(app.screen, Screen::Catalog);
        app.switch_screen();
        app.run_pending_load();
        assert_eq!(app.screen, Screen::Installed);
        let ids: Vec<_> = app.installed.as_ref().unwrap().apps().iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, ["B"]);
    }

    #[test]
    fn unknown_detail_is_not_found() {
        let mut app = app_with(FakeApi::default());
        app.open_detail("nope");
        app.run_pending_load();
        assert_eq!(app.screen, Screen::Detail);
        assert_eq!(app.status_message, "App is not found");
        app.install_current();
        assert!(app.toast.is_none());
    }

    #[test]
    fn uninstall_needs_confirmation() {
        let mut app = app_with(FakeApi::default());
        app.open_detail("A");
        app.run_pending_load();
        app.install_current();
        app.close_detail();
        app.show_installed();
        app.run_pending_load();

        app.request_uninstall();
        assert_eq!(app.state, AppState::ConfirmUninstall);
        app.cancel_uninstall();
        assert_eq!(app.installed.as_ref().unwrap().apps().len(), 1);

        app.request_uninstall();
        app.confirm_uninstall();
        assert!(app.installed.as_ref().unwrap().apps().is_empty());
        assert_eq!(app.status_message, "0 apps installed");
    }

    #[test]
    fn loader_failure_keeps_current_screen() {
        let api = FakeApi::default();
        api.fail_all.set(true);
        let mut app = app_with(api);
        app.show_installed();
        app.run_pending_load();
        assert_eq!(app.screen, Screen::Catalog);
        assert!(app.status_message.contains("offline"));
    }

    #[test]
    fn loaders_wait_for_the_next_frame() {
        let mut app = app_with(FakeApi::default());
        app.open_detail("A");
        assert_eq!(app.screen, Screen::Catalog);
        assert_eq!(app.status_message, "Loading app details...");
        assert_eq!(app.pending_load, Some(PendingLoad::Detail("A".into())));

        app.run_pending_load();
        assert_eq!(app.screen, Screen::Detail);
        assert!(app.pending_load.is_none());

        app.show_installed();
        assert_eq!(app.screen, Screen::Detail);
        assert_eq!(app.status_message, "Loading installed apps...");
        app.run_pending_load();
        assert_eq!(app.screen, Screen::Installed);
    }
}
