//! End-to-end flow through the library: browse, open, install, list, uninstall

use std::time::Instant;

use color_eyre::Result;

use heroapps::catalog::{CatalogQuery, CatalogState, LoadStatus};
use heroapps::client::CatalogApi;
use heroapps::details::DetailState;
use heroapps::installed::InstalledState;
use heroapps::store::{InstalledStore, JsonFileStore};
use heroapps::types::*;

/// In-memory catalog that filters and pages like the real server
struct FakeCatalog {
    apps: Vec<AppRecord>,
}

impl FakeCatalog {
    fn new() -> Self {
        let json = r#"[
            {"_id": "a1", "title": "Alpha Notes", "companyName": "Acme", "size": 50, "downloads": 1000, "ratingAvg": 4.1},
            {"_id": "b2", "title": "Beta Chat", "companyName": "Bolt", "size": 10, "downloads": 9000, "ratingAvg": 4.8},
            {"_id": "c3", "title": "Gamma Notes", "companyName": "Core", "size": 30, "downloads": 500, "ratingAvg": 3.2}
        ]"#;
        Self { apps: serde_json::from_str(json).unwrap() }
    }
}

impl CatalogApi for FakeCatalog {
    fn fetch_page(&self, query: &CatalogQuery) -> Result<AppsPage> {
        let needle = query.search.to_lowercase();
        let mut hits: Vec<AppRecord> = self
            .apps
            .iter()
            .filter(|a| a.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        if query.sort == SortField::Downloads {
            hits.sort_by_key(|a| a.downloads);
            if query.order == SortOrder::Desc {
                hits.reverse();
            }
        }
        let total = hits.len();
        let apps = hits.into_iter().skip(query.skip()).take(PAGE_SIZE).collect();
        Ok(AppsPage { apps, total })
    }

    fn fetch_app(&self, id: &str) -> Result<Option<AppRecord>> {
        Ok(self.apps.iter().find(|a| a.id == id).cloned())
    }

    fn fetch_all(&self) -> Result<Vec<AppRecord>> {
        Ok(self.apps.clone())
    }
}

fn run_due(state: &mut CatalogState, api: &dyn CatalogApi) {
    let req = state.take_due_request(Instant::now()).expect("a fetch should be due");
    let result = api.fetch_page(&req.query).map_err(|e| e.to_string());
    assert!(state.apply_response(req.token, result));
}

#[test]
fn browse_install_and_uninstall() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let api = FakeCatalog::new();

    // Catalog: search then sort
    let mut catalog = CatalogState::new(std::time::Duration::ZERO);
    run_due(&mut catalog, &api);
    assert_eq!(catalog.total(), 3);
    assert_eq!(catalog.total_pages(), 1);

    catalog.set_search("notes");
    run_due(&mut catalog, &api);
    assert_eq!(catalog.total(), 2);

    catalog.set_search("");
    catalog.select_sort("downloads-desc".parse().unwrap());
    run_due(&mut catalog, &api);
    assert_eq!(*catalog.status(), LoadStatus::Loaded);
    let top = catalog.apps()[0].id.clone();
    assert_eq!(top, "b2");

    // Detail: install the top app and another one
    let mut detail = DetailState::open(&top, api.fetch_app(&top).unwrap(), &store);
    assert!(!detail.is_installed());
    detail.install(&store).unwrap();
    let mut other = DetailState::open("a1", api.fetch_app("a1").unwrap(), &store);
    other.install(&store).unwrap();
    assert_eq!(store.load_ids(), ["b2", "a1"]);

    // Reopening reads the persisted state
    let reopened = DetailState::open(&top, api.fetch_app(&top).unwrap(), &store);
    assert!(reopened.is_installed());

    // Installed: sort for display, uninstall, persisted order intact
    let mut installed = InstalledState::open(api.fetch_all().unwrap(), &store);
    installed.sort_by_size(SortOrder::Desc);
    let shown: Vec<_> = installed.apps().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(shown, ["a1", "b2"]);

    installed.uninstall("b2", &store).unwrap();
    assert_eq!(store.load_ids(), ["a1"]);

    // A fresh store on the same directory sees the same list
    assert_eq!(JsonFileStore::new(dir.path()).load_ids(), ["a1"]);
}

#[test]
fn install_survives_missing_app_on_installed_screen() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    store.save_ids(&["c3".to_string(), "deleted".to_string()]).unwrap();

    let installed = InstalledState::open(FakeCatalog::new().fetch_all().unwrap(), &store);
    let shown: Vec<_> = installed.apps().iter().map(|a| a.title.as_str()).collect();
    assert_eq!(shown, ["Gamma Notes"]);
}
