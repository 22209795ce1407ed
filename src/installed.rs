//! Installed-apps screen: the persisted id list joined against the catalog

use color_eyre::Result;
use tracing::info;

use crate::store::InstalledStore;
use crate::types::*;

/// Resolve persisted ids against the full collection. Ids with no matching
/// record (removed server-side since install) are dropped.
pub fn derive_installed(ids: &[String], all_apps: &[AppRecord]) -> Vec<AppRecord> {
    ids.iter()
        .filter_map(|id| all_apps.iter().find(|app| app.id == *id))
        .cloned()
        .collect()
}

#[derive(Debug)]
pub struct InstalledState {
    all_apps: Vec<AppRecord>,
    /// Persisted ids as read when the screen opened
    ids: Vec<String>,
    apps: Vec<AppRecord>,
    size_order: SortOrder,
    pub selected: usize,
}

impl InstalledState {
    /// Build the screen from the loader's collection. The store is read once;
    /// later changes made elsewhere are not picked up.
    pub fn open(all_apps: Vec<AppRecord>, store: &dyn InstalledStore) -> Self {
        let ids = store.load_ids();
        let apps = derive_installed(&ids, &all_apps);
        Self {
            all_apps,
            ids,
            apps,
            size_order: SortOrder::Default,
            selected: 0,
        }
    }

    pub fn apps(&self) -> &[AppRecord] {
        &self.apps
    }

    pub fn size_order(&self) -> SortOrder {
        self.size_order
    }

    pub fn selected_app(&self) -> Option<&AppRecord> {
        self.apps.get(self.selected)
    }

    /// Replace the collection (e.g. after a reload) and re-derive
    pub fn set_all_apps(&mut self, all_apps: Vec<AppRecord>) {
        self.all_apps = all_apps;
        self.rederive();
    }

    fn rederive(&mut self) {
        self.apps = derive_installed(&self.ids, &self.all_apps);
        self.size_order = SortOrder::Default;
        self.clamp_selection();
    }

    /// Reorder the displayed list by size. Display only; persisted order is
    /// untouched.
    pub fn sort_by_size(&mut self, order: SortOrder) {
        match order {
            SortOrder::Asc => self.apps.sort_by(|a, b| a.size.total_cmp(&b.size)),
            SortOrder::Desc => self.apps.sort_by(|a, b| b.size.total_cmp(&a.size)),
            SortOrder::Default => {
                self.apps = derive_installed(&self.ids, &self.all_apps);
            }
        }
        self.size_order = order;
    }

    /// Remove an app from the installed list.
    ///
    /// The id is removed from the persisted list in its persisted order, so a
    /// display sort never leaks into storage. Returns the notification text,
    /// or `None` if the id is not displayed.
    pub fn uninstall(&mut self, id: &str, store: &dyn InstalledStore) -> Result<Option<String>> {
        let Some(pos) = self.apps.iter().position(|app| app.id == id) else {
            return Ok(None);
        };

        let written = store.update(&mut |ids| ids.retain(|i| i != id))?;
        self.ids = written;
        let removed = self.apps.remove(pos);
        self.clamp_selection();
        info!(id, title = %removed.title, "app uninstalled");

        Ok(Some(format!("{} uninstalled from your device", removed.title)))
    }

    pub fn move_selection(&mut self, delta: i32) {
        if self.apps.is_empty() {
            return;
        }
        let current = self.selected as i64;
        self.selected = (current + delta as i64).clamp(0, self.apps.len() as i64 - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.apps.len().saturating_sub(1));
    }
}
