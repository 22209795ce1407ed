//! Detail screen: one app, its rating breakdown and the install action

use color_eyre::Result;
use tracing::info;

use crate::store::InstalledStore;
use crate::types::*;

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    /// The loader had no record for this id. Terminal.
    NotFound,
    Found {
        app: Box<AppRecord>,
        installed: bool,
        /// Ratings in reverse server order, most recent first
        ratings: Vec<RatingEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { message: String },
    AlreadyInstalled,
    NotFound,
}

#[derive(Debug)]
pub struct DetailState {
    id: String,
    view: DetailView,
    pub scroll: u16,
}

impl DetailState {
    /// Build the screen from the loader's record. The installed flag is read
    /// from the store once, here.
    pub fn open(id: &str, record: Option<AppRecord>, store: &dyn InstalledStore) -> Self {
        let view = match record {
            None => DetailView::NotFound,
            Some(app) => {
                let ratings = app.ratings.iter().rev().cloned().collect();
                DetailView::Found {
                    installed: store.contains(id),
                    app: Box::new(app),
                    ratings,
                }
            }
        };
        Self {
            id: id.to_string(),
            view,
            scroll: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn view(&self) -> &DetailView {
        &self.view
    }

    pub fn app(&self) -> Option<&AppRecord> {
        match &self.view {
            DetailView::Found { app, .. } => Some(app),
            DetailView::NotFound => None,
        }
    }

    pub fn is_installed(&self) -> bool {
        matches!(self.view, DetailView::Found { installed: true, .. })
    }

    pub fn install_label(&self) -> String {
        match &self.view {
            DetailView::Found { installed: true, .. } => String::from("Installed"),
            DetailView::Found { app, .. } => format!("Install Now ({})", app.size_str()),
            DetailView::NotFound => String::new(),
        }
    }

    /// Add this app to the installed list.
    ///
    /// One-way for the lifetime of the screen: once installed, further calls
    /// leave the store untouched. The store is treated as a set, so an id that
    /// is already persisted is not appended again.
    pub fn install(&mut self, store: &dyn InstalledStore) -> Result<InstallOutcome> {
        let DetailView::Found { app, installed, .. } = &mut self.view else {
            return Ok(InstallOutcome::NotFound);
        };
        if *installed {
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let id = self.id.clone();
        store.update(&mut |ids| {
            if !ids.contains(&id) {
                ids.push(id.clone());
            }
        })?;
        *installed = true;
        info!(id = %self.id, title = %app.title, "app installed");

        Ok(InstallOutcome::Installed {
            message: format!("{} installed successfully", app.title),
        })
    }
}
