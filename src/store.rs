//! Persisted installed-id list
//!
//! Screens never touch storage directly; they get an `InstalledStore` and
//! read or rewrite the whole id list through it.

use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::{debug, warn};

/// Key the id list is stored under
pub const STORE_KEY: &str = "apps";

/// Key-value access to the list of installed app ids
pub trait InstalledStore {
    /// Current list. Absent or unreadable state reads as empty.
    fn load_ids(&self) -> Vec<String>;

    fn save_ids(&self, ids: &[String]) -> Result<()>;

    /// Read, let `f` edit, write back. Returns the list as written.
    fn update(&self, f: &mut dyn FnMut(&mut Vec<String>)) -> Result<Vec<String>> {
        let mut ids = self.load_ids();
        f(&mut ids);
        self.save_ids(&ids)?;
        Ok(ids)
    }

    fn contains(&self, id: &str) -> bool {
        self.load_ids().iter().any(|i| i == id)
    }
}

/// JSON array of strings in `<dir>/<STORE_KEY>.json`
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{STORE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InstalledStore for JsonFileStore {
    fn load_ids(&self) -> Vec<String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read installed list; treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Option<Vec<String>>>(&raw) {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed installed list; treating as empty");
                Vec::new()
            }
        }
    }

    fn save_ids(&self, ids: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string(ids)?;

        // Write-then-rename so a crash never leaves a truncated list behind
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)
                .wrap_err_with(|| format!("create {}", tmp.display()))?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)
            .wrap_err_with(|| format!("replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), count = ids.len(), "installed list saved");
        Ok(())
    }
}

/// In-process store, used by tests and `heroapps-cli --memory`
#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: RefCell<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: RefCell::new(ids.into_iter().map(Into::into).collect()),
        }
    }
}

impl InstalledStore for MemoryStore {
    fn load_ids(&self) -> Vec<String> {
        self.ids.borrow().clone()
    }

    fn save_ids(&self, ids: &[String]) -> Result<()> {
        *self.ids.borrow_mut() = ids.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load_ids().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn saved_ids_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save_ids(&["b".to_string(), "a".to_string()]).unwrap();

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.load_ids(), ["b", "a"]);
        let on_disk = fs::read_to_string(reopened.path()).unwrap();
        assert_eq!(on_disk, r#"["b","a"]"#);
    }

    #[test]
    fn malformed_or_null_content_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load_ids().is_empty());

        fs::write(store.path(), "null").unwrap();
        assert!(store.load_ids().is_empty());

        fs::write(store.path(), "[1, 2]").unwrap();
        assert!(store.load_ids().is_empty());
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("data");
        let store = JsonFileStore::new(&nested);
        store.save_ids(&["x".to_string()]).unwrap();
        assert_eq!(store.load_ids(), ["x"]);
        assert!(!nested.join("apps.json.tmp").exists());
    }

    #[test]
    fn update_writes_back_the_edited_list() {
        let store = MemoryStore::with_ids(["a"]);
        let written = store.update(&mut |ids| ids.push("b".into())).unwrap();
        assert_eq!(written, ["a", "b"]);
        assert_eq!(store.load_ids(), ["a", "b"]);
        assert!(store.contains("b"));
        assert!(!store.contains("c"));
    }
}
