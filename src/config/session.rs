//! File-backed session store (`session.toml`)

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::Config;
use crate::auth::SessionStore;

/// Session store persisted as a flat TOML table of string values.
///
/// The file is rewritten on every mutation; reads are served from memory.
/// A mutation only becomes visible once its write has succeeded.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Open the session file in the default config directory.
    pub fn open_default() -> Result<Self> {
        let store = Self::open(Config::config_dir()?.join("session.toml"))?;
        tracing::debug!("Session file: {}", store.path().display());
        Ok(store)
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path).context("Failed to read session file")?;
            toml::from_str(&content).context("Failed to parse session file")?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = toml::to_string(values).context("Failed to serialize session")?;
        fs::write(&self.path, content).context("Failed to write session file")?;

        // Set restrictive permissions on session file (contains tokens)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, perms)
                .context("Failed to set session file permissions")?;
        }

        Ok(())
    }

    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = values.clone();
        f(&mut next);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|values| {
            values.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.mutate(BTreeMap::clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_ROLE_KEY};

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "R1").unwrap();
        drop(store);

        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("A1"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("R1"));
    }

    #[test]
    fn test_clear_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        store.set(USER_ROLE_KEY, "Manager").unwrap();
        store.clear().unwrap();

        let reopened = FileSessionStore::open(&path).unwrap();
        assert!(reopened.access_token().is_none());
        assert!(reopened.get(USER_ROLE_KEY).is_none());
    }

    #[test]
    fn test_failed_write_keeps_previous_values() {
        let dir = tempfile::tempdir().unwrap();
        let session_dir = dir.path().join("erp-cli");
        let path = session_dir.join("session.toml");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "R1").unwrap();

        // A plain file where the directory should be makes every write fail.
        fs::remove_dir_all(&session_dir).unwrap();
        fs::write(&session_dir, "not a directory").unwrap();

        assert!(store.clear().is_err());
        assert_eq!(store.access_token().as_deref(), Some("A1"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));

        assert!(store.set(ACCESS_TOKEN_KEY, "A2").is_err());
        assert_eq!(store.access_token().as_deref(), Some("A1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path().join("session.toml")).unwrap();
        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
