//! Fixture lookup
//!
//! A fixture is the recorded body of one device page. Keys are paths relative
//! to the modem's `fixtures/` directory and are matched case-sensitively.

use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Directory under a modem root that holds its fixtures.
pub const FIXTURES_DIR: &str = "fixtures";

/// Resolved fixture content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
}

/// Read-only fixture store for one modem.
///
/// Files are read on first request and kept for the lifetime of the store;
/// later edits on disk are not picked up.
#[derive(Debug)]
pub struct FixtureStore {
    root: PathBuf,
    loaded: DashMap<String, Bytes>,
}

impl FixtureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: DashMap::new(),
        }
    }

    /// Store rooted at `<modem_path>/fixtures`
    pub fn for_modem(modem_path: &Path) -> Self {
        Self::new(modem_path.join(FIXTURES_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `key` has a backing file
    pub fn contains(&self, key: &str) -> bool {
        self.loaded.contains_key(key) || self.path_for(key).is_some_and(|p| p.is_file())
    }

    /// Fixture bytes and inferred content type for `key`
    pub fn resolve(&self, key: &str) -> Result<Fixture> {
        let body = match self.loaded.get(key) {
            Some(body) => body.clone(),
            None => {
                let body = self.read(key)?;
                self.loaded
                    .entry(key.to_string())
                    .or_insert(body)
                    .clone()
            }
        };

        Ok(Fixture {
            key: key.to_string(),
            body,
            content_type: content_type_for(key),
        })
    }

    fn read(&self, key: &str) -> Result<Bytes> {
        let path = self
            .path_for(key)
            .ok_or_else(|| Error::FixtureNotFound(key.to_string()))?;
        if !path.is_file() {
            return Err(Error::FixtureNotFound(key.to_string()));
        }

        match std::fs::read(&path) {
            Ok(data) => {
                debug!("Loaded fixture {} ({} bytes)", key, data.len());
                Ok(Bytes::from(data))
            }
            Err(e) => {
                warn!("Failed to read fixture {}: {}", path.display(), e);
                Err(Error::FixtureNotFound(key.to_string()))
            }
        }
    }

    /// Resolve a key to a file path, refusing anything that escapes the root.
    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let rel = Path::new(key);
        if key.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(rel))
    }
}

/// Content type from the file extension alone
pub fn content_type_for(key: &str) -> String {
    let mime = mime_guess::from_path(key).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT && mime.get_param("charset").is_none() {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    }
}
