//! Durable client preferences.
//!
//! A flat string map persisted through a [`PreferenceBackend`]. The app
//! stores exactly two keys, the active locale and the theme mode, each read
//! at startup and written on every explicit change.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

/// Preference key holding the active locale code.
pub const LOCALE_KEY: &str = "cartshelf.locale";
/// Preference key holding the theme mode.
pub const THEME_KEY: &str = "cartshelf.theme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("preferences io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("preferences at {path} are not valid RON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("could not serialize preferences: {0}")]
    Serialize(#[from] ron::Error),
}

/// Where preferences live.
pub trait PreferenceBackend {
    /// Short label for log lines.
    fn name(&self) -> String;
    fn load_all(&self) -> Result<BTreeMap<String, String>, StorageError>;
    fn save_all(&mut self, values: &BTreeMap<String, String>) -> Result<(), StorageError>;
}

/// In-process backend. Clones share the same map, so tests can observe what
/// was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.borrow().clone()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn load_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        Ok(self.values.borrow().clone())
    }

    fn save_all(&mut self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        *self.values.borrow_mut() = values.clone();
        Ok(())
    }
}

/// RON file backend. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_STATE_HOME/cartshelf/preferences.ron`, else under
    /// `~/.local/state`, else the working directory.
    pub fn default_path() -> PathBuf {
        let base = std::env::var_os("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state"))
            })
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("cartshelf").join("preferences.ron")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PreferenceBackend for FileBackend {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io(e)),
        };
        ron::from_str(&content).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save_all(&mut self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| self.io(e))?;
        }
        let text = ron::ser::to_string_pretty(values, ron::ser::PrettyConfig::default())?;
        // Write-then-rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("ron.tmp");
        std::fs::write(&tmp, text).map_err(|e| self.io(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io(e))
    }
}

/// Cached view over a backend. Reads hit the cache; writes go through.
pub struct Preferences {
    backend: Box<dyn PreferenceBackend>,
    cache: BTreeMap<String, String>,
}

impl Preferences {
    /// Load from `backend`. Unreadable storage starts empty with a warning;
    /// it will be overwritten on the next successful save.
    pub fn open(backend: impl PreferenceBackend + 'static) -> Self {
        let cache = match backend.load_all() {
            Ok(values) => values,
            Err(e) => {
                log::warn!("{e}, starting with empty preferences");
                BTreeMap::new()
            }
        };
        log::debug!("preferences from {}: {} key(s)", backend.name(), cache.len());
        Self {
            backend: Box::new(backend),
            cache,
        }
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryBackend::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.cache.get(key).map(String::as_str)
    }

    /// Store `value` under `key` and persist. The cached value is updated
    /// even when persisting fails.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.get(key) == Some(value) {
            return Ok(());
        }
        self.cache.insert(key.to_string(), value.to_string());
        self.backend.save_all(&self.cache)
    }
}
