//! Core [`RuleLoader`] struct: filesystem-backed rule loading with optional hot-reload.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rulecheck_core::RulesConfig;
use tracing::{debug, info, warn};

use crate::schema::RuleConfiguration;

use super::error::{LoadError, LoadResult, LoadStatus, Result};
use super::format::DocumentFormat;
use super::source::RuleSource;
use super::watcher::handle_fs_event;

pub(super) type DocumentCache = Arc<RwLock<HashMap<String, Arc<RuleConfiguration>>>>;

/// Filesystem-backed rule loader with optional hot-reload.
///
/// References are paths relative to the rules directory, e.g.
/// `validation/employee.json`. Parsed trees are cached by reference until
/// the watcher sees their file change or [`invalidate`](Self::invalidate)
/// is called.
pub struct RuleLoader {
    /// Root directory containing rule documents.
    rules_dir: PathBuf,
    /// Parsed trees keyed by normalised reference.
    cache: DocumentCache,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl RuleLoader {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        let rules_dir = rules_dir.into();
        if !rules_dir.is_dir() {
            warn!(path = %rules_dir.display(), "rules directory does not exist");
        }
        Self {
            rules_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
            _watcher: None,
        }
    }

    /// Loader for the configured directory, watching it when `watch` is set.
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        let mut loader = Self::new(config.dir.clone());
        if config.watch {
            loader.watch()?;
        }
        Ok(loader)
    }

    /// Get the rules directory path.
    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Recursively scan the rules directory and load every rule document.
    ///
    /// Dotfiles and files without a `.json`/`.yml`/`.yaml` extension are
    /// skipped. Parse and format errors are reported per file and do not
    /// abort the scan. Successfully parsed documents replace cached ones.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.rules_dir, &mut results)?;
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        // Stable report order regardless of directory iteration order.
        paths.sort();

        for path in paths {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let Some(format) = DocumentFormat::from_path(&path) else {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a rule document".to_string(),
                    },
                });
                continue;
            };

            let Some(reference) = self.reference_for(&path) else {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "path is not addressable as a reference".to_string(),
                    },
                });
                continue;
            };

            match self.load_file(&path, format) {
                Ok(rule) => {
                    info!(reference = %reference, format = %format, "loaded rule document");
                    self.cache_write().insert(reference.clone(), Arc::new(rule));
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { reference },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule document");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(())
    }

    /// Parse a single rule document.
    pub fn load_file(&self, path: &Path, format: DocumentFormat) -> Result<RuleConfiguration> {
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.display().to_string()),
            _ => LoadError::Io(e),
        })?;
        format.parse(&contents)
    }

    /// Resolve a reference to its file path and format.
    ///
    /// Rejects empty and absolute references and any `..` component, so a
    /// reference can never leave the rules directory.
    pub(crate) fn resolve(&self, reference: &str) -> Result<(String, PathBuf, DocumentFormat)> {
        let relative = Path::new(reference.trim());
        let key = reference_key(relative).map_err(|reason| LoadError::invalid_reference(reference, reason))?;
        let format = DocumentFormat::from_path(relative)
            .ok_or_else(|| LoadError::UnsupportedFormat(reference.to_string()))?;
        Ok((key, self.rules_dir.join(relative), format))
    }

    /// Drop one cached tree; the next load re-reads the file.
    pub fn invalidate(&self, reference: &str) -> bool {
        match reference_key(Path::new(reference.trim())) {
            Ok(key) => self.cache_write().remove(&key).is_some(),
            Err(_) => false,
        }
    }

    /// Number of cached trees.
    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Start a filesystem watcher with 500ms poll interval.
    ///
    /// Creating, modifying or removing a document evicts its cached tree;
    /// it is re-read on the next load, so a broken edit surfaces as a load
    /// error instead of silently keeping the old version.
    pub fn watch(&mut self) -> Result<()> {
        let cache = Arc::clone(&self.cache);
        let rules_dir = self
            .rules_dir
            .canonicalize()
            .unwrap_or_else(|_| self.rules_dir.clone());
        let watched_dir = rules_dir.clone();

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &cache, &watched_dir),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(&rules_dir, RecursiveMode::Recursive)?;

        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %rules_dir.display(), "watching rules directory for changes (recursive)");
        self._watcher = Some(watcher);
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn cache_handle(&self) -> DocumentCache {
        Arc::clone(&self.cache)
    }

    fn reference_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.rules_dir).ok()?;
        reference_key(relative).ok()
    }

    fn cache_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<RuleConfiguration>>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RuleSource for RuleLoader {
    fn load(&self, reference: &str) -> Result<Arc<RuleConfiguration>> {
        let (key, path, format) = self.resolve(reference)?;

        if let Some(rule) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            debug!(reference = %key, "rule document served from cache");
            return Ok(Arc::clone(rule));
        }

        let rule = Arc::new(self.load_file(&path, format).map_err(|e| match e {
            LoadError::NotFound(_) => LoadError::NotFound(key.clone()),
            other => other,
        })?);
        info!(reference = %key, format = %format, "loaded rule document");
        self.cache_write().insert(key, Arc::clone(&rule));
        Ok(rule)
    }
}

/// Normalise a relative path into a cache key (`a/b.json`).
pub(super) fn reference_key(relative: &Path) -> std::result::Result<String, &'static str> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or("reference is not valid UTF-8")?),
            Component::CurDir => {}
            Component::ParentDir => return Err("reference must not contain '..'"),
            Component::RootDir | Component::Prefix(_) => return Err("reference must be relative"),
        }
    }
    if parts.is_empty() {
        return Err("reference is empty");
    }
    Ok(parts.join("/"))
}
