//! Filesystem event handler for the notify watcher (hot-reload).

use std::path::Path;
use std::sync::PoisonError;

use notify::{Event, EventKind};
use tracing::info;

use super::core::{reference_key, DocumentCache};
use super::format::DocumentFormat;

/// Handle a single filesystem event from the notify watcher.
///
/// Evicts the cached tree of every rule document named by the event. A
/// removed directory evicts everything cached below it.
pub(super) fn handle_fs_event(event: &Event, cache: &DocumentCache, rules_dir: &Path) {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }

    for path in &event.paths {
        let Ok(relative) = path.strip_prefix(rules_dir) else {
            continue;
        };

        // Skip dotfiles (editor swap files and the like)
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }

        let Ok(key) = reference_key(relative) else {
            continue;
        };

        let mut guard = cache.write().unwrap_or_else(PoisonError::into_inner);
        if DocumentFormat::from_path(relative).is_some() {
            if guard.remove(&key).is_some() {
                info!(reference = %key, kind = ?event.kind, "evicted rule document after change");
            }
        } else if matches!(event.kind, EventKind::Remove(_)) {
            let prefix = format!("{key}/");
            let before = guard.len();
            guard.retain(|cached, _| !cached.starts_with(&prefix));
            let evicted = before - guard.len();
            if evicted > 0 {
                info!(directory = %key, evicted, "evicted rule documents after directory removal");
            }
        }
    }
}
