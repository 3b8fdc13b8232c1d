//! File system watcher for live rebuild.
//!
//! Monitors the content and assets directories plus the config file and
//! triggers rebuilds. The build itself is cheap to repeat: unchanged posts
//! skip on mtime and resolved citations come from the cache, so a full
//! `build_site` on every change batch keeps the strategy simple.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     Event Loop                       │
//! │                                                      │
//! │  ┌──────────┐    ┌──────────┐    ┌────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│ build_site()   │  │
//! │  │ events   │    │ (300ms)  │    │ (cooldown)     │  │
//! │  └──────────┘    └──────────┘    └────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{build::build_site, config::SiteConfig, log, logger::WatchStatus};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Format path as relative to root for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Rebuild the site after a change batch. Returns true on success.
fn handle_changes(
    paths: &[PathBuf],
    config: &'static SiteConfig,
    status: &mut WatchStatus,
) -> bool {
    if paths.is_empty() {
        return false;
    }

    let root = config.get_root();
    let trigger = paths
        .iter()
        .map(|p| rel_path(p, root))
        .collect::<Vec<_>>()
        .join(", ");

    match build_site(config) {
        Ok(_) => {
            status.success(&format!("rebuilt: {trigger}"));
            true
        }
        Err(e) => {
            status.error(&format!("build failed ({trigger})"), &format!("{e:#}"));
            false
        }
    }
}

// =============================================================================
// Watcher Setup
// =============================================================================

/// Watch content and assets. The config file is deliberately not watched:
/// the loaded config is immutable for the process lifetime, so a rebuild
/// after a config edit would use stale values. Its mtime still invalidates
/// pages on the next invocation.
fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    let watched: &[(&Path, RecursiveMode)] = &[
        (&config.build.content, RecursiveMode::Recursive),
        (&config.build.assets, RecursiveMode::Recursive),
    ];

    let root = config.get_root();
    let mut names = Vec::new();
    for (path, mode) in watched {
        if path.exists() {
            watcher
                .watch(path, *mode)
                .with_context(|| format!("Failed to watch {}", path.display()))?;
            names.push(rel_path(path, root));
        }
    }

    log!("watch"; "watching: {}", names.join(", "));
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing and live rebuild.
pub fn watch_for_changes_blocking(config: &'static SiteConfig) -> Result<()> {
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, config)?;

    let mut debouncer = Debouncer::new();
    let mut status = WatchStatus::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                if handle_changes(&debouncer.take(), config, &mut status) {
                    debouncer.mark_rebuild();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            // Other cases: irrelevant events, timeout without ready, etc.
            _ => {}
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // is_temp_file tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_temp_file_detection() {
        assert!(is_temp_file(Path::new("post.md.swp")));
        assert!(is_temp_file(Path::new("post.md~")));
        assert!(is_temp_file(Path::new(".hidden")));
        assert!(is_temp_file(Path::new("backup.bak")));
        assert!(!is_temp_file(Path::new("post.md")));
        assert!(!is_temp_file(Path::new("image.png")));
    }

    // ------------------------------------------------------------------------
    // Debouncer tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_debouncer_filters_temp_files() {
        let mut debouncer = Debouncer::new();
        debouncer.add(
            Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
                .add_path(PathBuf::from("post.md"))
                .add_path(PathBuf::from("post.md.swp")),
        );

        assert_eq!(debouncer.pending.len(), 1);
    }

    #[test]
    fn test_debouncer_not_ready_immediately() {
        let mut debouncer = Debouncer::new();
        debouncer.add(
            Event::new(EventKind::Create(notify::event::CreateKind::File))
                .add_path(PathBuf::from("post.md")),
        );

        // Just added: debounce window still open
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));
    }

    #[test]
    fn test_debouncer_take_clears_pending() {
        let mut debouncer = Debouncer::new();
        debouncer.add(
            Event::new(EventKind::Create(notify::event::CreateKind::File))
                .add_path(PathBuf::from("post.md")),
        );

        let taken = debouncer.take();
        assert_eq!(taken.len(), 1);
        assert!(debouncer.pending.is_empty());
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_rel_path() {
        assert_eq!(
            rel_path(Path::new("/site/content/posts/a.md"), Path::new("/site")),
            "content/posts/a.md"
        );
        // Paths outside the root stay absolute
        assert_eq!(
            rel_path(Path::new("/other/x.md"), Path::new("/site")),
            "/other/x.md"
        );
    }
}
