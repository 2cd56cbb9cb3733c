//! Debounced file watching.
//!
//! Raw notify events land in a path-keyed debounce map; a path fires only
//! after it has been stable for the configured interval, and a new event for
//! the same path resets its timer. On fire the matching indexer operation
//! runs and a typed event is emitted. Low-level watch errors are forwarded
//! to the event stream and never panic the host, subscriber or not.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use sliver_engine::indexer::Indexer;
use sliver_parsers::walker::FileWalker;

/// Typed watcher output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Indexed(PathBuf),
    Removed(PathBuf),
    Skipped(PathBuf),
    Error(String),
}

/// Debounces file change events by path. A second event before the stability
/// interval resets that path's timer without touching other paths.
#[derive(Debug)]
pub struct Debouncer {
    pending: HashMap<PathBuf, Instant>,
    interval: Duration,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            interval: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a change, resetting the timer for this path.
    pub fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    /// Take all paths stable for the full interval, removing them.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut ready = Vec::new();
        self.pending.retain(|path, last_change| {
            if now.duration_since(*last_change) >= self.interval {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });
        ready.sort();
        ready
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop every pending timer; called on shutdown.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Watch the indexer's root and replay the pipeline per stable file.
///
/// Returns the OS watcher (keep it alive) and the typed event stream. The
/// processing task ends when the OS watcher is dropped.
pub fn start_watching(
    indexer: Arc<Indexer>,
) -> Result<(RecommendedWatcher, mpsc::Receiver<WatchEvent>), notify::Error> {
    let (event_tx, event_rx) = mpsc::channel::<WatchEvent>(256);
    let (raw_tx, mut raw_rx) = mpsc::channel::<Result<PathBuf, String>>(1024);

    let debounce_ms = indexer.config().debounce_ms;
    let root = indexer.root().to_path_buf();
    let filter = FileWalker::new(&root, &indexer.config().include, &indexer.config().exclude)
        .map_err(|e| notify::Error::generic(&e.to_string()))?;

    let raw_for_watcher = raw_tx.clone();
    let mut watcher = notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
        match result {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                for path in event.paths {
                    if !filter.matches(&path) {
                        continue;
                    }
                    // Full channel or closed receiver: drop the event rather
                    // than block the OS callback.
                    let _ = raw_for_watcher.try_send(Ok(path));
                }
            }
            Err(e) => {
                let _ = raw_for_watcher.try_send(Err(e.to_string()));
            }
        }
    })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;

    tokio::spawn(async move {
        let mut debouncer = Debouncer::new(debounce_ms);
        let tick = Duration::from_millis(debounce_ms.clamp(10, 200) / 2);

        loop {
            let next = tokio::time::timeout(tick, raw_rx.recv()).await;
            match next {
                Ok(Some(Ok(path))) => debouncer.record(path),
                Ok(Some(Err(message))) => {
                    warn!("watch error: {message}");
                    let _ = event_tx.send(WatchEvent::Error(message)).await;
                }
                Ok(None) => break,
                Err(_) => {}
            }

            for path in debouncer.take_ready() {
                let event = process_path(&indexer, &path);
                debug!("watcher processed {}: {event:?}", path.display());
                let _ = event_tx.send(event).await;
            }
        }

        debouncer.clear();
    });
    drop(raw_tx);

    Ok((watcher, event_rx))
}

fn process_path(indexer: &Indexer, path: &Path) -> WatchEvent {
    if path.exists() {
        match indexer.index_file(path, false) {
            Ok(true) => WatchEvent::Indexed(path.to_path_buf()),
            Ok(false) => WatchEvent::Skipped(path.to_path_buf()),
            Err(e) => WatchEvent::Error(format!("{}: {e}", path.display())),
        }
    } else {
        match indexer.remove_file(path) {
            Ok(true) => WatchEvent::Removed(path.to_path_buf()),
            Ok(false) => WatchEvent::Skipped(path.to_path_buf()),
            Err(e) => WatchEvent::Error(format!("{}: {e}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_debouncer_fires_after_interval() {
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/w/file.ts");
        debouncer.record(path.clone());

        assert!(debouncer.take_ready().is_empty());
        assert!(debouncer.has_pending());

        sleep(Duration::from_millis(60));
        assert_eq!(debouncer.take_ready(), vec![path]);
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_second_event_resets_timer() {
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/w/file.ts");

        debouncer.record(path.clone());
        sleep(Duration::from_millis(30));
        debouncer.record(path.clone());
        sleep(Duration::from_millis(30));

        // Only 30ms since the second event.
        assert!(debouncer.take_ready().is_empty());

        sleep(Duration::from_millis(30));
        assert_eq!(debouncer.take_ready(), vec![path]);
    }

    #[test]
    fn test_timers_are_per_path() {
        let mut debouncer = Debouncer::new(50);
        let first = PathBuf::from("/w/a.ts");
        let second = PathBuf::from("/w/b.ts");

        debouncer.record(first.clone());
        sleep(Duration::from_millis(30));
        debouncer.record(second.clone());
        sleep(Duration::from_millis(25));

        assert_eq!(debouncer.take_ready(), vec![first]);
        assert!(debouncer.has_pending());

        sleep(Duration::from_millis(30));
        assert_eq!(debouncer.take_ready(), vec![second]);
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut debouncer = Debouncer::new(50);
        debouncer.record(PathBuf::from("/w/a.ts"));
        debouncer.clear();
        assert!(!debouncer.has_pending());
    }
}
