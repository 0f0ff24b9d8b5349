use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

use crate::loader::is_config_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Create,
    Modify,
    Delete,
}

/// Transient change notification, produced and consumed within one tick
#[derive(Debug, Clone)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
}

pub type EventHandler = Box<dyn Fn(FileEvent) + Send>;

/// Polling directory watcher for definition files.
///
/// Each tick diffs a fresh directory snapshot against the previous one and
/// emits create/modify/delete events. A modification is reported only when
/// the file's age since its last write exceeds the debounce window, so a
/// file still being written is not picked up mid-write. The snapshot is
/// replaced wholesale each tick, so a modification observed before its
/// debounce elapses can be absorbed silently; delivery is best-effort, not
/// exactly-once.
///
/// Handlers run synchronously on the watcher's own thread; a slow handler
/// delays the next tick.
pub struct ChangeWatcher {
    dir: PathBuf,
    interval: Duration,
    debounce: Duration,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ChangeWatcher {
    pub fn new(dir: impl Into<PathBuf>, interval: Duration, debounce: Duration) -> Self {
        Self { dir: dir.into(), interval, debounce, stop_tx: None, handle: None }
    }

    /// Scan once synchronously, then poll on the configured interval until
    /// [`stop`](Self::stop).
    ///
    /// The initial snapshot is empty, so the first scan reports every
    /// pre-existing definition file as a create; consumers must treat
    /// creates as idempotent upserts.
    pub fn start(&mut self, handler: EventHandler) {
        if self.handle.is_some() {
            return;
        }

        let mut snapshot = HashMap::new();
        for event in scan(&self.dir, &mut snapshot, self.debounce) {
            handler(event);
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let dir = self.dir.clone();
        let interval = self.interval;
        let debounce = self.debounce;

        let handle = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
            for event in scan(&dir, &mut snapshot, debounce) {
                handler(event);
            }
        });

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);
        tracing::info!(dir = %self.dir.display(), interval = ?self.interval, "file watcher started");
    }

    /// Signal the poll loop and block until it exits; idempotent.
    ///
    /// No event is guaranteed to be delivered after `stop` returns.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            tracing::info!(dir = %self.dir.display(), "file watcher stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Diff the directory against `snapshot`, emit the resulting events and
/// replace the snapshot
fn scan(
    dir: &Path,
    snapshot: &mut HashMap<PathBuf, SystemTime>,
    debounce: Duration,
) -> Vec<FileEvent> {
    let mut fresh: HashMap<PathBuf, SystemTime> = HashMap::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !is_config_file(&path) {
                continue;
            }
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                fresh.insert(path, modified);
            }
        }
    }

    let now = SystemTime::now();
    let mut events = Vec::new();

    for (path, modified) in &fresh {
        match snapshot.get(path) {
            None => events.push(FileEvent { kind: FileEventKind::Create, path: path.clone() }),
            Some(prior) if modified > prior => {
                let settled =
                    now.duration_since(*modified).map(|age| age >= debounce).unwrap_or(false);
                if settled {
                    events.push(FileEvent { kind: FileEventKind::Modify, path: path.clone() });
                }
            }
            Some(_) => {}
        }
    }

    for path in snapshot.keys() {
        if !fresh.contains_key(path) {
            events.push(FileEvent { kind: FileEventKind::Delete, path: path.clone() });
        }
    }

    *snapshot = fresh;
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver;
    use std::thread::sleep;
    use tempfile::TempDir;

    const INTERVAL: Duration = Duration::from_millis(50);
    const DEBOUNCE: Duration = Duration::from_millis(20);

    fn collecting_watcher(dir: &Path) -> (ChangeWatcher, Receiver<FileEvent>) {
        let (tx, rx) = mpsc::channel();
        let mut watcher = ChangeWatcher::new(dir, INTERVAL, DEBOUNCE);
        watcher.start(Box::new(move |event| {
            let _ = tx.send(event);
        }));
        (watcher, rx)
    }

    fn drain(rx: &Receiver<FileEvent>, wait: Duration) -> Vec<FileEvent> {
        sleep(wait);
        rx.try_iter().collect()
    }

    #[test]
    fn test_initial_scan_reports_existing_files_as_creates() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("writer.yaml"), "x").unwrap();

        let (mut watcher, rx) = collecting_watcher(tmp.path());
        let events = drain(&rx, Duration::from_millis(10));
        watcher.stop();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FileEventKind::Create);
        assert!(events[0].path.ends_with("writer.yaml"));
    }

    #[test]
    fn test_new_file_emits_exactly_one_create() {
        let tmp = TempDir::new().unwrap();
        let (mut watcher, rx) = collecting_watcher(tmp.path());
        drain(&rx, Duration::from_millis(10));

        fs::write(tmp.path().join("reviewer.yml"), "x").unwrap();
        let events = drain(&rx, INTERVAL * 4);
        watcher.stop();

        let creates: Vec<_> =
            events.iter().filter(|e| e.kind == FileEventKind::Create).collect();
        assert_eq!(creates.len(), 1);
        assert!(creates[0].path.ends_with("reviewer.yml"));
    }

    #[test]
    fn test_settled_modification_emits_exactly_one_modify() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("writer.yaml");
        fs::write(&path, "v1").unwrap();

        let mut snapshot = HashMap::new();
        let events = scan(tmp.path(), &mut snapshot, DEBOUNCE);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FileEventKind::Create);

        fs::write(&path, "v2").unwrap();
        sleep(DEBOUNCE * 2);

        let events = scan(tmp.path(), &mut snapshot, DEBOUNCE);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FileEventKind::Modify);

        // unchanged file stays quiet on the next tick
        assert!(scan(tmp.path(), &mut snapshot, DEBOUNCE).is_empty());
    }

    #[test]
    fn test_unsettled_modification_is_absorbed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("writer.yaml");
        fs::write(&path, "v1").unwrap();

        let mut snapshot = HashMap::new();
        scan(tmp.path(), &mut snapshot, Duration::from_secs(5));

        // a scan inside the debounce window swallows the change: the fresh
        // snapshot already carries the new timestamp
        fs::write(&path, "v2").unwrap();
        assert!(scan(tmp.path(), &mut snapshot, Duration::from_secs(5)).is_empty());
        assert!(scan(tmp.path(), &mut snapshot, Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_deleted_file_emits_exactly_one_delete() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("writer.yaml");
        fs::write(&path, "x").unwrap();

        let (mut watcher, rx) = collecting_watcher(tmp.path());
        drain(&rx, Duration::from_millis(10));

        fs::remove_file(&path).unwrap();
        let events = drain(&rx, INTERVAL * 4);
        watcher.stop();

        let deletes: Vec<_> =
            events.iter().filter(|e| e.kind == FileEventKind::Delete).collect();
        assert_eq!(deletes.len(), 1);
    }

    #[test]
    fn test_non_config_files_are_never_observed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "x").unwrap();

        let (mut watcher, rx) = collecting_watcher(tmp.path());
        fs::write(tmp.path().join("more.txt"), "x").unwrap();
        let events = drain(&rx, INTERVAL * 3);
        watcher.stop();

        assert!(events.is_empty());
    }

    #[test]
    fn test_stop_joins_the_loop() {
        let tmp = TempDir::new().unwrap();
        let (mut watcher, _rx) = collecting_watcher(tmp.path());
        assert!(watcher.is_running());
        watcher.stop();
        assert!(!watcher.is_running());
        // second stop is a no-op
        watcher.stop();
    }
}
