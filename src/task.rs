//! Background execution of scans and organize runs.
//!
//! Each operation runs on its own worker thread. The caller gets a
//! [`TaskHandle`] with an ordered progress channel, a cancellation switch and
//! the terminal result, delivered once by [`TaskHandle::wait`].
//!
//! A [`TaskRegistry`] keeps at most one operation of each kind in flight per
//! directory. Cancellation is cooperative and checked between files; whatever
//! was already moved or deleted stays that way.

use crate::duplicates::{self, EquivalenceMethod, ScanReport};
use crate::error::{SortError, SortResult};
use crate::file_category::CategoryRuleTable;
use crate::file_organizer::{self, OrganizeReport};
use crate::progress::{ProgressEvent, ProgressSink};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// The kinds of operation that are single-flight per directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Scan,
    Organize,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Organize => "organize",
        }
    }
}

/// Lifecycle of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Completed,
    Failed,
}

/// Shared flag used to ask a worker to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress sink used inside workers: forwards events over a channel and
/// reports the token's state.
struct WorkerSink {
    events: Sender<ProgressEvent>,
    cancel: CancelToken,
}

impl ProgressSink for WorkerSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.emit(event);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Handle to a running background operation.
pub struct TaskHandle<T> {
    kind: OperationKind,
    events: Receiver<ProgressEvent>,
    cancel: CancelToken,
    state: Arc<Mutex<TaskState>>,
    worker: JoinHandle<SortResult<T>>,
}

impl<T> TaskHandle<T> {
    /// Blocking iterator over progress events. Ends when the worker finishes.
    pub fn progress(&self) -> mpsc::Iter<'_, ProgressEvent> {
        self.events.iter()
    }

    /// Asks the worker to stop before its next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the cancellation token, e.g. for a Ctrl-C handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> TaskState {
        *lock(&self.state)
    }

    /// Waits for the worker and returns its result.
    ///
    /// # Errors
    ///
    /// The operation's own error, or [`SortError::WorkerPanicked`].
    pub fn wait(self) -> SortResult<T> {
        let kind = self.kind.as_str();
        self.worker
            .join()
            .map_err(|_| SortError::WorkerPanicked { kind })?
    }
}

/// Tracks which (operation, directory) pairs are in flight.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    active: Arc<Mutex<HashSet<(OperationKind, PathBuf)>>>,
}

/// Releases a registry slot when dropped.
struct FlightGuard {
    active: Arc<Mutex<HashSet<(OperationKind, PathBuf)>>>,
    key: (OperationKind, PathBuf),
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.key);
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an operation of `kind` runs on `dir`.
    pub fn is_running(&self, kind: OperationKind, dir: &Path) -> bool {
        lock(&self.active).contains(&(kind, normalize(dir)))
    }

    fn acquire(&self, kind: OperationKind, dir: &Path) -> SortResult<FlightGuard> {
        let key = (kind, normalize(dir));
        let mut active = lock(&self.active);
        if !active.insert(key.clone()) {
            return Err(SortError::AlreadyRunning {
                kind: kind.as_str(),
                path: dir.to_path_buf(),
            });
        }
        Ok(FlightGuard {
            active: Arc::clone(&self.active),
            key,
        })
    }

    /// Starts a duplicate scan of `dir` on a worker thread.
    ///
    /// # Errors
    ///
    /// [`SortError::AlreadyRunning`] if a scan of `dir` is already in flight.
    pub fn spawn_scan(
        &self,
        dir: &Path,
        method: EquivalenceMethod,
    ) -> SortResult<TaskHandle<ScanReport>> {
        let guard = self.acquire(OperationKind::Scan, dir)?;
        let dir = dir.to_path_buf();
        spawn(OperationKind::Scan, guard, move |sink| {
            duplicates::scan(&dir, method, sink)
        })
    }

    /// Starts organizing `source` into `destination` on a worker thread.
    ///
    /// The table is moved into the worker; callers keep their own copy.
    ///
    /// # Errors
    ///
    /// [`SortError::AlreadyRunning`] if `source` is already being organized.
    pub fn spawn_organize(
        &self,
        source: &Path,
        destination: &Path,
        table: CategoryRuleTable,
    ) -> SortResult<TaskHandle<OrganizeReport>> {
        let guard = self.acquire(OperationKind::Organize, source)?;
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();
        spawn(OperationKind::Organize, guard, move |sink| {
            file_organizer::organize(&source, &destination, &table, sink)
        })
    }
}

fn spawn<T, F>(kind: OperationKind, guard: FlightGuard, job: F) -> SortResult<TaskHandle<T>>
where
    T: Send + 'static,
    F: FnOnce(&dyn ProgressSink) -> SortResult<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let cancel = CancelToken::new();
    let state = Arc::new(Mutex::new(TaskState::Running));

    let sink = WorkerSink {
        events: tx,
        cancel: cancel.clone(),
    };
    let worker_state = Arc::clone(&state);
    let worker = thread::Builder::new()
        .name(format!("sortdir-{}", kind.as_str()))
        .spawn(move || {
            let _guard = guard;
            let result = job(&sink);
            *lock(&worker_state) = if result.is_ok() {
                TaskState::Completed
            } else {
                TaskState::Failed
            };
            if let Err(e) = &result {
                log::debug!("{} task failed: {}", kind.as_str(), e);
            }
            result
        })
        .map_err(|_| SortError::WorkerPanicked {
            kind: kind.as_str(),
        })?;

    Ok(TaskHandle {
        kind,
        events: rx,
        cancel,
        state,
        worker,
    })
}

fn normalize(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_spawn_scan_delivers_progress_and_result() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "same").expect("Failed to write file");
        fs::write(temp_dir.path().join("b.txt"), "same").expect("Failed to write file");

        let registry = TaskRegistry::new();
        let handle = registry
            .spawn_scan(temp_dir.path(), EquivalenceMethod::ByContent)
            .expect("spawn failed");

        let events: Vec<_> = handle.progress().collect();
        let currents: Vec<_> = events.iter().map(|e| e.current).collect();
        assert_eq!(currents, vec![1, 2, 2]);

        let report = handle.wait().expect("scan failed");
        assert_eq!(report.groups.len(), 1);
        assert!(!registry.is_running(OperationKind::Scan, temp_dir.path()));
    }

    #[test]
    fn test_single_flight_per_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let registry = TaskRegistry::new();

        let guard = registry
            .acquire(OperationKind::Scan, temp_dir.path())
            .expect("first acquire");
        let second = registry.spawn_scan(temp_dir.path(), EquivalenceMethod::ByName);
        assert!(matches!(second, Err(SortError::AlreadyRunning { .. })));

        // A different kind on the same directory is allowed.
        let other = registry
            .acquire(OperationKind::Organize, temp_dir.path())
            .expect("organize slot");

        drop(guard);
        drop(other);
        assert!(!registry.is_running(OperationKind::Scan, temp_dir.path()));
        let handle = registry
            .spawn_scan(temp_dir.path(), EquivalenceMethod::ByName)
            .expect("slot should be free again");
        handle.wait().expect("scan failed");
    }

    #[test]
    fn test_failed_task_releases_slot() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing");
        let registry = TaskRegistry::new();

        let handle = registry
            .spawn_scan(&missing, EquivalenceMethod::ByName)
            .expect("spawn failed");
        assert_eq!(handle.progress().count(), 0);
        assert_eq!(handle.state(), TaskState::Failed);
        assert!(matches!(
            handle.wait(),
            Err(SortError::DirectoryNotFound { .. })
        ));
        assert!(!registry.is_running(OperationKind::Scan, &missing));
    }

    #[test]
    fn test_cancelled_before_start() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        for i in 0..50 {
            fs::write(source.path().join(format!("{i}.txt")), "x").expect("Failed to write file");
        }

        let registry = TaskRegistry::new();
        let handle = registry
            .spawn_organize(source.path(), dest.path(), CategoryRuleTable::default())
            .expect("spawn failed");
        handle.cancel();
        let _: Vec<_> = handle.progress().collect();

        match handle.wait() {
            Err(SortError::Cancelled { processed }) => {
                assert!(processed < 50);
                let left = fs::read_dir(source.path()).expect("read_dir").count();
                assert_eq!(left, 50 - processed);
            }
            Ok(report) => assert_eq!(report.processed, 50),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
