/// Moving files into category directories.
///
/// The organizer takes a snapshot of the regular files in a source directory,
/// classifies each one against a [`CategoryRuleTable`], and moves matched files
/// to `<destination>/<category>/<file name>`. A file that cannot be moved is
/// recorded and skipped; the rest of the batch still runs.
use crate::error::{FileFailure, SortError, SortResult};
use crate::file_category::CategoryRuleTable;
use crate::listing;
use crate::progress::{ProgressEvent, ProgressSink};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A file that will be (or was) moved into a category directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    /// File name in the source directory.
    pub file: String,
    /// Category the file matched.
    pub category: String,
    /// The original path of the file before organization.
    pub source: PathBuf,
    /// Full destination path, `<destination>/<category>/<file>`.
    pub destination: PathBuf,
}

/// What an organize run would do, without doing it.
#[derive(Debug, Clone, Default)]
pub struct OrganizePlan {
    pub moves: Vec<PlannedMove>,
    /// Files no category matched; they stay where they are.
    pub unclassified: Vec<String>,
}

impl OrganizePlan {
    /// Total number of files in the snapshot.
    pub fn total(&self) -> usize {
        self.moves.len() + self.unclassified.len()
    }

    /// Planned move count per category, in table order of first appearance.
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for planned in &self.moves {
            match counts.iter_mut().find(|(c, _)| *c == planned.category) {
                Some((_, n)) => *n += 1,
                None => counts.push((planned.category.clone(), 1)),
            }
        }
        counts
    }
}

/// Outcome of an organize run.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Files visited, whether moved, left unclassified, or failed.
    pub processed: usize,
    pub moved: Vec<PlannedMove>,
    pub unclassified: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl OrganizeReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Computes where each file of `source` would go.
///
/// # Errors
///
/// [`SortError::DirectoryNotFound`] or [`SortError::DirectoryUnreadable`] if the
/// source cannot be listed. Nothing on disk is changed.
///
/// # Examples
///
/// ```no_run
/// use sortdir::file_category::CategoryRuleTable;
/// use sortdir::file_organizer::plan;
/// use std::path::Path;
///
/// let plan = plan(Path::new("/home/me/Downloads"), Path::new("/home/me/Sorted"), &CategoryRuleTable::default())?;
/// for m in &plan.moves {
///     println!("{} -> {}", m.file, m.destination.display());
/// }
/// # Ok::<(), sortdir::SortError>(())
/// ```
pub fn plan(source: &Path, destination: &Path, table: &CategoryRuleTable) -> SortResult<OrganizePlan> {
    let files = listing::list_files(source)?;
    let mut plan = OrganizePlan::default();

    for file in files {
        match table.classify(&file.name) {
            Some(category) => plan.moves.push(PlannedMove {
                destination: destination.join(category).join(&file.file_name),
                category: category.to_string(),
                source: file.path,
                file: file.name,
            }),
            None => plan.unclassified.push(file.name),
        }
    }

    Ok(plan)
}

/// Moves every classifiable file of `source` into its category directory
/// under `destination`.
///
/// The destination and one subdirectory per category in `table` are created
/// first. Each file produces exactly one progress event; a final
/// `Organization complete!` event has `current == total`. Running it again
/// with the same arguments moves nothing new and does not fail.
///
/// # Errors
///
/// [`SortError::DirectoryNotFound`] if `source` is missing (checked before
/// anything else), [`SortError::DirectoryNotCreatable`] if `destination`
/// cannot be created, [`SortError::Cancelled`] if `progress` asks to stop.
/// Per-file failures are returned in [`OrganizeReport::failures`].
pub fn organize(
    source: &Path,
    destination: &Path,
    table: &CategoryRuleTable,
    progress: &dyn ProgressSink,
) -> SortResult<OrganizeReport> {
    let files = listing::list_files(source)?;

    fs::create_dir_all(destination).map_err(|e| SortError::DirectoryNotCreatable {
        path: destination.to_path_buf(),
        source: e,
    })?;
    for category in table.names() {
        let dir = destination.join(category);
        if let Err(e) = fs::create_dir_all(&dir) {
            // Files bound for this category will fail individually.
            log::warn!("Could not create {}: {}", dir.display(), e);
        }
    }

    let total = files.len();
    log::info!(
        "Organizing {} files from {} into {}",
        total,
        source.display(),
        destination.display()
    );

    let mut report = OrganizeReport::default();
    for (i, file) in files.into_iter().enumerate() {
        if progress.is_cancelled() {
            log::info!("Organize of {} cancelled after {} files", source.display(), i);
            return Err(SortError::Cancelled { processed: i });
        }

        let current = i + 1;
        let message = match table.classify(&file.name) {
            Some(category) => {
                let target = destination.join(category).join(&file.file_name);
                match move_file(&file.path, &target) {
                    Ok(()) => {
                        log::debug!("Moved {} to {}/", file.name, category);
                        report.moved.push(PlannedMove {
                            file: file.name,
                            category: category.to_string(),
                            source: file.path,
                            destination: target,
                        });
                        format!("Processing... ({}/{})", current, total)
                    }
                    Err(e) => {
                        log::warn!("Failed to move {}: {}", file.name, e);
                        let message = format!("Failed to move {}: {}", file.name, e);
                        report.failures.push(FileFailure::new(
                            file.name,
                            SortError::FileMoveError {
                                from: file.path,
                                to: target,
                                source: e,
                            },
                        ));
                        message
                    }
                }
            }
            None => {
                log::debug!("{} is unclassified, leaving in place", file.name);
                report.unclassified.push(file.name);
                format!("Processing... ({}/{})", current, total)
            }
        };

        report.processed = current;
        progress.emit(ProgressEvent::new(message, current, total));
    }

    progress.emit(ProgressEvent::new("Organization complete!", total, total));
    log::info!(
        "Processed {} files: {} moved, {} unclassified, {} failed",
        report.processed,
        report.moved.len(),
        report.unclassified.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Moves `from` to `to` without overwriting.
///
/// Uses a rename, falling back to copy + sync + remove when the two paths are
/// on different filesystems.
///
/// # Errors
///
/// `AlreadyExists` if `to` is already present, otherwise the I/O error of the
/// failed step.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(to).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination already exists",
        ));
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            log::debug!(
                "Cross-device move of {}, copying instead",
                from.display()
            );
            match fs::copy(from, to) {
                Ok(_) => {
                    fs::File::open(to)?.sync_all()?;
                    fs::remove_file(from)
                }
                Err(copy_err) => {
                    let _ = fs::remove_file(to);
                    Err(copy_err)
                }
            }
        }
        Err(e) => Err(e),
    }
}

/// Raw OS error for a rename across filesystems.
#[cfg(unix)]
const CROSS_DEVICE_CODE: Option<i32> = Some(18); // EXDEV
#[cfg(windows)]
const CROSS_DEVICE_CODE: Option<i32> = Some(17); // ERROR_NOT_SAME_DEVICE
#[cfg(not(any(unix, windows)))]
const CROSS_DEVICE_CODE: Option<i32> = None;

fn is_cross_device_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
        || (CROSS_DEVICE_CODE.is_some() && err.raw_os_error() == CROSS_DEVICE_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn table() -> CategoryRuleTable {
        CategoryRuleTable::empty()
            .with_rule("Images", &[".jpg", ".png"])
            .unwrap()
            .with_rule("Documents", &[".txt"])
            .unwrap()
    }

    #[test]
    fn test_plan_does_not_touch_disk() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        fs::write(source.path().join("a.jpg"), "img").expect("Failed to write file");
        fs::write(source.path().join("notes.md"), "md").expect("Failed to write file");

        let target = dest.path().join("out");
        let plan = plan(source.path(), &target, &table()).expect("plan failed");
        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.moves[0].destination, target.join("Images").join("a.jpg"));
        assert_eq!(plan.unclassified, vec!["notes.md"]);
        assert_eq!(plan.total(), 2);
        assert!(!target.exists());
        assert!(source.path().join("a.jpg").exists());
    }

    #[test]
    fn test_plan_category_counts() {
        let source = TempDir::new().expect("Failed to create temp directory");
        for name in ["a.jpg", "b.png", "c.txt"] {
            fs::write(source.path().join(name), name).expect("Failed to write file");
        }
        let plan = plan(source.path(), Path::new("/dest"), &table()).expect("plan failed");
        assert_eq!(
            plan.category_counts(),
            vec![("Images".to_string(), 2), ("Documents".to_string(), 1)]
        );
    }

    #[test]
    fn test_organize_creates_all_category_directories() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        let target = dest.path().join("nested").join("out");

        let report = organize(source.path(), &target, &table(), &NoProgress)
            .expect("organize failed");
        assert_eq!(report.processed, 0);
        assert!(target.join("Images").is_dir());
        assert!(target.join("Documents").is_dir());
    }

    #[test]
    fn test_organize_collision_is_reported_not_overwritten() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        fs::write(source.path().join("a.jpg"), "new").expect("Failed to write file");
        fs::write(source.path().join("b.jpg"), "b").expect("Failed to write file");
        fs::create_dir(dest.path().join("Images")).expect("Failed to create directory");
        fs::write(dest.path().join("Images").join("a.jpg"), "old").expect("Failed to write file");

        let events = RefCell::new(Vec::new());
        let sink = |e: ProgressEvent| events.borrow_mut().push(e);
        let report = organize(source.path(), dest.path(), &table(), &sink).expect("organize failed");

        assert_eq!(report.processed, 2);
        assert_eq!(report.moved.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, "a.jpg");
        assert!(source.path().join("a.jpg").exists());
        let kept = fs::read_to_string(dest.path().join("Images").join("a.jpg"))
            .expect("Failed to read file");
        assert_eq!(kept, "old");

        let events = events.into_inner();
        assert_eq!(events.len(), 3);
        assert!(events[0].message.starts_with("Failed to move a.jpg"));
        assert_eq!(events[0].current, 1);
        assert_eq!(events[2].message, "Organization complete!");
    }

    #[test]
    fn test_organize_missing_source() {
        let dest = TempDir::new().expect("Failed to create temp directory");
        let target = dest.path().join("out");
        let result = organize(&dest.path().join("missing"), &target, &table(), &NoProgress);
        assert!(matches!(result, Err(SortError::DirectoryNotFound { .. })));
        assert!(!target.exists());
    }

    #[test]
    fn test_organize_destination_not_creatable() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let blocker = source.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").expect("Failed to write file");

        let result = organize(source.path(), &blocker.join("out"), &table(), &NoProgress);
        assert!(matches!(result, Err(SortError::DirectoryNotCreatable { .. })));
    }

    #[test]
    fn test_organize_in_place() {
        let base = TempDir::new().expect("Failed to create temp directory");
        fs::write(base.path().join("a.jpg"), "img").expect("Failed to write file");

        let report = organize(base.path(), base.path(), &table(), &NoProgress)
            .expect("organize failed");
        assert_eq!(report.moved.len(), 1);
        assert!(base.path().join("Images").join("a.jpg").exists());
    }

    #[test]
    fn test_move_file_refuses_existing_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let from = temp_dir.path().join("from.txt");
        let to = temp_dir.path().join("to.txt");
        fs::write(&from, "from").expect("Failed to write file");
        fs::write(&to, "to").expect("Failed to write file");

        let err = move_file(&from, &to).expect_err("should refuse");
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert!(from.exists());
    }

    #[test]
    fn test_move_file_missing_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = move_file(
            &temp_dir.path().join("gone.txt"),
            &temp_dir.path().join("dest.txt"),
        );
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_cross_device_detection_uses_exdev_only() {
        assert!(is_cross_device_error(&io::Error::from_raw_os_error(18)));
        // EEXIST from a rename race is not a reason to copy.
        assert!(!is_cross_device_error(&io::Error::from_raw_os_error(17)));
    }

    #[cfg(unix)]
    #[test]
    fn test_organize_keeps_non_utf8_file_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let source = TempDir::new().expect("Failed to create temp directory");
        let dest = TempDir::new().expect("Failed to create temp directory");
        let raw = OsStr::from_bytes(b"a\xff.txt");
        fs::write(source.path().join(raw), "text").expect("Failed to write file");

        let planned = plan(source.path(), dest.path(), &table()).expect("plan failed");
        let expected = dest.path().join("Documents").join(raw);
        assert_eq!(planned.moves[0].destination, expected);

        let report = organize(source.path(), dest.path(), &table(), &NoProgress)
            .expect("organize failed");
        assert_eq!(report.moved.len(), 1);
        assert_eq!(report.moved[0].destination, expected);
        assert!(expected.exists());
        assert!(!dest.path().join("Documents").join("a\u{FFFD}.txt").exists());
        assert!(!source.path().join(raw).exists());
    }
}
