//! Duplicate detection and removal.
//!
//! [`scan`] groups the files of one directory by an equivalence key (the
//! case-folded file name, or the SHA-256 of the content) and keeps the keys
//! shared by two or more files. [`delete_keeping_first`] and
//! [`delete_selected`] remove duplicates, collecting failures instead of
//! stopping at the first one.

use crate::error::{FileFailure, SortError, SortResult};
use crate::hasher;
use crate::listing;
use crate::progress::{ProgressEvent, ProgressSink};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How two files are judged to be duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EquivalenceMethod {
    /// Same file name, ignoring case.
    #[serde(rename = "name", alias = "filename")]
    ByName,
    /// Byte-identical content.
    #[default]
    #[serde(rename = "content", alias = "hash")]
    ByContent,
}

impl EquivalenceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ByName => "name",
            Self::ByContent => "content",
        }
    }
}

impl fmt::Display for EquivalenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquivalenceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "filename" => Ok(Self::ByName),
            "content" | "hash" => Ok(Self::ByContent),
            other => Err(format!(
                "unknown duplicate method '{}': expected 'name' or 'content'",
                other
            )),
        }
    }
}

/// Files sharing one equivalence key. Always holds at least two names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Lowercase file name or hex content digest.
    pub key: String,
    /// File names in listing order, for display.
    pub files: Vec<String>,
    /// The same names as stored on disk.
    #[serde(skip)]
    file_names: Vec<OsString>,
}

impl DuplicateGroup {
    /// Builds a group from on-disk file names, in order.
    pub fn new(key: impl Into<String>, file_names: Vec<OsString>) -> Self {
        Self {
            key: key.into(),
            files: file_names
                .iter()
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
            file_names,
        }
    }

    fn push(&mut self, file_name: OsString) {
        self.files.push(file_name.to_string_lossy().into_owned());
        self.file_names.push(file_name);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Full paths of the members inside `directory`.
    pub fn paths(&self, directory: &Path) -> Vec<PathBuf> {
        self.file_names.iter().map(|f| directory.join(f)).collect()
    }
}

/// Outcome of a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Groups in order of their first member's position in the listing.
    pub groups: Vec<DuplicateGroup>,
    /// Number of files in the directory snapshot.
    pub files_scanned: usize,
    /// Files that could not be hashed and were left out of every group.
    pub failures: Vec<FileFailure>,
}

impl ScanReport {
    /// Key → file names view of the groups.
    pub fn as_map(&self) -> HashMap<&str, &[String]> {
        self.groups
            .iter()
            .map(|g| (g.key.as_str(), g.files.as_slice()))
            .collect()
    }

    /// Number of files that are redundant copies (group size minus one, summed).
    pub fn redundant_files(&self) -> usize {
        self.groups.iter().map(|g| g.files.len() - 1).sum()
    }
}

/// Groups the regular files directly inside `directory` by `method`.
///
/// Emits one progress event per file and a final `Scan complete!` event with
/// `current == total`. A file that cannot be hashed is recorded in
/// [`ScanReport::failures`] and the scan continues.
///
/// # Errors
///
/// Fails before emitting any event if the directory is missing or cannot be
/// listed, and with [`SortError::Cancelled`] if `progress` reports
/// cancellation.
///
/// # Examples
///
/// ```no_run
/// use sortdir::duplicates::{scan, EquivalenceMethod};
/// use sortdir::progress::NoProgress;
/// use std::path::Path;
///
/// let report = scan(Path::new("/home/me/Downloads"), EquivalenceMethod::ByContent, &NoProgress)?;
/// for group in &report.groups {
///     println!("{}: {:?}", group.key, group.files);
/// }
/// # Ok::<(), sortdir::SortError>(())
/// ```
pub fn scan(
    directory: &Path,
    method: EquivalenceMethod,
    progress: &dyn ProgressSink,
) -> SortResult<ScanReport> {
    let files = listing::list_files(directory)?;
    let total = files.len();
    log::info!(
        "Scanning {} files in {} by {}",
        total,
        directory.display(),
        method
    );

    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut failures = Vec::new();

    for (i, file) in files.iter().enumerate() {
        if progress.is_cancelled() {
            log::info!("Scan of {} cancelled after {} files", directory.display(), i);
            return Err(SortError::Cancelled { processed: i });
        }

        let key = match method {
            EquivalenceMethod::ByName => match file.utf8_name() {
                Some(name) => Some(name.to_lowercase()),
                None => {
                    log::warn!(
                        "Leaving {} out of name groups: file name is not valid UTF-8",
                        file.path.display()
                    );
                    None
                }
            },
            EquivalenceMethod::ByContent => match hasher::hash_file(&file.path) {
                Ok(digest) => Some(digest),
                Err(e) => {
                    log::warn!("Skipping {}: {}", file.path.display(), e);
                    failures.push(FileFailure::new(
                        file.name.clone(),
                        SortError::FileReadError {
                            path: file.path.clone(),
                            source: e,
                        },
                    ));
                    None
                }
            },
        };

        if let Some(key) = key {
            log::debug!("{} -> {}", file.name, key);
            match index.get(&key) {
                Some(&slot) => groups[slot].push(file.file_name.clone()),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(DuplicateGroup::new(key, vec![file.file_name.clone()]));
                }
            }
        }

        progress.emit(ProgressEvent::new(
            format!("Scanning... ({}/{})", i + 1, total),
            i + 1,
            total,
        ));
    }

    groups.retain(|g| g.files.len() >= 2);
    progress.emit(ProgressEvent::new("Scan complete!", total, total));
    log::info!(
        "Found {} duplicate groups among {} files",
        groups.len(),
        total
    );

    Ok(ScanReport {
        groups,
        files_scanned: total,
        failures,
    })
}

/// Outcome of a batch deletion.
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub deleted: usize,
    pub failures: Vec<FileFailure>,
}

impl DeleteReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line summary, e.g. `Deleted 3 files, 1 failed`.
    pub fn summary(&self) -> String {
        let noun = if self.deleted == 1 { "file" } else { "files" };
        if self.failures.is_empty() {
            format!("Deleted {} {}", self.deleted, noun)
        } else {
            format!(
                "Deleted {} {}, {} failed",
                self.deleted,
                noun,
                self.failures.len()
            )
        }
    }

    /// Folds another batch's outcome into this one.
    pub fn absorb(&mut self, other: DeleteReport) {
        self.deleted += other.deleted;
        self.failures.extend(other.failures);
    }

    fn delete(&mut self, label: String, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => {
                log::debug!("Deleted {}", path.display());
                self.deleted += 1;
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", path.display(), e);
                self.failures.push(FileFailure::new(
                    label,
                    SortError::FileDeleteError {
                        path: path.to_path_buf(),
                        source: e,
                    },
                ));
            }
        }
    }
}

/// Deletes every member of `group` except the first, resolving names inside
/// `directory`.
///
/// A group of one is left alone.
pub fn delete_keeping_first(directory: &Path, group: &DuplicateGroup) -> DeleteReport {
    let mut report = DeleteReport::default();
    for (name, path) in group.files.iter().zip(group.paths(directory)).skip(1) {
        report.delete(name.clone(), &path);
    }
    log::info!("Group {}: {}", group.key, report.summary());
    report
}

/// Deletes each of `paths`. Every failure is recorded; none stops the batch.
pub fn delete_selected<P: AsRef<Path>>(paths: &[P]) -> DeleteReport {
    let mut report = DeleteReport::default();
    for path in paths {
        let path = path.as_ref();
        report.delete(path.display().to_string(), path);
    }
    log::info!("{}", report.summary());
    report
}
