//! sortdir - sort a directory by file category and clean out duplicates
//!
//! This library classifies files by extension into named categories, moves
//! them into per-category subdirectories, and finds duplicate files by
//! case-insensitive name or by content hash. Long operations report progress
//! through a [`progress::ProgressSink`] and can run on a background worker via
//! [`task::TaskRegistry`].

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod hasher;
pub mod listing;
pub mod logging;
pub mod output;
pub mod progress;
pub mod signal;
pub mod task;

pub use config::{AppConfig, ConfigError};
pub use duplicates::{DeleteReport, DuplicateGroup, EquivalenceMethod, ScanReport};
pub use error::{FileFailure, SortError, SortResult};
pub use file_category::{CategoryRule, CategoryRuleTable, classify};
pub use file_organizer::{OrganizePlan, OrganizeReport, PlannedMove};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use task::{CancelToken, OperationKind, TaskHandle, TaskRegistry, TaskState};
