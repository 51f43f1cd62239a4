//! Command-line interface for sortdir.
//!
//! Defines the arguments with the clap derive API and runs each subcommand
//! against the library: scans and organize runs go through a
//! [`TaskRegistry`] so their progress can drive a terminal progress bar.
//!
//! ```bash
//! # List duplicate files by content
//! sortdir scan ~/Downloads
//!
//! # Preview sorting Downloads into ~/Sorted, with an extra category
//! sortdir organize ~/Downloads ~/Sorted --dry-run --rule Ebooks=.epub,.mobi
//! ```

use crate::config::AppConfig;
use crate::duplicates::{self, DeleteReport, EquivalenceMethod, ScanReport};
use crate::error::{SortError, SortResult};
use crate::file_category::{self, CategoryRuleTable};
use crate::file_organizer;
use crate::output::OutputFormatter;
use crate::signal::{self, EXIT_CODE_INTERRUPTED, InterruptHandler};
use crate::task::{TaskHandle, TaskRegistry};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Sort a directory's files into category folders and find duplicates.
#[derive(Debug, Parser)]
#[command(name = "sortdir")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors and hide progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file to use instead of the default locations
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List groups of duplicate files in a directory
    Scan(ScanArgs),
    /// Delete all but the first file of every duplicate group
    Dedupe(DedupeArgs),
    /// Delete the given files
    Delete(DeleteArgs),
    /// Move files into category subdirectories of a destination
    Organize(OrganizeArgs),
    /// Print the active category table
    Categories(RuleArgs),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan (not recursive)
    #[arg(value_name = "DIR")]
    pub directory: PathBuf,

    /// Duplicate rule: "name" (case-insensitive) or "content"
    #[arg(long = "by", value_name = "METHOD")]
    pub method: Option<EquivalenceMethod>,

    /// Print the groups as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DedupeArgs {
    #[arg(value_name = "DIR")]
    pub directory: PathBuf,

    #[arg(long = "by", value_name = "METHOD")]
    pub method: Option<EquivalenceMethod>,

    /// Actually delete; without this only the plan is shown
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

/// Category table adjustments shared by `organize` and `categories`.
#[derive(Debug, Args)]
pub struct RuleArgs {
    /// Add or replace a category, e.g. --rule Ebooks=.epub,.mobi
    #[arg(long = "rule", value_name = "NAME=EXTS", value_parser = parse_rule)]
    pub rules: Vec<RuleArg>,

    /// Only use these categories
    #[arg(long = "only", value_name = "CATEGORY")]
    pub only: Vec<String>,

    /// Leave these categories out
    #[arg(long = "skip", value_name = "CATEGORY")]
    pub skip: Vec<String>,
}

#[derive(Debug, Args)]
pub struct OrganizeArgs {
    /// Directory whose files are sorted
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory that receives the category subdirectories
    #[arg(value_name = "DEST")]
    pub destination: PathBuf,

    /// Show where files would go without moving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Remove duplicates from SOURCE first, keeping the first of each group
    #[arg(long)]
    pub dedupe: bool,

    #[arg(long = "by", value_name = "METHOD")]
    pub method: Option<EquivalenceMethod>,

    #[command(flatten)]
    pub rules: RuleArgs,
}

/// A `NAME=.ext,.ext` category given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleArg {
    pub name: String,
    pub extensions: Vec<String>,
}

fn parse_rule(s: &str) -> Result<RuleArg, String> {
    let (name, exts) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=EXTENSIONS, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("category name is empty".to_string());
    }
    let extensions = file_category::parse_extension_list(exts);
    if extensions.is_empty() {
        return Err(format!("category '{}' has no extensions", name));
    }
    Ok(RuleArg {
        name: name.to_string(),
        extensions,
    })
}

/// Runs the parsed command line.
///
/// # Errors
///
/// Configuration errors and directory-level failures. Per-file failures are
/// printed and do not make the run fail.
pub fn run(cli: Cli) -> SortResult<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let session = Session {
        registry: TaskRegistry::new(),
        interrupts: signal::install_handler(),
        show_progress: !cli.quiet,
    };

    match cli.command {
        Commands::Scan(args) => {
            let method = args.method.unwrap_or(config.duplicates.method);
            let handle = session.registry.spawn_scan(&args.directory, method)?;
            let report = session.drive(handle, !args.json)?;
            if args.json {
                print_scan_json(&args.directory, method, &report);
            } else {
                OutputFormatter::duplicate_groups(&args.directory, &report);
            }
            Ok(())
        }
        Commands::Dedupe(args) => {
            let method = args.method.unwrap_or(config.duplicates.method);
            dedupe(&session, &args.directory, method, !args.yes)
        }
        Commands::Delete(args) => {
            let report = duplicates::delete_selected(&args.paths);
            OutputFormatter::delete_report(&report);
            Ok(())
        }
        Commands::Organize(args) => {
            let table = build_table(&config, &args.rules)?;
            if args.dedupe {
                if config.duplicates.enabled {
                    let method = args.method.unwrap_or(config.duplicates.method);
                    dedupe(&session, &args.source, method, args.dry_run)?;
                } else {
                    OutputFormatter::warning(
                        "Duplicate detection is disabled in the configuration; skipping --dedupe",
                    );
                }
            }
            organize(&session, &args, table)
        }
        Commands::Categories(args) => {
            let table = build_table(&config, &args)?;
            OutputFormatter::rule_table(&table);
            Ok(())
        }
    }
}

/// Applies `--rule`, `--only` and `--skip` on top of the configured table.
fn build_table(config: &AppConfig, args: &RuleArgs) -> SortResult<CategoryRuleTable> {
    let mut table = config.rule_table()?;
    for rule in &args.rules {
        table = table.with_rule(&rule.name, rule.extensions.as_slice())?;
    }

    for name in args.only.iter().chain(&args.skip) {
        if !table.contains(name) {
            OutputFormatter::warning(&format!("Unknown category '{}'", name));
        }
    }
    if !args.only.is_empty() {
        table = table.retain_categories(|name| args.only.iter().any(|o| o == name));
    }
    if !args.skip.is_empty() {
        table = table.retain_categories(|name| !args.skip.iter().any(|s| s == name));
    }
    Ok(table)
}

fn dedupe(
    session: &Session,
    directory: &Path,
    method: EquivalenceMethod,
    dry_run: bool,
) -> SortResult<()> {
    OutputFormatter::info(&format!(
        "Looking for duplicates in {} (by {})",
        directory.display(),
        method
    ));
    let handle = session.registry.spawn_scan(directory, method)?;
    let scan = session.drive(handle, true)?;
    OutputFormatter::duplicate_groups(directory, &scan);

    if scan.groups.is_empty() {
        return Ok(());
    }
    if dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Would delete {} duplicate file(s), keeping the first of each group",
            scan.redundant_files()
        ));
        return Ok(());
    }

    let mut report = DeleteReport::default();
    for group in &scan.groups {
        report.absorb(duplicates::delete_keeping_first(directory, group));
    }
    OutputFormatter::delete_report(&report);
    Ok(())
}

fn organize(session: &Session, args: &OrganizeArgs, table: CategoryRuleTable) -> SortResult<()> {
    if args.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of: {}",
            args.source.display()
        ));
        let plan = file_organizer::plan(&args.source, &args.destination, &table)?;
        OutputFormatter::organize_plan(&plan);
        OutputFormatter::success("Dry run complete. No files were modified.");
        return Ok(());
    }

    OutputFormatter::info(&format!(
        "Organizing {} into {}",
        args.source.display(),
        args.destination.display()
    ));
    let handle = session
        .registry
        .spawn_organize(&args.source, &args.destination, table)?;
    let report = session.drive(handle, true)?;
    OutputFormatter::organize_report(&report);

    if report.all_succeeded() {
        OutputFormatter::success("Organization complete!");
    } else {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    }
    Ok(())
}

/// State shared by the subcommands of one run.
struct Session {
    registry: TaskRegistry,
    interrupts: InterruptHandler,
    show_progress: bool,
}

impl Session {
    /// Feeds a task's events into a progress bar and returns its result.
    /// Ctrl-C cancels the task while it runs.
    fn drive<T>(&self, handle: TaskHandle<T>, with_bar: bool) -> SortResult<T> {
        let _watch = self.interrupts.watch(handle.cancel_token());
        if self.show_progress && with_bar {
            let pb = OutputFormatter::create_progress_bar();
            for event in handle.progress() {
                OutputFormatter::update_progress(&pb, &event);
            }
            pb.finish_and_clear();
        } else {
            handle.progress().for_each(drop);
        }
        handle.wait()
    }
}

#[derive(Serialize)]
struct ScanJson<'a> {
    directory: &'a Path,
    method: EquivalenceMethod,
    files_scanned: usize,
    groups: &'a [duplicates::DuplicateGroup],
    failures: Vec<String>,
}

fn print_scan_json(directory: &Path, method: EquivalenceMethod, report: &ScanReport) {
    let doc = ScanJson {
        directory,
        method,
        files_scanned: report.files_scanned,
        groups: &report.groups,
        failures: report.failures.iter().map(|f| f.to_string()).collect(),
    };
    match serde_json::to_string_pretty(&doc) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize scan report: {}", e),
    }
}

/// Exit code for a failed run: 2 for usage-like errors, 130 after Ctrl-C,
/// 1 otherwise.
pub fn exit_code(err: &SortError) -> i32 {
    match err {
        SortError::InvalidRule { .. } | SortError::Config(_) => 2,
        SortError::Cancelled { .. } => EXIT_CODE_INTERRUPTED,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rule() {
        let rule = parse_rule("Ebooks=.epub, mobi").expect("parse failed");
        assert_eq!(rule.name, "Ebooks");
        assert_eq!(rule.extensions, vec![".epub", "mobi"]);
    }

    #[test]
    fn test_parse_rule_rejects_bad_input() {
        assert!(parse_rule("Ebooks").is_err());
        assert!(parse_rule("=.epub").is_err());
        assert!(parse_rule("Ebooks= , ").is_err());
    }

    #[test]
    fn test_parse_organize_command() {
        let cli = Cli::try_parse_from([
            "sortdir", "-vv", "organize", "in", "out", "--dry-run", "--skip", "Code", "--rule",
            "Ebooks=.epub",
        ])
        .expect("parse failed");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Organize(args) => {
                assert!(args.dry_run);
                assert!(!args.dedupe);
                assert_eq!(args.source, PathBuf::from("in"));
                assert_eq!(args.rules.skip, vec!["Code"]);
                assert_eq!(args.rules.rules.len(), 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_scan_method() {
        let cli = Cli::try_parse_from(["sortdir", "scan", "dir", "--by", "name", "--json"])
            .expect("parse failed");
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.method, Some(EquivalenceMethod::ByName));
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["sortdir", "scan", "dir", "--by", "size"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["sortdir", "-q", "-v", "categories"]).is_err());
    }

    #[test]
    fn test_build_table_only_and_skip() {
        let config = AppConfig::default();
        let args = RuleArgs {
            rules: vec![RuleArg {
                name: "Ebooks".to_string(),
                extensions: vec![".epub".to_string()],
            }],
            only: vec!["Images".to_string(), "Ebooks".to_string(), "Code".to_string()],
            skip: vec!["Code".to_string()],
        };
        let table = build_table(&config, &args).expect("table");
        let names: Vec<_> = table.names().collect();
        assert_eq!(names, vec!["Images", "Ebooks"]);
    }

    #[test]
    fn test_exit_codes() {
        let usage = SortError::InvalidRule {
            name: String::new(),
            reason: "empty".to_string(),
        };
        assert_eq!(exit_code(&usage), 2);
        let missing = SortError::DirectoryNotFound {
            path: PathBuf::from("/missing"),
        };
        assert_eq!(exit_code(&missing), 1);
        let cancelled = SortError::Cancelled { processed: 3 };
        assert_eq!(exit_code(&cancelled), EXIT_CODE_INTERRUPTED);
    }

    #[test]
    fn test_drive_watches_task_only_while_it_runs() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        std::fs::write(temp_dir.path().join("a.txt"), "a").expect("Failed to write file");
        let session = Session {
            registry: TaskRegistry::new(),
            interrupts: InterruptHandler::new(),
            show_progress: false,
        };

        let handle = session
            .registry
            .spawn_scan(temp_dir.path(), EquivalenceMethod::ByContent)
            .expect("spawn failed");
        let report = session.drive(handle, true).expect("scan failed");
        assert_eq!(report.files_scanned, 1);
        assert!(!session.interrupts.interrupt());
    }
}
