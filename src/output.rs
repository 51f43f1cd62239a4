//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! progress bars fed from [`ProgressEvent`]s, and the tables printed after a
//! scan or organize run.

use crate::duplicates::{DeleteReport, ScanReport};
use crate::error::FileFailure;
use crate::file_category::CategoryRuleTable;
use crate::file_organizer::{OrganizePlan, OrganizeReport};
use crate::listing::FileEntry;
use crate::progress::ProgressEvent;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar; its length is set from the first event.
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Applies one progress event to a bar.
    pub fn update_progress(pb: &ProgressBar, event: &ProgressEvent) {
        pb.set_length(event.total as u64);
        pb.set_position(event.current as u64);
        pb.set_message(event.message.clone());
    }

    /// Prints the duplicate groups of a scan with size and modification time.
    pub fn duplicate_groups(directory: &Path, report: &ScanReport) {
        if report.groups.is_empty() {
            Self::success(&format!(
                "No duplicate files found among {} files",
                report.files_scanned
            ));
        }

        for (i, group) in report.groups.iter().enumerate() {
            Self::header(&format!("Group {} ({} files)", i + 1, group.len()));
            println!("  {}", group.key.dimmed());
            for (j, (name, path)) in group.files.iter().zip(group.paths(directory)).enumerate() {
                let entry = FileEntry::from_path(path);
                let details = match entry.details() {
                    Ok(d) => format!("{:>12}  {}", d.size, d.modified_display()),
                    Err(e) => format!("{:>12}  {}", "?", e),
                };
                let marker = if j == 0 { "keep".green() } else { "dup ".yellow() };
                println!("  {} {}  {}", marker, details, name);
            }
        }

        Self::failures("Files that could not be read", &report.failures);
    }

    /// Prints what an organize run would do.
    pub fn organize_plan(plan: &OrganizePlan) {
        if plan.total() == 0 {
            Self::plain("No files found to organize.");
            return;
        }

        Self::header(&format!("Organized Files ({})", plan.moves.len()));
        for planned in &plan.moves {
            println!(" - {}", planned.file);
            println!("   → Would move to {}", planned.destination.display());
        }

        Self::header(&format!("Other Files ({})", plan.unclassified.len()));
        for name in &plan.unclassified {
            println!(" - {}", name);
        }

        Self::summary_table(&plan.category_counts(), plan.moves.len());
    }

    /// Prints the outcome of an organize run.
    pub fn organize_report(report: &OrganizeReport) {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for moved in &report.moved {
            match counts.iter_mut().find(|(c, _)| *c == moved.category) {
                Some((_, n)) => *n += 1,
                None => counts.push((moved.category.clone(), 1)),
            }
        }
        Self::summary_table(&counts, report.moved.len());

        if !report.unclassified.is_empty() {
            Self::header(&format!("Unclassified ({})", report.unclassified.len()));
            for name in &report.unclassified {
                println!(" - {}", name);
            }
        }
        Self::failures("Files that could not be moved", &report.failures);
    }

    /// Prints the outcome of a deletion batch.
    pub fn delete_report(report: &DeleteReport) {
        if report.all_succeeded() {
            Self::success(&report.summary());
        } else {
            Self::warning(&report.summary());
            Self::failures("Files that could not be deleted", &report.failures);
        }
    }

    /// Prints a rule table, one category per line.
    pub fn rule_table(table: &CategoryRuleTable) {
        Self::header("CATEGORIES");
        for rule in table {
            println!("{:<12} {}", rule.name().bold(), rule.extensions().join(", "));
        }
    }

    /// Prints a list of per-file failures, if any.
    pub fn failures(title: &str, failures: &[FileFailure]) {
        if failures.is_empty() {
            return;
        }
        Self::header(&format!("{} ({})", title, failures.len()));
        for failure in failures {
            Self::error(&failure.to_string());
        }
    }

    /// Prints a summary table with file counts by category.
    pub fn summary_table(category_counts: &[(String, usize)], total_files: usize) {
        Self::header("SUMMARY");

        let max_category_len = category_counts
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = max_category_len
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
