//! reorg - filesystem maintenance utilities.
//!
//! Usage:
//!   reorg dupes <ROOT>             Find and remove name/size duplicates
//!   reorg rename <ROOT>            Normalize file and folder names
//!   reorg retention run            Clean tracked directories that are due
//!   reorg retention track <DIR>    Start tracking a directory
//!   reorg --help                   Show help

mod logging;

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};

use reorg_analyze::{
    DuplicateConfig, DuplicateFinder, DuplicateReport, NormalizeConfig, format_age, schedule,
};
use reorg_core::{
    AutoApprove, AutoDecline, ConfirmationProvider, InteractivePrompt, ReorgConfig,
    RepositoryOpener, RetentionRecord,
};
use reorg_ops::{
    CleanConfig, DirectoryOutcome, DuplicateResolver, NameNormalizer, RetentionCleaner,
    RetentionReport, VcsOutcome, prune_empty_dirs,
};
use reorg_scan::{TreeWalker, WalkConfig, WalkTree};

#[derive(Parser)]
#[command(
    name = "reorg",
    version,
    about = "Filesystem maintenance: retention cleanup, duplicate removal, name normalization"
)]
struct Cli {
    /// Config file (defaults to <config dir>/reorg/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find files sharing a name and size, and delete the extra copies
    Dupes {
        /// Directory to search
        root: PathBuf,

        /// Delete every extra copy without asking
        #[arg(short, long, conflicts_with = "no")]
        yes: bool,

        /// Answer no to every prompt
        #[arg(short, long)]
        no: bool,

        /// Only print the duplicate groups
        #[arg(long)]
        report: bool,

        /// Report format
        #[arg(short, long, default_value = "text", requires = "report")]
        format: OutputFormat,

        /// Only group files with identical content
        #[arg(long)]
        verify_content: bool,

        /// Minimum file size to consider (e.g., "1KB", "1MB")
        #[arg(long)]
        min_size: Option<String>,

        /// Do not remove folders left empty
        #[arg(long)]
        keep_empty_dirs: bool,
    },

    /// Rename files and folders to lowercase_underscore names
    Rename {
        /// Directory to normalize
        root: PathBuf,

        /// Apply every rename without asking
        #[arg(long)]
        no_prompt: bool,

        /// Show what would be renamed
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage and run retention cleanup
    Retention {
        #[command(subcommand)]
        action: RetentionCommand,
    },
}

#[derive(Subcommand)]
enum RetentionCommand {
    /// Clean every tracked directory whose retention period has passed
    Run {
        /// Show what would be deleted
        #[arg(long)]
        dry_run: bool,
    },

    /// Track a directory (replaces an existing entry)
    Track {
        /// Directory to clean periodically; may start with ~
        directory: String,

        /// Days between cleanups
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..))]
        max_age_days: i64,
    },

    /// Stop tracking a directory
    Untrack {
        /// Directory as it was tracked
        directory: String,
    },

    /// List tracked directories
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let config = ReorgConfig::load(cli.config.as_deref()).wrap_err("Cannot load configuration")?;

    match cli.command {
        Command::Dupes {
            root,
            yes,
            no,
            report,
            format,
            verify_content,
            min_size,
            keep_empty_dirs,
        } => {
            let mut dup_config = DuplicateConfig::from(&config.duplicates);
            dup_config.verify_content |= verify_content;
            if let Some(min_size) = min_size {
                dup_config.min_size = parse_size(&min_size)?;
            }
            let keep_empty_dirs = keep_empty_dirs || config.duplicates.keep_empty_dirs;

            let tree = walk(&root)?;
            let dupes = DuplicateFinder::with_config(dup_config).find_duplicates(&tree);

            if report {
                print_duplicates(&dupes, format)?;
            } else {
                let mut confirm: Box<dyn ConfirmationProvider> = if yes {
                    Box::new(AutoApprove)
                } else if no {
                    Box::new(AutoDecline)
                } else {
                    Box::new(InteractivePrompt::stdio())
                };
                run_dupes(&tree, &dupes, confirm.as_mut(), keep_empty_dirs);
            }
        }
        Command::Rename {
            root,
            no_prompt,
            dry_run,
        } => {
            let mut rename_config = NormalizeConfig::from(&config.normalize);
            rename_config.prompt = !no_prompt;
            rename_config.dry_run = dry_run;
            run_rename(&root, rename_config)?;
        }
        Command::Retention { action } => run_retention(&config, action)?,
    }

    Ok(())
}

/// Walk a root directory, reporting unreadable entries.
fn walk(root: &Path) -> Result<WalkTree> {
    let tree = TreeWalker::new()
        .walk(&WalkConfig::new(root))
        .wrap_err_with(|| format!("Cannot walk {}", root.display()))?;

    for warning in &tree.warnings {
        tracing::debug!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
    }
    tracing::info!(
        files = tree.stats.total_files,
        dirs = tree.stats.total_dirs,
        "Walked {} in {:.2}s",
        tree.root.display(),
        tree.duration.as_secs_f64()
    );
    Ok(tree)
}

/// Print duplicate groups without touching anything.
fn print_duplicates(report: &DuplicateReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Duplicate File Report");
            println!("{}", "─".repeat(70));
            println!();

            if report.groups.is_empty() {
                println!(" No duplicate files found.");
            } else {
                println!(
                    " Found {} duplicate groups ({} files)",
                    report.group_count, report.files_with_duplicates
                );
                println!(
                    " Total reclaimable space: {}",
                    format_size(report.total_wasted_space)
                );
                println!();

                for group in &report.groups {
                    println!("{}", reorg_ops::format_group(group));
                    println!();
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }

    Ok(())
}

/// Resolve duplicates interactively, then prune empty folders.
fn run_dupes(
    tree: &WalkTree,
    report: &DuplicateReport,
    confirm: &mut dyn ConfirmationProvider,
    keep_empty_dirs: bool,
) {
    if !report.has_duplicates() {
        println!("No duplicate files found.");
    }

    let summary = DuplicateResolver::new().resolve(report, confirm);
    println!(
        "Summary: {} deleted, {} errors ({} freed)",
        summary.deleted.len(),
        summary.errors.len(),
        format_size(summary.bytes_freed)
    );
    print_errors(summary.errors.iter());

    if keep_empty_dirs {
        return;
    }

    let pruned = prune_empty_dirs(tree);
    println!("Removed {} empty folders", pruned.removed.len());
    print_errors(pruned.errors.iter());
}

/// Normalize names under a root.
fn run_rename(root: &Path, config: NormalizeConfig) -> Result<()> {
    let dry_run = config.dry_run;
    let tree = walk(root)?;
    let mut confirm = InteractivePrompt::stdio();

    let summary = NameNormalizer::new(config).run(&tree, &mut confirm);

    if dry_run {
        for rename in &summary.planned {
            println!("{} -> {}", rename.from.display(), rename.to.display());
        }
        println!("Summary: {} would be renamed", summary.planned.len());
    } else {
        println!(
            "Summary: {} renamed, {} declined, {} errors",
            summary.renamed.len(),
            summary.declined,
            summary.errors.len()
        );
        print_errors(summary.errors.iter());
    }

    Ok(())
}

fn run_retention(config: &ReorgConfig, action: RetentionCommand) -> Result<()> {
    let mut store = reorg_store::open_store(&config.retention)
        .wrap_err_with(|| format!("Cannot open {} record store", config.retention.backend))?;
    let now = current_time();

    match action {
        RetentionCommand::Run { dry_run } => {
            let mut clean_config = CleanConfig::from(&config.retention);
            clean_config.dry_run = dry_run;

            let opener = repository_opener();
            let report = RetentionCleaner::new(clean_config)
                .run(store.as_mut(), opener.as_ref(), now)
                .wrap_err("Retention run failed")?;
            print_retention(&report);
        }
        RetentionCommand::Track {
            directory,
            max_age_days,
        } => {
            store.track(&RetentionRecord::new(&directory, max_age_days, now))?;
            println!("Tracking {directory} (every {max_age_days} days)");
        }
        RetentionCommand::Untrack { directory } => {
            if !store.untrack(&directory)? {
                bail!("{directory} is not tracked");
            }
            println!("Stopped tracking {directory}");
        }
        RetentionCommand::List { format } => {
            let schedule = schedule(store.load_records()?, now);
            match format {
                OutputFormat::Text => {
                    if schedule.is_empty() {
                        println!("No tracked directories.");
                    }
                    for item in schedule.iter() {
                        println!(
                            "{:<5} {:<40} every {:>3} days, last cleaned {} ({} ago)",
                            if item.due { "due" } else { "ok" },
                            item.record.directory,
                            item.record.max_age_days,
                            item.record.last_operation.format("%Y-%m-%d %H:%M:%S"),
                            format_age(item.elapsed())
                        );
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&schedule)?);
                }
            }
        }
    }

    Ok(())
}

fn print_retention(report: &RetentionReport) {
    for entry in &report.directories {
        let directory = &entry.record.directory;
        match &entry.outcome {
            DirectoryOutcome::NotDue => tracing::debug!("Skipping {directory}: not due"),
            DirectoryOutcome::Missing => println!("{directory}: missing, skipped"),
            DirectoryOutcome::NotADirectory => println!("{directory}: not a directory, skipped"),
            DirectoryOutcome::Unreadable { message } => {
                println!("{directory}: unreadable, skipped ({message})")
            }
            DirectoryOutcome::Cleaned { outcome, vcs, .. } => {
                println!("\nProcessing: {directory}");
                let verb = if report.dry_run { "Would delete" } else { "Deleted" };
                for path in &outcome.removed {
                    println!("  {verb}: {}", file_name(path));
                }
                print_errors(outcome.errors.iter());
                println!(
                    "Summary: {} deleted, {} errors",
                    outcome.removed.len(),
                    outcome.errors.len()
                );
                match vcs {
                    VcsOutcome::Committed { pushed: true } => println!("  Committed and pushed"),
                    VcsOutcome::Committed { pushed: false } => println!("  Committed"),
                    VcsOutcome::Failed { message } => println!("  Git failed: {message}"),
                    VcsOutcome::Clean | VcsOutcome::Unversioned => {}
                }
            }
        }
    }

    println!(
        "\n{} of {} tracked directories cleaned",
        report.cleaned_count(),
        report.directories.len()
    );
}

#[cfg(feature = "git")]
fn repository_opener() -> Box<dyn RepositoryOpener> {
    Box::new(reorg_ops::GitOpener)
}

#[cfg(not(feature = "git"))]
fn repository_opener() -> Box<dyn RepositoryOpener> {
    Box::new(reorg_core::NoRepositories)
}

/// Local wall-clock time truncated to whole seconds.
fn current_time() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn print_errors<'a>(errors: impl Iterator<Item = &'a reorg_ops::OperationError>) {
    for error in errors {
        eprintln!("  ✗ {error}");
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let number = |s: &str| -> Result<f64> {
        s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()
            .wrap_err_with(|| format!("Invalid size: {s}"))
    };

    let (num, multiplier) = if s.ends_with("GB") || s.ends_with('G') {
        (number(&s)?, 1024 * 1024 * 1024)
    } else if s.ends_with("MB") || s.ends_with('M') {
        (number(&s)?, 1024 * 1024)
    } else if s.ends_with("KB") || s.ends_with('K') {
        (number(&s)?, 1024)
    } else {
        (number(&s)?, 1)
    };

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("10B").unwrap(), 10);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1.5k").unwrap(), 1536);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_rename_requires_root() {
        assert!(Cli::try_parse_from(["reorg", "rename"]).is_err());
        assert!(Cli::try_parse_from(["reorg", "rename", "/docs", "--no-prompt"]).is_ok());
    }

    #[test]
    fn test_yes_and_no_conflict() {
        assert!(Cli::try_parse_from(["reorg", "dupes", "/data", "--yes", "--no"]).is_err());
    }

    #[test]
    fn test_dupes_format_needs_report() {
        assert!(Cli::try_parse_from(["reorg", "dupes", "/data", "--format", "json"]).is_err());
        assert!(
            Cli::try_parse_from(["reorg", "dupes", "/data", "--report", "--format", "json"])
                .is_ok()
        );
        assert!(Cli::try_parse_from(["reorg", "dupes", "/data", "--yes"]).is_ok());
    }

    #[test]
    fn test_track_rejects_negative_days() {
        let result = Cli::try_parse_from([
            "reorg",
            "retention",
            "track",
            "/tmp/x",
            "--max-age-days",
            "-1",
        ]);
        assert!(result.is_err());
    }
}
