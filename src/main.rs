// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};

use tgclean::app_config::{Config, LogLevel};
use tgclean::app_controller::Controller;
use tgclean::errors::AppError;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for tgclean
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// tgclean - TextGrid label cleaner
///
/// Normalizes the interval labels of Praat TextGrid files in place.
#[derive(Parser, Debug)]
#[command(name = "tgclean")]
#[command(version)]
#[command(about = "Normalize the labels of Praat TextGrid annotation files")]
#[command(long_about = "tgclean lowercases and normalizes the interval labels of every TextGrid file in a folder.

EXAMPLES:
    tgclean corpus/                                   # Lowercase and collapse whitespace
    tgclean -r --replace-hyphens corpus/              # Recurse, split hyphenated words
    tgclean --remove-parentheses corpus/              # Drop parenthesized asides
    tgclean --wrong-words wrong.txt --correct-words correct.txt corpus/
    tgclean --dry-run --report report.json corpus/    # Preview changes only
    tgclean -j 8 -r corpus/                           # Process 8 files at a time
    tgclean completions bash > tgclean.bash           # Generate bash completions

BACKUPS:
    Before a file is rewritten, its original content is saved next to it as
    <file>.bak. An existing backup is never overwritten. Use --no-backup to
    skip backups.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Folder containing the TextGrid files
    #[arg(value_name = "ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Replace hyphens and underscores with spaces
    #[arg(long)]
    replace_hyphens: bool,

    /// Remove parenthesized content, parentheses included
    #[arg(long)]
    remove_parentheses: bool,

    /// Put a space before a period ending a label
    #[arg(long)]
    space_final_dot: bool,

    /// File of misspelled words, one per line
    #[arg(long, value_name = "FILE")]
    wrong_words: Option<PathBuf>,

    /// File of replacements, paired by line with --wrong-words
    #[arg(long, value_name = "FILE")]
    correct_words: Option<PathBuf>,

    /// Only rewrite tiers with this name (repeatable)
    #[arg(long = "tier", value_name = "NAME")]
    tiers: Vec<String>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Do not create .bak backups
    #[arg(long)]
    no_backup: bool,

    /// Show what would change without writing
    #[arg(long)]
    dry_run: bool,

    /// Extension of the files to process
    #[arg(long, value_name = "EXT")]
    extension: Option<String>,

    /// Number of files to process concurrently
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Write a JSON report of the run
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Exit with status 2 if any file failed
    #[arg(long)]
    strict: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// JSON configuration file; command-line options take precedence
    #[arg(short, long, value_name = "FILE", env = "TGCLEAN_CONFIG")]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

impl CommandLineOptions {
    /// Layer the command-line options over a base configuration
    fn apply_to(&self, config: &mut Config) {
        config.transforms.replace_hyphens |= self.replace_hyphens;
        config.transforms.remove_parentheses |= self.remove_parentheses;
        config.transforms.space_final_dot |= self.space_final_dot;
        config.recursive |= self.recursive;
        config.dry_run |= self.dry_run;
        if self.no_backup {
            config.backup = false;
        }
        if self.wrong_words.is_some() || self.correct_words.is_some() {
            config.wrong_words = self.wrong_words.clone();
            config.correct_words = self.correct_words.clone();
        }
        if !self.tiers.is_empty() {
            config.tiers = self.tiers.clone();
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.clone();
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level.into();
        }
    }
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "tgclean", &mut std::io::stdout());
        return Ok(());
    }

    let code = run_clean(cli).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Run a cleaning pass and return the process exit code
async fn run_clean(cli: CommandLineOptions) -> Result<i32> {
    let root = cli
        .root_folder
        .clone()
        .ok_or_else(|| anyhow!("ROOT_FOLDER is required when no subcommand is specified"))?;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    cli.apply_to(&mut config);
    log::set_max_level(config.log_level.to_level_filter());

    let controller = match Controller::with_config(config) {
        Ok(controller) => controller.with_progress(!cli.no_progress),
        Err(e) => {
            error!("{}", e);
            return Ok(1);
        }
    };

    let summary = match controller.run_folder(&root).await {
        Ok(summary) => summary,
        Err(e @ AppError::Config(_)) => {
            error!("{}", e);
            return Ok(1);
        }
        Err(e) => return Err(e).context("Cleaning run failed"),
    };

    print!("{}", summary);

    if let Some(report) = &cli.report {
        summary.write_json(report)?;
        info!("Report written to {}", report.display());
    }

    if cli.strict && summary.has_failures() {
        return Ok(2);
    }
    Ok(0)
}
