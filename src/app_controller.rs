use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};

use crate::app_config::Config;
use crate::errors::{AppError, ConfigError, FileError};
use crate::file_utils::{FileManager, FileStore};
use crate::pipeline::{self, PipelineStats, TransformConfig};
use crate::summary::RunSummary;
use crate::textgrid;

// @module: Application controller for folder cleaning runs

/// What happened to a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    // @status: Labels changed; written back unless dry run
    Modified,
    // @status: Nothing to change; file untouched
    Unchanged,
}

/// Result of processing one file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub status: FileStatus,
    pub stats: PipelineStats,
    // @field: Backup written for this file, if any
    pub backup: Option<PathBuf>,
}

/// Write behaviour shared by every file of a run
#[derive(Debug, Clone, Copy)]
struct WriteOptions {
    backup: bool,
    dry_run: bool,
}

/// Main application controller for TextGrid cleaning
pub struct Controller {
    // @field: Run configuration
    config: Config,

    // @field: Transforms built from the configuration, shared with workers
    transforms: Arc<TransformConfig>,

    // @field: Where files are read, backed up and written
    store: Arc<dyn FileStore>,

    // @field: Draw a progress bar during folder runs
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    //
    // Validates the configuration and loads the word lists, so every
    // configuration problem surfaces here, before any file is opened.
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let transforms = config.transform_config()?;
        if let Some(words) = transforms.word_list() {
            info!("Loaded {} word substitutions", words.len());
        }

        Ok(Self {
            config,
            transforms: Arc::new(transforms),
            store: Arc::new(FileManager),
            show_progress: true,
        })
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Replace the on-disk file store
    pub fn with_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = store;
        self
    }

    /// Run configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn write_options(&self) -> WriteOptions {
        WriteOptions {
            backup: self.config.backup,
            dry_run: self.config.dry_run,
        }
    }

    /// List the files a run on `root` would process, in processing order
    pub fn discover<P: AsRef<Path>>(&self, root: P) -> Result<Vec<PathBuf>, AppError> {
        let root = root.as_ref();
        if !FileManager::dir_exists(root) {
            return Err(ConfigError::InvalidRoot(root.to_path_buf()).into());
        }
        Ok(FileManager::find_files(
            root,
            &self.config.extension,
            self.config.recursive,
        ))
    }

    /// Clean a single file
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<FileOutcome, FileError> {
        clean_file(path.as_ref(), &self.transforms, self.store.as_ref(), self.write_options())
    }

    /// Clean every matching file under `root`
    ///
    /// Per-file failures are recorded in the summary and never stop the run.
    /// With `jobs > 1`, files are processed on blocking worker threads; the
    /// summary still lists them in discovery order.
    pub async fn run_folder<P: AsRef<Path>>(&self, root: P) -> Result<RunSummary, AppError> {
        let start_time = Instant::now();
        let root = root.as_ref();
        let files = self.discover(root)?;

        let mut summary = RunSummary::new(root, self.config.dry_run);
        if files.is_empty() {
            warn!("No .{} files found in {}", self.config.extension, root.display());
            summary.finish(start_time.elapsed());
            return Ok(summary);
        }
        info!("Found {} files to process in {}", files.len(), root.display());

        let progress = self.progress_bar(files.len() as u64);
        let jobs = self.config.jobs.max(1);
        let options = self.write_options();

        let mut results = stream::iter(files.into_iter().enumerate())
            .map(|(index, path)| {
                let transforms = Arc::clone(&self.transforms);
                let store = Arc::clone(&self.store);
                let progress = progress.clone();
                async move {
                    let worker_path = path.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        clean_file(&worker_path, &transforms, store.as_ref(), options)
                    })
                    .await
                    .unwrap_or_else(|join_error| {
                        Err(FileError::Unexpected {
                            path: path.clone(),
                            message: join_error.to_string(),
                        })
                    });

                    if let Some(name) = path.file_name() {
                        progress.set_message(name.to_string_lossy().to_string());
                    }
                    progress.inc(1);
                    (index, path, result)
                }
            })
            .buffer_unordered(jobs)
            .collect::<Vec<_>>()
            .await;

        progress.finish_and_clear();

        // Restore discovery order
        results.sort_by_key(|(index, _, _)| *index);
        for (_, path, result) in results {
            match &result {
                Ok(outcome) if outcome.status == FileStatus::Modified => {
                    info!("{}: {} labels changed", path.display(), outcome.stats.labels_changed);
                }
                Ok(_) => debug!("{}: unchanged", path.display()),
                Err(e) => error!("{}", e),
            }
            summary.record(path, result);
        }

        summary.finish(start_time.elapsed());
        Ok(summary)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=> "));
        progress_bar
    }
}

/// Read, clean and write back one file
///
/// Nothing is written when no label changes or in a dry run. Otherwise the
/// backup is created first and the write is skipped if that fails.
fn clean_file(
    path: &Path,
    transforms: &TransformConfig,
    store: &dyn FileStore,
    options: WriteOptions,
) -> Result<FileOutcome, FileError> {
    let raw = store.read(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut document = textgrid::parse(&raw).map_err(|source| FileError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    let stats = pipeline::run_with_stats(&mut document, transforms);
    if !stats.mutated() {
        return Ok(FileOutcome {
            status: FileStatus::Unchanged,
            stats,
            backup: None,
        });
    }

    if options.dry_run {
        debug!("Dry run, not writing {}", path.display());
        return Ok(FileOutcome {
            status: FileStatus::Modified,
            stats,
            backup: None,
        });
    }

    let backup = if options.backup {
        store.backup(path, &raw).map_err(|source| FileError::Backup {
            backup: FileManager::backup_path(path),
            source,
        })?
    } else {
        None
    };

    let content = textgrid::serialize(&document);
    store.write(path, &content).map_err(|source| FileError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(FileOutcome {
        status: FileStatus::Modified,
        stats,
        backup,
    })
}
