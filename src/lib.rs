/*!
 * # tgclean - TextGrid label cleaner
 *
 * A Rust library and command-line tool that normalizes the interval labels
 * of Praat TextGrid annotation files, in place, across a folder tree.
 *
 * ## Features
 *
 * - Lowercase every label and collapse whitespace
 * - Optional transforms:
 *   - hyphen and underscore replacement
 *   - removal of parenthesized asides
 *   - spacing of a final period
 *   - word substitution from paired word-list files
 * - Byte-preserving rewrite: only changed label literals differ on disk
 * - `.bak` backups and atomic writes
 * - Optional parallel processing with a stable, ordered run summary
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `transforms`: Pure label transforms and the word substitution list
 * - `textgrid`: TextGrid parsing, model and serialization
 * - `pipeline`: Fixed-order application of the transforms to a document
 * - `file_utils`: File discovery, backups and atomic writes
 * - `app_config`: Configuration management
 * - `app_controller`: Folder runs and per-file processing
 * - `summary`: Run accounting and JSON reports
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod pipeline;
pub mod summary;
pub mod textgrid;
pub mod transforms;

// Re-export main types for easier usage
pub use app_config::{Config, LogLevel};
pub use app_controller::{Controller, FileOutcome, FileStatus};
pub use errors::{AppError, ConfigError, FileError, FormatError};
pub use file_utils::{FileManager, FileStore};
pub use pipeline::{PipelineStats, TransformConfig, TransformOptions};
pub use summary::RunSummary;
pub use textgrid::{Interval, TextGrid, Tier, TierClass};
pub use transforms::WordSubstitutionList;
