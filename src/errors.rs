/*!
 * Error types for the tgclean application.
 *
 * This module contains custom error types for the different stages of a
 * cleaning run, using the thiserror crate for ergonomic error definitions.
 * Configuration errors are fatal and stop the run before any file is touched;
 * format and file errors are recovered at file granularity.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors in the user-supplied configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Only one of the two word-list files was given
    #[error("--wrong-words and --correct-words must be provided together")]
    UnpairedWordLists,

    /// The two word lists do not have the same number of entries
    #[error("word lists differ in length: {wrong} wrong words vs {correct} correct words")]
    WordListLengthMismatch {
        /// Entries in the wrong-words file
        wrong: usize,
        /// Entries in the correct-words file
        correct: usize,
    },

    /// A word-list file could not be read
    #[error("cannot read word list {path}: {source}")]
    WordListUnreadable {
        /// Path of the word list
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A replacement word is itself listed as a word to replace
    #[error("'{wrong}' is replaced by '{correct}', which is itself listed as a wrong word")]
    ChainedSubstitution {
        /// Wrong word of the offending pair
        wrong: String,
        /// Correct word of the offending pair
        correct: String,
    },

    /// Root folder is missing or not a directory
    #[error("{0} is not a valid directory")]
    InvalidRoot(PathBuf),

    /// Any other invalid option value
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// The JSON configuration file could not be loaded
    #[error("cannot load config file {path}: {message}")]
    ConfigFile {
        /// Path of the config file
        path: PathBuf,
        /// Parse or read failure
        message: String,
    },
}

/// Errors raised while parsing a TextGrid
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The content is not valid UTF-8
    #[error("file is not valid UTF-8")]
    InvalidUtf8,

    /// The content looks like UTF-16, which is not supported
    #[error("UTF-16 encoded TextGrids are not supported, convert to UTF-8 first")]
    Utf16,

    /// The file header does not announce a TextGrid in long text format
    #[error("line {line}: malformed header: {message}")]
    Header {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// A field was missing, unexpected or unreadable
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// A quoted string was never closed
    #[error("line {line}: unterminated string")]
    UnterminatedString {
        /// Line where the string starts
        line: usize,
    },

    /// Intervals are inverted, overlapping or outside their tier
    #[error("line {line}: tier '{tier}': {message}")]
    Timing {
        /// 1-based line number of the offending interval
        line: usize,
        /// Tier name
        tier: String,
        /// What was wrong
        message: String,
    },

    /// The file ended before all announced tiers or intervals were read
    #[error("unexpected end of file: {0}")]
    UnexpectedEof(String),
}

/// Errors that can occur while processing one file
#[derive(Error, Debug)]
pub enum FileError {
    /// The file could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid TextGrid
    #[error("cannot parse {path}: {source}")]
    Format {
        /// File path
        path: PathBuf,
        /// Parse failure
        #[source]
        source: FormatError,
    },

    /// The backup copy could not be created; the original is untouched
    #[error("cannot create backup {backup}: {source}")]
    Backup {
        /// Backup path
        backup: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The cleaned file could not be written
    #[error("cannot write {path}: {source}")]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The worker processing the file stopped unexpectedly
    #[error("processing {path} failed unexpectedly: {message}")]
    Unexpected {
        /// File path
        path: PathBuf,
        /// Panic or join failure description
        message: String,
    },
}

impl FileError {
    /// Short label for the error kind, used in the run summary
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read { .. } | Self::Backup { .. } | Self::Write { .. } => "io",
            Self::Format { .. } => "format",
            Self::Unexpected { .. } => "unexpected",
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Fatal configuration problem
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-file processing failure
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}
