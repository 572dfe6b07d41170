use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::pipeline::{TransformConfig, TransformOptions};
use crate::transforms::WordSubstitutionList;

/// Application configuration module
/// This module handles the run configuration: loading it from a JSON file,
/// validating it, and building the transform setup it describes.
/// Represents the run configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Optional label transforms
    #[serde(default)]
    pub transforms: TransformOptions,

    /// File listing misspelled words, one per line
    #[serde(default)]
    pub wrong_words: Option<PathBuf>,

    /// File listing replacements, paired by line with `wrong_words`
    #[serde(default)]
    pub correct_words: Option<PathBuf>,

    /// Tier names to rewrite; empty means every interval tier
    #[serde(default)]
    pub tiers: Vec<String>,

    /// Extension of the files to process, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,

    /// Keep a `.bak` copy of every modified file
    #[serde(default = "default_true")]
    pub backup: bool,

    /// Report what would change without writing anything
    #[serde(default)]
    pub dry_run: bool,

    /// Number of files processed concurrently
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching `log` filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_extension() -> String {
    "TextGrid".to_string()
}

fn default_true() -> bool {
    true
}

fn default_jobs() -> usize {
    1
}

impl Config {
    /// Load a configuration file
    ///
    /// Fields missing from the file take their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config_error = |message: String| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| config_error(e.to_string()))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| config_error(e.to_string()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wrong_words.is_some() != self.correct_words.is_some() {
            return Err(ConfigError::UnpairedWordLists);
        }

        if self.jobs == 0 {
            return Err(ConfigError::InvalidOption(
                "jobs must be at least 1".to_string(),
            ));
        }

        let extension = self.extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(ConfigError::InvalidOption(format!(
                "invalid file extension '{}'",
                self.extension
            )));
        }

        if let Some(name) = self.tiers.iter().find(|name| name.is_empty()) {
            return Err(ConfigError::InvalidOption(format!(
                "invalid tier name '{}'",
                name
            )));
        }

        Ok(())
    }

    /// Load the word lists, if configured
    pub fn load_word_list(&self) -> Result<Option<WordSubstitutionList>, ConfigError> {
        match (&self.wrong_words, &self.correct_words) {
            (Some(wrong), Some(correct)) => WordSubstitutionList::from_files(wrong, correct).map(Some),
            (None, None) => Ok(None),
            _ => Err(ConfigError::UnpairedWordLists),
        }
    }

    /// Validate and build the transform setup for a run
    ///
    /// Word lists are read here, so a broken list fails the run before any
    /// annotation file is opened.
    pub fn transform_config(&self) -> Result<TransformConfig, ConfigError> {
        self.validate()?;
        let word_list = self.load_word_list()?;
        TransformConfig::new(self.transforms, word_list, self.tiers.clone())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            transforms: TransformOptions::default(),
            wrong_words: None,
            correct_words: None,
            tiers: Vec::new(),
            extension: default_extension(),
            recursive: false,
            backup: default_true(),
            dry_run: false,
            jobs: default_jobs(),
            log_level: LogLevel::default(),
        }
    }
}
