/*!
 * Label normalization pipeline.
 *
 * `TransformConfig` holds the enabled transforms for one run and applies
 * them to a label in a fixed order. `run` applies it to every interval
 * label of the targeted tiers of a document.
 */

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::textgrid::{TextGrid, TierClass};
use crate::transforms::{self, WordSubstitutionList};

/// Optional transforms, as selected on the command line or in the config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Replace hyphens and underscores with spaces
    pub replace_hyphens: bool,

    /// Remove parenthesized content
    pub remove_parentheses: bool,

    /// Detach a period glued to the last word
    pub space_final_dot: bool,
}

/// Immutable transform setup for one run
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    options: TransformOptions,
    word_list: Option<WordSubstitutionList>,
    target_tiers: Option<BTreeSet<String>>,
}

impl TransformConfig {
    /// Build the configuration
    ///
    /// Replacement words are normalized through the stages that run before
    /// substitution, so a cleaned label is left unchanged by a second run.
    /// With hyphen replacement on, a wrong word holding `-` or `_` could
    /// never match and is rejected.
    /// An empty `target_tiers` selects every tier.
    pub fn new(
        options: TransformOptions,
        word_list: Option<WordSubstitutionList>,
        target_tiers: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self {
            options,
            word_list: None,
            target_tiers: if target_tiers.is_empty() {
                None
            } else {
                Some(target_tiers.into_iter().collect())
            },
        };

        if let Some(mut list) = word_list {
            if options.replace_hyphens {
                if let Some((wrong, _)) = list.pairs().find(|(wrong, _)| wrong.contains(['-', '_'])) {
                    return Err(ConfigError::InvalidOption(format!(
                        "wrong word '{}' contains '-' or '_', which hyphen replacement turns into spaces before substitution",
                        wrong
                    )));
                }
            }
            list.normalize_replacements(|word| {
                let mut normalized = config.pre_substitution(word);
                if options.remove_parentheses {
                    normalized.retain(|ch| ch != '(' && ch != ')');
                }
                transforms::collapse_whitespace(&normalized)
            })?;
            config.word_list = Some(list);
        }

        Ok(config)
    }

    /// Enabled optional transforms
    pub fn options(&self) -> TransformOptions {
        self.options
    }

    /// Substitution list, if one was loaded
    pub fn word_list(&self) -> Option<&WordSubstitutionList> {
        self.word_list.as_ref()
    }

    /// Whether the pipeline rewrites labels of the named tier
    pub fn targets(&self, tier_name: &str) -> bool {
        self.target_tiers
            .as_ref()
            .is_none_or(|names| names.contains(tier_name))
    }

    /// Stages 1 to 4: lowercase, hyphens, parentheses, final period
    fn pre_substitution(&self, label: &str) -> String {
        let mut text = transforms::lowercase(label);
        if self.options.replace_hyphens {
            text = transforms::replace_hyphens(&text);
        }
        if self.options.remove_parentheses {
            text = transforms::remove_parentheses(&text);
        }
        if self.options.space_final_dot {
            text = transforms::space_final_dot(&text);
        }
        text
    }

    /// Apply every enabled transform to one label
    pub fn apply(&self, label: &str) -> String {
        self.apply_counting(label, |_| {})
    }

    /// Same as `apply`, calling `on_substitution` for each replaced word
    pub fn apply_counting<F>(&self, label: &str, on_substitution: F) -> String
    where
        F: FnMut(&str),
    {
        let mut text = self.pre_substitution(label);
        if let Some(list) = &self.word_list {
            text = list.apply_counting(&text, on_substitution);
        }
        transforms::collapse_whitespace(&text)
    }
}

/// What a pipeline run did to one document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    /// Interval labels the pipeline looked at
    pub labels_examined: usize,

    /// Interval labels whose text changed
    pub labels_changed: usize,

    /// Tiers left alone because of the tier filter or because they hold points
    pub tiers_skipped: usize,

    /// Replacement count per wrong word
    pub substitutions: BTreeMap<String, usize>,
}

impl PipelineStats {
    /// Whether any label changed
    pub fn mutated(&self) -> bool {
        self.labels_changed > 0
    }
}

/// Apply the transforms to the document, returning whether any label changed
pub fn run(document: &mut TextGrid, config: &TransformConfig) -> bool {
    run_with_stats(document, config).mutated()
}

/// Apply the transforms to the document and collect statistics
pub fn run_with_stats(document: &mut TextGrid, config: &TransformConfig) -> PipelineStats {
    let mut stats = PipelineStats::default();

    for tier in document.tiers.iter_mut() {
        if tier.class != TierClass::IntervalTier || !config.targets(&tier.name) {
            debug!("Skipping tier '{}'", tier.name);
            stats.tiers_skipped += 1;
            continue;
        }

        for interval in tier.intervals.iter_mut() {
            stats.labels_examined += 1;
            let mut hits: Vec<String> = Vec::new();
            let cleaned = config.apply_counting(&interval.text, |wrong| hits.push(wrong.to_string()));
            if cleaned != interval.text {
                trace!("'{}' -> '{}'", interval.text, cleaned);
                interval.text = cleaned;
                stats.labels_changed += 1;
                for wrong in hits {
                    *stats.substitutions.entry(wrong).or_insert(0) += 1;
                }
            }
        }
    }

    stats
}
