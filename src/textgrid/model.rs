/*!
 * In-memory representation of a TextGrid.
 */

use std::fmt;
use std::ops::Range;

// @const: Tolerance for comparing interval boundaries
pub(crate) const TIME_EPSILON: f64 = 1e-9;

/// Kind of tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierClass {
    // @class: Consecutive labeled intervals
    IntervalTier,
    // @class: Labeled points in time
    TextTier,
}

impl TierClass {
    /// Name written in the `class` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntervalTier => "IntervalTier",
            Self::TextTier => "TextTier",
        }
    }
}

impl fmt::Display for TierClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TierClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IntervalTier" => Ok(Self::IntervalTier),
            "TextTier" => Ok(Self::TextTier),
            other => Err(format!("unknown tier class '{}'", other)),
        }
    }
}

/// Where a parsed label came from, used to splice edits back into the source
#[derive(Debug, Clone)]
pub(crate) struct LabelOrigin {
    // @field: Byte span of the quoted literal in the source
    pub(crate) span: Range<usize>,
    // @field: Label text as parsed
    pub(crate) text: String,
    // @field: Bounds as parsed
    pub(crate) xmin: f64,
    pub(crate) xmax: f64,
}

/// Single timed annotation unit
#[derive(Debug, Clone)]
pub struct Interval {
    // @field: Start time in seconds
    pub xmin: f64,

    // @field: End time in seconds
    pub xmax: f64,

    // @field: Label text, possibly empty
    pub text: String,

    pub(crate) origin: Option<LabelOrigin>,
}

impl Interval {
    /// Creates a new interval
    pub fn new(xmin: f64, xmax: f64, text: impl Into<String>) -> Self {
        Self {
            xmin,
            xmax,
            text: text.into(),
            origin: None,
        }
    }

    /// Whether the label differs from the text it was parsed with
    ///
    /// Intervals built in memory always count as changed.
    pub fn is_modified(&self) -> bool {
        self.origin.as_ref().is_none_or(|origin| origin.text != self.text)
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.xmin == other.xmin && self.xmax == other.xmax && self.text == other.text
    }
}

/// Labeled point of a `TextTier`
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    // @field: Time in seconds
    pub time: f64,

    // @field: Mark text
    pub mark: String,
}

impl Point {
    /// Creates a new point
    pub fn new(time: f64, mark: impl Into<String>) -> Self {
        Self { time, mark: mark.into() }
    }
}

/// Named annotation channel
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    // @field: Tier name, e.g. "words" or "phones"
    pub name: String,

    // @field: Interval or point tier
    pub class: TierClass,

    // @field: Tier bounds in seconds
    pub xmin: f64,
    pub xmax: f64,

    // @field: Intervals in temporal order (interval tiers only)
    pub intervals: Vec<Interval>,

    // @field: Points in temporal order (text tiers only)
    pub points: Vec<Point>,
}

impl Tier {
    /// Creates an empty interval tier
    pub fn interval_tier(name: impl Into<String>, xmin: f64, xmax: f64) -> Self {
        Self {
            name: name.into(),
            class: TierClass::IntervalTier,
            xmin,
            xmax,
            intervals: Vec::new(),
            points: Vec::new(),
        }
    }

    /// Creates an empty point tier
    pub fn text_tier(name: impl Into<String>, xmin: f64, xmax: f64) -> Self {
        Self {
            name: name.into(),
            class: TierClass::TextTier,
            xmin,
            xmax,
            intervals: Vec::new(),
            points: Vec::new(),
        }
    }

    /// Appends an interval to an interval tier
    pub fn with_interval(mut self, xmin: f64, xmax: f64, text: impl Into<String>) -> Self {
        self.intervals.push(Interval::new(xmin, xmax, text));
        self
    }

    /// Appends a point to a text tier
    pub fn with_point(mut self, time: f64, mark: impl Into<String>) -> Self {
        self.points.push(Point::new(time, mark));
        self
    }

    /// Number of items, whichever kind the tier holds
    pub fn len(&self) -> usize {
        match self.class {
            TierClass::IntervalTier => self.intervals.len(),
            TierClass::TextTier => self.points.len(),
        }
    }

    /// Whether the tier holds no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything about a parsed tier except its interval labels
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TierShape {
    pub(crate) name: String,
    pub(crate) class: TierClass,
    pub(crate) xmin: f64,
    pub(crate) xmax: f64,
    pub(crate) interval_count: usize,
    pub(crate) points: Vec<Point>,
}

impl TierShape {
    pub(crate) fn of(tier: &Tier) -> Self {
        Self {
            name: tier.name.clone(),
            class: tier.class,
            xmin: tier.xmin,
            xmax: tier.xmax,
            interval_count: tier.intervals.len(),
            points: tier.points.clone(),
        }
    }
}

/// The original bytes of a parsed document
#[derive(Debug, Clone)]
pub(crate) struct SourceText {
    pub(crate) text: String,
    // @field: Document bounds at parse time
    pub(crate) xmin: f64,
    pub(crate) xmax: f64,
    // @field: Tier structure at parse time
    pub(crate) tiers: Vec<TierShape>,
}

/// Parsed annotation document
#[derive(Debug, Clone)]
pub struct TextGrid {
    // @field: Global start time in seconds
    pub xmin: f64,

    // @field: Global end time in seconds
    pub xmax: f64,

    // @field: Tiers in file order
    pub tiers: Vec<Tier>,

    pub(crate) source: Option<SourceText>,
}

impl TextGrid {
    /// Creates an empty document
    pub fn new(xmin: f64, xmax: f64) -> Self {
        Self {
            xmin,
            xmax,
            tiers: Vec::new(),
            source: None,
        }
    }

    /// Appends a tier
    pub fn add_tier(&mut self, tier: Tier) {
        self.tiers.push(tier);
    }

    /// Finds a tier by name
    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.name == name)
    }

    /// Whether the document was parsed from a file
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Number of interval labels that differ from the parsed source
    pub fn modified_label_count(&self) -> usize {
        self.tiers
            .iter()
            .flat_map(|tier| tier.intervals.iter())
            .filter(|interval| interval.is_modified())
            .count()
    }
}

impl PartialEq for TextGrid {
    fn eq(&self, other: &Self) -> bool {
        self.xmin == other.xmin && self.xmax == other.xmax && self.tiers == other.tiers
    }
}

impl fmt::Display for TextGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::writer::serialize(self))
    }
}
