/*!
 * Parser for the TextGrid long text format.
 */

use std::iter::Peekable;
use std::ops::Range;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::lexer::{Lexer, Line, Value};
use super::model::{
    Interval, LabelOrigin, Point, SourceText, TextGrid, Tier, TierClass, TierShape, TIME_EPSILON,
};
use crate::errors::FormatError;

// @const: Item header regex, e.g. `item [2]:` or `intervals [14]:`
static ITEM_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(item|intervals|points)\s*\[(\d*)\]\s*:$").unwrap()
});

/// Parse raw file bytes into a document
pub fn parse_bytes(raw: &[u8]) -> Result<TextGrid, FormatError> {
    if raw.starts_with(&[0xFF, 0xFE]) || raw.starts_with(&[0xFE, 0xFF]) {
        return Err(FormatError::Utf16);
    }
    let content = std::str::from_utf8(raw).map_err(|_| FormatError::InvalidUtf8)?;
    parse_str(content)
}

/// Parse file content into a document
pub fn parse_str(content: &str) -> Result<TextGrid, FormatError> {
    let mut parser = Parser {
        lines: Lexer::new(content).peekable(),
    };
    let mut grid = parser.document()?;
    grid.source = Some(SourceText {
        text: content.to_string(),
        xmin: grid.xmin,
        xmax: grid.xmax,
        tiers: grid.tiers.iter().map(TierShape::of).collect(),
    });
    debug!("Parsed TextGrid with {} tiers", grid.tiers.len());
    Ok(grid)
}

struct Parser<'a> {
    lines: Peekable<Lexer<'a>>,
}

impl<'a> Parser<'a> {
    fn next_line(&mut self, expected: &str) -> Result<Line<'a>, FormatError> {
        match self.lines.next() {
            Some(Ok(line)) => Ok(line),
            Some(Err(e)) => Err(e),
            None => Err(FormatError::UnexpectedEof(format!("expected {}", expected))),
        }
    }

    fn syntax(&self, line: usize, message: impl Into<String>) -> FormatError {
        FormatError::Syntax { line, message: message.into() }
    }

    fn field(&mut self, key: &str) -> Result<(Value<'a>, usize), FormatError> {
        match self.next_line(&format!("'{} = ...'", key))? {
            Line::Field { key: found, value, line } if found == key => Ok((value, line)),
            Line::Field { key: found, line, .. } => {
                Err(self.syntax(line, format!("expected '{}', found '{}'", key, found)))
            }
            Line::Header { text, line } => {
                Err(self.syntax(line, format!("expected '{} = ...', found '{}'", key, text)))
            }
        }
    }

    fn number(&mut self, key: &str) -> Result<(f64, usize), FormatError> {
        let (value, line) = self.field(key)?;
        match value {
            Value::Raw(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(|n| (n, line))
                .ok_or_else(|| self.syntax(line, format!("'{}' is not a number: '{}'", key, raw))),
            Value::Text { .. } => Err(self.syntax(line, format!("'{}' must be a number", key))),
        }
    }

    fn count(&mut self, key: &str) -> Result<usize, FormatError> {
        let (value, line) = self.field(key)?;
        match value {
            Value::Raw(raw) => raw
                .parse::<usize>()
                .map_err(|_| self.syntax(line, format!("'{}' is not a count: '{}'", key, raw))),
            Value::Text { .. } => Err(self.syntax(line, format!("'{}' must be a count", key))),
        }
    }

    fn string(&mut self, key: &str) -> Result<(String, Range<usize>, usize), FormatError> {
        let (value, line) = self.field(key)?;
        match value {
            Value::Text { value, span } => Ok((value, span, line)),
            Value::Raw(raw) => Err(self.syntax(line, format!("'{}' must be a quoted string, found '{}'", key, raw))),
        }
    }

    fn header(&mut self, text: &str) -> Result<(), FormatError> {
        match self.next_line(&format!("'{}'", text))? {
            Line::Header { text: found, .. } if found == text => Ok(()),
            other => {
                let line = other.line();
                Err(self.syntax(line, format!("expected '{}'", text)))
            }
        }
    }

    fn item_header(&mut self, kind: &str, index: usize) -> Result<(), FormatError> {
        let expected = format!("{} [{}]:", kind, index);
        match self.next_line(&format!("'{}'", expected))? {
            Line::Header { text, line } => {
                let matches = ITEM_HEADER_REGEX
                    .captures(text)
                    .is_some_and(|caps| &caps[1] == kind && caps[2].parse::<usize>().ok() == Some(index));
                if matches {
                    Ok(())
                } else {
                    Err(self.syntax(line, format!("expected '{}', found '{}'", expected, text)))
                }
            }
            other => {
                let line = other.line();
                Err(self.syntax(line, format!("expected '{}'", expected)))
            }
        }
    }

    fn document(&mut self) -> Result<TextGrid, FormatError> {
        let (file_type, _, line) = self.string("File type").map_err(header_error)?;
        if file_type != "ooTextFile" {
            return Err(FormatError::Header {
                line,
                message: format!("unsupported file type '{}', expected 'ooTextFile'", file_type),
            });
        }
        let (object_class, _, line) = self.string("Object class").map_err(header_error)?;
        if object_class != "TextGrid" {
            return Err(FormatError::Header {
                line,
                message: format!("object class is '{}', expected 'TextGrid'", object_class),
            });
        }

        let (xmin, line) = match self.number("xmin") {
            Ok(found) => found,
            Err(FormatError::Syntax { line, .. }) => {
                return Err(FormatError::Header {
                    line,
                    message: "expected 'xmin = ...'; only the long text format is supported".to_string(),
                });
            }
            Err(e) => return Err(e),
        };
        let (xmax, _) = self.number("xmax")?;
        if xmax < xmin {
            return Err(FormatError::Header {
                line,
                message: format!("xmax {} is before xmin {}", xmax, xmin),
            });
        }

        let mut grid = TextGrid::new(xmin, xmax);
        match self.next_line("'tiers? <exists>'")? {
            Line::Header { text: "tiers? <exists>", .. } => {}
            Line::Header { text: "tiers? <absent>", .. } => {
                self.expect_end()?;
                return Ok(grid);
            }
            other => {
                let line = other.line();
                return Err(self.syntax(line, "expected 'tiers? <exists>'"));
            }
        }

        let size = self.count("size")?;
        self.header("item []:")?;
        for index in 1..=size {
            self.item_header("item", index)?;
            let tier = self.tier()?;
            grid.tiers.push(tier);
        }

        self.expect_end()?;
        Ok(grid)
    }

    fn expect_end(&mut self) -> Result<(), FormatError> {
        match self.lines.next() {
            None => Ok(()),
            Some(Err(e)) => Err(e),
            Some(Ok(line)) => Err(self.syntax(line.line(), "unexpected content after the last tier")),
        }
    }

    fn tier(&mut self) -> Result<Tier, FormatError> {
        let (class_name, _, line) = self.string("class")?;
        let class = class_name
            .parse::<TierClass>()
            .map_err(|message| self.syntax(line, message))?;
        let (name, _, _) = self.string("name")?;
        let (xmin, line) = self.number("xmin")?;
        let (xmax, _) = self.number("xmax")?;
        if xmax < xmin {
            return Err(FormatError::Timing {
                line,
                tier: name,
                message: format!("tier ends at {} before it starts at {}", xmax, xmin),
            });
        }

        let mut tier = match class {
            TierClass::IntervalTier => Tier::interval_tier(name, xmin, xmax),
            TierClass::TextTier => Tier::text_tier(name, xmin, xmax),
        };
        match class {
            TierClass::IntervalTier => self.intervals(&mut tier)?,
            TierClass::TextTier => self.points(&mut tier)?,
        }
        Ok(tier)
    }

    fn intervals(&mut self, tier: &mut Tier) -> Result<(), FormatError> {
        let size = self.count("intervals: size")?;
        let mut previous_end = tier.xmin;

        for index in 1..=size {
            self.item_header("intervals", index)?;
            let (xmin, line) = self.number("xmin")?;
            let (xmax, _) = self.number("xmax")?;
            let (text, span, _) = self.string("text")?;

            let timing = |message: String| FormatError::Timing {
                line,
                tier: tier.name.clone(),
                message,
            };
            if xmax < xmin {
                return Err(timing(format!("interval {} ends at {} before it starts at {}", index, xmax, xmin)));
            }
            if xmin < previous_end - TIME_EPSILON {
                let message = if index == 1 {
                    format!("interval 1 starts at {} before the tier starts at {}", xmin, tier.xmin)
                } else {
                    format!("interval {} starts at {} before interval {} ends at {}", index, xmin, index - 1, previous_end)
                };
                return Err(timing(message));
            }
            if xmax > tier.xmax + TIME_EPSILON {
                return Err(timing(format!("interval {} ends at {} after the tier ends at {}", index, xmax, tier.xmax)));
            }
            previous_end = xmax;

            tier.intervals.push(Interval {
                xmin,
                xmax,
                text: text.clone(),
                origin: Some(LabelOrigin { span, text, xmin, xmax }),
            });
        }
        Ok(())
    }

    fn points(&mut self, tier: &mut Tier) -> Result<(), FormatError> {
        let size = self.count("points: size")?;
        let mut previous_time = f64::NEG_INFINITY;

        for index in 1..=size {
            self.item_header("points", index)?;
            // Praat writes `number`, some tools write `time`
            let (time, line) = match self.lines.peek() {
                Some(Ok(Line::Field { key: "time", .. })) => self.number("time")?,
                _ => self.number("number")?,
            };
            let (mark, _, _) = self.string("mark")?;
            if time < previous_time - TIME_EPSILON {
                return Err(FormatError::Timing {
                    line,
                    tier: tier.name.clone(),
                    message: format!("point {} at {} comes before the previous point at {}", index, time, previous_time),
                });
            }
            previous_time = time;
            tier.points.push(Point::new(time, mark));
        }
        Ok(())
    }
}

fn header_error(error: FormatError) -> FormatError {
    match error {
        FormatError::Syntax { line, message } => FormatError::Header { line, message },
        FormatError::UnexpectedEof(message) => FormatError::Header { line: 1, message },
        other => other,
    }
}
