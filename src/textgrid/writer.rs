/*!
 * Serializer for the TextGrid long text format.
 *
 * A parsed document is written back by copying its source and replacing
 * only the label literals whose text changed. Documents built in memory,
 * or parsed documents whose tiers or timings were edited, are written in
 * the canonical layout Praat itself produces.
 */

use std::fmt::Write;

use log::debug;

use super::model::{SourceText, TextGrid, TierClass, TierShape};

/// Serialize a document to TextGrid text
pub fn serialize(grid: &TextGrid) -> String {
    match &grid.source {
        Some(source) if matches_source(grid, source) => splice(grid, source),
        Some(_) => {
            debug!("Document structure changed since parsing, writing canonical layout");
            canonical(grid)
        }
        None => canonical(grid),
    }
}

/// Quote a label, doubling embedded quotes
pub fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn matches_source(grid: &TextGrid, source: &SourceText) -> bool {
    grid.xmin == source.xmin
        && grid.xmax == source.xmax
        && grid.tiers.len() == source.tiers.len()
        && grid.tiers.iter().zip(&source.tiers).all(|(tier, shape)| {
            TierShape::of(tier) == *shape
                && tier.intervals.iter().all(|interval| {
                    interval.origin.as_ref().is_some_and(|origin| {
                        origin.xmin == interval.xmin && origin.xmax == interval.xmax
                    })
                })
        })
}

fn splice(grid: &TextGrid, source: &SourceText) -> String {
    let text = &source.text;
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    let origins = grid
        .tiers
        .iter()
        .flat_map(|tier| tier.intervals.iter())
        .filter_map(|interval| interval.origin.as_ref().map(|origin| (origin, &interval.text)));

    for (origin, label) in origins {
        if origin.text == *label {
            continue;
        }
        out.push_str(&text[cursor..origin.span.start]);
        out.push_str(&quote(label));
        cursor = origin.span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn canonical(grid: &TextGrid) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_canonical(grid, &mut out);
    out
}

fn write_canonical(grid: &TextGrid, out: &mut String) -> std::fmt::Result {
    writeln!(out, "File type = \"ooTextFile\"")?;
    writeln!(out, "Object class = \"TextGrid\"")?;
    writeln!(out)?;
    writeln!(out, "xmin = {} ", grid.xmin)?;
    writeln!(out, "xmax = {} ", grid.xmax)?;
    if grid.tiers.is_empty() {
        writeln!(out, "tiers? <absent> ")?;
        return Ok(());
    }
    writeln!(out, "tiers? <exists> ")?;
    writeln!(out, "size = {} ", grid.tiers.len())?;
    writeln!(out, "item []: ")?;

    for (tier_index, tier) in grid.tiers.iter().enumerate() {
        writeln!(out, "    item [{}]:", tier_index + 1)?;
        writeln!(out, "        class = {} ", quote(tier.class.as_str()))?;
        writeln!(out, "        name = {} ", quote(&tier.name))?;
        writeln!(out, "        xmin = {} ", tier.xmin)?;
        writeln!(out, "        xmax = {} ", tier.xmax)?;
        match tier.class {
            TierClass::IntervalTier => {
                writeln!(out, "        intervals: size = {} ", tier.intervals.len())?;
                for (index, interval) in tier.intervals.iter().enumerate() {
                    writeln!(out, "        intervals [{}]:", index + 1)?;
                    writeln!(out, "            xmin = {} ", interval.xmin)?;
                    writeln!(out, "            xmax = {} ", interval.xmax)?;
                    writeln!(out, "            text = {} ", quote(&interval.text))?;
                }
            }
            TierClass::TextTier => {
                writeln!(out, "        points: size = {} ", tier.points.len())?;
                for (index, point) in tier.points.iter().enumerate() {
                    writeln!(out, "        points [{}]:", index + 1)?;
                    writeln!(out, "            number = {} ", point.time)?;
                    writeln!(out, "            mark = {} ", quote(&point.mark))?;
                }
            }
        }
    }
    Ok(())
}
