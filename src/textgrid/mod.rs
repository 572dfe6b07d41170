/*!
 * Praat TextGrid documents.
 *
 * Reads and writes the long ("ooTextFile") text format. A parsed document
 * keeps its source text, so serializing it again reproduces the input byte
 * for byte except for interval labels that were changed in between.
 */

mod lexer;
mod model;
mod parser;
mod writer;

pub use model::{Interval, Point, TextGrid, Tier, TierClass};
pub use parser::{parse_bytes, parse_str};
pub use writer::quote;

use crate::errors::FormatError;

/// Parse raw file bytes into a document
pub fn parse(raw: &[u8]) -> Result<TextGrid, FormatError> {
    parse_bytes(raw)
}

/// Serialize a document back to file bytes
pub fn serialize(grid: &TextGrid) -> Vec<u8> {
    writer::serialize(grid).into_bytes()
}
