/*!
 * Line-level scanner for the TextGrid long text format.
 *
 * The long format writes one `key = value` pair per line, interleaved with
 * bare header lines such as `item [1]:`. String values are double-quoted,
 * may span several lines and escape a quote by doubling it.
 */

use std::ops::Range;

use crate::errors::FormatError;

/// Value on the right-hand side of `=`
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value<'a> {
    /// Quoted string, unescaped, with the byte span of the full literal
    Text { value: String, span: Range<usize> },
    /// Anything else, trimmed (numbers, flags)
    Raw(&'a str),
}

/// One logical line of the file
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Line<'a> {
    /// `key = value`
    Field { key: &'a str, value: Value<'a>, line: usize },
    /// Any line without `=`, trimmed
    Header { text: &'a str, line: usize },
}

impl Line<'_> {
    pub(crate) fn line(&self) -> usize {
        match self {
            Line::Field { line, .. } | Line::Header { line, .. } => *line,
        }
    }
}

pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        let pos = if src.starts_with('\u{FEFF}') { '\u{FEFF}'.len_utf8() } else { 0 };
        Self { src, pos, line: 1 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn skip_whitespace(&mut self) {
        while let Some(&b) = self.bytes().get(self.pos) {
            match b {
                b'\n' => self.line += 1,
                b' ' | b'\t' | b'\r' => {}
                _ => break,
            }
            self.pos += 1;
        }
    }

    fn skip_inline_blanks(&mut self) {
        while let Some(b' ' | b'\t' | b'\r') = self.bytes().get(self.pos) {
            self.pos += 1;
        }
    }

    fn line_end(&self, from: usize) -> usize {
        self.src[from..].find('\n').map_or(self.src.len(), |offset| from + offset)
    }

    fn read_string(&mut self) -> Result<Value<'a>, FormatError> {
        let src = self.src;
        let start = self.pos;
        let start_line = self.line;
        let bytes = src.as_bytes();
        let mut cursor = start + 1;
        let mut value = String::new();
        let mut chunk_start = cursor;

        loop {
            let Some(offset) = src[cursor..].find('"') else {
                return Err(FormatError::UnterminatedString { line: start_line });
            };
            let quote = cursor + offset;
            value.push_str(&src[chunk_start..quote]);
            if bytes.get(quote + 1) == Some(&b'"') {
                value.push('"');
                cursor = quote + 2;
                chunk_start = cursor;
            } else {
                cursor = quote + 1;
                break;
            }
        }

        self.line += src[start..cursor].matches('\n').count();
        self.pos = cursor;
        Ok(Value::Text { value, span: start..cursor })
    }

    fn read_line(&mut self) -> Result<Line<'a>, FormatError> {
        let src = self.src;
        let start = self.pos;
        let line = self.line;
        let end = self.line_end(start);
        let text = &src[start..end];

        let Some(eq) = text.find('=') else {
            self.pos = end;
            return Ok(Line::Header { text: text.trim(), line });
        };

        let key = text[..eq].trim();
        self.pos = start + eq + 1;
        self.skip_inline_blanks();

        let value = if self.bytes().get(self.pos) == Some(&b'"') {
            let value = self.read_string()?;
            self.skip_inline_blanks();
            match self.bytes().get(self.pos) {
                None | Some(b'\n') => {}
                Some(_) => {
                    return Err(FormatError::Syntax {
                        line: self.line,
                        message: format!("unexpected text after the value of '{}'", key),
                    });
                }
            }
            value
        } else {
            let end = self.line_end(self.pos);
            let raw = src[self.pos..end].trim();
            self.pos = end;
            Value::Raw(raw)
        };

        Ok(Line::Field { key, value, line })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Line<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        if self.pos >= self.src.len() {
            return None;
        }
        let result = self.read_line();
        if result.is_err() {
            // Stop after the first error
            self.pos = self.src.len();
        }
        Some(result)
    }
}
