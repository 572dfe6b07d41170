/*!
 * Text transforms applied to annotation labels.
 *
 * Every transform is a pure `&str -> String` function working on a single
 * label. They are idempotent on their own output, which keeps the whole
 * pipeline idempotent as long as they run in the order defined by
 * `pipeline::TransformConfig::apply`:
 *
 * 1. `lowercase` (always)
 * 2. `replace_hyphens` (optional)
 * 3. `remove_parentheses` (optional)
 * 4. `space_final_dot` (optional)
 * 5. `WordSubstitutionList::apply` (optional)
 * 6. `collapse_whitespace` (always)
 */

pub mod word_list;

use once_cell::sync::Lazy;
use regex::Regex;

pub use word_list::WordSubstitutionList;

// @const: Word character glued to a final period, with optional trailing blanks
static FINAL_DOT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w)\.\s*$").unwrap()
});

/// Convert every character to lowercase
pub fn lowercase(text: &str) -> String {
    text.to_lowercase()
}

/// Replace every hyphen and underscore with a single space
///
/// `"est_ce_que"` becomes `"est ce que"`. Runs of separators produce runs of
/// spaces, which `collapse_whitespace` folds later.
pub fn replace_hyphens(text: &str) -> String {
    text.chars()
        .map(|ch| if ch == '-' || ch == '_' { ' ' } else { ch })
        .collect()
}

/// Remove every outermost matched `(`...`)` span, delimiters included
///
/// Nested pairs disappear with their enclosing pair. An opening or closing
/// parenthesis without a partner is left where it is:
///
/// - `"id(le)"` -> `"id"`
/// - `"a (b (c) d) e"` -> `"a  e"`
/// - `"a (b (c) d"` -> `"a (b  d"`
/// - `"a ) b (c)"` -> `"a ) b "`
pub fn remove_parentheses(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();

    // Matched pairs as (open, close) char indices
    let mut open_stack: Vec<usize> = Vec::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (idx, ch) in chars.iter().enumerate() {
        match ch {
            '(' => open_stack.push(idx),
            ')' => {
                if let Some(open) = open_stack.pop() {
                    pairs.push((open, idx));
                }
            }
            _ => {}
        }
    }

    if pairs.is_empty() {
        return text.to_string();
    }

    // Keep only pairs not contained in another pair
    pairs.sort_unstable();
    let mut outermost: Vec<(usize, usize)> = Vec::with_capacity(pairs.len());
    for (open, close) in pairs {
        match outermost.last() {
            Some(&(_, last_close)) if open < last_close => {}
            _ => outermost.push((open, close)),
        }
    }

    let mut result = String::with_capacity(text.len());
    let mut spans = outermost.iter().peekable();
    let mut idx = 0;
    while idx < chars.len() {
        if let Some(&&(open, close)) = spans.peek() {
            if idx == open {
                idx = close + 1;
                spans.next();
                continue;
            }
        }
        result.push(chars[idx]);
        idx += 1;
    }
    result
}

/// Detach a period glued to the final word of a label
///
/// `"arbre."` and `"arbre. "` both become `"arbre ."`. A label whose final
/// period already stands alone, or that does not end with a period, is
/// returned unchanged.
pub fn space_final_dot(text: &str) -> String {
    FINAL_DOT_REGEX.replace(text, "$1 .").into_owned()
}

/// Collapse whitespace runs to a single space and trim both ends
pub fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    collapse_whitespace_into(text, &mut result);
    result
}

/// Collapse whitespace into a supplied buffer to avoid allocation
pub fn collapse_whitespace_into(text: &str, buffer: &mut String) {
    buffer.clear();
    for word in text.split_whitespace() {
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(word);
    }
}
