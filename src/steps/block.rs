//! Step block parsing
//!
//! A block is the text a composite step hands back to the registry:
//!
//! ```text
//! * file select dialog with name "Open Image" is displayed
//! * In file select dialog select "~/Pictures/gnome.png"
//! ```
//!
//! Every non-empty line must start with a marker (`*`, `-` or a Gherkin
//! keyword). A block that is a single unmarked line is taken as one phrase.

use crate::common::{Error, Result};

/// Marker a phrase line started with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Given,
    When,
    Then,
    And,
    But,
    /// `*` or `-`
    Bullet,
}

const KEYWORDS: [(Keyword, &str); 5] = [
    (Keyword::Given, "Given"),
    (Keyword::When, "When"),
    (Keyword::Then, "Then"),
    (Keyword::And, "And"),
    (Keyword::But, "But"),
];

/// One phrase of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub keyword: Keyword,
    pub text: String,
    /// 1-based line within the block or file
    pub line: usize,
}

/// Split a line into its marker and phrase text
///
/// Returns `None` for lines that don't start with a marker followed by
/// whitespace and some text.
pub fn split_marker(line: &str) -> Option<(Keyword, &str)> {
    let line = line.trim();

    let (keyword, rest) = KEYWORDS
        .iter()
        .find_map(|(keyword, word)| line.strip_prefix(*word).map(|rest| (*keyword, rest)))
        .or_else(|| {
            line.strip_prefix('*')
                .or_else(|| line.strip_prefix('-'))
                .map(|rest| (Keyword::Bullet, rest))
        })?;

    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        None
    } else {
        Some((keyword, text))
    }
}

/// Parse a block into phrases, in order
pub fn parse_block(text: &str) -> Result<Vec<Phrase>> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect();

    if let [(line, only)] = lines.as_slice() {
        if split_marker(only).is_none() {
            return Ok(vec![Phrase {
                keyword: Keyword::Bullet,
                text: only.to_string(),
                line: *line,
            }]);
        }
    }

    lines
        .into_iter()
        .map(|(line, raw)| match split_marker(raw) {
            Some((keyword, text)) => Ok(Phrase {
                keyword,
                text: text.to_string(),
                line,
            }),
            None => Err(Error::MalformedBlock {
                line,
                text: raw.to_string(),
            }),
        })
        .collect()
}
