//! Normalization of raw extracted prose.
//!
//! The output is a sequence of blocks separated by one blank line: headings and
//! paragraphs as single lines, and list groups as consecutive `• ` lines. Every rule
//! below maps that shape onto itself, which keeps [`preprocess`] idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::domain::section::BULLET_MARKER;

/// Symbols kept alongside letters, digits and whitespace.
const RETAINED_SYMBOLS: &str = ".,!?;:()[]{}'\"/\\-_&#@–—+=%^°²³*×÷±≈≠≤≥<>→←↔↑↓∞∑∏∫∂√•·";

const MIN_DEFINITION_BODY_CHARS: usize = 10;

static HYPHEN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)-[ \t]*\n[ \t]*(\w)").expect("valid hyphenation regex"));
static PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\s*$").expect("valid page number regex"));
static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[•*\-]|\d+[.)])\s+").expect("valid list marker regex"));
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s+").expect("valid numbered item regex"));
static BULLET_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[•*\-]\s+").expect("valid bullet line regex"));
static NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.?\s+\p{Lu}").expect("valid numbered heading regex"));
static TERMINAL_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?;,]$").expect("valid terminal punctuation regex"));
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]$").expect("valid sentence end regex"));
static DEFINITION_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\p{Lu}\p{Ll}+(?: \p{Lu}\p{Ll}+)*: ").expect("valid definition anchor regex")
});
static SPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" {2,}").expect("valid space run regex"));
static NEWLINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid newline run regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Text(String),
    ListItem(String),
}

enum LineClass {
    Heading,
    ListItem(String),
    Body,
}

/// Cleans extraction artifacts and restores paragraph, heading and list structure.
pub fn preprocess(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = filter_characters(&text);

    let lines: Vec<String> = text
        .lines()
        .map(|line| SPACE_RUN.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !PAGE_NUMBER.is_match(line))
        .collect();

    let joined = join_hyphenation(&lines.join("\n"));
    let lines: Vec<&str> = joined
        .lines()
        .filter(|line| !PAGE_NUMBER.is_match(line))
        .collect();

    let blocks = reconstruct_blocks(&lines);
    normalize_whitespace(&render_blocks(&blocks))
}

/// Heading heuristic shared with the section splitter.
///
/// Two to twelve words and at most 100 characters, and one of: a numbered prefix,
/// ALL CAPS (up to ten words), or at least 70% capitalized words with no trailing
/// punctuation next to a blank line. Bulleted lines are never headings.
pub fn is_heading(line: &str, prev_blank: bool, next_blank: bool) -> bool {
    let line = line.trim();
    if line.chars().count() > 100 || BULLET_LINE.is_match(line) {
        return false;
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() < 2 || words.len() > 12 {
        return false;
    }

    if NUMBERED_HEADING.is_match(line) && !TERMINAL_PUNCTUATION.is_match(line) {
        return true;
    }

    if is_all_caps(line) && words.len() <= 10 {
        return true;
    }

    let capitalized = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count();

    capitalized * 10 >= words.len() * 7
        && !TERMINAL_PUNCTUATION.is_match(line)
        && (prev_blank || next_blank)
}

pub fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}

/// Returns the item text when `line` starts with a bullet or `N.`/`N)` marker.
pub fn strip_list_marker(line: &str) -> Option<&str> {
    LIST_MARKER
        .find(line)
        .map(|m| line[m.end()..].trim())
        .filter(|item| !item.is_empty())
}

pub fn is_list_line(line: &str) -> bool {
    strip_list_marker(line.trim()).is_some()
}

fn filter_characters(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c == '\n' || c == ' ' || c.is_alphanumeric() || RETAINED_SYMBOLS.contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn join_hyphenation(text: &str) -> String {
    let mut joined = text.to_string();
    // Each pass removes at least one line break, so this terminates.
    while HYPHEN_BREAK.is_match(&joined) {
        joined = HYPHEN_BREAK.replace_all(&joined, "$1$2").into_owned();
    }
    joined
}

/// A numbered line adjacent to another list line belongs to that list, never a heading.
fn classify(line: &str, prev: Option<&str>, next: Option<&str>) -> LineClass {
    let prev_blank = prev.map_or(true, str::is_empty);
    let next_blank = next.map_or(true, str::is_empty);
    let in_numbered_run = NUMBERED_ITEM.is_match(line)
        && (prev.is_some_and(is_list_line) || next.is_some_and(is_list_line));

    if !in_numbered_run && is_heading(line, prev_blank, next_blank) {
        LineClass::Heading
    } else if let Some(item) = strip_list_marker(line) {
        LineClass::ListItem(item.to_string())
    } else {
        LineClass::Body
    }
}

fn reconstruct_blocks(lines: &[&str]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            continue;
        }

        let prev = index.checked_sub(1).map(|i| lines[i]);
        let next = lines.get(index + 1).copied();

        match classify(line, prev, next) {
            LineClass::Heading => {
                flush_paragraph(&mut paragraph, &mut blocks);
                blocks.push(Block::Text(line.to_string()));
            }
            LineClass::ListItem(item) => {
                flush_paragraph(&mut paragraph, &mut blocks);
                blocks.push(Block::ListItem(item));
            }
            LineClass::Body => {
                paragraph.push(line);
                let next_starts_capital = next
                    .and_then(|n| n.chars().next())
                    .is_some_and(char::is_uppercase);
                let next_blank = next.map_or(true, str::is_empty);
                if SENTENCE_END.is_match(line) && (next_blank || next_starts_capital) {
                    flush_paragraph(&mut paragraph, &mut blocks);
                }
            }
        }
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if paragraph.is_empty() {
        return;
    }

    let joined = paragraph.join(" ");
    paragraph.clear();

    // Classified the way it will read once it stands alone between blank lines.
    match classify(&joined, None, None) {
        LineClass::Heading => blocks.push(Block::Text(joined)),
        LineClass::ListItem(item) => blocks.push(Block::ListItem(item)),
        LineClass::Body => match split_definitions(&joined) {
            Some(pieces) => blocks.extend(pieces.into_iter().map(Block::Text)),
            None => blocks.push(Block::Text(joined)),
        },
    }
}

/// Splits run-on "Term: definition Term: definition" text into one piece per term,
/// when at least two of the terms carry a definition body.
fn split_definitions(text: &str) -> Option<Vec<String>> {
    let anchors: Vec<(usize, usize)> = DEFINITION_ANCHOR
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    if anchors.len() < 2 {
        return None;
    }

    let mut pieces = Vec::with_capacity(anchors.len() + 1);
    let prefix = text[..anchors[0].0].trim();
    if !prefix.is_empty() {
        pieces.push(prefix.to_string());
    }

    let mut definitions = 0;
    for (index, &(start, body_start)) in anchors.iter().enumerate() {
        let end = anchors.get(index + 1).map_or(text.len(), |&(next, _)| next);
        if text[body_start..end].trim().chars().count() >= MIN_DEFINITION_BODY_CHARS {
            definitions += 1;
        }
        pieces.push(text[start..end].trim().to_string());
    }

    (definitions >= 2).then_some(pieces)
}

fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut previous_was_item = false;

    for block in blocks {
        let (separator, text, is_item) = match block {
            Block::Text(text) => ("\n\n", text.clone(), false),
            Block::ListItem(item) => (
                if previous_was_item { "\n" } else { "\n\n" },
                format!("{}{}", BULLET_MARKER, item),
                true,
            ),
        };
        if !out.is_empty() {
            out.push_str(separator);
        }
        out.push_str(&text);
        previous_was_item = is_item;
    }

    out
}

fn normalize_whitespace(text: &str) -> String {
    let trimmed_lines = text
        .lines()
        .map(|line| SPACE_RUN.replace_all(line.trim(), " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    NEWLINE_RUN
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}
