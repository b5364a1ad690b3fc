//! Recovery of JSON payloads from free-form model completions.
//!
//! Completions are often wrapped in prose or Markdown fences and are regularly cut off
//! by the token limit. [`parse`] locates the structure, applies a small set of ordered
//! repairs and returns either the value or a typed [`ParseError`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

const RAW_SNIPPET_CHARS: usize = 1000;

static CLOSING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*```\s*$").expect("valid closing fence regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("No JSON structure found in {context}")]
    NoStructureFound { context: String, raw_snippet: String },

    #[error("Invalid JSON in {context}: {message}")]
    InvalidJson {
        context: String,
        message: String,
        raw_snippet: String,
    },
}

impl ParseError {
    pub fn raw_snippet(&self) -> &str {
        match self {
            ParseError::NoStructureFound { raw_snippet, .. } => raw_snippet,
            ParseError::InvalidJson { raw_snippet, .. } => raw_snippet,
        }
    }
}

pub type ParseResult = Result<Value, ParseError>;

/// Parses the JSON array or object embedded in `raw_text`.
///
/// `context` only labels diagnostics (e.g. `"sections"`, `"mc-hard"`).
pub fn parse(raw_text: &str, context: &str) -> ParseResult {
    log::debug!("Raw {} completion length: {}", context, raw_text.len());

    let unfenced = strip_closing_fence(raw_text.trim());

    let Some((start, close)) = structure_start(&unfenced) else {
        log::warn!("No JSON structure found in {}", context);
        return Err(ParseError::NoStructureFound {
            context: context.to_string(),
            raw_snippet: snippet(raw_text),
        });
    };

    let candidate = bracketed_candidate(&unfenced, start, close);

    // Well-formed payloads are returned untouched.
    if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
        return Ok(value);
    }
    if let Some(value) = leading_value(&unfenced[start..]) {
        return Ok(value);
    }

    let repaired = repair(&candidate);
    let parsed = serde_json::from_str::<Value>(&repaired).or_else(|err| {
        // A nested `]` can end the slice early; retry on everything after the start.
        if close == ']' {
            serde_json::from_str::<Value>(&repair(&unfenced[start..])).map_err(|_| err)
        } else {
            Err(err)
        }
    });

    match parsed {
        Ok(value) => {
            log::debug!("Repaired malformed JSON in {}", context);
            Ok(value)
        }
        Err(e) => {
            let raw_snippet = snippet(raw_text);
            log::error!(
                "Invalid JSON in {}: {}. Problematic text (first {} chars): {}",
                context,
                e,
                RAW_SNIPPET_CHARS,
                raw_snippet
            );
            Err(ParseError::InvalidJson {
                context: context.to_string(),
                message: e.to_string(),
                raw_snippet,
            })
        }
    }
}

/// Drops a Markdown fence closing the completion. An opening fence needs no handling
/// since the structure is sliced from its first bracket.
fn strip_closing_fence(text: &str) -> String {
    CLOSING_FENCE.replace(text, "").into_owned()
}

/// First complete JSON value at the start of `text`, ignoring whatever follows it.
fn leading_value(text: &str) -> Option<Value> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()
        .and_then(Result::ok)
}

/// Position of the earliest `[` or `{`, with the matching close character.
fn structure_start(text: &str) -> Option<(usize, char)> {
    let array = text.find('[');
    let object = text.find('{');
    match (array, object) {
        (Some(a), Some(o)) if o < a => Some((o, '}')),
        (Some(a), _) => Some((a, ']')),
        (None, Some(o)) => Some((o, '}')),
        (None, None) => None,
    }
}

/// Slices from `start` through the last `close`, appending the terminator once if
/// the completion was cut off before it.
fn bracketed_candidate(text: &str, start: usize, close: char) -> String {
    let mut text = text.to_string();
    let end = match text.rfind(close) {
        Some(end) if end > start => end,
        _ => {
            text.push('\n');
            text.push(close);
            text.len() - close.len_utf8()
        }
    };
    text[start..end + close.len_utf8()].to_string()
}

fn repair(candidate: &str) -> String {
    let mut repaired = remove_trailing_commas(candidate);

    if repaired.trim_start().starts_with('[') {
        if let Some(dangling) = dangling_object_start(&repaired) {
            let kept = repaired[..dangling].trim_end();
            let kept = kept.strip_suffix(',').unwrap_or(kept).trim_end();
            let mut truncated = kept.to_string();
            if !truncated.ends_with(']') {
                truncated.push_str("\n]");
            }
            repaired = remove_trailing_commas(&truncated);
        }
    }

    repaired
}

fn remove_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Finds the start of an element object of the top-level array that is never closed.
///
/// Scans string-aware; the scan stops at end of input or at a closer that does not
/// match the innermost open bracket (such as an appended `]`).
fn dangling_object_start(candidate: &str) -> Option<usize> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in candidate.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' | '{' => stack.push((ch, idx)),
            ']' | '}' => {
                let opener = if ch == ']' { '[' } else { '{' };
                match stack.last() {
                    Some(&(open, _)) if open == opener => {
                        stack.pop();
                    }
                    _ => break,
                }
            }
            _ => {}
        }
    }

    match (stack.first(), stack.get(1)) {
        (Some(&('[', _)), Some(&('{', pos))) => Some(pos),
        _ => None,
    }
}

fn snippet(raw_text: &str) -> String {
    raw_text.chars().take(RAW_SNIPPET_CHARS).collect()
}
