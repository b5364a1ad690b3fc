use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const BULLET_MARKER: &str = "• ";
pub const HIGHLIGHT_MARKER: &str = "> ";

static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s").expect("valid numbered line regex"));
static LLM_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^BULLET\s+").expect("valid bullet marker regex"));
static LLM_NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^NUM(\d+)\.\s+").expect("valid numbered marker regex"));
static LLM_ARROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^ARROW\s+").expect("valid arrow marker regex"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Paragraph,
    Bullet,
    Numbered,
    Highlight,
}

/// A single line of section content. The kind is carried by its leading marker
/// so the line serializes as a plain string.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ContentLine(String);

impl ContentLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Rewrites the `BULLET `, `NUMn. ` and `ARROW ` markers models are asked to emit.
    pub fn from_model_line(line: &str) -> Self {
        let line = line.trim();
        let converted = if LLM_BULLET.is_match(line) {
            LLM_BULLET.replace(line, BULLET_MARKER).into_owned()
        } else if LLM_NUMBERED.is_match(line) {
            LLM_NUMBERED.replace(line, "$1. ").into_owned()
        } else if LLM_ARROW.is_match(line) {
            LLM_ARROW.replace(line, HIGHLIGHT_MARKER).into_owned()
        } else {
            line.to_string()
        };
        Self(converted)
    }

    pub fn kind(&self) -> LineKind {
        if self.0.starts_with(BULLET_MARKER) {
            LineKind::Bullet
        } else if self.0.starts_with(HIGHLIGHT_MARKER) {
            LineKind::Highlight
        } else if NUMBERED_LINE.is_match(&self.0) {
            LineKind::Numbered
        } else {
            LineKind::Paragraph
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for ContentLine {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    pub level: u8,
    pub content: Vec<ContentLine>,
    pub raw_content: String,
}

impl Section {
    /// Builds a section, clamping the level to 1..=2 and never leaving the content empty.
    pub fn new(title: impl Into<String>, level: u8, content: Vec<ContentLine>) -> Self {
        let title = title.into();
        let mut content = content;
        if content.iter().all(ContentLine::is_blank) {
            content = vec![ContentLine::new(format!("This section introduces {}.", title))];
        }

        let raw_content = content
            .iter()
            .map(ContentLine::as_str)
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            title,
            level: level.clamp(1, 2),
            content,
            raw_content,
        }
    }
}
