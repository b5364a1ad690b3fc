use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::domain::ReviewerMetadata;
use crate::services::pattern_detector::{self, DetectedPatterns};
use crate::services::text_preprocessor::preprocess;

const MIN_SENTENCE_CHARS: usize = 15;
const MIN_SENTENCE_WORDS: usize = 4;
const TIDY_PUNCTUATION: &str = "!?.,;:";

static SPACE_BEFORE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+([!?.,;:])").expect("valid punctuation spacing regex"));
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence boundary regex"));

/// Normalized view of one source document shared by the heuristic generators.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentAnalysis {
    pub text: String,
    pub lines: Vec<String>,
    pub paragraphs: Vec<String>,
    pub sentences: Vec<String>,
    pub patterns: DetectedPatterns,
}

impl ContentAnalysis {
    pub fn analyze(raw: &str) -> Self {
        let text = tidy_punctuation(&preprocess(raw));

        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        let paragraphs = split_paragraphs(&text);
        let sentences = extract_sentences(&text);
        let patterns = pattern_detector::detect(&text);

        log::debug!(
            "Analyzed source: {} paragraphs, {} sentences, {} definitions",
            paragraphs.len(),
            sentences.len(),
            patterns.definitions.len()
        );

        Self {
            text,
            lines,
            paragraphs,
            sentences,
            patterns,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn metadata(&self, raw: &str, processing_version: &str) -> ReviewerMetadata {
        ReviewerMetadata::new(
            raw.split_whitespace().count(),
            self.sentences.len(),
            self.paragraphs.len(),
            processing_version,
        )
    }
}

pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits after `.`, `!` or `?` followed by whitespace, line by line so headings and
/// list items never merge into the following sentence. Fragments shorter than 15
/// characters or four words are dropped.
pub fn extract_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let mut start = 0;
        for boundary in SENTENCE_BOUNDARY.find_iter(line) {
            push_sentence(&mut sentences, &line[start..boundary.start() + 1]);
            start = boundary.end();
        }
        push_sentence(&mut sentences, &line[start..]);
    }

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if candidate.chars().count() > MIN_SENTENCE_CHARS
        && candidate.split_whitespace().count() >= MIN_SENTENCE_WORDS
    {
        sentences.push(candidate.to_string());
    }
}

/// Collapses repeated punctuation (`!!` → `!`) and removes spaces before punctuation.
pub fn tidy_punctuation(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut previous: Option<char> = None;

    for ch in text.chars() {
        if previous == Some(ch) && TIDY_PUNCTUATION.contains(ch) {
            continue;
        }
        collapsed.push(ch);
        previous = Some(ch);
    }

    SPACE_BEFORE_PUNCTUATION
        .replace_all(&collapsed, "$1")
        .into_owned()
}
