use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::vocabulary::is_common_word;
use crate::models::domain::{ContentLine, Section};
use crate::services::text_preprocessor::{is_all_caps, is_heading};

const RESPLIT_LINE_THRESHOLD: usize = 20;
const RESPLIT_PARTS: usize = 4;
const INTRODUCTION_TITLE: &str = "Introduction";
const CONTENT_TITLE: &str = "Content";

static HEADING_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:#+\s*|\d+[.)]?\s*|[•*\-]\s*)+").expect("valid heading prefix regex")
});
static HEADING_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[:.]+$").expect("valid heading suffix regex"));
static TOP_LEVEL_NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s").expect("valid numbering regex"));
static CAPITALIZED_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)+").expect("valid capitalized phrase regex")
});
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence boundary regex"));

struct SectionDraft {
    title: String,
    level: u8,
    lines: Vec<String>,
}

impl SectionDraft {
    fn finish(self) -> Section {
        let content = self.lines.into_iter().map(ContentLine::new).collect();
        Section::new(self.title, self.level, content)
    }
}

/// Segments normalized text into titled sections.
pub fn split(normalized_text: &str) -> Vec<Section> {
    let mut drafts: Vec<SectionDraft> = Vec::new();

    let paragraphs = normalized_text
        .split("\n\n")
        .map(|block| {
            block
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|lines| !lines.is_empty());

    for (index, lines) in paragraphs.enumerate() {
        let first = lines[0];
        if is_heading(first, true, lines.len() == 1) {
            drafts.push(SectionDraft {
                title: clean_heading(first),
                level: heading_level(first),
                lines: lines[1..].iter().map(|line| line.to_string()).collect(),
            });
            continue;
        }

        let body = lines.iter().map(|line| line.to_string());
        match drafts.last_mut() {
            Some(current) => current.lines.extend(body),
            None => drafts.push(SectionDraft {
                title: if index == 0 {
                    INTRODUCTION_TITLE.to_string()
                } else {
                    CONTENT_TITLE.to_string()
                },
                level: 1,
                lines: body.collect(),
            }),
        }
    }

    let mut sections: Vec<Section> = drafts.into_iter().map(SectionDraft::finish).collect();

    if sections.len() == 1 && sections[0].content.len() > RESPLIT_LINE_THRESHOLD {
        log::debug!(
            "Single section with {} lines, re-splitting into {} parts",
            sections[0].content.len(),
            RESPLIT_PARTS
        );
        sections = resplit(&sections[0]);
    }

    sections
}

/// Strips markdown hashes, numbering, bullets and trailing colons.
pub fn clean_heading(line: &str) -> String {
    let stripped = HEADING_PREFIX.replace(line.trim(), "");
    let stripped = HEADING_SUFFIX.replace(stripped.trim(), "");
    let title = stripped.trim();
    if title.is_empty() {
        line.trim().to_string()
    } else {
        title.to_string()
    }
}

fn heading_level(line: &str) -> u8 {
    if TOP_LEVEL_NUMBERING.is_match(line) || is_all_caps(line) {
        1
    } else {
        2
    }
}

fn resplit(section: &Section) -> Vec<Section> {
    let sentences: Vec<String> = section
        .content
        .iter()
        .flat_map(|line| line_sentences(line.as_str()))
        .collect();

    let part_size = sentences.len().div_ceil(RESPLIT_PARTS).max(1);

    sentences
        .chunks(part_size)
        .enumerate()
        .map(|(index, part)| {
            let title = part
                .first()
                .and_then(|sentence| phrase_title(sentence))
                .unwrap_or_else(|| format!("Section {}", index + 1));
            let content = part.iter().map(|s| ContentLine::new(s.as_str())).collect();
            Section::new(title, 2, content)
        })
        .collect()
}

fn line_sentences(line: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(line) {
        sentences.push(line[start..boundary.start() + 1].trim().to_string());
        start = boundary.end();
    }
    let tail = line[start..].trim();
    if !tail.is_empty() {
        if tail.ends_with(&['.', '!', '?'][..]) {
            sentences.push(tail.to_string());
        } else {
            sentences.push(format!("{}.", tail));
        }
    }
    sentences
}

/// First capitalized phrase of two or more words, ignoring leading common words.
fn phrase_title(sentence: &str) -> Option<String> {
    CAPITALIZED_PHRASE.find_iter(sentence).find_map(|found| {
        let words: Vec<&str> = found
            .as_str()
            .split_whitespace()
            .skip_while(|word| is_common_word(word))
            .collect();
        (words.len() >= 2).then(|| words.join(" "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_headings_is_one_introduction_section() {
        let text = "A cell is a basic unit of life in all organisms. \
                    An enzyme is a protein that speeds up reactions. \
                    A gene is a segment of DNA that codes for a protein.";

        let sections = split(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Introduction");
        assert_eq!(sections[0].level, 1);
        assert_eq!(sections[0].content.len(), 1);
    }

    #[test]
    fn headings_start_sections_and_body_attaches_to_current() {
        let text = "Cells are everywhere.\n\n\
                    1. CELL STRUCTURE:\n\n\
                    The membrane surrounds the cell.\n\n\
                    • nucleus\n• ribosome\n\n\
                    Energy And Metabolism\n\n\
                    Mitochondria release energy.";

        let sections = split(text);

        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Introduction", "CELL STRUCTURE", "Energy And Metabolism"]);
        assert_eq!(sections[1].level, 1);
        assert_eq!(sections[2].level, 2);
        assert_eq!(sections[1].content.len(), 3);
        assert_eq!(sections[1].content[1].as_str(), "• nucleus");
        assert_eq!(sections[2].raw_content, "Mitochondria release energy.");
    }

    #[test]
    fn heading_without_body_gets_introductory_line() {
        let sections = split("PHOTOSYNTHESIS BASICS");

        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].content[0].as_str(),
            "This section introduces PHOTOSYNTHESIS BASICS."
        );
    }

    #[test]
    fn long_single_section_is_resplit_into_four_parts() {
        let topics = [
            "Cell Membrane",
            "Golgi Apparatus",
            "Endoplasmic Reticulum",
            "Nuclear Envelope",
        ];
        let mut lines = Vec::new();
        for topic in topics {
            for n in 0..6 {
                lines.push(format!("The {} handles task number {} in the cell", topic, n));
            }
        }
        let text = lines.join("\n");

        let sections = split(&text);

        assert_eq!(sections.len(), 4);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, topics.to_vec());
        assert!(sections.iter().all(|s| s.level == 2 && s.content.len() == 6));
        assert!(sections[0].content[0].as_str().ends_with("cell."));
    }

    #[test]
    fn resplit_falls_back_to_numbered_titles() {
        let text = (0..24)
            .map(|n| format!("item number {} is listed here", n))
            .collect::<Vec<_>>()
            .join("\n");

        let sections = split(&text);

        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].title, "Section 1");
        assert_eq!(sections[3].title, "Section 4");
    }

    #[test]
    fn clean_heading_strips_decoration() {
        assert_eq!(clean_heading("## 2. Cell Division:"), "Cell Division");
        assert_eq!(clean_heading("• Overview."), "Overview");
        assert_eq!(clean_heading("3) Results"), "Results");
    }
}
