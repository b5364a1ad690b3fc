use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::constants::vocabulary::LEADING_ARTICLE;
use crate::services::text_preprocessor::{is_list_line, strip_list_marker};

const MAX_TERM_WORDS: usize = 6;
const MIN_DEFINITION_WORDS: usize = 3;
const SUMMARY_CHARS: usize = 100;

const PROCESS_KEYWORDS: &[&str] = &[
    "process",
    "procedure",
    "method",
    "steps",
    "stages",
    "involves",
    "consists of",
    "comprises",
];

const CLASSIFICATION_KEYWORDS: &[&str] = &[
    "types of",
    "kinds of",
    "categories",
    "classified into",
    "divided into",
    "two main",
    "three main",
];

/// Ordered definition templates; the first one that yields an acceptable pair wins.
static DEFINITION_TEMPLATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(.{3,50})\s+is\s+(?:a|an|the)\s+(.{10,200})",
        r"(?i)(.{3,50})\s+are\s+(.{10,200})",
        r"(?i)(.{3,50})\s+means\s+(.{10,200})",
        r"(?i)(.{3,50})\s+refers?\s+to\s+(.{10,200})",
        r"(.{3,50}):\s+(.{10,200})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid definition template"))
    .collect()
});

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+|\n").expect("valid sentence break regex"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionPattern {
    pub term: String,
    pub definition: String,
    pub full_text: String,
}

/// A sentence describing a process or a classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordPattern {
    pub summary: String,
    pub full_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListPattern {
    pub context: String,
    pub items: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DetectedPatterns {
    pub definitions: Vec<DefinitionPattern>,
    pub processes: Vec<KeywordPattern>,
    pub classifications: Vec<KeywordPattern>,
    pub lists: Vec<ListPattern>,
}

pub fn detect(normalized_text: &str) -> DetectedPatterns {
    let sentences = split_sentences(normalized_text);

    DetectedPatterns {
        definitions: sentences.iter().filter_map(|s| find_definition(s)).collect(),
        processes: keyword_sentences(&sentences, PROCESS_KEYWORDS),
        classifications: keyword_sentences(&sentences, CLASSIFICATION_KEYWORDS),
        lists: find_lists(normalized_text),
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn find_definition(sentence: &str) -> Option<DefinitionPattern> {
    DEFINITION_TEMPLATES.iter().find_map(|template| {
        let captures = template.captures(sentence)?;
        let term = clean_term(captures.get(1)?.as_str());
        let definition = captures.get(2)?.as_str().trim();

        let term_words = term.split_whitespace().count();
        let acceptable = (1..=MAX_TERM_WORDS).contains(&term_words)
            && definition.split_whitespace().count() >= MIN_DEFINITION_WORDS;

        acceptable.then(|| DefinitionPattern {
            term,
            definition: definition.to_string(),
            full_text: sentence.to_string(),
        })
    })
}

fn clean_term(raw: &str) -> String {
    let term = raw.trim();
    let term = strip_list_marker(term).unwrap_or(term);
    LEADING_ARTICLE.replace(term, "").trim().to_string()
}

fn keyword_sentences(sentences: &[&str], keywords: &[&str]) -> Vec<KeywordPattern> {
    sentences
        .iter()
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            keywords.iter().any(|keyword| lower.contains(keyword))
        })
        .map(|sentence| KeywordPattern {
            summary: sentence.chars().take(SUMMARY_CHARS).collect(),
            full_text: sentence.to_string(),
        })
        .collect()
}

fn find_lists(text: &str) -> Vec<ListPattern> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut lists = Vec::new();
    let mut run_start = 0;
    let mut items: Vec<String> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        match strip_list_marker(line) {
            Some(item) => {
                if items.is_empty() {
                    run_start = index;
                }
                items.push(item.to_string());
            }
            None => close_run(&lines, run_start, &mut items, &mut lists),
        }
    }
    close_run(&lines, run_start, &mut items, &mut lists);

    lists
}

fn close_run(lines: &[&str], run_start: usize, items: &mut Vec<String>, lists: &mut Vec<ListPattern>) {
    if items.len() >= 2 {
        let context = lines[..run_start]
            .iter()
            .rev()
            .find(|line| !line.is_empty())
            .filter(|line| !is_list_line(line))
            .map(|line| line.to_string())
            .unwrap_or_default();
        lists.push(ListPattern {
            context,
            items: std::mem::take(items),
        });
    }
    items.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_templates_extract_term_and_body() {
        let patterns = detect(
            "The mitochondrion is an organelle that produces most of the cell's energy. \
             Enzymes are proteins that speed up chemical reactions.",
        );

        assert_eq!(patterns.definitions.len(), 2);
        assert_eq!(patterns.definitions[0].term, "mitochondrion");
        assert_eq!(
            patterns.definitions[0].definition,
            "organelle that produces most of the cell's energy"
        );
        assert_eq!(patterns.definitions[1].term, "Enzymes");
    }

    #[test]
    fn long_terms_and_short_definitions_are_rejected() {
        let patterns = detect(
            "The thing that we saw in the lab yesterday afternoon is a cell that divides quickly. \
             Osmosis means water flow",
        );

        assert!(patterns.definitions.is_empty());
    }

    #[test]
    fn one_definition_per_sentence_first_template_wins() {
        let patterns = detect("Diffusion is a process: movement of particles from high to low.");

        assert_eq!(patterns.definitions.len(), 1);
        assert_eq!(patterns.definitions[0].term, "Diffusion");
        assert_eq!(
            patterns.definitions[0].definition,
            "process: movement of particles from high to low"
        );
    }

    #[test]
    fn colon_template_and_bullet_terms() {
        let patterns = detect("• Catalyst: a substance that speeds up a reaction");

        assert_eq!(patterns.definitions[0].term, "Catalyst");
        assert_eq!(
            patterns.definitions[0].definition,
            "a substance that speeds up a reaction"
        );
    }

    #[test]
    fn process_and_classification_keywords() {
        let text = "Mitosis involves four stages of division. \
                    Rocks are divided into three main groups. Water is wet.";

        let patterns = detect(text);

        assert_eq!(patterns.processes.len(), 1);
        assert_eq!(patterns.processes[0].full_text, "Mitosis involves four stages of division");
        assert_eq!(patterns.classifications.len(), 1);
        assert!(patterns.classifications[0].summary.starts_with("Rocks are divided"));
    }

    #[test]
    fn process_summary_is_truncated() {
        let sentence = format!("The process {}", "x".repeat(200));

        let patterns = detect(&sentence);

        assert_eq!(patterns.processes[0].summary.chars().count(), 100);
        assert_eq!(patterns.processes[0].full_text, sentence);
    }

    #[test]
    fn list_runs_capture_preceding_context() {
        let text = "Key organelles:\n\n• nucleus\n• mitochondria\n• ribosomes\n\nSingle:\n\n• only\n\nSteps\n1. mix\n2. heat";

        let patterns = detect(text);

        assert_eq!(patterns.lists.len(), 2);
        assert_eq!(patterns.lists[0].context, "Key organelles:");
        assert_eq!(
            patterns.lists[0].items,
            vec!["nucleus", "mitochondria", "ribosomes"]
        );
        assert_eq!(patterns.lists[1].context, "Steps");
        assert_eq!(patterns.lists[1].items, vec!["mix", "heat"]);
    }
}
