use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::constants::vocabulary::{is_common_word, FILLER_PHRASES, LEADING_ARTICLE};
use crate::models::domain::concept::dedupe_concepts;
use crate::models::domain::{Concept, ConceptType};
use crate::models::dto::model_output::ConceptCandidate;
use crate::services::content_analyzer::ContentAnalysis;

pub const MAX_CONCEPTS: usize = 25;
const DEFINITION_CONFIDENCE: f64 = 0.95;
const FREQUENT_MIN_COUNT: u32 = 3;
const FREQUENT_MAX_CONFIDENCE: f64 = 0.8;
const FREQUENT_DIVISOR: f64 = 8.0;
const AI_CONFIDENCE_STEP: f64 = 0.02;
const MIN_TERM_CHARS: usize = 3;
const MAX_TERM_WORDS: usize = 5;
const BACKFILL_CHARS: usize = 150;

static CAPITALIZED_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\p{Lu}\p{Ll}{2,}(?:[ ]+\p{Lu}\p{Ll}{2,}){0,2})\b")
        .expect("valid capitalized term regex")
});
static COPULA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(is|are|means|refers)\b").expect("valid copula regex"));
static NOUN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(tion|ism|ology|sis|ment)$").expect("valid suffix regex"));

/// Builds the glossary from detected definitions and frequently capitalized phrases.
pub fn extract(analysis: &ContentAnalysis) -> Vec<Concept> {
    let mut concepts: Vec<Concept> = analysis
        .patterns
        .definitions
        .iter()
        .filter(|pattern| is_valid_term(&pattern.term))
        .map(|pattern| {
            Concept::new(
                pattern.term.as_str(),
                pattern.definition.as_str(),
                DEFINITION_CONFIDENCE,
                ConceptType::Definition,
                count_occurrences(&analysis.text, &pattern.term),
            )
        })
        .collect();

    for (term, count) in capitalized_counts(&analysis.text) {
        if count < FREQUENT_MIN_COUNT || !is_valid_term(&term) {
            continue;
        }
        let confidence = (f64::from(count) / FREQUENT_DIVISOR).min(FREQUENT_MAX_CONFIDENCE);
        let definition = find_definition_for(&term, &analysis.sentences);
        concepts.push(Concept::new(
            term,
            definition,
            confidence,
            ConceptType::Frequent,
            count,
        ));
    }

    let mut concepts = dedupe_concepts(concepts);
    concepts.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    concepts.truncate(MAX_CONCEPTS);

    log::debug!("Extracted {} concepts heuristically", concepts.len());
    concepts
}

/// Converts validated model candidates into ranked concepts.
pub fn from_model_candidates(candidates: Vec<ConceptCandidate>, source_text: &str) -> Vec<Concept> {
    let concepts = candidates
        .into_iter()
        .map(|candidate| {
            let occurrences = count_occurrences(source_text, &candidate.term);
            Concept::new(
                candidate.term,
                candidate.definition,
                0.0,
                ConceptType::AiExtracted,
                occurrences,
            )
        })
        .collect();

    dedupe_concepts(concepts)
        .into_iter()
        .take(MAX_CONCEPTS)
        .enumerate()
        .map(|(index, mut concept)| {
            concept.confidence =
                (DEFINITION_CONFIDENCE - AI_CONFIDENCE_STEP * index as f64).max(0.0);
            concept
        })
        .collect()
}

pub fn is_valid_term(term: &str) -> bool {
    let term = term.trim();
    let words: Vec<&str> = term.split_whitespace().collect();

    if term.chars().count() < MIN_TERM_CHARS
        || !term.chars().any(char::is_alphabetic)
        || words.is_empty()
        || words.len() > MAX_TERM_WORDS
    {
        return false;
    }

    if words.len() == 1 && is_common_word(term) {
        return false;
    }

    // OCR duplication ("Cell Cell Membrane")
    if words
        .windows(2)
        .any(|pair| pair[0].eq_ignore_ascii_case(pair[1]))
    {
        return false;
    }

    if LEADING_ARTICLE.is_match(term) || FILLER_PHRASES.iter().any(|re| re.is_match(term)) {
        return false;
    }

    words.len() == 1 || words.iter().any(|word| is_substantive(word))
}

fn is_substantive(word: &str) -> bool {
    let capitalized = word.chars().next().is_some_and(char::is_uppercase);
    (word.chars().count() >= 4 && capitalized) || NOUN_SUFFIX.is_match(word)
}

/// Case-insensitive whole-word occurrences of `term` in `text`.
pub fn count_occurrences(text: &str, term: &str) -> u32 {
    term_pattern(term)
        .map(|re| u32::try_from(re.find_iter(text).count()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Case-insensitive whole-word matcher for `term`; `None` for a blank term.
pub fn term_pattern(term: &str) -> Option<Regex> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    let boundary = |c: Option<char>| if c.is_some_and(char::is_alphanumeric) { r"\b" } else { "" };
    let pattern = format!(
        "(?i){}{}{}",
        boundary(term.chars().next()),
        regex::escape(term),
        boundary(term.chars().last())
    );

    Regex::new(&pattern).ok()
}

/// Phrase counts in first-seen order.
fn capitalized_counts(text: &str) -> Vec<(String, u32)> {
    let mut order: Vec<(String, u32)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for captures in CAPITALIZED_TERM.captures_iter(text) {
        let Some(phrase) = captures.get(1) else {
            continue;
        };
        // Sentence-initial "The Calvin Cycle" counts as "Calvin Cycle".
        let words: Vec<&str> = phrase
            .as_str()
            .split_whitespace()
            .skip_while(|word| is_common_word(word))
            .collect();
        if words.is_empty() {
            continue;
        }
        let phrase = words.join(" ");
        match index.get(&phrase) {
            Some(&position) => order[position].1 += 1,
            None => {
                index.insert(phrase.clone(), order.len());
                order.push((phrase, 1));
            }
        }
    }

    order
}

fn find_definition_for(term: &str, sentences: &[String]) -> String {
    let needle = term.to_lowercase();
    sentences
        .iter()
        .find(|sentence| sentence.to_lowercase().contains(&needle) && COPULA.is_match(sentence))
        .map(|sentence| sentence.chars().take(BACKFILL_CHARS).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;

    #[test]
    fn explicit_definitions_become_definition_concepts() {
        let analysis = ContentAnalysis::analyze(fixtures::THREE_DEFINITIONS);

        let concepts = extract(&analysis);

        assert_eq!(concepts.len(), 3);
        assert!(concepts
            .iter()
            .all(|c| c.concept_type == ConceptType::Definition && c.confidence == 0.95));
        assert_eq!(concepts[0].term, "cell");
        assert!(concepts[0].occurrences >= 1);
    }

    #[test]
    fn frequent_capitalized_phrases_are_ranked_below_definitions() {
        let text = "Photosynthesis is a process that converts light into chemical energy. \
                    Calvin Cycle reactions fix carbon. The Calvin Cycle needs ATP. \
                    Without the Calvin Cycle plants starve. The Calvin Cycle is light independent.";

        let concepts = extract(&ContentAnalysis::analyze(text));

        assert_eq!(concepts[0].term, "Photosynthesis");
        let calvin = concepts
            .iter()
            .find(|c| c.term == "Calvin Cycle")
            .expect("frequent phrase should be extracted");
        assert_eq!(calvin.concept_type, ConceptType::Frequent);
        assert_eq!(calvin.occurrences, 4);
        assert_eq!(calvin.confidence, 0.5);
        assert_eq!(calvin.definition, "The Calvin Cycle is light independent.");
    }

    #[test]
    fn terms_are_unique_case_insensitively() {
        let text = "Osmosis is a movement of water across a membrane. \
                    OSMOSIS is a passive process in every cell. Osmosis Osmosis Osmosis.";

        let concepts = extract(&ContentAnalysis::analyze(text));

        let osmosis: Vec<_> = concepts
            .iter()
            .filter(|c| c.term.eq_ignore_ascii_case("osmosis"))
            .collect();
        assert_eq!(osmosis.len(), 1);
        assert_eq!(osmosis[0].concept_type, ConceptType::Definition);
    }

    #[test]
    fn validity_filter_rejects_noise() {
        assert!(!is_valid_term("The"));
        assert!(!is_valid_term("pH"));
        assert!(!is_valid_term("Cell Cell"));
        assert!(!is_valid_term("These Organelles"));
        assert!(!is_valid_term("The Nucleus"));
        assert!(!is_valid_term("One Two Three Four Five Six"));
        assert!(!is_valid_term("big red dot"));
        assert!(!is_valid_term("123"));
        assert!(is_valid_term("Osmosis"));
        assert!(is_valid_term("cellular respiration"));
        assert!(is_valid_term("Golgi Apparatus"));
    }

    #[test]
    fn glossary_is_capped_and_sorted() {
        let text = (0..40)
            .map(|n| format!("Term{} is a thing that does job number {}.", n, n))
            .collect::<Vec<_>>()
            .join(" ");

        let concepts = extract(&ContentAnalysis::analyze(&text));

        assert_eq!(concepts.len(), MAX_CONCEPTS);
        assert!(concepts
            .windows(2)
            .all(|pair| pair[0].confidence >= pair[1].confidence));
    }

    #[test]
    fn model_candidates_get_decreasing_confidence() {
        let candidates = vec![
            ConceptCandidate {
                term: "Cell".to_string(),
                definition: "Basic unit of life".to_string(),
            },
            ConceptCandidate {
                term: "cell".to_string(),
                definition: "duplicate".to_string(),
            },
            ConceptCandidate {
                term: "Nucleus".to_string(),
                definition: "Control center".to_string(),
            },
        ];

        let concepts = from_model_candidates(candidates, "The cell has a nucleus. Each cell divides.");

        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].confidence, 0.95);
        assert!((concepts[1].confidence - 0.93).abs() < 1e-9);
        assert_eq!(concepts[0].occurrences, 2);
        assert_eq!(concepts[1].concept_type, ConceptType::AiExtracted);
    }

    #[test]
    fn occurrences_respect_word_boundaries() {
        assert_eq!(count_occurrences("cell cells Cell subcell", "cell"), 2);
        assert_eq!(count_occurrences("Na+ and Na+ ions", "Na+"), 2);
        assert_eq!(count_occurrences("anything", ""), 0);
    }
}
