//! Heuristic quiz generation from sections and glossary concepts.
//!
//! Every cell is built independently and never exceeds its target. Randomness
//! (statement and option shuffles, easy distractors) comes from the caller's RNG so a
//! seeded generator reproduces the same quiz.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::collections::HashSet;

use crate::models::domain::quiz_item::QuizItemKey;
use crate::models::domain::{
    Concept, Difficulty, DifficultyTiers, IdentificationItem, MatchPair, MatchSet,
    MultipleChoiceItem, QuestionSet, QuizType, Section, TrueFalseItem,
};
use crate::models::dto::model_output::first_letter_hint;
use crate::services::concept_extractor::term_pattern;
use crate::services::content_analyzer::extract_sentences;

/// Below this many model items a cell is topped up with heuristic items.
pub const MIN_VIABLE_ITEMS: usize = 5;

const TRUE_SHARE: f64 = 0.6;
const FALSE_SHARE: f64 = 0.4;
const MIN_FACT_WORDS: usize = 8;
const MAX_FACT_WORDS: usize = 30;
const MIN_MC_DEFINITION_CHARS: usize = 20;
const MIN_ID_DEFINITION_CHARS: usize = 15;
const PARTIAL_CHARS: usize = 80;
const BRIEF_ID_WORDS: usize = 10;
const BRIEF_MATCH_WORDS: usize = 8;
const MASK: &str = "_____";
const DISTRACTOR_COUNT: usize = 3;

const FILLER_OPTIONS: &[&str] = &[
    "A process that performs various biological functions",
    "A structure found in many living organisms",
    "A chemical compound involved in cellular reactions",
    "A theory used to describe natural phenomena",
];

static FACTUAL_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(is|are|was|were|contains|includes)\b").expect("valid factual verb regex")
});

pub fn generate<R: Rng + ?Sized>(
    sections: &[Section],
    concepts: &[Concept],
    rng: &mut R,
) -> QuestionSet {
    let sentences = section_sentences(sections);

    QuestionSet {
        true_false: DifficultyTiers::from_fn(|d| true_false(&sentences, concepts, d, rng)),
        multiple_choice: DifficultyTiers::from_fn(|d| multiple_choice(concepts, d, rng)),
        identification: DifficultyTiers::from_fn(|d| identification(concepts, d)),
        matching: DifficultyTiers::from_fn(|d| matching(concepts, d)),
    }
}

pub fn section_sentences(sections: &[Section]) -> Vec<String> {
    sections
        .iter()
        .flat_map(|section| extract_sentences(&section.raw_content))
        .collect()
}

pub fn true_false<R: Rng + ?Sized>(
    sentences: &[String],
    concepts: &[Concept],
    difficulty: Difficulty,
    rng: &mut R,
) -> Vec<TrueFalseItem> {
    let target = QuizType::TrueFalse.target(difficulty);
    let true_count = (target as f64 * TRUE_SHARE).ceil() as usize;
    let false_count = (target as f64 * FALSE_SHARE).floor() as usize;

    let mut facts: Vec<&String> = sentences.iter().filter(|s| is_factual(s)).collect();
    match difficulty {
        Difficulty::Easy => facts.sort_by_key(|s| s.chars().count()),
        Difficulty::Medium => {}
        Difficulty::Hard => facts.sort_by_key(|s| std::cmp::Reverse(s.chars().count())),
    }

    let mut items: Vec<TrueFalseItem> = facts
        .into_iter()
        .take(true_count)
        .map(|sentence| TrueFalseItem {
            question: sentence.clone(),
            answer: true,
            explanation: "This statement is taken directly from the study material.".to_string(),
        })
        .collect();

    items.extend(false_statements(concepts).into_iter().take(false_count));

    let mut items = dedupe_by_key(items);
    items.shuffle(rng);
    items.truncate(target);
    items
}

fn is_factual(sentence: &str) -> bool {
    let words = sentence.split_whitespace().count();
    (MIN_FACT_WORDS..=MAX_FACT_WORDS).contains(&words)
        && !sentence.contains('?')
        && FACTUAL_VERB.is_match(sentence)
}

/// Swaps each defined concept's term for another concept of the same type.
/// Concepts without such a partner are skipped.
fn false_statements(concepts: &[Concept]) -> Vec<TrueFalseItem> {
    let defined: Vec<&Concept> = concepts.iter().filter(|c| c.has_definition()).collect();

    defined
        .iter()
        .enumerate()
        .filter_map(|(index, concept)| {
            let partner = defined
                .iter()
                .cycle()
                .skip(index + 1)
                .take(defined.len().saturating_sub(1))
                .find(|other| {
                    other.concept_type == concept.concept_type
                        && other.term_key() != concept.term_key()
                })?;

            let definition = concept.definition.trim();
            let statement = match term_pattern(&concept.term) {
                Some(pattern) if pattern.is_match(definition) => pattern
                    .replace_all(definition, regex::NoExpand(&partner.term))
                    .into_owned(),
                _ => format!("{} can be defined as {}", partner.term, lowercase_first(definition)),
            };

            Some(TrueFalseItem {
                question: with_period(&statement),
                answer: false,
                explanation: format!(
                    "This describes {}, not {}.",
                    concept.term, partner.term
                ),
            })
        })
        .collect()
}

pub fn multiple_choice<R: Rng + ?Sized>(
    concepts: &[Concept],
    difficulty: Difficulty,
    rng: &mut R,
) -> Vec<MultipleChoiceItem> {
    let target = QuizType::MultipleChoice.target(difficulty);
    let mut items = Vec::new();

    for concept in concepts
        .iter()
        .filter(|c| c.definition.trim().chars().count() >= MIN_MC_DEFINITION_CHARS)
    {
        if items.len() >= target {
            break;
        }

        let correct = concept.definition.trim().to_string();
        let mut options = vec![correct.clone()];
        options.extend(distractors(concept, concepts, difficulty, rng));
        for filler in FILLER_OPTIONS {
            if options.len() > DISTRACTOR_COUNT {
                break;
            }
            if !options.iter().any(|o| o.eq_ignore_ascii_case(filler)) {
                options.push(filler.to_string());
            }
        }

        options.shuffle(rng);
        let Some(correct_index) = options.iter().position(|o| *o == correct) else {
            continue;
        };
        let Ok(options) = <[String; 4]>::try_from(options) else {
            continue;
        };

        items.push(MultipleChoiceItem {
            question: stem(&concept.term, difficulty),
            options,
            correct_index,
            explanation: format!("{} is defined as: {}", concept.term, correct),
        });
    }

    dedupe_by_key(items)
}

fn stem(term: &str, difficulty: Difficulty) -> String {
    match difficulty {
        Difficulty::Easy => format!("What is {}?", term),
        Difficulty::Medium => format!("Which best describes {}?", term),
        Difficulty::Hard => format!("Which statement most accurately defines {}?", term),
    }
}

/// Easy picks at random, medium prefers concepts of the same type, hard prefers
/// definitions closest in length to the correct one.
fn distractors<R: Rng + ?Sized>(
    concept: &Concept,
    concepts: &[Concept],
    difficulty: Difficulty,
    rng: &mut R,
) -> Vec<String> {
    let correct = concept.definition.trim();
    let mut seen = HashSet::new();
    seen.insert(correct.to_lowercase());

    let mut pool: Vec<&Concept> = concepts
        .iter()
        .filter(|other| other.has_definition() && other.term_key() != concept.term_key())
        .filter(|other| seen.insert(other.definition.trim().to_lowercase()))
        .collect();

    match difficulty {
        Difficulty::Easy => pool
            .choose_multiple(rng, DISTRACTOR_COUNT)
            .map(|other| other.definition.trim().to_string())
            .collect(),
        Difficulty::Medium => {
            pool.sort_by_key(|other| other.concept_type != concept.concept_type);
            take_definitions(&pool)
        }
        Difficulty::Hard => {
            let length = correct.chars().count();
            pool.sort_by_key(|other| other.definition.trim().chars().count().abs_diff(length));
            take_definitions(&pool)
        }
    }
}

fn take_definitions(pool: &[&Concept]) -> Vec<String> {
    pool.iter()
        .take(DISTRACTOR_COUNT)
        .map(|other| other.definition.trim().to_string())
        .collect()
}

pub fn identification(concepts: &[Concept], difficulty: Difficulty) -> Vec<IdentificationItem> {
    let target = QuizType::Identification.target(difficulty);

    let items: Vec<IdentificationItem> = concepts
        .iter()
        .filter(|c| c.definition.trim().chars().count() > MIN_ID_DEFINITION_CHARS)
        .map(|concept| {
            let definition = concept.definition.trim();
            let clue = match difficulty {
                Difficulty::Easy => definition.to_string(),
                Difficulty::Medium => first_chars(definition, PARTIAL_CHARS),
                Difficulty::Hard => first_words(definition, BRIEF_ID_WORDS),
            };
            IdentificationItem {
                question: mask_term(&clue, &concept.term),
                answer: concept.term.trim().to_string(),
                hint: identification_hint(&concept.term, difficulty),
            }
        })
        .collect();

    let mut items = dedupe_by_key(items);
    items.truncate(target);
    items
}

fn identification_hint(term: &str, difficulty: Difficulty) -> String {
    let term = term.trim();
    if term.chars().count() < 2 {
        return "No hint".to_string();
    }

    match difficulty {
        Difficulty::Easy => first_letter_hint(term),
        Difficulty::Medium => {
            let letters = term.chars().filter(|c| !c.is_whitespace()).count();
            format!("{} letters", letters)
        }
        Difficulty::Hard => match term.split_whitespace().count() {
            1 => "1 word".to_string(),
            n => format!("{} words", n),
        },
    }
}

pub fn matching(concepts: &[Concept], difficulty: Difficulty) -> MatchSet {
    let target = QuizType::Matching.target(difficulty);

    let pairs: Vec<MatchPair> = concepts
        .iter()
        .filter(|c| c.has_definition())
        .map(|concept| {
            let definition = concept.definition.trim();
            MatchPair {
                left: concept.term.trim().to_string(),
                right: match difficulty {
                    Difficulty::Easy => definition.to_string(),
                    Difficulty::Medium => first_chars(definition, PARTIAL_CHARS),
                    Difficulty::Hard => first_words(definition, BRIEF_MATCH_WORDS),
                },
            }
        })
        .collect();

    let mut pairs = dedupe_by_key(pairs);
    pairs.truncate(target);

    MatchSet {
        pairs,
        instruction: matching_instruction(difficulty).to_string(),
    }
}

pub fn matching_instruction(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Match each term with its definition.",
        Difficulty::Medium => "Match terms with partial definitions.",
        Difficulty::Hard => "Match terms with brief descriptions.",
    }
}

/// Model items first, then heuristic items with unseen keys.
///
/// Short model output (fewer than [`MIN_VIABLE_ITEMS`]) is topped up to the target;
/// otherwise heuristic items are only added until the merged cell is at least as
/// large as the heuristic cell. The result never exceeds `target`.
pub fn merge_cell<T: QuizItemKey>(model_items: Vec<T>, heuristic_items: Vec<T>, target: usize) -> Vec<T> {
    let floor = if model_items.len() < MIN_VIABLE_ITEMS {
        target
    } else {
        heuristic_items.len().min(target)
    };

    let mut merged = dedupe_by_key(model_items);
    let mut keys: HashSet<String> = merged.iter().map(QuizItemKey::item_key).collect();

    for item in heuristic_items {
        if merged.len() >= floor {
            break;
        }
        if keys.insert(item.item_key()) {
            merged.push(item);
        }
    }

    merged.truncate(target);
    merged
}

fn dedupe_by_key<T: QuizItemKey>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.item_key()))
        .collect()
}

fn mask_term(text: &str, term: &str) -> String {
    match term_pattern(term) {
        Some(pattern) => pattern.replace_all(text, MASK).into_owned(),
        None => text.to_string(),
    }
}

fn first_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

fn first_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        return text.to_string();
    }
    format!("{}...", words[..limit].join(" "))
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn with_period(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(&['.', '!', '?'][..]) {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}
