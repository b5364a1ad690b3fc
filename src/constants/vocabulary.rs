use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

pub const COMMON_WORDS: &[&str] = &[
    "the", "this", "that", "these", "those", "what", "which", "who", "when", "where", "why",
    "how", "can", "will", "should", "would", "could", "may", "might", "must", "have", "has",
    "had", "does", "did", "are", "was", "were", "been", "being", "other", "some", "many",
    "more", "most", "such", "very", "also", "just", "only", "each", "every", "both", "few",
    "all", "any", "none", "one", "first", "last", "next", "then", "now", "here", "there",
    "about", "into", "through", "during", "before", "after", "above", "below",
];

/// Generic determiner and filler phrases that are never glossary terms.
pub static FILLER_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^(these|those|this|that)\s",
        r"(?i)^(some|many|all|most|few|several)\s",
        r"(?i)^(for example|in addition|as follows|such as)\b",
        r"(?i)^(they|them|their|it|its)$",
        r"(?i)^(key (concepts?|features?|points?)|important (concepts?|features?|points?))$",
        r"(?i)^the (process|structure|function|role) of$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid filler phrase regex"))
    .collect()
});

pub static LEADING_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(the|a|an)\s+").expect("valid article regex"));

static COMMON_WORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| COMMON_WORDS.iter().copied().collect());

/// Case-insensitive; anything shorter than three characters counts as common.
pub fn is_common_word(word: &str) -> bool {
    let word = word.trim();
    word.chars().count() < 3 || COMMON_WORD_SET.contains(word.to_lowercase().as_str())
}
