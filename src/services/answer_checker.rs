use crate::constants::vocabulary::LEADING_ARTICLE;

pub const ACCEPT_SIMILARITY: f64 = 0.8;

/// `(longer - edit distance) / longer`, measured in characters.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longer = a.chars().count().max(b.chars().count());
    if longer == 0 {
        return 1.0;
    }

    (longer - strsim::levenshtein(a, b)) as f64 / longer as f64
}

/// Grades a typed identification answer, tolerating case, a leading article and small typos.
pub fn check_identification_answer(correct: &str, given: &str) -> bool {
    let correct = correct.trim().to_lowercase();
    let given = given.trim().to_lowercase();

    if correct == given {
        return true;
    }
    if LEADING_ARTICLE.replace(&correct, "") == LEADING_ARTICLE.replace(&given, "") {
        return true;
    }

    similarity(&correct, &given) >= ACCEPT_SIMILARITY
}
