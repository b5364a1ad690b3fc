use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuizType {
    TrueFalse,
    MultipleChoice,
    Identification,
    Matching,
}

impl QuizType {
    pub const ALL: [QuizType; 4] = [
        QuizType::TrueFalse,
        QuizType::MultipleChoice,
        QuizType::Identification,
        QuizType::Matching,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            QuizType::TrueFalse => "trueFalse",
            QuizType::MultipleChoice => "multipleChoice",
            QuizType::Identification => "identification",
            QuizType::Matching => "matching",
        }
    }

    /// Short name used in step names and diagnostic contexts.
    pub fn slug(&self) -> &'static str {
        match self {
            QuizType::TrueFalse => "tf",
            QuizType::MultipleChoice => "mc",
            QuizType::Identification => "id",
            QuizType::Matching => "match",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        QuizType::ALL.into_iter().find(|t| t.slug() == slug)
    }

    /// Maximum number of items (or pairs, for matching) in one cell.
    pub fn target(&self, difficulty: Difficulty) -> usize {
        match (self, difficulty) {
            (QuizType::Matching, Difficulty::Easy) => 10,
            (QuizType::Matching, Difficulty::Medium) => 8,
            (QuizType::Matching, Difficulty::Hard) => 6,
            (_, Difficulty::Easy) => 15,
            (_, Difficulty::Medium) => 12,
            (_, Difficulty::Hard) => 10,
        }
    }
}

/// One quiz type at one difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCell {
    pub quiz_type: QuizType,
    pub difficulty: Difficulty,
}

impl QuizCell {
    pub fn new(quiz_type: QuizType, difficulty: Difficulty) -> Self {
        Self {
            quiz_type,
            difficulty,
        }
    }

    pub fn target(&self) -> usize {
        self.quiz_type.target(self.difficulty)
    }

    /// Diagnostic label such as `tf-easy`.
    pub fn context(&self) -> String {
        format!("{}-{}", self.quiz_type.slug(), self.difficulty)
    }
}

impl fmt::Display for QuizCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.quiz_type.key(), self.difficulty)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrueFalseItem {
    pub question: String,
    pub answer: bool,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceItem {
    pub question: String,
    pub options: [String; 4],
    pub correct_index: usize,
    pub explanation: String,
}

impl MultipleChoiceItem {
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdentificationItem {
    pub question: String,
    pub answer: String,
    pub hint: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchSet {
    pub pairs: Vec<MatchPair>,
    pub instruction: String,
}

/// Key used to drop repeated items when model output and heuristic output are merged.
pub trait QuizItemKey {
    fn item_key(&self) -> String;
}

impl QuizItemKey for TrueFalseItem {
    fn item_key(&self) -> String {
        self.question.trim().to_lowercase()
    }
}

impl QuizItemKey for MultipleChoiceItem {
    fn item_key(&self) -> String {
        self.question.trim().to_lowercase()
    }
}

impl QuizItemKey for IdentificationItem {
    fn item_key(&self) -> String {
        self.answer.trim().to_lowercase()
    }
}

impl QuizItemKey for MatchPair {
    fn item_key(&self) -> String {
        self.left.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_follow_tier_table() {
        assert_eq!(QuizType::TrueFalse.target(Difficulty::Easy), 15);
        assert_eq!(QuizType::MultipleChoice.target(Difficulty::Medium), 12);
        assert_eq!(QuizType::Identification.target(Difficulty::Hard), 10);
        assert_eq!(QuizType::Matching.target(Difficulty::Easy), 10);
        assert_eq!(QuizType::Matching.target(Difficulty::Medium), 8);
        assert_eq!(QuizType::Matching.target(Difficulty::Hard), 6);
    }

    #[test]
    fn quiz_cell_context_and_display() {
        let cell = QuizCell::new(QuizType::MultipleChoice, Difficulty::Hard);

        assert_eq!(cell.context(), "mc-hard");
        assert_eq!(cell.to_string(), "multipleChoice/hard");
        assert_eq!(cell.target(), 10);
    }

    #[test]
    fn slugs_resolve_back_to_types() {
        for quiz_type in QuizType::ALL {
            assert_eq!(QuizType::from_slug(quiz_type.slug()), Some(quiz_type));
        }
        assert_eq!(QuizType::from_slug("essay"), None);
    }

    #[test]
    fn multiple_choice_serializes_correct_index_camel_case() {
        let item = MultipleChoiceItem {
            question: "What is osmosis?".to_string(),
            options: [
                "Movement of water across a membrane".to_string(),
                "Cell division".to_string(),
                "Protein synthesis".to_string(),
                "Energy storage".to_string(),
            ],
            correct_index: 0,
            explanation: "Osmosis moves water.".to_string(),
        };

        let json = serde_json::to_value(&item).expect("item should serialize");
        assert_eq!(json["correctIndex"], 0);
        assert_eq!(json["options"].as_array().map(Vec::len), Some(4));
        assert_eq!(item.correct_option(), Some("Movement of water across a membrane"));
    }

    #[test]
    fn multiple_choice_rejects_wrong_option_count() {
        let raw = r#"{"question":"q","options":["a","b","c"],"correctIndex":0,"explanation":"e"}"#;
        let parsed = serde_json::from_str::<MultipleChoiceItem>(raw);

        assert!(parsed.is_err());
    }
}
