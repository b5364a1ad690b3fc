pub mod concept;
pub mod question_set;
pub mod quiz_item;
pub mod reviewer;
pub mod section;
pub mod study_guide;

pub use concept::{Concept, ConceptType};
pub use question_set::{DifficultyTiers, QuestionSet};
pub use quiz_item::{
    Difficulty, IdentificationItem, MatchPair, MatchSet, MultipleChoiceItem, QuizCell, QuizType,
    TrueFalseItem,
};
pub use reviewer::{Reviewer, ReviewerMetadata};
pub use section::{ContentLine, LineKind, Section};
pub use study_guide::{FallbackNotice, FallbackReason, SourceQuality, StudyGuide};
