use serde::{Deserialize, Serialize};

use crate::models::domain::{question_set::QuestionSet, reviewer::Reviewer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceQuality {
    Sufficient,
    ThinSourceMaterial,
}

/// Why a generation step fell back to heuristic output.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FallbackReason {
    CompletionFailed { message: String },
    NoStructureFound,
    InvalidJson { message: String },
    #[serde(rename_all = "camelCase")]
    ValidationFailure { accepted: usize, rejected: usize },
    BelowMinimum { count: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct FallbackNotice {
    pub step: String,
    pub reason: FallbackReason,
}

impl FallbackNotice {
    pub fn new(step: impl Into<String>, reason: FallbackReason) -> Self {
        Self {
            step: step.into(),
            reason,
        }
    }
}

/// Everything produced for one source document in a single run.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyGuide {
    pub reviewer: Reviewer,
    pub questions: QuestionSet,
    pub source_quality: SourceQuality,
    pub fallbacks: Vec<FallbackNotice>,
}

impl StudyGuide {
    pub fn is_degraded(&self) -> bool {
        !self.fallbacks.is_empty()
    }
}
