use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{concept::Concept, section::Section};

const WORDS_PER_MINUTE: usize = 200;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerMetadata {
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub estimated_read_time: usize,
    pub generated_at: DateTime<Utc>,
    pub processing_version: String,
}

impl ReviewerMetadata {
    pub fn new(
        word_count: usize,
        sentence_count: usize,
        paragraph_count: usize,
        processing_version: impl Into<String>,
    ) -> Self {
        Self {
            word_count,
            sentence_count,
            paragraph_count,
            estimated_read_time: word_count.div_ceil(WORDS_PER_MINUTE),
            generated_at: Utc::now(),
            processing_version: processing_version.into(),
        }
    }
}

/// The structured study guide persisted for one source document.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub title: String,
    pub sections: Vec<Section>,
    pub concepts: Vec<Concept>,
    pub metadata: ReviewerMetadata,
    pub original_text: String,
}
