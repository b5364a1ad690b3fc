use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConceptType {
    Definition,
    Frequent,
    AiExtracted,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Concept {
    pub term: String,
    pub definition: String,
    pub confidence: f64,
    #[serde(rename = "type")]
    pub concept_type: ConceptType,
    pub occurrences: u32,
}

impl Concept {
    pub fn new(
        term: impl Into<String>,
        definition: impl Into<String>,
        confidence: f64,
        concept_type: ConceptType,
        occurrences: u32,
    ) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
            confidence: confidence.clamp(0.0, 1.0),
            concept_type,
            occurrences,
        }
    }

    pub fn has_definition(&self) -> bool {
        !self.definition.trim().is_empty()
    }

    pub fn term_key(&self) -> String {
        self.term.trim().to_lowercase()
    }
}

/// Keeps the first concept seen for each case-insensitive term.
pub fn dedupe_concepts(concepts: Vec<Concept>) -> Vec<Concept> {
    let mut seen = HashSet::new();
    concepts
        .into_iter()
        .filter(|concept| seen.insert(concept.term_key()))
        .collect()
}
